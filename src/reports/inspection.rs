use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{format_timestamp, lenient_number, lenient_text};
use crate::model::{BannerMode, Field, Report, Section};

/// Bounding box as the camera pipeline writes it: a list, or a map keyed by
/// the list index. Entries are kept raw and coerced when displayed.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum BBox {
    List(Vec<Value>),
    Indexed(BTreeMap<String, Value>),
    Other(Value),
}

impl BBox {
    fn values(&self) -> Vec<f64> {
        match self {
            BBox::List(v) => v.iter().map(coerce_number).collect(),
            BBox::Indexed(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| {
                    let ka = a.0.parse::<f64>().unwrap_or(f64::MAX);
                    let kb = b.0.parse::<f64>().unwrap_or(f64::MAX);
                    ka.total_cmp(&kb)
                });
                entries.into_iter().map(|(_, v)| coerce_number(v)).collect()
            }
            BBox::Other(v) => vec![coerce_number(v)],
        }
    }

    /// Whole numbers joined by commas. `null` shows as 0 and anything
    /// non-numeric as NaN.
    pub fn display(&self) -> String {
        self.values()
            .iter()
            .map(|n| if n.is_nan() { "NaN".to_string() } else { format!("{n:.0}") })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Numeric reading of a loose JSON value: null, false and blank text are 0.
fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub bbox: Option<BBox>,
    #[serde(default, rename = "class", deserialize_with = "lenient_text")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub class_index: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub confidence: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Detections {
    List(Vec<Option<Detection>>),
    Keyed(BTreeMap<String, Option<Detection>>),
    /// Anything else holds no readable detections.
    Unreadable(serde::de::IgnoredAny),
}

/// One Druva inspection node from the realtime database.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct InspectionRow {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub camera_id: Option<String>,
    #[serde(default)]
    pub detections: Option<Detections>,
}

impl InspectionRow {
    /// Detections in index order; null slots are dropped.
    pub fn detections(&self) -> Vec<&Detection> {
        match &self.detections {
            None | Some(Detections::Unreadable(_)) => Vec::new(),
            Some(Detections::List(list)) => list.iter().flatten().collect(),
            Some(Detections::Keyed(map)) => {
                let mut entries: Vec<(&String, &Detection)> = map
                    .iter()
                    .filter_map(|(k, v)| v.as_ref().map(|d| (k, d)))
                    .collect();
                // Integer keys first in numeric order, the rest after.
                entries.sort_by_key(|(k, _)| match k.parse::<u64>() {
                    Ok(n) => (0, n),
                    Err(_) => (1, 0),
                });
                entries.into_iter().map(|(_, d)| d).collect()
            }
        }
    }

    /// The node id is the capture time in epoch milliseconds.
    pub fn captured_at(&self, offset: FixedOffset) -> Option<String> {
        let id = self.id.as_deref()?;
        match id.trim().parse::<f64>() {
            Ok(ms) if ms.is_finite() => DateTime::from_timestamp_millis(ms as i64)
                .map(|ts| format_timestamp(ts, offset))
                .or_else(|| Some(id.to_string())),
            _ => Some(id.to_string()),
        }
    }
}

/// Values above 1 are already percentages; fractions are scaled.
pub fn format_confidence(c: Option<f64>) -> Option<String> {
    let n = c.filter(|n| !n.is_nan())?;
    if n > 1.0 {
        Some(format!("{n:.2}"))
    } else {
        Some(format!("{:.2}%", n * 100.0))
    }
}

pub fn default_file_name(row: &InspectionRow) -> String {
    format!(
        "DRUVA_INSPECTION_{}.pdf",
        row.id.as_deref().unwrap_or("REPORT")
    )
}

pub fn build(
    row: &InspectionRow,
    generated_at: DateTime<Utc>,
    offset: FixedOffset,
    file_name: Option<&str>,
) -> Report {
    let detections = row.detections();

    let summary = Section::new("1. Inspection Summary")
        .field("Inspection ID", row.id.clone())
        .field("Time", row.captured_at(offset))
        .field("Camera ID", row.camera_id.clone())
        .field("Detections Count", Some(detections.len().to_string()));

    let mut detail = Section::new("2. Detections Detail");
    if detections.is_empty() {
        detail = detail.field(
            "Detections",
            Some("No detections found for this inspection.".to_string()),
        );
    } else {
        for (idx, d) in detections.iter().enumerate() {
            let fields = vec![
                Field::new(
                    "Class",
                    Some(d.class_name.clone().unwrap_or_else(|| "unknown".to_string())),
                ),
                Field::new("Confidence", format_confidence(d.confidence)),
                Field::new("Class Index", d.class_index.clone()),
                Field::new("Color", d.color.clone()),
                Field::new("BBox", d.bbox.as_ref().map(BBox::display)),
            ];
            detail = detail.group(format!("Detection {}", idx + 1), fields);
        }
    }

    let system = Section::new("3. System Info")
        .field("Data Source", Some("Firebase Realtime Database".to_string()))
        .field("Path", Some("inspections".to_string()))
        .field("Generated On", Some(format_timestamp(generated_at, offset)));

    Report {
        title: "DRUVA \u{2013} INSPECTION REPORT".to_string(),
        subtitle: "Issued by: Druva Track Monitoring & Maintenance".to_string(),
        sections: vec![summary, detail, system],
        footer: "This document is system-generated and valid for official Druva / Railways use."
            .to_string(),
        file_name: file_name
            .map(str::to_string)
            .unwrap_or_else(|| default_file_name(row)),
        banner: BannerMode::EveryPage,
    }
}
