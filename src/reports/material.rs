use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use super::{OFFICIAL_USE_FOOTER, format_timestamp, lenient_number, lenient_text, parse_date_string};
use crate::model::{BannerMode, Column, Report, Section, Table};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScanLocation {
    #[serde(default, deserialize_with = "lenient_number")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub lng: Option<f64>,
}

impl ScanLocation {
    pub fn display(&self) -> Option<String> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(format!("{lat:.4}, {lng:.4}")),
            _ => None,
        }
    }
}

/// One QR camera hit, as the scanner node writes it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QrScan {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub camera: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub qr_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub location: Option<ScanLocation>,
}

impl QrScan {
    /// Epoch milliseconds; 0 when missing or unparseable.
    pub fn millis(&self) -> i64 {
        self.timestamp
            .as_deref()
            .map(truncate_fraction)
            .as_deref()
            .and_then(parse_date_string)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0)
    }

    fn scanned_at(&self, offset: FixedOffset) -> Option<String> {
        match self.millis() {
            0 => self.timestamp.clone(),
            ms => DateTime::from_timestamp_millis(ms).map(|ts| format_timestamp(ts, offset)),
        }
    }
}

/// Scanner timestamps carry microseconds; keep three fractional digits.
fn truncate_fraction(ts: &str) -> String {
    let Some(dot) = ts.find('.') else {
        return ts.to_string();
    };
    let digits = ts[dot + 1..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits <= 3 {
        return ts.to_string();
    }
    format!("{}{}", &ts[..dot + 4], &ts[dot + 1 + digits..])
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialScanHistory {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fitting_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub drawing_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub batch_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub manufacturing_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub depot_code: Option<String>,
    #[serde(default)]
    pub rows: Vec<QrScan>,
}

impl MaterialScanHistory {
    /// Newest first. Scans with the same time keep their input order.
    pub fn sorted_scans(&self) -> Vec<&QrScan> {
        let mut scans: Vec<&QrScan> = self.rows.iter().collect();
        scans.sort_by_key(|s| std::cmp::Reverse(s.millis()));
        scans
    }
}

pub fn default_file_name(history: &MaterialScanHistory) -> String {
    format!(
        "{}_Scan_History.pdf",
        history.id.as_deref().unwrap_or("MATERIAL")
    )
}

pub fn build(
    history: &MaterialScanHistory,
    offset: FixedOffset,
    file_name: Option<&str>,
) -> Report {
    let overview = Section::new("1. Material Overview")
        .field("Material ID", history.id.clone())
        .field("Fitting Type", history.fitting_type.clone())
        .field("Drawing Number", history.drawing_number.clone())
        .field("Batch Number", history.batch_number.clone())
        .field("Manufacturing Date", history.manufacturing_date.clone())
        .field("Depot Code", history.depot_code.clone());

    let mut scans = Table::new(
        vec![
            Column::new("Scanned At", 150.0),
            Column::new("Camera", 90.0),
            Column::new("QR Code", 150.0),
            Column::new("Location", 125.0),
        ],
        "No QR scans recorded for this material.",
    );
    for scan in history.sorted_scans() {
        scans.row(vec![
            scan.scanned_at(offset),
            scan.camera.clone(),
            scan.qr_code.clone(),
            scan.location.as_ref().and_then(ScanLocation::display),
        ]);
    }

    Report {
        title: "INDIAN RAILWAYS \u{2013} MATERIAL SCAN HISTORY".to_string(),
        subtitle: "Issued by: Materials & Track Maintenance Division".to_string(),
        sections: vec![
            overview,
            Section::new("2. QR Scan History").table(scans),
        ],
        footer: OFFICIAL_USE_FOOTER.to_string(),
        file_name: file_name
            .map(str::to_string)
            .unwrap_or_else(|| default_file_name(history)),
        banner: BannerMode::FirstPage,
    }
}

