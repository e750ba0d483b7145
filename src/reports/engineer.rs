use chrono::FixedOffset;
use serde::Deserialize;
use serde_json::Value;

use super::{OFFICIAL_USE_FOOTER, format_any_date, lenient_number, lenient_text};
use crate::model::{BannerMode, Report, Section};

/// Material document as seen by the engineer, with installation, fault and
/// closure data merged in.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineerReportData {
    #[serde(default, deserialize_with = "lenient_text")]
    pub material_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub fitting_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub drawing_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub material_spec: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub weight_kg: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub board_gauge: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub manufacturing_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub expected_life_years: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub purchase_order_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub batch_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub depot_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub udm_lot_number: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub depot_entry_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tms_track_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub installation_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gps_location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub jio_tag_photo_data: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub ai_verified_component: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ai_verified_confidence: Option<f64>,
    #[serde(default)]
    pub ai_verified_at: Option<Value>,

    #[serde(default, rename = "aiVarification")]
    pub ai_verification: Option<AiVerification>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub fault_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fault_severity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fault_detected_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fault_source: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub maintenance_notes: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub last_maintenance_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub engineer_gps_location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fault_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub engineer_remarks: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub engineer_root_cause: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub engineer_preventive_action: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub engineer_photo_data: Option<String>,
}

/// Result document written by the component classifier.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiVerification {
    #[serde(default, deserialize_with = "lenient_text")]
    pub material_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub component: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub confidence_percent: Option<f64>,
    #[serde(default)]
    pub ai_verified_at: Option<Value>,
}

impl AiVerification {
    pub fn is_verified(&self) -> bool {
        self.verified == Some(true)
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("verified"))
    }
}

fn fixed2(n: Option<f64>) -> Option<String> {
    n.map(|v| format!("{v:.2}"))
}

fn upper(s: &Option<String>) -> Option<String> {
    s.as_ref().map(|v| v.to_uppercase())
}

pub fn default_file_name(data: &EngineerReportData) -> String {
    format!(
        "{}_Engineer_Report.pdf",
        data.material_id.as_deref().unwrap_or("MATERIAL")
    )
}

pub fn build(data: &EngineerReportData, offset: FixedOffset, file_name: Option<&str>) -> Report {
    let d = data;
    let av = d.ai_verification.as_ref();

    let manufacturer = Section::new("1. Manufacturer Details (Read Only)")
        .field("Material ID", d.material_id.clone())
        .field("Fitting Type", d.fitting_type.clone())
        .field("Drawing Number", d.drawing_number.clone())
        .field("Material Spec", d.material_spec.clone())
        .field("Weight (kg)", d.weight_kg.clone())
        .field("Board Gauge", d.board_gauge.clone())
        .field("Manufacturing Date", d.manufacturing_date.clone())
        .field(
            "Expected Service Life",
            d.expected_life_years.as_ref().map(|y| format!("{y} years")),
        )
        .field("Purchase Order Number", d.purchase_order_number.clone())
        .field("Batch Number", d.batch_number.clone())
        .field("Depot Code", d.depot_code.clone())
        .field("UDM Lot Number", d.udm_lot_number.clone());

    let installation = Section::new("2. Installation Snapshot (Track Staff)")
        .field("Depot Entry Date", d.depot_entry_date.clone())
        .field("TMS Track ID", d.tms_track_id.clone())
        .field("Installation Status", d.installation_status.clone())
        .field("GPS Installation Location", d.gps_location.clone())
        .field(
            "AI Verification (Installation) - Component",
            upper(&d.ai_verified_component),
        )
        .field(
            "AI Verification (Installation) - Confidence",
            fixed2(d.ai_verified_confidence),
        )
        .field(
            "AI Verification (Installation) - Verified At",
            format_any_date(d.ai_verified_at.as_ref(), offset),
        )
        .photo("Jio Tag Photo", d.jio_tag_photo_data.clone());

    let ai_details = Section::new("2.1 AI Verification Details (ai_varification)")
        .field("Status", av.and_then(|a| a.status.clone()))
        .field(
            "Verified",
            av.map(|a| if a.is_verified() { "Yes" } else { "No" }.to_string()),
        )
        .field("Component", av.and_then(|a| upper(&a.component)))
        .field(
            "Confidence (%)",
            fixed2(av.and_then(|a| a.confidence_percent)),
        )
        .field(
            "Verified At",
            format_any_date(av.and_then(|a| a.ai_verified_at.as_ref()), offset),
        )
        .field(
            "Material ID (ai_varification)",
            av.and_then(|a| a.material_id.clone())
                .or_else(|| d.material_id.clone()),
        );

    let fault = Section::new("3. Fault & Detection Details")
        .field("Fault Type", d.fault_type.clone())
        .field("Fault Severity", d.fault_severity.clone())
        .field("Fault Detected At", d.fault_detected_at.clone())
        .field(
            "Detection Source",
            Some(
                d.fault_source
                    .clone()
                    .unwrap_or_else(|| "Hardware / Druva".to_string()),
            ),
        )
        .note("Maintenance Staff Notes", d.maintenance_notes.clone());

    let closure = Section::new("4. Engineer Verification & Closure")
        .field(
            "Last Maintenance Date (Engineer Confirmed)",
            d.last_maintenance_date.clone(),
        )
        .field("Engineer GPS (During Visit)", d.engineer_gps_location.clone())
        .field("Fault Status", d.fault_status.clone())
        .note("Engineer Remarks", d.engineer_remarks.clone())
        .note("Root Cause (Diagnosis)", d.engineer_root_cause.clone())
        .note("Preventive Measures", d.engineer_preventive_action.clone())
        .photo("Engineer Visit Photo", d.engineer_photo_data.clone());

    Report {
        title: "INDIAN RAILWAYS \u{2013} ENGINEER VERIFICATION REPORT".to_string(),
        subtitle: "Issued by: Materials & Track Maintenance Division".to_string(),
        sections: vec![manufacturer, installation, ai_details, fault, closure],
        footer: OFFICIAL_USE_FOOTER.to_string(),
        file_name: file_name
            .map(str::to_string)
            .unwrap_or_else(|| default_file_name(d)),
        banner: BannerMode::FirstPage,
    }
}
