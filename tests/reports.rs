mod common;

use chrono::{FixedOffset, TimeZone, Utc};
use serde_json::json;

use vimarsha_pdf::analytics::{self, Employee, Material, MaterialFilter};
use vimarsha_pdf::model::{BannerMode, PLACEHOLDER, Report, Section};
use vimarsha_pdf::pdf;
use vimarsha_pdf::reports::{company, engineer, format_any_date, inspection, material};
use vimarsha_pdf::{Error, LogoCache, RenderConfig, RenderedReport, generate_report};

fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset")
}

fn render(report: &Report) -> RenderedReport {
    pdf::render(report, &common::logos(), &RenderConfig::default())
}

fn position(rendered: &RenderedReport, needle: &str) -> usize {
    rendered
        .text_content()
        .into_iter()
        .flatten()
        .position(|t| t == needle)
        .unwrap_or_else(|| panic!("{needle} not drawn"))
}

#[test]
fn material_without_scans_is_one_page() {
    let _ = env_logger::try_init();
    let history: material::MaterialScanHistory =
        serde_json::from_value(json!({ "id": "M-001", "fittingType": "Liner", "rows": [] }))
            .expect("parse");
    let report = material::build(&history, ist(), None);
    assert_eq!(report.file_name, "M-001_Scan_History.pdf");

    let dir = common::output_dir("material_without_scans");
    let path = generate_report(
        &report,
        &common::logo_source(),
        &LogoCache::new(),
        &RenderConfig::default(),
        &dir,
    )
    .expect("generate");
    let bytes = std::fs::read(&path).expect("read output");
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("M-001_Scan_History.pdf"));

    let rendered = render(&report);
    assert_eq!(rendered.page_count(), 1);
    assert_eq!(rendered.pages[0].image_count(), 3);
    assert!(rendered.contains_text("M-001"));
    assert!(rendered.contains_text("Liner"));
    assert!(rendered.contains_text("No QR scans recorded for this material."));
    assert!(!rendered.contains_text("Scanned At"));
}

#[test]
fn scans_listed_newest_first() {
    let history: material::MaterialScanHistory = serde_json::from_value(json!({
        "id": "M-002",
        "rows": [
            { "id": "a", "qr_code": "QR-OLD", "timestamp": "2025-01-01T08:00:00.123456Z" },
            { "id": "b", "qr_code": "QR-NEW", "timestamp": "2025-03-01T08:00:00.999999Z",
              "location": { "lat": 12.97161, "lng": 77.59456 } },
            { "id": "c", "qr_code": "QR-UNDATED" },
            { "id": "d", "qr_code": "QR-MID", "timestamp": "2025-02-01T08:00:00Z", "camera": "CAM-2" }
        ]
    }))
    .expect("parse");
    let rendered = render(&material::build(&history, ist(), None));

    let new = position(&rendered, "QR-NEW");
    let mid = position(&rendered, "QR-MID");
    let old = position(&rendered, "QR-OLD");
    let undated = position(&rendered, "QR-UNDATED");
    assert!(new < mid && mid < old && old < undated);
    assert!(rendered.contains_text("12.9716, 77.5946"));
    assert!(rendered.contains_text("CAM-2"));
}

#[test]
fn engineer_report_with_nothing_filled_in() {
    let _ = env_logger::try_init();
    let data: engineer::EngineerReportData = serde_json::from_str("{}").expect("parse");
    let report = engineer::build(&data, ist(), None);
    assert_eq!(report.file_name, "MATERIAL_Engineer_Report.pdf");

    let rendered = render(&report);
    let images: usize = rendered.pages.iter().map(|p| p.image_count()).sum();
    assert_eq!(images, 3);
    assert!(rendered.contains_text("INDIAN RAILWAYS \u{2013} ENGINEER VERIFICATION REPORT"));
    assert!(rendered.contains_text("Hardware / Druva"));
    assert!(!rendered.contains_text("Jio Tag Photo"));
    assert!(!rendered.contains_text("Engineer Visit Photo"));

    let placeholders = rendered
        .text_content()
        .into_iter()
        .flatten()
        .filter(|t| t == PLACEHOLDER)
        .count();
    // Every field and note except the detection source.
    assert!(placeholders >= 30, "{placeholders}");
    assert!(rendered.to_pdf().expect("write").starts_with(b"%PDF"));
}

#[test]
fn engineer_report_embeds_photos_and_formats_values() {
    let data: engineer::EngineerReportData = serde_json::from_value(json!({
        "materialId": "ERC-2024-0042",
        "fittingType": "ERC",
        "expectedLifeYears": 15,
        "weightKg": "",
        "aiVerifiedComponent": "elastic rail clip",
        "aiVerifiedConfidence": 0.9312,
        "aiVerifiedAt": { "seconds": 1_700_000_000, "nanoseconds": 0 },
        "aiVarification": { "status": "Verified", "confidencePercent": "93.1" },
        "jioTagPhotoData": common::png_data_uri(120, 90),
        "engineerPhotoData": common::jpeg_data_uri(90, 120),
        "engineerRemarks": "Clip reseated.\nToe load within limits."
    }))
    .expect("parse");
    let report = engineer::build(&data, ist(), None);
    assert_eq!(report.file_name, "ERC-2024-0042_Engineer_Report.pdf");

    let rendered = render(&report);
    let images: usize = rendered.pages.iter().map(|p| p.image_count()).sum();
    assert_eq!(images, 5);
    assert!(rendered.contains_text("15 years"));
    assert!(rendered.contains_text("ELASTIC RAIL CLIP"));
    assert!(rendered.contains_text("0.93"));
    assert!(rendered.contains_text("93.10"));
    assert!(rendered.contains_text("Yes"));
    assert!(rendered.contains_text("Clip reseated."));
    assert!(rendered.contains_text("Toe load within limits."));
    // The verification record has no id of its own, so the material's is repeated.
    let ids = rendered
        .text_content()
        .into_iter()
        .flatten()
        .filter(|t| t == "ERC-2024-0042")
        .count();
    assert_eq!(ids, 2);

    let dir = common::output_dir("engineer_photos");
    let path = rendered.save(&dir).expect("save");
    assert!(path.ends_with("ERC-2024-0042_Engineer_Report.pdf"));
}

#[test]
fn rendering_is_repeatable() {
    let data: engineer::EngineerReportData = serde_json::from_value(json!({
        "materialId": "M-9",
        "maintenanceNotes": "Rust on shoulder.",
        "jioTagPhotoData": common::png_data_uri(10, 10)
    }))
    .expect("parse");
    let report = engineer::build(&data, ist(), Some("custom.pdf"));
    assert_eq!(report.file_name, "custom.pdf");

    let logos = common::logos();
    let config = RenderConfig::default();
    let a = pdf::render(&report, &logos, &config);
    let b = pdf::render(&report, &logos, &config);
    assert_eq!(a.text_content(), b.text_content());
    assert_eq!(a.to_pdf().expect("write a"), b.to_pdf().expect("write b"));
}

#[test]
fn inspection_lists_detections_in_key_order() {
    let _ = env_logger::try_init();
    let row: inspection::InspectionRow = serde_json::from_value(json!({
        "id": "1700000000000",
        "camera_id": "CAM-07",
        "detections": {
            "10": { "class": "crack", "confidence": 93.5, "bbox": { "0": 1, "1": 2, "2": 3, "3": 4 } },
            "2": { "class": "missing_clip", "confidence": 0.87, "class_index": 3,
                   "color": "#ff0000", "bbox": [10.4, 20.6, 110.6, 220.0] },
            "3": null
        }
    }))
    .expect("parse");
    assert_eq!(row.detections().len(), 2);

    let generated = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    let report = inspection::build(&row, generated, ist(), None);
    assert_eq!(report.file_name, "DRUVA_INSPECTION_1700000000000.pdf");

    let rendered = render(&report);
    assert!(rendered.contains_text("2"));
    assert!(position(&rendered, "missing_clip") < position(&rendered, "crack"));
    assert!(rendered.contains_text("87.00%"));
    assert!(rendered.contains_text("93.50"));
    assert!(rendered.contains_text("10, 21, 111, 220"));
    assert!(rendered.contains_text("1, 2, 3, 4"));
    assert!(rendered.contains_text("CAM-07"));
    assert_eq!(row.captured_at(ist()).as_deref(), Some("15/11/2023, 03:43:20"));
    assert!(rendered.contains_text("15/11/2023, 03:43:20"));
    assert!(rendered.contains_text("01/06/2025, 17:30:00"));
}

#[test]
fn loose_bbox_entries_still_render() {
    let row: inspection::InspectionRow = serde_json::from_value(json!({
        "id": "7",
        "detections": [
            { "class": "crack", "bbox": [1, null, 3, 4] },
            { "class": "rust", "bbox": { "0": "12.4", "1": "", "2": "wide", "3": 8 } },
            { "class": "spall", "bbox": "n/a" }
        ]
    }))
    .expect("parse");
    assert_eq!(row.detections().len(), 3);

    let rendered = render(&inspection::build(&row, Utc::now(), ist(), None));
    assert!(rendered.contains_text("1, 0, 3, 4"));
    assert!(rendered.contains_text("12, 0, NaN, 8"));
    assert!(rendered.contains_text("NaN"));
    assert!(rendered.to_pdf().is_ok());

    let row: inspection::InspectionRow =
        serde_json::from_value(json!({ "id": "8", "detections": "offline" })).expect("parse");
    assert!(row.detections().is_empty());
}

#[test]
fn inspection_without_detections() {
    let row: inspection::InspectionRow =
        serde_json::from_value(json!({ "camera_id": "CAM-01", "detections": [null] })).expect("parse");
    let report = inspection::build(&row, Utc::now(), ist(), None);
    assert_eq!(report.file_name, "DRUVA_INSPECTION_REPORT.pdf");
    let rendered = render(&report);
    assert!(rendered.contains_text("No detections found for this inspection."));
    assert!(rendered.contains_text("0"));
}

#[test]
fn inspection_banner_on_every_page() {
    let detections: Vec<_> = (0..25)
        .map(|i| json!({ "class": format!("defect_{i}"), "confidence": 0.5 }))
        .collect();
    let row: inspection::InspectionRow =
        serde_json::from_value(json!({ "id": "42", "detections": detections })).expect("parse");
    let rendered = render(&inspection::build(&row, Utc::now(), ist(), None));
    assert!(rendered.page_count() > 2);
    for page in &rendered.pages {
        assert_eq!(page.image_count(), 3);
        assert!(page.texts().any(|t| t == "DRUVA \u{2013} INSPECTION REPORT"));
    }
    assert!(position(&rendered, "Detection 9") < position(&rendered, "Detection 10"));

    let bytes = rendered.to_pdf().expect("write");
    // Logos are shared across pages and written once.
    let xobjects = bytes.windows(b"/Subtype /Image".len()).filter(|w| *w == b"/Subtype /Image").count();
    assert!(xobjects <= 4, "{xobjects}");
}

fn employees() -> Vec<Employee> {
    serde_json::from_value(json!([
        { "uid": "u1", "name": "Asha Rao", "companyId": "C1", "companyName": "Kalinga Forge" },
        { "uid": "u2", "empId": "EMP-22", "companyId": "C1", "companyName": "Kalinga Forge" },
        { "uid": "u3", "email": "ops@deccan.example", "companyId": "C2", "companyName": "Deccan Fittings" }
    ]))
    .expect("employees")
}

fn materials() -> Vec<Material> {
    serde_json::from_value(json!([
        { "id": "m1", "materialId": "ERC-1", "fittingType": "ERC", "batchNumber": "B1",
          "manufacturingDate": "2025-01-15", "manufacturerId": "C1", "createdBy": "u1" },
        { "id": "m2", "materialId": "LNR-1", "fittingType": "Liner",
          "manufacturingDate": "2025-02-03", "manufacturerId": "C1", "createdBy": "u2" },
        { "id": "m3", "materialId": "ERC-2", "fittingType": "ERC",
          "manufacturingDate": "2025-02-28", "manufacturerId": "C1", "createdBy": "u1" },
        { "id": "m4", "materialId": "ERC-3", "fittingType": "ERC",
          "manufacturerId": "C1", "createdBy": "ghost" }
    ]))
    .expect("materials")
}

#[test]
fn company_report_resolves_creators() {
    let _ = env_logger::try_init();
    let groups = analytics::group_by_company(&employees(), &materials());
    let kalinga = groups.iter().find(|g| g.company_id == "C1").expect("C1");
    let generated = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();

    let report = company::build_filtered(kalinga, &MaterialFilter::default(), generated, ist());
    assert_eq!(report.file_name, "vimarsha_company_report_C1.pdf");
    let rendered = render(&report);

    assert!(rendered.contains_text("Kalinga Forge"));
    assert!(rendered.contains_text("Employee Name / ID"));
    assert!(rendered.contains_text("Asha Rao"));
    assert!(rendered.contains_text("EMP-22"));
    // m4 has no manufacturing date and is filtered out.
    assert!(!rendered.contains_text("ERC-3"));
    assert!(rendered.contains_text("4"));
    assert!(rendered.contains_text("3"));
    assert!(position(&rendered, "ERC-1") < position(&rendered, "LNR-1"));
    assert!(rendered.contains_text("01/03/2025, 15:00:00"));
}

#[test]
fn company_report_with_no_matches() {
    let groups = analytics::group_by_company(&employees(), &materials());
    let deccan = groups.iter().find(|g| g.company_id == "C2").expect("C2");
    let filter = MaterialFilter {
        fitting_type: Some("Liner".to_string()),
        ..MaterialFilter::default()
    };
    let rendered = render(&company::build_filtered(deccan, &filter, Utc::now(), ist()));
    assert!(rendered.contains_text("No employee work found for the selected filters."));
    assert!(rendered.contains_text("No materials match the current filters for this company."));
    assert_eq!(rendered.page_count(), 1);
}

#[test]
fn any_date_formats() {
    let utc = FixedOffset::east_opt(0).expect("UTC offset");
    assert_eq!(format_any_date(None, ist()), None);
    assert_eq!(format_any_date(Some(&json!("")), ist()), None);
    assert_eq!(
        format_any_date(Some(&json!("next tuesday")), ist()),
        Some("next tuesday".to_string())
    );
    assert_eq!(
        format_any_date(Some(&json!({ "_seconds": 1_700_000_000 })), ist()).as_deref(),
        Some("15/11/2023, 03:43:20")
    );
    assert_eq!(
        format_any_date(Some(&json!({ "seconds": 1_700_000_000, "nanoseconds": 5 })), utc).as_deref(),
        Some("14/11/2023, 22:13:20")
    );
    assert_eq!(
        format_any_date(Some(&json!(1_700_000_000_000i64)), utc).as_deref(),
        Some("14/11/2023, 22:13:20")
    );
    assert_eq!(
        format_any_date(Some(&json!("2024-05-06T10:00:00Z")), ist()).as_deref(),
        Some("06/05/2024, 15:30:00")
    );
    assert_eq!(
        format_any_date(Some(&json!("2024-05-06")), utc).as_deref(),
        Some("06/05/2024, 00:00:00")
    );
}

#[test]
fn missing_logo_aborts_generation() {
    let report = material::build(&material::MaterialScanHistory::default(), ist(), Some("never.pdf"));
    let source = common::MemorySource::default().with("/g20.png", common::png_bytes(8, 8));
    let dir = common::output_dir("missing_logo");
    let _ = std::fs::remove_file(dir.join("never.pdf"));

    let err = generate_report(&report, &source, &LogoCache::new(), &RenderConfig::default(), &dir)
        .expect_err("logo missing");
    assert!(matches!(err, Error::Asset { ref path, .. } if path == "/railway.png"));
    assert!(!dir.join("never.pdf").exists());
}

#[test]
fn file_name_stays_inside_output_dir() {
    let dir = common::output_dir("flat_file_name");
    for (id, expected) in [
        ("ERC/2024/01", "ERC_2024_01_Scan_History.pdf"),
        ("../../escaped", ".._.._escaped_Scan_History.pdf"),
    ] {
        let history: material::MaterialScanHistory =
            serde_json::from_value(json!({ "id": id })).expect("parse");
        let path = render(&material::build(&history, ist(), None))
            .save(&dir)
            .expect("save");
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(expected));
        assert!(path.exists());
    }
    assert_eq!(pdf::flat_file_name(".."), "report.pdf");
    assert_eq!(pdf::flat_file_name("vimarsha_company_report_C1.pdf"), "vimarsha_company_report_C1.pdf");
}

#[test]
fn corrupt_photo_does_not_abort_save() {
    let _ = env_logger::try_init();
    let photo = common::data_uri("image/png", &common::corrupt_png_bytes(64, 64));
    let report = Report {
        title: "PHOTO CHECK".to_string(),
        subtitle: "Issued by: test".to_string(),
        sections: vec![
            Section::new("1. Photos")
                .field("Engineer", Some("Ravi \u{0930}\u{093e}\u{092e}".to_string()))
                .photo("Engineer Visit Photo", Some(photo)),
        ],
        footer: "footer line".to_string(),
        file_name: "corrupt_photo.pdf".to_string(),
        banner: BannerMode::FirstPage,
    };
    let rendered = render(&report);
    assert!(rendered.contains_text("Image could not be embedded."));
    assert_eq!(rendered.pages[0].image_count(), 3);

    let path = rendered.save(&common::output_dir("corrupt_photo")).expect("save");
    let bytes = std::fs::read(&path).expect("read output");
    assert!(bytes.starts_with(b"%PDF"));
}
