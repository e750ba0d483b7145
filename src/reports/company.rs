use chrono::{DateTime, FixedOffset, Utc};

use super::format_timestamp;
use crate::analytics::{CompanyGroup, EfficiencyRow, Material, MaterialFilter, employee_efficiency};
use crate::model::{BannerMode, Column, Report, Section, Table};

pub fn default_file_name(company: &CompanyGroup) -> String {
    format!("vimarsha_company_report_{}.pdf", company.company_id)
}

/// Apply `filter` to the company's materials and build the report from the
/// filtered set.
pub fn build_filtered(
    company: &CompanyGroup,
    filter: &MaterialFilter,
    generated_at: DateTime<Utc>,
    offset: FixedOffset,
) -> Report {
    let filtered = filter.apply(&company.materials);
    let efficiency = employee_efficiency(&company.employees, &filtered);
    build(company, &filtered, &efficiency, generated_at, offset)
}

pub fn build(
    company: &CompanyGroup,
    filtered: &[Material],
    efficiency: &[EfficiencyRow],
    generated_at: DateTime<Utc>,
    offset: FixedOffset,
) -> Report {
    let overview = Section::new("1. Company Overview")
        .field("Company Name", Some(company.company_name.clone()))
        .field("Company ID", Some(company.company_id.clone()))
        .field(
            "Total Employees (All Time)",
            Some(company.employees.len().to_string()),
        )
        .field(
            "Total Materials (All Time)",
            Some(company.materials.len().to_string()),
        )
        .field(
            "Materials in This Filtered Report",
            Some(filtered.len().to_string()),
        )
        .field("Report Generated On", Some(format_timestamp(generated_at, offset)));

    let mut work = Table::new(
        vec![
            Column::new("Employee Name / ID", 260.0),
            Column::new("Material Count", 130.0),
        ],
        "No employee work found for the selected filters.",
    );
    for row in efficiency {
        work.row(vec![Some(row.name.clone()), Some(row.count.to_string())]);
    }

    let mut list = Table::new(
        vec![
            Column::new("Material ID", 150.0),
            Column::new("Type", 110.0),
            Column::new("Batch", 90.0),
            Column::new("Mfg Date", 90.0),
            Column::new("Created By", 120.0),
        ],
        "No materials match the current filters for this company.",
    );
    for m in filtered {
        list.row(vec![
            m.material_id.clone(),
            m.fitting_type.clone(),
            m.batch_number.clone(),
            m.manufacturing_date.clone(),
            Some(company.creator_name(m.created_by.as_deref()).to_string()),
        ]);
    }

    Report {
        title: "INDIAN RAILWAYS \u{2013} MANUFACTURER COMPANY REPORT".to_string(),
        subtitle: "Vimarsha \u{2013} Track Fittings Digital Ecosystem".to_string(),
        sections: vec![
            overview,
            Section::new("2. Employee Efficiency (Filtered)").table(work),
            Section::new("3. Materials List (Filtered)").table(list),
        ],
        footer: "This document is system-generated by Vimarsha and valid for official Indian Railways use."
            .to_string(),
        file_name: default_file_name(company),
        banner: BannerMode::FirstPage,
    }
}
