//! Company grouping and the summaries shown on the manufacturer admin
//! dashboard. The company report is built from these.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::reports::{lenient_text, parse_date_string};

const UNKNOWN_COMPANY: &str = "UNKNOWN";

/// A manufacturer user account.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(default)]
    pub uid: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub emp_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: Option<String>,
}

impl Employee {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.emp_id.as_deref())
            .or(self.email.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub material_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fitting_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub drawing_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub batch_number: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default, deserialize_with = "lenient_text")]
    pub manufacturing_date: Option<String>,
    /// Company id of the manufacturer.
    #[serde(default, deserialize_with = "lenient_text")]
    pub manufacturer_id: Option<String>,
    /// Uid of the employee who registered the material.
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_by: Option<String>,
}

impl Material {
    fn manufactured_on(&self) -> Option<NaiveDate> {
        self.manufacturing_date
            .as_deref()
            .and_then(parse_date_string)
            .map(|dt| dt.date_naive())
    }
}

#[derive(Clone, Debug)]
pub struct CompanyGroup {
    pub company_id: String,
    pub company_name: String,
    pub employees: Vec<Employee>,
    pub materials: Vec<Material>,
}

impl CompanyGroup {
    /// Display name of the employee with `uid`, or "Unknown".
    pub fn creator_name(&self, uid: Option<&str>) -> &str {
        uid.and_then(|uid| self.employees.iter().find(|e| e.uid == uid))
            .map(Employee::display_name)
            .unwrap_or("Unknown")
    }
}

/// Companies are defined by their employees; a material whose manufacturer
/// has no employee on record is left out. Sorted by company name.
pub fn group_by_company(employees: &[Employee], materials: &[Material]) -> Vec<CompanyGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, CompanyGroup> = HashMap::new();

    for emp in employees {
        let cid = emp.company_id.as_deref().unwrap_or(UNKNOWN_COMPANY).to_string();
        let group = groups.entry(cid.clone()).or_insert_with(|| {
            order.push(cid.clone());
            CompanyGroup {
                company_id: cid.clone(),
                company_name: emp.company_name.clone().unwrap_or_else(|| cid.clone()),
                employees: Vec::new(),
                materials: Vec::new(),
            }
        });
        group.employees.push(emp.clone());
    }

    for mat in materials {
        let cid = mat.manufacturer_id.as_deref().unwrap_or(UNKNOWN_COMPANY);
        if let Some(group) = groups.get_mut(cid) {
            group.materials.push(mat.clone());
        }
    }

    let mut out: Vec<CompanyGroup> = order
        .into_iter()
        .filter_map(|cid| groups.remove(&cid))
        .collect();
    out.sort_by(|a, b| a.company_name.cmp(&b.company_name));
    log::debug!(
        "grouped {} employee(s) and {} material(s) into {} compan(ies)",
        employees.len(),
        materials.len(),
        out.len()
    );
    out
}

/// Dashboard filters. Materials without a manufacturing date never match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialFilter {
    pub from: Option<NaiveDate>,
    /// Inclusive: the whole day counts.
    pub to: Option<NaiveDate>,
    pub fitting_type: Option<String>,
}

impl MaterialFilter {
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some() || self.fitting_type.is_some()
    }

    pub fn matches(&self, material: &Material) -> bool {
        if material.manufacturing_date.is_none() {
            return false;
        }
        if self.from.is_some() || self.to.is_some() {
            let Some(date) = material.manufactured_on() else {
                return false;
            };
            if self.from.is_some_and(|from| date < from) {
                return false;
            }
            if self.to.is_some_and(|to| date > to) {
                return false;
            }
        }
        match &self.fitting_type {
            Some(t) => material.fitting_type.as_deref() == Some(t.as_str()),
            None => true,
        }
    }

    pub fn apply(&self, materials: &[Material]) -> Vec<Material> {
        materials
            .iter()
            .filter(|m| self.matches(m))
            .cloned()
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MonthCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

/// Materials per manufacturing month, oldest first.
pub fn monthly_series(materials: &[Material]) -> Vec<MonthCount> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for m in materials {
        let Some(date) = m.manufacturing_date.as_deref() else {
            continue;
        };
        let month: String = date.chars().take(7).collect();
        *buckets.entry(month).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(month, count)| MonthCount { month, count })
        .collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeCount {
    pub name: String,
    pub value: usize,
}

/// Materials per fitting type, in first-seen order.
pub fn type_distribution(materials: &[Material]) -> Vec<TypeCount> {
    let mut out: Vec<TypeCount> = Vec::new();
    for m in materials {
        let name = m.fitting_type.as_deref().unwrap_or("Unknown");
        match out.iter_mut().find(|t| t.name == name) {
            Some(t) => t.value += 1,
            None => out.push(TypeCount {
                name: name.to_string(),
                value: 1,
            }),
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
pub struct EfficiencyRow {
    pub name: String,
    pub count: usize,
}

/// Materials registered per employee, busiest first. Idle employees are dropped.
pub fn employee_efficiency(employees: &[Employee], materials: &[Material]) -> Vec<EfficiencyRow> {
    let mut work: HashMap<&str, usize> = HashMap::new();
    for m in materials {
        if let Some(uid) = m.created_by.as_deref() {
            *work.entry(uid).or_insert(0) += 1;
        }
    }

    let mut rows: Vec<EfficiencyRow> = employees
        .iter()
        .map(|emp| EfficiencyRow {
            name: emp.display_name().to_string(),
            count: work.get(emp.uid.as_str()).copied().unwrap_or(0),
        })
        .filter(|row| row.count > 0)
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

/// Materials manufactured in the given calendar month.
pub fn materials_in_month(materials: &[Material], year: i32, month: u32) -> usize {
    let prefix = format!("{year:04}-{month:02}");
    materials
        .iter()
        .filter(|m| {
            m.manufacturing_date
                .as_deref()
                .is_some_and(|d| d.starts_with(&prefix))
        })
        .count()
}

/// `materials_in_month` for the month containing `today`.
pub fn materials_this_month(materials: &[Material], today: NaiveDate) -> usize {
    materials_in_month(materials, today.year(), today.month())
}
