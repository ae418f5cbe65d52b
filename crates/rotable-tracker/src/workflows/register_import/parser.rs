use std::io::Read;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

use super::mapping::{component_type_for, status_for};
use crate::workflows::lifecycle::domain::{
    Component, ComponentId, ComponentStatus, ImportedComponent, InstallOrder,
};

/// A register row that could not be turned into a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub component_id: Option<String>,
    pub reason: String,
}

pub(crate) enum ParsedRow {
    Component(ImportedComponent),
    Skipped(SkippedRow),
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<ParsedRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut rows = Vec::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());
        let row: RegisterRow = record.deserialize(Some(&headers))?;
        rows.push(match row.into_imported() {
            Ok(imported) => ParsedRow::Component(imported),
            Err((component_id, reason)) => ParsedRow::Skipped(SkippedRow {
                line,
                component_id,
                reason,
            }),
        });
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RegisterRow {
    #[serde(rename = "Component ID", default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(rename = "Type", default, deserialize_with = "empty_string_as_none")]
    component_type: Option<String>,
    #[serde(rename = "Serial Number", default, deserialize_with = "empty_string_as_none")]
    serial_number: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(rename = "From Unit", default, deserialize_with = "empty_string_as_none")]
    from_unit_id: Option<String>,
    #[serde(rename = "Date Received", default, deserialize_with = "empty_string_as_none")]
    date_received: Option<String>,
    #[serde(rename = "Condition Notes", default, deserialize_with = "empty_string_as_none")]
    condition_notes: Option<String>,
    #[serde(rename = "OEM Part Number", default, deserialize_with = "empty_string_as_none")]
    oem_part_number: Option<String>,
    #[serde(
        rename = "Model Compatibility",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    model_compatibility: Option<String>,
    #[serde(rename = "Vendor Reference", default, deserialize_with = "empty_string_as_none")]
    vendor_reference: Option<String>,
    #[serde(rename = "Total Lifetime", default, deserialize_with = "empty_string_as_none")]
    total_lifetime: Option<String>,
    #[serde(rename = "Cycles", default, deserialize_with = "empty_string_as_none")]
    cycles: Option<String>,
    #[serde(rename = "Installed Unit", default, deserialize_with = "empty_string_as_none")]
    installed_unit: Option<String>,
    #[serde(rename = "Install HM", default, deserialize_with = "empty_string_as_none")]
    install_hm: Option<String>,
    #[serde(rename = "Install Date", default, deserialize_with = "empty_string_as_none")]
    install_date: Option<String>,
}

impl RegisterRow {
    fn into_imported(self) -> Result<ImportedComponent, (Option<String>, String)> {
        let Some(id) = self.id else {
            return Err((None, "missing component id".to_string()));
        };
        let fail = |reason: String| Err((Some(id.clone()), reason));

        let component_type = match self.component_type.as_deref() {
            None => return fail("missing type".to_string()),
            Some(cell) => match component_type_for(cell) {
                Some(component_type) => component_type,
                None => return fail(format!("unknown type '{cell}'")),
            },
        };
        let status = match self.status.as_deref() {
            None => ComponentStatus::Received,
            Some(cell) => match status_for(cell) {
                Some(status) => status,
                None => return fail(format!("unknown status '{cell}'")),
            },
        };
        let date_received = match self.date_received.as_deref() {
            None => return fail("missing date received".to_string()),
            Some(cell) => match parse_date(cell) {
                Some(date) => date,
                None => return fail(format!("unparseable date received '{cell}'")),
            },
        };
        let total_lifetime = match parse_count::<u64>(self.total_lifetime.as_deref()) {
            Ok(value) => value,
            Err(cell) => return fail(format!("invalid total lifetime '{cell}'")),
        };
        let cycles = match parse_count::<u32>(self.cycles.as_deref()) {
            Ok(value) => value,
            Err(cell) => return fail(format!("invalid cycles '{cell}'")),
        };

        // Parts still fitted need the cycle they are running on.
        let install = if status == ComponentStatus::Installed {
            let (Some(unit_id), Some(hm_cell)) = (self.installed_unit, self.install_hm.as_deref())
            else {
                return fail("installed without unit and install hour meter".to_string());
            };
            let hm_start = match parse_count::<u64>(Some(hm_cell)) {
                Ok(value) => value,
                Err(cell) => return fail(format!("invalid install hour meter '{cell}'")),
            };
            let install_date = match self.install_date.as_deref() {
                None => date_received,
                Some(cell) => match parse_date(cell) {
                    Some(date) => date,
                    None => return fail(format!("unparseable install date '{cell}'")),
                },
            };
            Some(InstallOrder {
                unit_id,
                hm_start,
                install_date,
            })
        } else {
            None
        };

        let component = Component {
            id: ComponentId(id.clone()),
            component_type,
            serial_number: self.serial_number,
            oem_part_number: self.oem_part_number,
            model_compatibility: self.model_compatibility,
            vendor_reference: self.vendor_reference,
            from_unit_id: self.from_unit_id,
            date_received,
            condition_notes: self.condition_notes,
            status,
            total_lifetime,
            cycles,
            revision: 0,
        };
        Ok(ImportedComponent { component, install })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").ok()
}

fn parse_count<T>(value: Option<&str>) -> Result<T, String>
where
    T: std::str::FromStr + Default,
{
    match value {
        None => Ok(T::default()),
        Some(cell) => cell
            .replace(',', "")
            .parse::<T>()
            .map_err(|_| cell.to_string()),
    }
}

#[cfg(test)]
pub(crate) fn parse_date_for_tests(value: &str) -> Option<NaiveDate> {
    parse_date(value)
}
