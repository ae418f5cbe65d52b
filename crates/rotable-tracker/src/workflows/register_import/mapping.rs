use std::collections::HashMap;
use std::sync::OnceLock;

use super::normalizer::normalize_cell;
use crate::workflows::lifecycle::domain::{ComponentStatus, ComponentType};

static TYPE_MAP: OnceLock<HashMap<String, ComponentType>> = OnceLock::new();
static STATUS_MAP: OnceLock<HashMap<String, ComponentStatus>> = OnceLock::new();

pub(crate) fn component_type_for(cell: &str) -> Option<ComponentType> {
    type_map().get(&normalize_cell(cell)).copied()
}

pub(crate) fn status_for(cell: &str) -> Option<ComponentStatus> {
    status_map().get(&normalize_cell(cell)).copied()
}

fn type_map() -> &'static HashMap<String, ComponentType> {
    TYPE_MAP.get_or_init(|| {
        let mut map = HashMap::new();
        for component_type in ComponentType::ordered() {
            map.insert(normalize_cell(component_type.as_str()), component_type);
            map.insert(normalize_cell(component_type.label()), component_type);
            map.insert(
                normalize_cell(&component_type.as_str().replace('_', "-")),
                component_type,
            );
        }
        map
    })
}

fn status_map() -> &'static HashMap<String, ComponentStatus> {
    STATUS_MAP.get_or_init(|| {
        const ALIASES: &[(&str, ComponentStatus)] = &[
            ("RFU", ComponentStatus::Rfu),
            ("In Stock", ComponentStatus::Rfu),
            ("In Service", ComponentStatus::Installed),
            ("Installed", ComponentStatus::Installed),
            ("Archived", ComponentStatus::Removed),
            ("Scrapped", ComponentStatus::Removed),
            ("Waiting GL", ComponentStatus::WaitingGlApproval),
            ("Waiting Planner", ComponentStatus::WaitingPlannerApproval),
            ("At Vendor", ComponentStatus::VendorRepair),
        ];

        let mut map = HashMap::new();
        for status in ComponentStatus::ordered() {
            map.insert(normalize_cell(status.as_str()), status);
            map.insert(normalize_cell(status.label()), status);
            if let Some(stage) = status.qa_stage() {
                map.insert(normalize_cell(stage.code()), status);
                map.insert(normalize_cell(stage.title()), status);
            }
        }
        for (alias, status) in ALIASES {
            map.insert(normalize_cell(alias), *status);
        }
        map
    })
}
