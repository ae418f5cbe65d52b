//! Install/remove cycles and lifetime accounting.

use serde::Serialize;

use super::domain::{
    Component, ComponentStatus, InstallOrder, InstallRecord, InstallRecordId, RemovalOrder,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("component {component} is '{status}', only RFU components can be installed")]
    ComponentNotRfu {
        component: String,
        status: ComponentStatus,
    },
    #[error("component {component} is already installed on unit {unit_id}")]
    AlreadyInstalled { component: String, unit_id: String },
    #[error("install record {record} was already closed")]
    AlreadyRemoved { record: String },
    #[error("hour meter at removal ({hm_end}) is below the reading at install ({hm_start})")]
    InvalidHourMeter { hm_start: u64, hm_end: u64 },
    #[error("lifetime counters overflowed for component {component}")]
    CounterOverflow { component: String },
}

pub fn install_record_id(component: &Component) -> InstallRecordId {
    InstallRecordId(format!("INS-{}-{}", component.id, component.revision))
}

pub fn ensure_rfu(component: &Component) -> Result<(), LedgerError> {
    if component.status == ComponentStatus::Rfu {
        Ok(())
    } else {
        Err(LedgerError::ComponentNotRfu {
            component: component.id.to_string(),
            status: component.status,
        })
    }
}

/// Open a new installation cycle. Fails unless the component is RFU and has no open cycle.
pub fn open_install(
    component: &Component,
    open_record: Option<&InstallRecord>,
    order: InstallOrder,
) -> Result<InstallRecord, LedgerError> {
    if let Some(open) = open_record {
        return Err(LedgerError::AlreadyInstalled {
            component: component.id.to_string(),
            unit_id: open.unit_id.clone(),
        });
    }
    ensure_rfu(component)?;
    Ok(cycle(component, order))
}

/// Open cycle for a part that was already fitted when its register row was imported.
pub fn imported_install(component: &Component, order: InstallOrder) -> InstallRecord {
    cycle(component, order)
}

fn cycle(component: &Component, order: InstallOrder) -> InstallRecord {
    InstallRecord {
        id: install_record_id(component),
        component_id: component.id.clone(),
        component_type: component.component_type,
        unit_id: order.unit_id.trim().to_string(),
        install_date: order.install_date,
        hm_start: order.hm_start,
        remove_date: None,
        hm_end: None,
        lifetime: None,
        removal_reason: None,
    }
}

/// Close an open cycle, computing `lifetime = hm_end - hm_start`.
pub fn close_install(
    record: &InstallRecord,
    order: RemovalOrder,
) -> Result<InstallRecord, LedgerError> {
    if !record.is_open() {
        return Err(LedgerError::AlreadyRemoved {
            record: record.id.to_string(),
        });
    }
    let lifetime = order
        .hm_end
        .checked_sub(record.hm_start)
        .ok_or(LedgerError::InvalidHourMeter {
            hm_start: record.hm_start,
            hm_end: order.hm_end,
        })?;

    let mut closed = record.clone();
    closed.remove_date = Some(order.remove_date);
    closed.hm_end = Some(order.hm_end);
    closed.lifetime = Some(lifetime);
    closed.removal_reason = Some(order.reason.trim().to_string());
    Ok(closed)
}

/// Add one completed cycle to the component counters.
pub fn accrue(component: &mut Component, lifetime: u64) -> Result<(), LedgerError> {
    let overflow = || LedgerError::CounterOverflow {
        component: component.id.to_string(),
    };
    let total = component
        .total_lifetime
        .checked_add(lifetime)
        .ok_or_else(overflow)?;
    let cycles = component.cycles.checked_add(1).ok_or_else(overflow)?;
    component.total_lifetime = total;
    component.cycles = cycles;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifetimeSummary {
    pub cycles: u32,
    pub total_lifetime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_lifetime_per_cycle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_cycle: Option<InstallRecord>,
    pub history: Vec<InstallRecord>,
}

/// Lifetime summary for a component; `records` are ordered by install date, newest first.
pub fn summarize(component: &Component, records: &[InstallRecord]) -> LifetimeSummary {
    let mut history = records.to_vec();
    history.sort_by(|left, right| {
        right
            .install_date
            .cmp(&left.install_date)
            .then_with(|| right.id.cmp(&left.id))
    });

    LifetimeSummary {
        cycles: component.cycles,
        total_lifetime: component.total_lifetime,
        average_lifetime_per_cycle: component.average_lifetime_per_cycle(),
        open_cycle: history.iter().find(|record| record.is_open()).cloned(),
        history,
    }
}
