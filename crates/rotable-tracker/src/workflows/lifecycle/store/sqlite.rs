use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Params, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{lock_within, timeout_millis};
use crate::workflows::lifecycle::domain::{
    Component, ComponentId, FabricationRequest, FabricationRequestId, InstallRecord,
    InstallRecordId, QaRecord, QaStage, TimelineEvent, TimelineEventId,
};
use crate::workflows::lifecycle::repository::{
    ComponentWrite, LifecycleCommit, LifecycleRepository, RepositoryError,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS components (
    id TEXT PRIMARY KEY,
    component_type TEXT NOT NULL,
    serial_number TEXT,
    oem_part_number TEXT,
    model_compatibility TEXT,
    vendor_reference TEXT,
    from_unit_id TEXT,
    date_received TEXT NOT NULL,
    condition_notes TEXT,
    status TEXT NOT NULL,
    total_lifetime INTEGER NOT NULL,
    cycles INTEGER NOT NULL,
    revision INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS timeline_events (
    id TEXT PRIMARY KEY,
    component_id TEXT NOT NULL,
    date TEXT NOT NULL,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_timeline_component ON timeline_events(component_id);
CREATE TABLE IF NOT EXISTS qa_records (
    id TEXT NOT NULL,
    component_id TEXT NOT NULL,
    stage INTEGER NOT NULL,
    status TEXT NOT NULL,
    checklist_json TEXT NOT NULL,
    mechanic_name TEXT,
    date_updated TEXT,
    notes TEXT,
    PRIMARY KEY (component_id, stage)
);
CREATE TABLE IF NOT EXISTS install_records (
    id TEXT PRIMARY KEY,
    component_id TEXT NOT NULL,
    component_type TEXT NOT NULL,
    unit_id TEXT NOT NULL,
    install_date TEXT NOT NULL,
    hm_start INTEGER NOT NULL,
    remove_date TEXT,
    hm_end INTEGER,
    lifetime INTEGER,
    removal_reason TEXT
);
CREATE INDEX IF NOT EXISTS idx_install_component ON install_records(component_id);
CREATE TABLE IF NOT EXISTS fabrication_requests (
    id TEXT PRIMARY KEY,
    component_id TEXT NOT NULL,
    component_type TEXT NOT NULL,
    reason TEXT NOT NULL,
    vendor_name TEXT,
    estimated_cost INTEGER NOT NULL,
    notes TEXT,
    attachment TEXT,
    status TEXT NOT NULL,
    created_date TEXT NOT NULL,
    created_by TEXT NOT NULL,
    approvals_json TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_fabrication_component ON fabrication_requests(component_id);
"#;

const COMPONENT_COLUMNS: &str = "id, component_type, serial_number, oem_part_number, \
    model_compatibility, vendor_reference, from_unit_id, date_received, condition_notes, \
    status, total_lifetime, cycles, revision";

const TIMELINE_COLUMNS: &str = "id, component_id, date, kind, title, description";

const QA_COLUMNS: &str =
    "id, component_id, stage, status, checklist_json, mechanic_name, date_updated, notes";

const INSTALL_COLUMNS: &str = "id, component_id, component_type, unit_id, install_date, \
    hm_start, remove_date, hm_end, lifetime, removal_reason";

const FABRICATION_COLUMNS: &str = "id, component_id, component_type, reason, vendor_name, \
    estimated_cost, notes, attachment, status, created_date, created_by, approvals_json";

/// SQLite-backed persistence. A single connection is shared behind a mutex; both the
/// mutex wait and SQLite's own busy handler are bounded by the configured timeout.
pub struct SqliteLifecycleStore {
    conn: Mutex<Connection>,
    timeout: Duration,
}

impl SqliteLifecycleStore {
    pub fn open(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path)
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        Self::from_connection(conn, timeout)
    }

    pub fn open_in_memory(timeout: Duration) -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        Self::from_connection(conn, timeout)
    }

    pub fn from_connection(conn: Connection, timeout: Duration) -> Result<Self, RepositoryError> {
        let store = Self {
            conn: Mutex::new(conn),
            timeout,
        };
        {
            let conn = store.conn()?;
            conn.busy_timeout(timeout)
                .map_err(|err| store.failure(err))?;
            conn.execute_batch(SCHEMA)
                .map_err(|err| store.failure(err))?;
        }
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, RepositoryError> {
        lock_within(&self.conn, self.timeout)
    }

    fn failure(&self, err: rusqlite::Error) -> RepositoryError {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => RepositoryError::Timeout {
                millis: timeout_millis(self.timeout),
            },
            Some(ErrorCode::ConstraintViolation) => RepositoryError::Conflict,
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }

    fn query_all<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, RepositoryError> {
        let conn = self.conn()?;
        let mut statement = conn.prepare(sql).map_err(|err| self.failure(err))?;
        let rows = statement
            .query_map(params, map)
            .map_err(|err| self.failure(err))?;
        let collected = rows.collect::<rusqlite::Result<Vec<T>>>();
        collected.map_err(|err| self.failure(err))
    }

    fn query_optional<T, P: Params>(
        &self,
        sql: &str,
        params: P,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, RepositoryError> {
        self.conn()?
            .query_row(sql, params, map)
            .optional()
            .map_err(|err| self.failure(err))
    }
}

impl LifecycleRepository for SqliteLifecycleStore {
    fn insert_component(&self, component: Component) -> Result<Component, RepositoryError> {
        self.insert_component_row(&*self.conn()?, &component)?;
        Ok(component)
    }

    fn load(&self, id: &ComponentId) -> Result<Component, RepositoryError> {
        debug!(component_id = %id, "loading component from sqlite");
        self.query_optional(
            &format!("SELECT {COMPONENT_COLUMNS} FROM components WHERE id = ?1"),
            params![id.as_str()],
            component_from_row,
        )?
        .ok_or_else(|| RepositoryError::not_found("component", id))
    }

    fn save(&self, component: Component) -> Result<Component, RepositoryError> {
        self.swap_component_row(&*self.conn()?, component)
    }

    fn commit(&self, commit: LifecycleCommit) -> Result<Component, RepositoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(|err| self.failure(err))?;

        let stored = match commit.write {
            ComponentWrite::Insert => {
                self.insert_component_row(&tx, &commit.component)?;
                commit.component
            }
            ComponentWrite::Swap => self.swap_component_row(&tx, commit.component)?,
        };
        for record in &commit.qa_records {
            self.upsert_qa_row(&tx, record)?;
        }
        if let Some(record) = &commit.install_record {
            self.upsert_install_row(&tx, record)?;
        }
        if let Some(request) = &commit.fabrication_request {
            self.upsert_fabrication_row(&tx, request)?;
        }
        self.insert_timeline_row(&tx, &commit.event)?;

        tx.commit().map_err(|err| self.failure(err))?;
        debug!(component_id = %stored.id, revision = stored.revision, "lifecycle commit stored");
        Ok(stored)
    }

    fn components(&self) -> Result<Vec<Component>, RepositoryError> {
        self.query_all(
            &format!("SELECT {COMPONENT_COLUMNS} FROM components ORDER BY id"),
            (),
            component_from_row,
        )
    }

    fn append_timeline_event(&self, event: TimelineEvent) -> Result<(), RepositoryError> {
        self.insert_timeline_row(&*self.conn()?, &event)
    }

    fn timeline(&self, id: &ComponentId) -> Result<Vec<TimelineEvent>, RepositoryError> {
        self.query_all(
            &format!(
                "SELECT {TIMELINE_COLUMNS} FROM timeline_events WHERE component_id = ?1 \
                 ORDER BY date, id"
            ),
            params![id.as_str()],
            timeline_event_from_row,
        )
    }

    fn load_qa_record(
        &self,
        id: &ComponentId,
        stage: QaStage,
    ) -> Result<Option<QaRecord>, RepositoryError> {
        self.query_optional(
            &format!("SELECT {QA_COLUMNS} FROM qa_records WHERE component_id = ?1 AND stage = ?2"),
            params![id.as_str(), stage.number()],
            qa_record_from_row,
        )
    }

    fn save_qa_record(&self, record: QaRecord) -> Result<(), RepositoryError> {
        self.upsert_qa_row(&*self.conn()?, &record)
    }

    fn qa_records(&self, id: &ComponentId) -> Result<Vec<QaRecord>, RepositoryError> {
        self.query_all(
            &format!("SELECT {QA_COLUMNS} FROM qa_records WHERE component_id = ?1 ORDER BY stage"),
            params![id.as_str()],
            qa_record_from_row,
        )
    }

    fn load_open_install_record(
        &self,
        id: &ComponentId,
    ) -> Result<Option<InstallRecord>, RepositoryError> {
        self.query_optional(
            &format!(
                "SELECT {INSTALL_COLUMNS} FROM install_records \
                 WHERE component_id = ?1 AND remove_date IS NULL LIMIT 1"
            ),
            params![id.as_str()],
            install_record_from_row,
        )
    }

    fn load_install_record(&self, id: &InstallRecordId) -> Result<InstallRecord, RepositoryError> {
        self.query_optional(
            &format!("SELECT {INSTALL_COLUMNS} FROM install_records WHERE id = ?1"),
            params![id.0],
            install_record_from_row,
        )?
        .ok_or_else(|| RepositoryError::not_found("install record", id))
    }

    fn save_install_record(&self, record: InstallRecord) -> Result<(), RepositoryError> {
        self.upsert_install_row(&*self.conn()?, &record)
    }

    fn install_records(&self, id: &ComponentId) -> Result<Vec<InstallRecord>, RepositoryError> {
        self.query_all(
            &format!(
                "SELECT {INSTALL_COLUMNS} FROM install_records WHERE component_id = ?1 \
                 ORDER BY install_date, id"
            ),
            params![id.as_str()],
            install_record_from_row,
        )
    }

    fn load_fabrication_request(
        &self,
        id: &FabricationRequestId,
    ) -> Result<FabricationRequest, RepositoryError> {
        self.query_optional(
            &format!("SELECT {FABRICATION_COLUMNS} FROM fabrication_requests WHERE id = ?1"),
            params![id.0],
            fabrication_request_from_row,
        )?
        .ok_or_else(|| RepositoryError::not_found("fabrication request", id))
    }

    fn load_open_fabrication_request(
        &self,
        id: &ComponentId,
    ) -> Result<Option<FabricationRequest>, RepositoryError> {
        self.query_optional(
            &format!(
                "SELECT {FABRICATION_COLUMNS} FROM fabrication_requests \
                 WHERE component_id = ?1 AND status IN ('pending', 'gl-approved') LIMIT 1"
            ),
            params![id.as_str()],
            fabrication_request_from_row,
        )
    }

    fn save_fabrication_request(
        &self,
        request: FabricationRequest,
    ) -> Result<(), RepositoryError> {
        self.upsert_fabrication_row(&*self.conn()?, &request)
    }

    fn fabrication_requests(
        &self,
        id: &ComponentId,
    ) -> Result<Vec<FabricationRequest>, RepositoryError> {
        self.query_all(
            &format!(
                "SELECT {FABRICATION_COLUMNS} FROM fabrication_requests WHERE component_id = ?1 \
                 ORDER BY created_date, id"
            ),
            params![id.as_str()],
            fabrication_request_from_row,
        )
    }
}

/// Row writers shared by the single-call port methods and [`LifecycleRepository::commit`].
/// They take the connection so a commit can run them inside one transaction.
impl SqliteLifecycleStore {
    fn insert_component_row(
        &self,
        conn: &Connection,
        component: &Component,
    ) -> Result<(), RepositoryError> {
        conn.execute(
            &format!(
                "INSERT INTO components ({COMPONENT_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                component.id.as_str(),
                component.component_type.as_str(),
                component.serial_number,
                component.oem_part_number,
                component.model_compatibility,
                component.vendor_reference,
                component.from_unit_id,
                component.date_received,
                component.condition_notes,
                component.status.as_str(),
                component.total_lifetime,
                component.cycles,
                component.revision,
            ],
        )
        .map_err(|err| self.failure(err))?;
        Ok(())
    }

    fn swap_component_row(
        &self,
        conn: &Connection,
        component: Component,
    ) -> Result<Component, RepositoryError> {
        let rows_affected = conn
            .execute(
                "UPDATE components SET component_type = ?2, serial_number = ?3, \
                 oem_part_number = ?4, model_compatibility = ?5, vendor_reference = ?6, \
                 from_unit_id = ?7, date_received = ?8, condition_notes = ?9, status = ?10, \
                 total_lifetime = ?11, cycles = ?12, revision = revision + 1 \
                 WHERE id = ?1 AND revision = ?13",
                params![
                    component.id.as_str(),
                    component.component_type.as_str(),
                    component.serial_number,
                    component.oem_part_number,
                    component.model_compatibility,
                    component.vendor_reference,
                    component.from_unit_id,
                    component.date_received,
                    component.condition_notes,
                    component.status.as_str(),
                    component.total_lifetime,
                    component.cycles,
                    component.revision,
                ],
            )
            .map_err(|err| self.failure(err))?;

        if rows_affected == 0 {
            let actual: Option<u64> = conn
                .query_row(
                    "SELECT revision FROM components WHERE id = ?1",
                    params![component.id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|err| self.failure(err))?;
            return Err(match actual {
                Some(actual) => RepositoryError::ConcurrentModification {
                    expected: component.revision,
                    actual,
                },
                None => RepositoryError::not_found("component", &component.id),
            });
        }

        let mut next = component;
        next.revision += 1;
        Ok(next)
    }

    fn insert_timeline_row(
        &self,
        conn: &Connection,
        event: &TimelineEvent,
    ) -> Result<(), RepositoryError> {
        conn.execute(
            &format!(
                "INSERT INTO timeline_events ({TIMELINE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            params![
                event.id.0,
                event.component_id.as_str(),
                event.date,
                event.kind.as_str(),
                event.title,
                event.description,
            ],
        )
        .map_err(|err| self.failure(err))?;
        Ok(())
    }

    fn upsert_qa_row(&self, conn: &Connection, record: &QaRecord) -> Result<(), RepositoryError> {
        let checklist = to_json(&record.checklist_items)?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO qa_records ({QA_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ),
            params![
                record.id,
                record.component_id.as_str(),
                record.stage.number(),
                record.status.as_str(),
                checklist,
                record.mechanic_name,
                record.date_updated,
                record.notes,
            ],
        )
        .map_err(|err| self.failure(err))?;
        Ok(())
    }

    fn upsert_install_row(
        &self,
        conn: &Connection,
        record: &InstallRecord,
    ) -> Result<(), RepositoryError> {
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO install_records ({INSTALL_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
            params![
                record.id.0,
                record.component_id.as_str(),
                record.component_type.as_str(),
                record.unit_id,
                record.install_date,
                record.hm_start,
                record.remove_date,
                record.hm_end,
                record.lifetime,
                record.removal_reason,
            ],
        )
        .map_err(|err| self.failure(err))?;
        Ok(())
    }

    fn upsert_fabrication_row(
        &self,
        conn: &Connection,
        request: &FabricationRequest,
    ) -> Result<(), RepositoryError> {
        let approvals = to_json(&request.approvals)?;
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO fabrication_requests ({FABRICATION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                request.id.0,
                request.component_id.as_str(),
                request.component_type.as_str(),
                request.reason,
                request.vendor_name,
                request.estimated_cost,
                request.notes,
                request.attachment,
                request.status.as_str(),
                request.created_date,
                request.created_by,
                approvals,
            ],
        )
        .map_err(|err| self.failure(err))?;
        Ok(())
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|err| RepositoryError::Unavailable(err.to_string()))
}

fn parse_text<T>(row: &Row<'_>, index: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(index)?;
    text.parse()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

fn parse_json<T: DeserializeOwned>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
    let text: String = row.get(index)?;
    serde_json::from_str(&text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

fn parse_stage(row: &Row<'_>, index: usize) -> rusqlite::Result<QaStage> {
    let number: u8 = row.get(index)?;
    QaStage::try_from(number).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(err))
    })
}

fn component_from_row(row: &Row<'_>) -> rusqlite::Result<Component> {
    Ok(Component {
        id: ComponentId(row.get(0)?),
        component_type: parse_text(row, 1)?,
        serial_number: row.get(2)?,
        oem_part_number: row.get(3)?,
        model_compatibility: row.get(4)?,
        vendor_reference: row.get(5)?,
        from_unit_id: row.get(6)?,
        date_received: row.get(7)?,
        condition_notes: row.get(8)?,
        status: parse_text(row, 9)?,
        total_lifetime: row.get(10)?,
        cycles: row.get(11)?,
        revision: row.get(12)?,
    })
}

fn timeline_event_from_row(row: &Row<'_>) -> rusqlite::Result<TimelineEvent> {
    Ok(TimelineEvent {
        id: TimelineEventId(row.get(0)?),
        component_id: ComponentId(row.get(1)?),
        date: row.get(2)?,
        kind: parse_text(row, 3)?,
        title: row.get(4)?,
        description: row.get(5)?,
    })
}

fn qa_record_from_row(row: &Row<'_>) -> rusqlite::Result<QaRecord> {
    Ok(QaRecord {
        id: row.get(0)?,
        component_id: ComponentId(row.get(1)?),
        stage: parse_stage(row, 2)?,
        status: parse_text(row, 3)?,
        checklist_items: parse_json(row, 4)?,
        mechanic_name: row.get(5)?,
        date_updated: row.get(6)?,
        notes: row.get(7)?,
    })
}

fn install_record_from_row(row: &Row<'_>) -> rusqlite::Result<InstallRecord> {
    Ok(InstallRecord {
        id: InstallRecordId(row.get(0)?),
        component_id: ComponentId(row.get(1)?),
        component_type: parse_text(row, 2)?,
        unit_id: row.get(3)?,
        install_date: row.get(4)?,
        hm_start: row.get(5)?,
        remove_date: row.get(6)?,
        hm_end: row.get(7)?,
        lifetime: row.get(8)?,
        removal_reason: row.get(9)?,
    })
}

fn fabrication_request_from_row(row: &Row<'_>) -> rusqlite::Result<FabricationRequest> {
    Ok(FabricationRequest {
        id: FabricationRequestId(row.get(0)?),
        component_id: ComponentId(row.get(1)?),
        component_type: parse_text(row, 2)?,
        reason: row.get(3)?,
        vendor_name: row.get(4)?,
        estimated_cost: row.get(5)?,
        notes: row.get(6)?,
        attachment: row.get(7)?,
        status: parse_text(row, 8)?,
        created_date: row.get(9)?,
        created_by: row.get(10)?,
        approvals: parse_json(row, 11)?,
    })
}
