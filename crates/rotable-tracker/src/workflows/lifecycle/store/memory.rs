use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use super::{lock_within, DEFAULT_STORE_TIMEOUT};
use crate::workflows::lifecycle::domain::{
    Component, ComponentId, FabricationRequest, FabricationRequestId, InstallRecord,
    InstallRecordId, QaRecord, QaStage, TimelineEvent,
};
use crate::workflows::lifecycle::repository::{
    ComponentWrite, LifecycleCommit, LifecycleRepository, RepositoryError,
};

#[derive(Default)]
struct Tables {
    components: BTreeMap<ComponentId, Component>,
    timeline: Vec<TimelineEvent>,
    qa_records: BTreeMap<(ComponentId, QaStage), QaRecord>,
    install_records: BTreeMap<InstallRecordId, InstallRecord>,
    fabrication_requests: BTreeMap<FabricationRequestId, FabricationRequest>,
}

impl Tables {
    /// The next stored copy of `component`, when its revision still matches.
    fn swapped(&self, component: Component) -> Result<Component, RepositoryError> {
        let stored = self
            .components
            .get(&component.id)
            .ok_or_else(|| RepositoryError::not_found("component", &component.id))?;
        if stored.revision != component.revision {
            return Err(RepositoryError::ConcurrentModification {
                expected: component.revision,
                actual: stored.revision,
            });
        }
        let mut next = component;
        next.revision += 1;
        Ok(next)
    }
}

/// Mutex-guarded maps, used for tests, demos and single-process deployments.
pub struct InMemoryLifecycleStore {
    tables: Mutex<Tables>,
    timeout: Duration,
}

impl Default for InMemoryLifecycleStore {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_STORE_TIMEOUT)
    }
}

impl InMemoryLifecycleStore {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            timeout,
        }
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, RepositoryError> {
        lock_within(&self.tables, self.timeout)
    }
}

impl LifecycleRepository for InMemoryLifecycleStore {
    fn insert_component(&self, component: Component) -> Result<Component, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.components.contains_key(&component.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .components
            .insert(component.id.clone(), component.clone());
        Ok(component)
    }

    fn load(&self, id: &ComponentId) -> Result<Component, RepositoryError> {
        self.tables()?
            .components
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("component", id))
    }

    fn save(&self, component: Component) -> Result<Component, RepositoryError> {
        let mut tables = self.tables()?;
        let next = tables.swapped(component)?;
        tables.components.insert(next.id.clone(), next.clone());
        Ok(next)
    }

    fn commit(&self, commit: LifecycleCommit) -> Result<Component, RepositoryError> {
        let mut tables = self.tables()?;
        let LifecycleCommit {
            write,
            component,
            qa_records,
            install_record,
            fabrication_request,
            event,
        } = commit;

        let stored = match write {
            ComponentWrite::Insert if tables.components.contains_key(&component.id) => {
                return Err(RepositoryError::Conflict)
            }
            ComponentWrite::Insert => component,
            ComponentWrite::Swap => tables.swapped(component)?,
        };
        if tables.timeline.iter().any(|existing| existing.id == event.id) {
            return Err(RepositoryError::Conflict);
        }

        tables
            .components
            .insert(stored.id.clone(), stored.clone());
        for record in qa_records {
            tables
                .qa_records
                .insert((record.component_id.clone(), record.stage), record);
        }
        if let Some(record) = install_record {
            tables.install_records.insert(record.id.clone(), record);
        }
        if let Some(request) = fabrication_request {
            tables
                .fabrication_requests
                .insert(request.id.clone(), request);
        }
        tables.timeline.push(event);
        Ok(stored)
    }

    fn components(&self) -> Result<Vec<Component>, RepositoryError> {
        Ok(self.tables()?.components.values().cloned().collect())
    }

    fn append_timeline_event(&self, event: TimelineEvent) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if tables.timeline.iter().any(|existing| existing.id == event.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.timeline.push(event);
        Ok(())
    }

    fn timeline(&self, id: &ComponentId) -> Result<Vec<TimelineEvent>, RepositoryError> {
        Ok(self
            .tables()?
            .timeline
            .iter()
            .filter(|event| &event.component_id == id)
            .cloned()
            .collect())
    }

    fn load_qa_record(
        &self,
        id: &ComponentId,
        stage: QaStage,
    ) -> Result<Option<QaRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .qa_records
            .get(&(id.clone(), stage))
            .cloned())
    }

    fn save_qa_record(&self, record: QaRecord) -> Result<(), RepositoryError> {
        self.tables()?
            .qa_records
            .insert((record.component_id.clone(), record.stage), record);
        Ok(())
    }

    fn qa_records(&self, id: &ComponentId) -> Result<Vec<QaRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .qa_records
            .values()
            .filter(|record| &record.component_id == id)
            .cloned()
            .collect())
    }

    fn load_open_install_record(
        &self,
        id: &ComponentId,
    ) -> Result<Option<InstallRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .install_records
            .values()
            .find(|record| &record.component_id == id && record.is_open())
            .cloned())
    }

    fn load_install_record(&self, id: &InstallRecordId) -> Result<InstallRecord, RepositoryError> {
        self.tables()?
            .install_records
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("install record", id))
    }

    fn save_install_record(&self, record: InstallRecord) -> Result<(), RepositoryError> {
        self.tables()?
            .install_records
            .insert(record.id.clone(), record);
        Ok(())
    }

    fn install_records(&self, id: &ComponentId) -> Result<Vec<InstallRecord>, RepositoryError> {
        Ok(self
            .tables()?
            .install_records
            .values()
            .filter(|record| &record.component_id == id)
            .cloned()
            .collect())
    }

    fn load_fabrication_request(
        &self,
        id: &FabricationRequestId,
    ) -> Result<FabricationRequest, RepositoryError> {
        self.tables()?
            .fabrication_requests
            .get(id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("fabrication request", id))
    }

    fn load_open_fabrication_request(
        &self,
        id: &ComponentId,
    ) -> Result<Option<FabricationRequest>, RepositoryError> {
        Ok(self
            .tables()?
            .fabrication_requests
            .values()
            .find(|request| &request.component_id == id && request.is_open())
            .cloned())
    }

    fn save_fabrication_request(
        &self,
        request: FabricationRequest,
    ) -> Result<(), RepositoryError> {
        self.tables()?
            .fabrication_requests
            .insert(request.id.clone(), request);
        Ok(())
    }

    fn fabrication_requests(
        &self,
        id: &ComponentId,
    ) -> Result<Vec<FabricationRequest>, RepositoryError> {
        Ok(self
            .tables()?
            .fabrication_requests
            .values()
            .filter(|request| &request.component_id == id)
            .cloned()
            .collect())
    }
}
