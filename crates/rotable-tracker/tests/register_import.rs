//! Loading a spreadsheet register export into a running lifecycle store.

use std::io::Cursor;
use std::sync::Arc;

use rotable_tracker::workflows::lifecycle::{
    ComponentId, ComponentStatus, InMemoryLifecycleStore, InMemoryNotifications,
    LifecycleRepository, LifecycleService, QaStage, TimelineEventKind,
};
use rotable_tracker::workflows::register_import::RegisterImporter;

const REGISTER: &str = "\
Component ID,Type,Serial Number,Status,From Unit,Date Received,Condition Notes,OEM Part Number,Model Compatibility,Vendor Reference,Total Lifetime,Cycles,Installed Unit,Install HM,Install Date
CMP-2024-101,Final Drive,SN-FD-1,Installed / In Service,EX-11,2024-11-02,,OEM-FD-3,PC2000,,\"24,300\",4,EX-11,\"21,050\",2024-11-20
CMP-2024-102,carrier roller,SN-CR-8,QA-2,DZ-07,03/12/2024,bearing noise,,,,,,,,
CMP-2024-103,Sprocket,,rfu,DZ-02,2024-12-09,,,,,1200,1,,,
,Idler,SN-ID-0,rfu,DZ-02,2024-12-10,,,,,,,,,
CMP-2024-104,Blade Edge,SN-BE-1,rfu,DZ-02,2024-12-10,,,,,,,,,
CMP-2024-105,Idler,SN-ID-5,In Service,DZ-05,2024-12-11,,,,,,,,,
";

#[test]
fn register_rows_become_components_with_their_counters() {
    let import = RegisterImporter::from_reader(Cursor::new(REGISTER)).expect("register parses");

    assert_eq!(import.components.len(), 3);
    assert_eq!(import.skipped.len(), 3);
    assert_eq!(import.skipped[0].component_id, None);
    assert_eq!(import.skipped[1].component_id.as_deref(), Some("CMP-2024-104"));
    assert_eq!(import.skipped[2].component_id.as_deref(), Some("CMP-2024-105"));

    let drive = &import.components[0].component;
    assert_eq!(drive.status, ComponentStatus::Installed);
    assert_eq!(drive.total_lifetime, 24_300);
    assert_eq!(drive.cycles, 4);
    assert_eq!(drive.average_lifetime_per_cycle(), Some(6_075.0));

    let install = import.components[0].install.as_ref().expect("drive is fitted");
    assert_eq!(install.unit_id, "EX-11");
    assert_eq!(install.hm_start, 21_050);

    let roller = &import.components[1].component;
    assert_eq!(roller.status, ComponentStatus::Qa(QaStage::new(2).expect("stage")));
    assert_eq!(roller.condition_notes.as_deref(), Some("bearing noise"));
}

#[test]
fn imported_components_continue_their_lifecycle() {
    let store = Arc::new(InMemoryLifecycleStore::default());
    let service = LifecycleService::new(store.clone(), Arc::new(InMemoryNotifications::default()));
    let import = RegisterImporter::from_reader(Cursor::new(REGISTER)).expect("register parses");

    let outcome = service.import(import.components.clone()).expect("import commits");
    assert_eq!(outcome.inserted.len(), 3);
    assert_eq!(outcome.skipped_existing, 0);

    let again = service.import(import.components).expect("re-import is harmless");
    assert!(again.inserted.is_empty());
    assert_eq!(again.skipped_existing, 3);

    let sprocket = ComponentId("CMP-2024-103".to_string());
    let timeline = store.timeline(&sprocket).expect("timeline");
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].kind, TimelineEventKind::Received);

    let stock = service.rfu_stock(None).expect("stock");
    assert_eq!(stock.len(), 1);
    assert_eq!(stock[0].id, sprocket);

    let record = service
        .install(
            &sprocket,
            rotable_tracker::workflows::lifecycle::InstallOrder {
                unit_id: "DZ-02".to_string(),
                hm_start: 3_000,
                install_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 5).expect("date"),
            },
        )
        .expect("imported RFU stock installs");
    let closed = service
        .remove(
            &record.id,
            rotable_tracker::workflows::lifecycle::RemovalOrder {
                hm_end: 3_800,
                remove_date: chrono::NaiveDate::from_ymd_opt(2025, 4, 5).expect("date"),
                reason: "tooth wear".to_string(),
            },
        )
        .expect("removal");
    assert_eq!(closed.lifetime, Some(800));

    let sprocket = service.get(&sprocket).expect("exists");
    assert_eq!(sprocket.cycles, 2);
    assert_eq!(sprocket.total_lifetime, 2_000);
}

#[test]
fn imported_fitted_parts_can_be_removed() {
    let store = Arc::new(InMemoryLifecycleStore::default());
    let service = LifecycleService::new(store.clone(), Arc::new(InMemoryNotifications::default()));
    let import = RegisterImporter::from_reader(Cursor::new(REGISTER)).expect("register parses");
    service.import(import.components).expect("import commits");

    let drive = ComponentId("CMP-2024-101".to_string());
    let open = store
        .load_open_install_record(&drive)
        .expect("readable")
        .expect("open cycle imported");
    assert_eq!(open.unit_id, "EX-11");

    let closed = service
        .remove(
            &open.id,
            rotable_tracker::workflows::lifecycle::RemovalOrder {
                hm_end: 22_050,
                remove_date: chrono::NaiveDate::from_ymd_opt(2025, 2, 1).expect("date"),
                reason: "seal leak".to_string(),
            },
        )
        .expect("imported installed part comes off");
    assert_eq!(closed.lifetime, Some(1_000));

    let drive = service.get(&drive).expect("exists");
    assert_eq!(drive.status, ComponentStatus::Qa(QaStage::FIRST));
    assert_eq!(drive.cycles, 5);
    assert_eq!(drive.total_lifetime, 25_300);
}
