pub mod lifecycle;
pub mod register_import;
