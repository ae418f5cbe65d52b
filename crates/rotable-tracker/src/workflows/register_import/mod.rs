//! Component register import from spreadsheet CSV exports.

mod mapping;
mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::workflows::lifecycle::domain::ImportedComponent;

pub use parser::SkippedRow;
use parser::ParsedRow;

#[derive(Debug, thiserror::Error)]
pub enum RegisterImportError {
    #[error("failed to read component register: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid component register CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Components recovered from a register export plus the rows that were left out.
#[derive(Debug, Clone, Default)]
pub struct RegisterImport {
    pub components: Vec<ImportedComponent>,
    pub skipped: Vec<SkippedRow>,
}

pub struct RegisterImporter;

impl RegisterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RegisterImport, RegisterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RegisterImport, RegisterImportError> {
        let mut import = RegisterImport::default();
        let mut seen = std::collections::HashSet::new();

        for row in parser::parse_rows(reader)? {
            match row {
                ParsedRow::Component(imported) => {
                    let id = imported.component.id.clone();
                    if !seen.insert(id.clone()) {
                        debug!(component_id = %id, "duplicate register row ignored");
                        continue;
                    }
                    import.components.push(imported);
                }
                ParsedRow::Skipped(skipped) => {
                    warn!(line = skipped.line, reason = %skipped.reason, "register row skipped");
                    import.skipped.push(skipped);
                }
            }
        }

        Ok(import)
    }
}
