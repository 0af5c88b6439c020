//! Migration sink: where `AddMigration` requirements land.
//!
//! Migrations have no effect on the project under edit; they are persisted
//! for downstream API consumers to apply against their own repositories. The
//! sink is pluggable; the default accumulates in memory and surfaces its
//! records on the final report.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::plan::{Requirement, Why};

/// One instruction for downstream consumers: the full requirement to apply
/// (with the import identifier already rewritten for their package) plus
/// provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub downstream: Requirement,
    pub why: Why,
}

pub trait MigrationSink {
    fn record(&mut self, record: MigrationRecord) -> Result<(), Error>;
}

/// Default sink: keep everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryMigrationSink {
    records: Vec<MigrationRecord>,
}

impl InMemoryMigrationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[MigrationRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MigrationRecord> {
        self.records
    }
}

impl MigrationSink for InMemoryMigrationSink {
    fn record(&mut self, record: MigrationRecord) -> Result<(), Error> {
        self.records.push(record);
        Ok(())
    }
}
