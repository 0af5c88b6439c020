//! The outcome of an execution run.

use serde::{Deserialize, Serialize};

use super::migration::MigrationRecord;
use crate::plan::Requirement;

/// A requirement the executor could not implement, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unimplemented {
    pub requirement: Requirement,
    pub message: String,
}

/// What happened: requirements implemented, requirements skipped with their
/// messages, and the migration records accumulated for downstream consumers.
///
/// An empty `implemented` list means there was nothing to do; it is not an
/// error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub implemented: Vec<Requirement>,
    pub unimplemented: Vec<Unimplemented>,
    pub migrations: Vec<MigrationRecord>,
}

impl Report {
    pub fn record_implemented(&mut self, requirement: Requirement) {
        self.implemented.push(requirement);
    }

    pub fn record_unimplemented(&mut self, requirement: Requirement, message: impl Into<String>) {
        self.unimplemented.push(Unimplemented { requirement, message: message.into() });
    }

    /// Concatenate another report onto this one, preserving order.
    pub fn merge(&mut self, other: Report) {
        self.implemented.extend(other.implemented);
        self.unimplemented.extend(other.unimplemented);
        self.migrations.extend(other.migrations);
    }

    pub fn is_clean(&self) -> bool {
        self.unimplemented.is_empty()
    }
}
