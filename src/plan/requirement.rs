//! The requirement model: one declarative refactoring intent per value.
//!
//! Equality is deliberately narrow: discriminant plus target declaration,
//! plus the enclosing declaration for `PassArgument`. The planner uses it to
//! drop duplicates during traversal. Provenance never participates.

use serde::{Deserialize, Serialize};

use crate::ident::FunctionCallIdentifier;
use crate::imports::ImportIdentifier;

/// Why a requirement exists: the requirement that generated it, or a
/// free-form reason supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Why {
    Reason(String),
    CausedBy(Box<Requirement>),
}

impl Why {
    pub fn reason(text: impl Into<String>) -> Self {
        Self::Reason(text.into())
    }

    pub fn caused_by(requirement: &Requirement) -> Self {
        Self::CausedBy(Box::new(requirement.clone()))
    }
}

/// How a new parameter is populated at call sites under `test*/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateInTests {
    pub dummy_value: String,
    pub additional_import: Option<ImportIdentifier>,
}

impl PopulateInTests {
    pub fn with_dummy(dummy_value: impl Into<String>) -> Self {
        Self { dummy_value: dummy_value.into(), additional_import: None }
    }

    pub fn and_import(mut self, import: ImportIdentifier) -> Self {
        self.additional_import = Some(import);
        self
    }
}

/// A single declarative refactoring intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Requirement {
    /// Insert a new first parameter into the target's declaration, adding
    /// the type's import if absent.
    AddParameter {
        target: FunctionCallIdentifier,
        parameter_type: ImportIdentifier,
        parameter_name: String,
        populate_in_tests: PopulateInTests,
        why: Why,
    },
    /// Prepend `argument_value` at every call of `target` inside
    /// `enclosing`.
    PassArgument {
        enclosing: FunctionCallIdentifier,
        target: FunctionCallIdentifier,
        argument_value: String,
        why: Why,
    },
    /// Prepend `dummy_value` at every call of `target` under `test*/`,
    /// importing `additional_import` into each file changed.
    PassDummyInTests {
        target: FunctionCallIdentifier,
        dummy_value: String,
        additional_import: Option<ImportIdentifier>,
        why: Why,
    },
    /// Record that downstream API consumers must apply `downstream` against
    /// their own source. No direct effect on this project.
    AddMigration { downstream: Box<Requirement>, why: Why },
}

impl Requirement {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddParameter { .. } => "AddParameter",
            Self::PassArgument { .. } => "PassArgument",
            Self::PassDummyInTests { .. } => "PassDummyInTests",
            Self::AddMigration { .. } => "AddMigration",
        }
    }

    /// The declaration this requirement is about. For a migration, the
    /// downstream requirement's target.
    pub fn target(&self) -> &FunctionCallIdentifier {
        match self {
            Self::AddParameter { target, .. }
            | Self::PassArgument { target, .. }
            | Self::PassDummyInTests { target, .. } => target,
            Self::AddMigration { downstream, .. } => downstream.target(),
        }
    }

    /// Short human-readable form for logs and reports.
    pub fn describe(&self) -> String {
        let target = self.target();
        match self {
            Self::PassArgument { enclosing, .. } => format!(
                "{}({} in {} -> {})",
                self.kind(),
                enclosing.name,
                enclosing.file_path,
                target.name
            ),
            _ => format!("{}({} in {})", self.kind(), target.name, target.file_path),
        }
    }
}

impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::AddParameter { target: a, .. }, Self::AddParameter { target: b, .. })
            | (Self::PassDummyInTests { target: a, .. }, Self::PassDummyInTests { target: b, .. }) => {
                a.same_declaration(b)
            }
            (
                Self::PassArgument { enclosing: ea, target: ta, .. },
                Self::PassArgument { enclosing: eb, target: tb, .. },
            ) => ta.same_declaration(tb) && ea.same_declaration(eb),
            (Self::AddMigration { downstream: a, .. }, Self::AddMigration { downstream: b, .. }) => {
                a.target().same_declaration(b.target())
            }
            _ => false,
        }
    }
}

impl Eq for Requirement {}
