//! Semantics-preserving parameter-addition refactoring for TypeScript
//! projects.
//!
//! Given one root requirement ("add parameter P of type T to function F"),
//! the planner discovers the full transitive set of consequent edits
//! (argument passing in callers, recursive parameter additions in callers
//! without a suitable value, test dummies, imports, migration markers),
//! de-duplicates them, and orders them so prerequisites run first. The
//! executor then applies each as a bounded, local AST edit against a
//! virtual project and returns a report of what was and was not
//! implemented.
//!
//! ```no_run
//! use reparam::{
//!     apply_requirement, Access, FunctionCallIdentifier, ImportIdentifier, InMemoryProject,
//!     PopulateInTests, Requirement, Why,
//! };
//!
//! let mut project = InMemoryProject::with_files([(
//!     "src/f.ts",
//!     "export function handler() { return helper(\"x\"); }\nfunction helper(s: string) {}\n",
//! )]);
//! let root = Requirement::AddParameter {
//!     target: FunctionCallIdentifier::function("helper", "src/f.ts", Access::PrivateFunction),
//!     parameter_type: ImportIdentifier::library("HandlerContext", "@scope/pkg"),
//!     parameter_name: "context".to_string(),
//!     populate_in_tests: PopulateInTests::with_dummy("{} as HandlerContext"),
//!     why: Why::reason("thread the context through"),
//! };
//! let report = apply_requirement(&mut project, root)?;
//! assert!(report.is_clean());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod error;
pub mod exec;
pub mod ident;
pub mod imports;
pub mod plan;
pub mod project;
pub mod tree;

pub use api::{apply_requirement, apply_requirement_with, execute_refactor_json, RefactorRequest};
pub use error::Error;
pub use exec::{
    CancelToken, ChangesetHook, Executor, InMemoryMigrationSink, MigrationRecord, MigrationSink,
    Report, Unimplemented,
};
pub use ident::{Access, FunctionCallIdentifier, Scope, ScopeKind, TEST_GLOB};
pub use imports::{add_import, ImportIdentifier};
pub use plan::{changeset_for, Changeset, EngineConfig, Plan, PopulateInTests, Requirement, Why};
pub use project::{InMemoryProject, Project};
pub use tree::{NodeHandle, TreeQuery};
