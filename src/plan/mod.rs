//! Requirement model and the planner that turns one root requirement into a
//! changeset DAG.

pub mod changeset;
pub mod planner;
pub mod requirement;

pub use changeset::Changeset;
pub use planner::{changeset_for, EngineConfig, Plan};
pub use requirement::{PopulateInTests, Requirement, Why};
