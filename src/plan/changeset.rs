//! A changeset is a tree of requirement groups: `requirements` are applied
//! together, after every changeset in `prerequisites` has been fully
//! implemented.

use serde::{Deserialize, Serialize};

use super::requirement::Requirement;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// Requirements applied together, in order, once the prerequisites are
    /// done.
    pub requirements: Vec<Requirement>,
    /// Changesets implemented strictly before `requirements`.
    pub prerequisites: Vec<Changeset>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(requirement: Requirement) -> Self {
        Self { requirements: vec![requirement], prerequisites: Vec::new() }
    }

    /// All requirements in implementation order: prerequisites flattened
    /// depth-first, followed by this changeset's own requirements.
    pub fn all_requirements(&self) -> Vec<&Requirement> {
        let mut out = Vec::new();
        for prerequisite in &self.prerequisites {
            out.extend(prerequisite.all_requirements());
        }
        out.extend(self.requirements.iter());
        out
    }

    pub fn requirement_count(&self) -> usize {
        self.requirements.len()
            + self.prerequisites.iter().map(Changeset::requirement_count).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && self.prerequisites.is_empty()
    }
}
