//! The recursive consequence finder.
//!
//! Given a root `AddParameter`, discover everything it drags along: argument
//! passing in callers, recursive parameter additions in callers that have no
//! suitable value in scope, test dummies, and a migration marker when the
//! change crosses the API boundary. Duplicates are dropped by requirement
//! equality as the traversal runs, which is what makes cyclic caller graphs
//! terminate.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;
use crate::ident::FunctionCallIdentifier;
use crate::project::Project;
use crate::tree::{kinds, NodeHandle, TreeQuery};

use super::changeset::Changeset;
use super::requirement::{Requirement, Why};

type Result<T> = std::result::Result<T, Error>;

fn default_max_planned() -> usize {
    512
}

/// Tunables for a planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard ceiling on the number of planned requirements. A guard against
    /// pathological caller graphs; requirements past the ceiling are
    /// surfaced as unimplemented rather than expanded.
    #[serde(default = "default_max_planned")]
    pub max_planned_requirements: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_planned_requirements: default_max_planned() }
    }
}

/// The outcome of planning: the changeset DAG plus any requirements dropped
/// by the traversal ceiling, which the caller folds into the report.
#[derive(Debug, Clone)]
pub struct Plan {
    pub changeset: Changeset,
    pub over_budget: Vec<Requirement>,
}

/// Turn one root requirement into its full changeset.
pub fn changeset_for(
    trees: &mut TreeQuery,
    project: &dyn Project,
    root: Requirement,
    config: &EngineConfig,
) -> Result<Plan> {
    let mut ctx = PlanContext {
        planned: vec![root.clone()],
        over_budget: Vec::new(),
        max: config.max_planned_requirements,
    };
    let changeset = expand(trees, project, root, true, &mut ctx)?;
    debug!(
        planned = ctx.planned.len(),
        dropped = ctx.over_budget.len(),
        "planning finished"
    );
    Ok(Plan { changeset, over_budget: ctx.over_budget })
}

struct PlanContext {
    planned: Vec<Requirement>,
    over_budget: Vec<Requirement>,
    max: usize,
}

impl PlanContext {
    /// Record a requirement unless an equal one was already planned
    /// anywhere in the traversal. Returns whether it was fresh.
    fn note(&mut self, requirement: &Requirement) -> bool {
        if self.planned.contains(requirement) {
            debug!(requirement = %requirement.describe(), "duplicate requirement dropped");
            return false;
        }
        self.planned.push(requirement.clone());
        true
    }

    fn at_capacity(&self) -> bool {
        self.planned.len() > self.max
    }
}

fn expand(
    trees: &mut TreeQuery,
    project: &dyn Project,
    requirement: Requirement,
    is_root: bool,
    ctx: &mut PlanContext,
) -> Result<Changeset> {
    let mut changeset = Changeset::single(requirement.clone());
    let Requirement::AddParameter {
        target,
        parameter_type,
        parameter_name,
        populate_in_tests,
        ..
    } = &requirement
    else {
        // The other variants are leaves.
        return Ok(changeset);
    };

    // Global consequences, evaluated against the root's access: test call
    // sites get a dummy value, and downstream consumers of a public API get
    // a migration record.
    if is_root && target.access.is_public() {
        let dummy = Requirement::PassDummyInTests {
            target: target.clone(),
            dummy_value: populate_in_tests.dummy_value.clone(),
            additional_import: populate_in_tests.additional_import.clone(),
            why: Why::caused_by(&requirement),
        };
        if ctx.note(&dummy) {
            changeset.requirements.push(dummy);
        }

        let downstream = Requirement::AddParameter {
            target: target.clone(),
            parameter_type: parameter_type.for_downstream(),
            parameter_name: parameter_name.clone(),
            populate_in_tests: populate_in_tests.clone(),
            why: Why::reason("downstream consumers must apply this change to their own source"),
        };
        let migration =
            Requirement::AddMigration { downstream: Box::new(downstream), why: Why::caused_by(&requirement) };
        if ctx.note(&migration) {
            changeset.requirements.push(migration);
        }
    }

    let calls = trees.find(project, &target.planning_glob(), &target.call_path_expression())?;
    debug!(target = target.name.as_str(), calls = calls.len(), "scanning call sites");
    for call in calls {
        // Test call sites are handled wholesale by PassDummyInTests.
        if call.file.starts_with("test/") {
            continue;
        }
        let Some(decl) = enclosing_declaration(trees, &call)? else {
            continue;
        };
        let enclosing = FunctionCallIdentifier::from_declaration_node(trees, &decl)?;

        match parameter_of_type(trees, &decl, parameter_type.name())? {
            Some(existing) => {
                // The caller already has a value of the right type in scope;
                // reuse it.
                let pass = Requirement::PassArgument {
                    enclosing,
                    target: target.clone(),
                    argument_value: existing,
                    why: Why::caused_by(&requirement),
                };
                if ctx.note(&pass) {
                    changeset.requirements.push(pass);
                }
            }
            None => {
                // The caller must itself grow the parameter, then forward it.
                let prerequisite = Requirement::AddParameter {
                    target: enclosing.clone(),
                    parameter_type: parameter_type.clone(),
                    parameter_name: parameter_name.clone(),
                    populate_in_tests: populate_in_tests.clone(),
                    why: Why::caused_by(&requirement),
                };
                if ctx.note(&prerequisite) {
                    if ctx.at_capacity() {
                        warn!(
                            requirement = %prerequisite.describe(),
                            max = ctx.max,
                            "requirement ceiling reached; not expanding"
                        );
                        ctx.over_budget.push(prerequisite);
                        continue;
                    }
                    let expanded = expand(trees, project, prerequisite, false, ctx)?;
                    changeset.prerequisites.push(expanded);
                }
                let pass = Requirement::PassArgument {
                    enclosing,
                    target: target.clone(),
                    argument_value: parameter_name.clone(),
                    why: Why::caused_by(&requirement),
                };
                if ctx.note(&pass) {
                    changeset.requirements.push(pass);
                }
            }
        }
    }

    order_requirements(&mut changeset.requirements);
    Ok(changeset)
}

/// Declarations must exist before call-site edits reference them by name:
/// parameter additions run first, argument passing last. The sort is stable,
/// so the owning requirement stays ahead of its consequences.
fn order_requirements(requirements: &mut [Requirement]) {
    requirements.sort_by_key(|requirement| match requirement {
        Requirement::AddParameter { .. } => 0,
        Requirement::PassDummyInTests { .. } | Requirement::AddMigration { .. } => 1,
        Requirement::PassArgument { .. } => 2,
    });
}

/// The nearest function or method declaration lexically wrapping a node.
fn enclosing_declaration(trees: &TreeQuery, node: &NodeHandle) -> Result<Option<NodeHandle>> {
    let mut current = trees.parent_of(node)?;
    while let Some(candidate) = current {
        if kinds::is_callable_declaration(&candidate.kind) {
            return Ok(Some(candidate));
        }
        current = trees.parent_of(&candidate)?;
    }
    Ok(None)
}

/// Look through a declaration's parameter list for a parameter whose type
/// reference textually equals `type_name`; return that parameter's name.
fn parameter_of_type(
    trees: &TreeQuery,
    decl: &NodeHandle,
    type_name: &str,
) -> Result<Option<String>> {
    for child in trees.children_of(decl)? {
        if !kinds::is_parameter_list(&child.kind) {
            continue;
        }
        for parameter in trees.children_of(&child)? {
            if !kinds::is_parameter(&parameter.kind) {
                continue;
            }
            let mut name = None;
            let mut type_matches = false;
            for part in trees.children_of(&parameter)? {
                if name.is_none() && kinds::is_identifier(&part.kind) {
                    name = Some(trees.value_of(&part)?);
                } else if kinds::is_type_annotation(&part.kind) {
                    let annotation = trees.value_of(&part)?;
                    let reference = annotation.trim_start_matches(':').trim();
                    type_matches = reference == type_name;
                }
            }
            if type_matches {
                return Ok(name);
            }
        }
    }
    Ok(None)
}
