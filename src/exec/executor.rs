//! Walks a changeset DAG in dependency order and applies each requirement
//! as a bounded, local edit against the project.
//!
//! The project is flushed after every individual requirement so the next
//! query sees the updated source; node handles taken before a flush are
//! stale afterwards and everything is re-queried. Recoverable failures are
//! folded into the report; parser and project failures abort.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Error;
use crate::ident::{FunctionCallIdentifier, TEST_GLOB};
use crate::imports::{add_import, ImportIdentifier};
use crate::plan::{Changeset, Requirement};
use crate::project::Project;
use crate::tree::{NodeHandle, TreeQuery};

use super::migration::{MigrationRecord, MigrationSink};
use super::report::Report;

type Result<T> = std::result::Result<T, Error>;

/// Cooperative cancellation. Checked before each requirement; once set, the
/// remainder of the changeset is reported unimplemented.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Observes each completed changeset with the report so far. Callers use
/// this to commit version-control snapshots between changesets.
pub type ChangesetHook<'h> = dyn FnMut(&Changeset, &Report) -> Result<()> + 'h;

pub struct Executor<'a> {
    trees: &'a mut TreeQuery,
    sink: &'a mut dyn MigrationSink,
    cancel: CancelToken,
    hook: Option<Box<ChangesetHook<'a>>>,
}

impl<'a> Executor<'a> {
    pub fn new(trees: &'a mut TreeQuery, sink: &'a mut dyn MigrationSink) -> Self {
        Self { trees, sink, cancel: CancelToken::new(), hook: None }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_hook(mut self, hook: Box<ChangesetHook<'a>>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Implement every prerequisite, then the changeset's own requirements,
    /// accumulating one report.
    pub fn implement(&mut self, project: &mut dyn Project, changeset: &Changeset) -> Result<Report> {
        let mut report = Report::default();
        self.implement_changeset(project, changeset, &mut report)?;
        Ok(report)
    }

    fn implement_changeset(
        &mut self,
        project: &mut dyn Project,
        changeset: &Changeset,
        report: &mut Report,
    ) -> Result<()> {
        for prerequisite in &changeset.prerequisites {
            self.implement_changeset(project, prerequisite, report)?;
        }
        for requirement in &changeset.requirements {
            if self.cancel.is_cancelled() {
                report.record_unimplemented(requirement.clone(), "cancelled before implementation");
                continue;
            }
            match self.implement_requirement(project, requirement) {
                Ok(()) => {
                    debug!(requirement = %requirement.describe(), "implemented");
                    report.record_implemented(requirement.clone());
                }
                Err(error) if error.is_recoverable() => {
                    warn!(requirement = %requirement.describe(), %error, "not implemented");
                    self.trees.discard_pending();
                    report.record_unimplemented(requirement.clone(), error.to_string());
                }
                Err(error) => return Err(error),
            }
            self.trees.flush(project)?;
        }
        if let Some(hook) = self.hook.as_mut() {
            hook(changeset, report)?;
        }
        Ok(())
    }

    fn implement_requirement(&mut self, project: &mut dyn Project, requirement: &Requirement) -> Result<()> {
        match requirement {
            Requirement::AddParameter { target, parameter_type, parameter_name, .. } => {
                self.add_parameter(project, target, parameter_type, parameter_name)
            }
            Requirement::PassArgument { enclosing, target, argument_value, .. } => {
                self.pass_argument(project, enclosing, target, argument_value)
            }
            Requirement::PassDummyInTests { target, dummy_value, additional_import, .. } => {
                self.pass_dummy_in_tests(project, target, dummy_value, additional_import.as_ref())
            }
            Requirement::AddMigration { downstream, why } => self.sink.record(MigrationRecord {
                downstream: (**downstream).clone(),
                why: why.clone(),
            }),
        }
    }

    /// Rewrite the declaration's open paren to carry the new first
    /// parameter, importing its type if absent. An empty parameter list is
    /// left with the trailing comma; the surrounding tokens resolve it on
    /// re-parse.
    fn add_parameter(
        &mut self,
        project: &mut dyn Project,
        target: &FunctionCallIdentifier,
        parameter_type: &ImportIdentifier,
        parameter_name: &str,
    ) -> Result<()> {
        add_import(self.trees, project, &target.file_path, parameter_type)?;
        let declarations =
            self.trees.find(project, &target.source_glob(), &target.declaration_path_expression())?;
        let declaration = match declarations.as_slice() {
            [] => return Err(Error::DeclarationNotFound { target: target.name.clone() }),
            [declaration] => declaration,
            many => {
                return Err(Error::AmbiguousDeclaration {
                    target: target.name.clone(),
                    matches: many.len(),
                })
            }
        };
        let paren = first_paren(self.trees, declaration)?;
        self.trees.set_value(&paren, &format!("({parameter_name}: {}, ", parameter_type.name()))
    }

    /// Prepend the argument at every call of `target` nested inside the
    /// enclosing function's declaration.
    fn pass_argument(
        &mut self,
        project: &mut dyn Project,
        enclosing: &FunctionCallIdentifier,
        target: &FunctionCallIdentifier,
        argument_value: &str,
    ) -> Result<()> {
        let expr =
            format!("{}{}", enclosing.declaration_path_expression(), target.call_path_expression());
        let calls = self.trees.find(project, &enclosing.source_glob(), &expr)?;
        if calls.is_empty() {
            return Err(Error::CallNotFound {
                target: target.name.clone(),
                enclosing: enclosing.name.clone(),
            });
        }
        for call in &calls {
            let paren = first_paren(self.trees, call)?;
            self.trees.set_value(&paren, &format!("({argument_value}, "))?;
        }
        Ok(())
    }

    /// Prepend the dummy at every test call site; zero matches is success.
    /// Imports are added after the paren edits are flushed so they land in
    /// the updated files.
    fn pass_dummy_in_tests(
        &mut self,
        project: &mut dyn Project,
        target: &FunctionCallIdentifier,
        dummy_value: &str,
        additional_import: Option<&ImportIdentifier>,
    ) -> Result<()> {
        let calls = self.trees.find(project, TEST_GLOB, &target.call_path_expression())?;
        if calls.is_empty() {
            debug!(target = target.name.as_str(), "no test call sites");
            return Ok(());
        }
        let mut touched = BTreeSet::new();
        for call in &calls {
            let paren = first_paren(self.trees, call)?;
            self.trees.set_value(&paren, &format!("({dummy_value}, "))?;
            touched.insert(call.file.clone());
        }
        self.trees.flush(project)?;
        if let Some(import) = additional_import {
            for file in &touched {
                add_import(self.trees, project, file, import)?;
            }
        }
        Ok(())
    }
}

/// The parameter or argument list paren of a declaration or call. Document
/// order makes the first match the right one.
fn first_paren(trees: &TreeQuery, node: &NodeHandle) -> Result<NodeHandle> {
    trees
        .evaluate(node, "/OpenParenToken")?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parser(format!("no open paren under `{}` node in {}", node.kind, node.file)))
}
