//! High-level user API for applying a parameter-addition refactoring.
//!
//! Two surfaces: a plain [`apply_requirement`] entry point for callers that
//! build their own [`Requirement`], and a serializable [`RefactorRequest`]
//! for scripting the common case without touching the planner and executor
//! directly.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::exec::{CancelToken, ChangesetHook, Executor, InMemoryMigrationSink, Report};
use crate::ident::FunctionCallIdentifier;
use crate::imports::ImportIdentifier;
use crate::plan::{changeset_for, EngineConfig, PopulateInTests, Requirement, Why};
use crate::project::Project;
use crate::tree::TreeQuery;

/// Plan the consequences of `root` and implement the resulting changeset.
pub fn apply_requirement(project: &mut dyn Project, root: Requirement) -> Result<Report> {
    apply_requirement_with(project, root, &EngineConfig::default(), CancelToken::new(), None)
}

/// As [`apply_requirement`], with a config, a cancel token, and an optional
/// per-changeset hook (callers use the hook to commit version-control
/// snapshots between changesets).
pub fn apply_requirement_with<'h>(
    project: &mut dyn Project,
    root: Requirement,
    config: &EngineConfig,
    cancel: CancelToken,
    hook: Option<Box<ChangesetHook<'h>>>,
) -> Result<Report> {
    let mut trees = TreeQuery::new();
    let plan = changeset_for(&mut trees, project, root, config)?;

    let mut report = Report::default();
    for requirement in plan.over_budget {
        let message = Error::PlannerCycle { requirement: requirement.describe() }.to_string();
        report.record_unimplemented(requirement, message);
    }

    let mut sink = InMemoryMigrationSink::new();
    {
        let mut executor = Executor::new(&mut trees, &mut sink).with_cancel(cancel);
        if let Some(hook) = hook {
            executor = executor.with_hook(hook);
        }
        let run = executor.implement(project, &plan.changeset)?;
        report.merge(run);
    }
    report.migrations = sink.into_records();
    Ok(report)
}

fn default_dummy() -> String {
    "null".to_string()
}

/// Serializable request describing one parameter addition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefactorRequest {
    /// The function gaining the parameter.
    pub target: FunctionCallIdentifier,
    /// Name of the new first parameter.
    pub parameter_name: String,
    /// Type of the new parameter, with where to import it from.
    pub parameter_type: ImportIdentifier,
    /// Value passed at call sites under `test*/`.
    #[serde(default = "default_dummy")]
    pub test_dummy: String,
    /// Import added to test files that receive the dummy.
    #[serde(default)]
    pub additional_test_import: Option<ImportIdentifier>,
    /// Free-form provenance recorded on the root requirement.
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub config: EngineConfig,
}

impl RefactorRequest {
    pub fn new(
        target: FunctionCallIdentifier,
        parameter_name: impl Into<String>,
        parameter_type: ImportIdentifier,
    ) -> Self {
        Self {
            target,
            parameter_name: parameter_name.into(),
            parameter_type,
            test_dummy: default_dummy(),
            additional_test_import: None,
            reason: None,
            config: EngineConfig::default(),
        }
    }

    /// Value inserted at test call sites (defaults to `null`).
    pub fn test_dummy(mut self, dummy: impl Into<String>) -> Self {
        self.test_dummy = dummy.into();
        self
    }

    /// Import to add alongside the test dummy.
    pub fn additional_test_import(mut self, import: ImportIdentifier) -> Self {
        self.additional_test_import = Some(import);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The root requirement this request describes.
    pub fn to_requirement(&self) -> Requirement {
        let mut populate = PopulateInTests::with_dummy(self.test_dummy.clone());
        if let Some(import) = &self.additional_test_import {
            populate = populate.and_import(import.clone());
        }
        Requirement::AddParameter {
            target: self.target.clone(),
            parameter_type: self.parameter_type.clone(),
            parameter_name: self.parameter_name.clone(),
            populate_in_tests: populate,
            why: Why::reason(
                self.reason.clone().unwrap_or_else(|| "requested parameter addition".to_string()),
            ),
        }
    }

    /// Execute the request against a project root.
    pub fn execute(&self, project: &mut dyn Project) -> Result<Report> {
        apply_requirement_with(
            project,
            self.to_requirement(),
            &self.config,
            CancelToken::new(),
            None,
        )
    }
}

/// Convenience helper: execute a request encoded as JSON and return the
/// report as JSON.
pub fn execute_refactor_json(project: &mut dyn Project, payload: &str) -> Result<String> {
    let request: RefactorRequest = serde_json::from_str(payload)?;
    let report = request.execute(project)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::Access;
    use crate::project::InMemoryProject;

    #[test]
    fn request_round_trips_through_json() {
        let request = RefactorRequest::new(
            FunctionCallIdentifier::function("priv", "src/f.ts", Access::PrivateFunction),
            "context",
            ImportIdentifier::library("HandlerContext", "@scope/pkg"),
        )
        .test_dummy("{} as HandlerContext")
        .reason("thread context through");
        let json = serde_json::to_string(&request).unwrap();
        let parsed: RefactorRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.parameter_name, "context");
        assert_eq!(parsed.test_dummy, "{} as HandlerContext");
        assert_eq!(parsed.target.name, "priv");
    }

    #[test]
    fn execute_rewrites_a_single_file_project() {
        let mut project = InMemoryProject::with_files([(
            "src/f.ts",
            "function priv(s: string) { return s; }\n",
        )]);
        let request = RefactorRequest::new(
            FunctionCallIdentifier::function("priv", "src/f.ts", Access::PrivateFunction),
            "context",
            ImportIdentifier::library("HandlerContext", "@scope/pkg"),
        );
        let report = request.execute(&mut project).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.implemented.len(), 1);
        assert!(report.migrations.is_empty());
        let content = project.read_file("src/f.ts").unwrap();
        assert!(content.contains("function priv(context: HandlerContext, s: string)"));
        assert!(content.starts_with("import { HandlerContext } from \"@scope/pkg\";"));
    }

    #[test]
    fn hook_runs_between_changesets() {
        let mut project = InMemoryProject::with_files([(
            "src/f.ts",
            "export function caller() { return priv(\"x\"); }\nfunction priv(s: string) {}\n",
        )]);
        let target = FunctionCallIdentifier::function("priv", "src/f.ts", Access::PrivateFunction);
        let request = RefactorRequest::new(
            target,
            "context",
            ImportIdentifier::library("HandlerContext", "@scope/pkg"),
        );
        let mut completed = Vec::new();
        apply_requirement_with(
            &mut project,
            request.to_requirement(),
            &EngineConfig::default(),
            CancelToken::new(),
            Some(Box::new(|changeset, report| {
                completed.push((changeset.requirements.len(), report.implemented.len()));
                Ok(())
            })),
        )
        .unwrap();
        // One prerequisite changeset (the caller's AddParameter) and the root.
        assert_eq!(completed.len(), 2);
        assert!(completed[0].1 <= completed[1].1);
    }
}
