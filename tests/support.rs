// Shared by both test binaries; each uses a subset.
#![allow(dead_code)]

use reparam::{
    FunctionCallIdentifier, ImportIdentifier, PopulateInTests, Requirement, Why,
};

pub fn handler_context() -> ImportIdentifier {
    ImportIdentifier::library("HandlerContext", "@atomist/automation-client")
}

/// Root requirement: add `context: HandlerContext` as the first parameter of
/// `target`, with a cast dummy for test call sites.
pub fn add_context_parameter(target: FunctionCallIdentifier) -> Requirement {
    Requirement::AddParameter {
        target,
        parameter_type: handler_context(),
        parameter_name: "context".to_string(),
        populate_in_tests: PopulateInTests::with_dummy("{} as HandlerContext")
            .and_import(handler_context()),
        why: Why::reason("thread the handler context through"),
    }
}

/// `(enclosing name, enclosing file, argument value)` for every
/// `PassArgument` in a flattened changeset.
pub fn pass_arguments(flat: &[&Requirement]) -> Vec<(String, String, String)> {
    flat.iter()
        .filter_map(|requirement| match requirement {
            Requirement::PassArgument { enclosing, argument_value, .. } => Some((
                enclosing.name.clone(),
                enclosing.file_path.clone(),
                argument_value.clone(),
            )),
            _ => None,
        })
        .collect()
}

/// Names of every `AddParameter` target in a flattened changeset.
pub fn added_parameter_targets(flat: &[&Requirement]) -> Vec<String> {
    flat.iter()
        .filter_map(|requirement| match requirement {
            Requirement::AddParameter { target, .. } => Some(target.name.clone()),
            _ => None,
        })
        .collect()
}

pub fn count_kind(flat: &[&Requirement], kind: &str) -> usize {
    flat.iter().filter(|requirement| requirement.kind() == kind).count()
}
