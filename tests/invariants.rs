//! Structural properties every planned changeset must satisfy, independent
//! of any one scenario.

use reparam::{
    apply_requirement, changeset_for, Access, Changeset, EngineConfig, FunctionCallIdentifier,
    ImportIdentifier, InMemoryProject, PopulateInTests, Project, Requirement, TreeQuery, Why,
};

#[path = "support.rs"]
mod support;
use support::{add_context_parameter, count_kind, pass_arguments};

fn plan(project: &InMemoryProject, root: Requirement) -> Changeset {
    let mut trees = TreeQuery::new();
    changeset_for(&mut trees, project, root, &EngineConfig::default())
        .expect("planning succeeds")
        .changeset
}

#[test]
fn privacy_gates_test_dummies_and_migrations() {
    let project = InMemoryProject::with_files([
        (
            "src/f.ts",
            "export function caller() { return priv(\"x\"); }\nfunction priv(s: string) {}\n",
        ),
        ("test/f.ts", "priv(\"y\");\n"),
    ]);
    for access in [Access::PrivateFunction, Access::PrivateMethod] {
        let target = FunctionCallIdentifier::function("priv", "src/f.ts", access);
        let changeset = plan(&project, add_context_parameter(target));
        let flat = changeset.all_requirements();
        assert_eq!(count_kind(&flat, "PassDummyInTests"), 0);
        assert_eq!(count_kind(&flat, "AddMigration"), 0);
    }
}

#[test]
fn public_targets_produce_exactly_one_migration_with_the_external_import() {
    let project = InMemoryProject::with_files([(
        "src/f.ts",
        "export function caller() { return api(\"x\"); }\nexport function api(s: string) {}\n",
    )]);
    let target = FunctionCallIdentifier::function("api", "src/f.ts", Access::PublicFunction);
    let root = Requirement::AddParameter {
        target,
        parameter_type: ImportIdentifier::Local {
            name: "HandlerContext".to_string(),
            local_path: "src/context".to_string(),
            external_path: Some("@my/pkg".to_string()),
        },
        parameter_name: "context".to_string(),
        populate_in_tests: PopulateInTests::with_dummy("{} as HandlerContext"),
        why: Why::reason("invariant check"),
    };
    let changeset = plan(&project, root);
    let flat = changeset.all_requirements();

    assert_eq!(count_kind(&flat, "AddMigration"), 1);
    let Some(Requirement::AddMigration { downstream, .. }) =
        flat.iter().find(|r| r.kind() == "AddMigration").copied()
    else {
        panic!("migration missing");
    };
    let Requirement::AddParameter { parameter_type, .. } = downstream.as_ref() else {
        panic!("downstream must be the AddParameter to apply");
    };
    assert_eq!(
        *parameter_type,
        ImportIdentifier::library("HandlerContext", "@my/pkg"),
        "a local type published under an external path becomes a library import downstream"
    );
}

#[test]
fn private_propagation_stays_inside_the_declaring_file() {
    let project = InMemoryProject::with_files([
        (
            "src/f.ts",
            "export function caller() { return priv(\"x\"); }\nfunction priv(s: string) {}\n",
        ),
        ("src/other.ts", "export function sneaky() { return priv(\"y\"); }\n"),
    ]);
    let target = FunctionCallIdentifier::function("priv", "src/f.ts", Access::PrivateFunction);
    let changeset = plan(&project, add_context_parameter(target));
    for (_, file, _) in pass_arguments(&changeset.all_requirements()) {
        assert_eq!(file, "src/f.ts");
    }
}

#[test]
fn callers_of_callers_also_gain_the_parameter() {
    let project = InMemoryProject::with_files([
        ("src/f.ts", "export function f(s: string) {}\n"),
        ("src/a.ts", "export function wrapper() { return f(\"x\"); }\n"),
        ("src/b.ts", "export function outer() { return wrapper(); }\n"),
    ]);
    let target = FunctionCallIdentifier::function("f", "src/f.ts", Access::PublicFunction);
    let changeset = plan(&project, add_context_parameter(target));
    let flat = changeset.all_requirements();

    let added: Vec<(String, String)> = flat
        .iter()
        .filter_map(|requirement| match requirement {
            Requirement::AddParameter { target, .. } => {
                Some((target.name.clone(), target.file_path.clone()))
            }
            _ => None,
        })
        .collect();
    assert!(added.contains(&("wrapper".to_string(), "src/a.ts".to_string())));
    assert!(added.contains(&("outer".to_string(), "src/b.ts".to_string())));
}

#[test]
fn applying_the_same_addition_twice_keeps_one_import() {
    let mut project =
        InMemoryProject::with_files([("src/f.ts", "function lonely(s: string) {}\n")]);
    let target = FunctionCallIdentifier::function("lonely", "src/f.ts", Access::PrivateFunction);
    apply_requirement(&mut project, add_context_parameter(target.clone())).unwrap();
    apply_requirement(&mut project, add_context_parameter(target)).unwrap();

    let content = project.read_file("src/f.ts").unwrap();
    assert_eq!(content.matches("import {").count(), 1, "{content}");
    assert_eq!(content.matches("HandlerContext").count(), 3, "one import, two inserted parameters");
}

#[test]
fn cyclic_caller_graphs_terminate_without_duplicate_requirements() {
    let project = InMemoryProject::with_files([(
        "src/cycle.ts",
        "function a() { return b(); }\nfunction b() { return a(); }\n",
    )]);
    let target = FunctionCallIdentifier::function("a", "src/cycle.ts", Access::PrivateFunction);
    let changeset = plan(&project, add_context_parameter(target));
    let flat = changeset.all_requirements();

    for (i, left) in flat.iter().enumerate() {
        for right in &flat[i + 1..] {
            assert_ne!(left, right, "equal requirements must appear at most once");
        }
    }
    let names: Vec<&str> = flat
        .iter()
        .filter_map(|requirement| match requirement {
            Requirement::AddParameter { target, .. } => Some(target.name.as_str()),
            _ => None,
        })
        .collect();
    assert!(names.contains(&"a") && names.contains(&"b"));
}
