//! Virtual project model: an addressable collection of source files.
//!
//! The engine never touches the real filesystem. All reads and writes go
//! through the [`Project`] trait; [`InMemoryProject`] is the default backing
//! used by the tests and by callers that stage a checkout in memory before
//! committing the result.

use std::collections::BTreeMap;

use crate::error::Error;

type Result<T> = std::result::Result<T, Error>;

/// A mutable, in-memory view of a source tree.
///
/// Paths are project-relative and `/`-separated. `file_names` must return a
/// stable order across calls on the same content; the engine relies on that
/// for deterministic query results.
pub trait Project {
    /// Every file path in the project, sorted.
    fn file_names(&self) -> Vec<String>;

    /// Borrow a file's content, or `None` if the path is absent.
    fn find_file(&self, path: &str) -> Option<&str>;

    fn read_file(&self, path: &str) -> Result<String>;

    fn write_file(&mut self, path: &str, content: String) -> Result<()>;

    /// Insert a file, replacing any existing content at `path`.
    fn add_file(&mut self, path: &str, content: &str);
}

/// The default `Project`: a sorted map from path to content.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProject {
    files: BTreeMap<String, String>,
}

impl InMemoryProject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a project from `(path, content)` pairs.
    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let mut project = Self::new();
        for (path, content) in files {
            project.add_file(&path.into(), &content.into());
        }
        project
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

impl Project for InMemoryProject {
    fn file_names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    fn find_file(&self, path: &str) -> Option<&str> {
        self.files.get(&normalize(path)).map(String::as_str)
    }

    fn read_file(&self, path: &str) -> Result<String> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| Error::ProjectIo(format!("no such file: {path}")))
    }

    fn write_file(&mut self, path: &str, content: String) -> Result<()> {
        self.files.insert(normalize(path), content);
        Ok(())
    }

    fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(normalize(path), content.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sorted() {
        let project = InMemoryProject::with_files([
            ("src/z.ts", "export function z() {}"),
            ("src/a.ts", "export function a() {}"),
            ("test/a.ts", "a();"),
        ]);
        assert_eq!(project.file_names(), vec!["src/a.ts", "src/z.ts", "test/a.ts"]);
    }

    #[test]
    fn paths_are_normalized() {
        let mut project = InMemoryProject::new();
        project.add_file("./src\\f.ts", "function f() {}");
        assert!(project.find_file("src/f.ts").is_some());
    }

    #[test]
    fn read_missing_file_is_project_io() {
        let project = InMemoryProject::new();
        let err = project.read_file("src/missing.ts").unwrap_err();
        assert!(!err.is_recoverable());
    }
}
