//! Idempotent import insertion.
//!
//! `add_import` merges into an existing import from the same module where it
//! can, prepends a fresh import statement otherwise, and refuses to guess
//! when the name is already visible in the file.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::project::Project;
use crate::tree::TreeQuery;

type Result<T> = std::result::Result<T, Error>;

/// What to import and where from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportIdentifier {
    /// A symbol from a published package, e.g. `@scope/pkg`.
    Library { name: String, location: String },
    /// A symbol from a file in this project. `external_path` carries the
    /// module specifier downstream consumers resolve the symbol from when
    /// the change crosses the API boundary.
    Local {
        name: String,
        local_path: String,
        external_path: Option<String>,
    },
}

impl ImportIdentifier {
    pub fn library(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Library { name: name.into(), location: location.into() }
    }

    pub fn local(name: impl Into<String>, local_path: impl Into<String>) -> Self {
        Self::Local { name: name.into(), local_path: local_path.into(), external_path: None }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Library { name, .. } | Self::Local { name, .. } => name,
        }
    }

    /// The module specifier used in the import statement. Local paths pass
    /// through unchanged; no relative-path computation is attempted.
    pub fn location(&self) -> &str {
        match self {
            Self::Library { location, .. } => location,
            Self::Local { local_path, .. } => local_path,
        }
    }

    /// The identifier downstream consumers should import: a local symbol
    /// published under `external_path` becomes a library import.
    pub fn for_downstream(&self) -> ImportIdentifier {
        match self {
            Self::Local { name, external_path: Some(external), .. } => {
                Self::Library { name: name.clone(), location: external.clone() }
            }
            other => other.clone(),
        }
    }
}

/// Add `import` to `file_path` unless the name is already imported. Returns
/// whether the file was mutated. Edits are queued on `trees`; the caller
/// flushes.
pub fn add_import(
    trees: &mut TreeQuery,
    project: &dyn Project,
    file_path: &str,
    import: &ImportIdentifier,
) -> Result<bool> {
    let name = import.name();
    let already = trees.find(
        project,
        file_path,
        &format!("//ImportDeclaration//Identifier[@value='{name}']"),
    )?;
    if !already.is_empty() {
        debug!(file = file_path, name, "import already present");
        return Ok(false);
    }

    let location = import.location();
    let same_module = trees.find(
        project,
        file_path,
        &format!("//ImportDeclaration[//StringLiteral[@value='{location}']]"),
    )?;
    if let Some(existing) = same_module.first() {
        let text = trees.value_of(existing)?;
        // Merge into the named-import braces. Default and `*` imports from
        // the same module are left unchanged.
        let Some(brace) = text.find('{') else {
            debug!(file = file_path, location, "existing import has no named bindings; leaving unchanged");
            return Ok(false);
        };
        let merged = format!("{}{{ {name},{}", &text[..brace], &text[brace + 1..]);
        trees.set_value(existing, &merged)?;
        return Ok(true);
    }

    trees.insert_at(file_path, 0, &format!("import {{ {name} }} from \"{location}\";\n"));
    Ok(true)
}
