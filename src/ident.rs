//! Canonical identity for a callable: name, enclosing scope chain, file and
//! access. Identifiers build the path expressions used to locate
//! declarations and call sites, and decide how far a change can reach (the
//! search glob).

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::tree::{kinds, NodeHandle, TreeQuery};

type Result<T> = std::result::Result<T, Error>;

/// Files scanned when inserting test dummies.
pub const TEST_GLOB: &str = "test*/**/*.ts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKind {
    ClassAroundMethod,
    EnclosingNamespace,
}

/// One link of the lexical scope chain wrapping a declaration. `parent`
/// points outward, toward the file level; the chain is owned, and equality
/// is recursive structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
    pub exported: bool,
    pub parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn class(name: impl Into<String>, exported: bool) -> Self {
        Self { kind: ScopeKind::ClassAroundMethod, name: name.into(), exported, parent: None }
    }

    pub fn namespace(name: impl Into<String>, exported: bool) -> Self {
        Self { kind: ScopeKind::EnclosingNamespace, name: name.into(), exported, parent: None }
    }

    pub fn within(mut self, parent: Scope) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }
}

/// Visibility classification. `protected` members collapse into
/// `PrivateMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    PublicFunction,
    PrivateFunction,
    PublicMethod,
    PrivateMethod,
}

impl Access {
    pub fn is_public(self) -> bool {
        matches!(self, Access::PublicFunction | Access::PublicMethod)
    }

    pub fn is_method(self) -> bool {
        matches!(self, Access::PublicMethod | Access::PrivateMethod)
    }
}

/// The canonical handle for a function or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallIdentifier {
    pub name: String,
    pub enclosing_scope: Option<Scope>,
    pub file_path: String,
    pub access: Access,
}

impl FunctionCallIdentifier {
    pub fn function(name: impl Into<String>, file_path: impl Into<String>, access: Access) -> Self {
        Self { name: name.into(), enclosing_scope: None, file_path: file_path.into(), access }
    }

    pub fn method(
        name: impl Into<String>,
        scope: Scope,
        file_path: impl Into<String>,
        access: Access,
    ) -> Self {
        Self {
            name: name.into(),
            enclosing_scope: Some(scope),
            file_path: file_path.into(),
            access,
        }
    }

    /// Same declaration site, access ignored. This is the projection
    /// requirement equality is built on.
    pub fn same_declaration(&self, other: &Self) -> bool {
        self.name == other.name
            && self.file_path == other.file_path
            && self.enclosing_scope == other.enclosing_scope
    }

    fn scopes_outermost_first(&self) -> Vec<&Scope> {
        let mut scopes = Vec::new();
        let mut current = self.enclosing_scope.as_ref();
        while let Some(scope) = current {
            scopes.push(scope);
            current = scope.parent.as_deref();
        }
        scopes.reverse();
        scopes
    }

    fn innermost_scope_is_class(&self) -> bool {
        self.enclosing_scope
            .as_ref()
            .is_some_and(|scope| scope.kind == ScopeKind::ClassAroundMethod)
    }

    /// `Scope.….name`, the qualified form call sites use.
    pub fn dotted_name(&self) -> String {
        let mut parts: Vec<&str> =
            self.scopes_outermost_first().iter().map(|scope| scope.name.as_str()).collect();
        parts.push(&self.name);
        parts.join(".")
    }

    /// Path expression addressing this function's declaration.
    pub fn declaration_path_expression(&self) -> String {
        let mut expr = String::new();
        for scope in self.scopes_outermost_first() {
            match scope.kind {
                ScopeKind::ClassAroundMethod => {
                    expr.push_str(&format!("//ClassDeclaration[/Identifier[@value='{}']]", scope.name));
                }
                ScopeKind::EnclosingNamespace => {
                    expr.push_str(&format!(
                        "//ModuleDeclaration[/Identifier[@value='{}']]/ModuleBlock",
                        scope.name
                    ));
                }
            }
        }
        let terminal =
            if self.innermost_scope_is_class() { "MethodDeclaration" } else { "FunctionDeclaration" };
        format!("{expr}//{terminal}[/Identifier[@value='{}']]", self.name)
    }

    /// Path expression matching calls of this function.
    pub fn call_path_expression(&self) -> String {
        match self.access {
            // `this.fn(…)` and any qualified access ending in `fn`.
            Access::PrivateMethod => format!(
                "//CallExpression[/PropertyAccessExpression/Identifier[@value='{}']]",
                self.name
            ),
            _ if self.enclosing_scope.is_some() => format!(
                "//CallExpression[/PropertyAccessExpression[@value='{}']]",
                self.dotted_name()
            ),
            _ => format!("//CallExpression[/Identifier[@value='{}']]", self.name),
        }
    }

    /// Where the planner looks for call sites.
    pub fn planning_glob(&self) -> String {
        if self.access.is_public() {
            "{src,test}/**/*.ts".to_string()
        } else {
            self.file_path.clone()
        }
    }

    /// Where the executor looks for declarations and source call sites.
    pub fn source_glob(&self) -> String {
        if self.access.is_public() {
            "src/**/*.ts".to_string()
        } else {
            self.file_path.clone()
        }
    }

    /// Infer an identifier from a declaration node by walking its parents.
    pub fn from_declaration_node(trees: &TreeQuery, decl: &NodeHandle) -> Result<Self> {
        if !kinds::is_callable_declaration(&decl.kind) {
            return Err(Error::Parser(format!(
                "cannot build a function identifier from a `{}` node",
                decl.kind
            )));
        }
        let name = declared_name(trees, decl)?;
        let is_method = kinds::is_method_declaration(&decl.kind);

        let mut chain = Vec::new();
        let mut cursor = trees.parent_of(decl)?;
        while let Some(node) = cursor {
            if kinds::is_class_declaration(&node.kind) {
                chain.push(Scope::class(declared_name(trees, &node)?, is_exported(trees, &node)?));
            } else if kinds::is_module_declaration(&node.kind) {
                chain.push(Scope::namespace(declared_name(trees, &node)?, is_exported(trees, &node)?));
            }
            cursor = trees.parent_of(&node)?;
        }
        // `chain` is innermost-first; fold from the outermost end so parent
        // links point outward.
        let mut scope: Option<Scope> = None;
        for mut link in chain.into_iter().rev() {
            link.parent = scope.map(Box::new);
            scope = Some(link);
        }

        let access = if is_method {
            if has_private_modifier(trees, decl)? {
                Access::PrivateMethod
            } else {
                Access::PublicMethod
            }
        } else if is_exported(trees, decl)? {
            Access::PublicFunction
        } else {
            Access::PrivateFunction
        };

        Ok(Self { name, enclosing_scope: scope, file_path: decl.file.clone(), access })
    }
}

/// The declared name of a class, namespace, function or method node.
fn declared_name(trees: &TreeQuery, node: &NodeHandle) -> Result<String> {
    for child in trees.children_of(node)? {
        if kinds::is_identifier(&child.kind) {
            return trees.value_of(&child);
        }
    }
    Err(Error::Parser(format!("declaration has no name identifier in {}", node.file)))
}

fn is_exported(trees: &TreeQuery, node: &NodeHandle) -> Result<bool> {
    Ok(trees
        .parent_of(node)?
        .is_some_and(|parent| kinds::is_export_statement(&parent.kind)))
}

fn has_private_modifier(trees: &TreeQuery, decl: &NodeHandle) -> Result<bool> {
    for child in trees.children_of(decl)? {
        if kinds::is_accessibility_modifier(&child.kind) {
            let text = trees.value_of(&child)?;
            return Ok(text == "private" || text == "protected");
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::InMemoryProject;

    #[test]
    fn declaration_expression_for_plain_function() {
        let ident =
            FunctionCallIdentifier::function("priv", "src/f.ts", Access::PrivateFunction);
        assert_eq!(
            ident.declaration_path_expression(),
            "//FunctionDeclaration[/Identifier[@value='priv']]"
        );
        assert_eq!(
            ident.call_path_expression(),
            "//CallExpression[/Identifier[@value='priv']]"
        );
    }

    #[test]
    fn declaration_expression_for_method_in_namespace() {
        let scope = Scope::class("Classy", true).within(Scope::namespace("Spacey", true));
        let ident =
            FunctionCallIdentifier::method("thinger", scope, "src/g.ts", Access::PublicMethod);
        assert_eq!(
            ident.declaration_path_expression(),
            "//ModuleDeclaration[/Identifier[@value='Spacey']]/ModuleBlock\
             //ClassDeclaration[/Identifier[@value='Classy']]\
             //MethodDeclaration[/Identifier[@value='thinger']]"
        );
        assert_eq!(ident.dotted_name(), "Spacey.Classy.thinger");
        assert_eq!(
            ident.call_path_expression(),
            "//CallExpression[/PropertyAccessExpression[@value='Spacey.Classy.thinger']]"
        );
    }

    #[test]
    fn private_method_calls_match_by_trailing_name() {
        let ident = FunctionCallIdentifier::method(
            "thinger",
            Scope::class("Classy", false),
            "src/g.ts",
            Access::PrivateMethod,
        );
        assert_eq!(
            ident.call_path_expression(),
            "//CallExpression[/PropertyAccessExpression/Identifier[@value='thinger']]"
        );
    }

    #[test]
    fn globs_follow_access() {
        let public =
            FunctionCallIdentifier::function("f", "src/f.ts", Access::PublicFunction);
        assert_eq!(public.planning_glob(), "{src,test}/**/*.ts");
        assert_eq!(public.source_glob(), "src/**/*.ts");

        let private =
            FunctionCallIdentifier::function("priv", "src/f.ts", Access::PrivateFunction);
        assert_eq!(private.planning_glob(), "src/f.ts");
        assert_eq!(private.source_glob(), "src/f.ts");
    }

    #[test]
    fn infers_access_and_scope_from_nodes() {
        let project = InMemoryProject::with_files([(
            "src/c.ts",
            "export class Classy {\n\
             \x20 public otherThinger() { return this.thinger(); }\n\
             \x20 protected clickMe() {}\n\
             \x20 private thinger() {}\n\
             }\n\
             export function top() {}\n\
             function hidden() {}\n",
        )]);
        let mut trees = TreeQuery::new();

        let methods = trees.find(&project, "src/**/*.ts", "//MethodDeclaration").unwrap();
        assert_eq!(methods.len(), 3);
        let other = FunctionCallIdentifier::from_declaration_node(&trees, &methods[0]).unwrap();
        assert_eq!(other.name, "otherThinger");
        assert_eq!(other.access, Access::PublicMethod);
        let scope = other.enclosing_scope.as_ref().unwrap();
        assert_eq!(scope.name, "Classy");
        assert!(scope.exported);

        let click = FunctionCallIdentifier::from_declaration_node(&trees, &methods[1]).unwrap();
        assert_eq!(click.access, Access::PrivateMethod);
        let thinger = FunctionCallIdentifier::from_declaration_node(&trees, &methods[2]).unwrap();
        assert_eq!(thinger.access, Access::PrivateMethod);

        let functions = trees.find(&project, "src/**/*.ts", "//FunctionDeclaration").unwrap();
        let top = FunctionCallIdentifier::from_declaration_node(&trees, &functions[0]).unwrap();
        assert_eq!(top.access, Access::PublicFunction);
        assert!(top.enclosing_scope.is_none());
        let hidden = FunctionCallIdentifier::from_declaration_node(&trees, &functions[1]).unwrap();
        assert_eq!(hidden.access, Access::PrivateFunction);
    }

    #[test]
    fn same_declaration_ignores_access() {
        let public = FunctionCallIdentifier::function("f", "src/f.ts", Access::PublicFunction);
        let private = FunctionCallIdentifier::function("f", "src/f.ts", Access::PrivateFunction);
        assert!(public.same_declaration(&private));
        assert_ne!(public, private);
    }
}
