//! AST query adapter over the external TypeScript parser.
//!
//! Wraps tree-sitter behind the three operations the engine needs: run a
//! path expression over a file glob, navigate from a matched node, and queue
//! textual replacements that are committed to the project on [`TreeQuery::flush`].
//!
//! Trees are parsed on demand and cached per file. A flush applies the queued
//! edits, writes the files back through the [`Project`], drops every cached
//! tree, and invalidates all outstanding [`NodeHandle`]s (they carry a
//! generation stamp; resolving a stale handle is a parser error).

pub mod kinds;
pub mod path_expr;

use std::collections::{HashMap, HashSet};

use globset::GlobBuilder;
use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

use crate::error::Error;
use crate::project::Project;
use self::path_expr::{Axis, PathExpr, Predicate, Step};

type Result<T> = std::result::Result<T, Error>;

/// A located node: file, child-index path from the root, grammar kind and
/// byte range. Handles resolve lazily against the cached tree and go stale
/// on flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    pub file: String,
    pub kind: String,
    pub start_byte: usize,
    pub end_byte: usize,
    steps: Vec<usize>,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextEdit {
    start: usize,
    end: usize,
    replacement: String,
}

struct ParsedFile {
    source: String,
    tree: Tree,
}

/// The query engine. One instance is shared by the planner and executor of a
/// single run; it owns the parse cache and the pending-edit buffer.
pub struct TreeQuery {
    language: Language,
    files: HashMap<String, ParsedFile>,
    pending: HashMap<String, Vec<TextEdit>>,
    generation: u64,
}

impl Default for TreeQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeQuery {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            files: HashMap::new(),
            pending: HashMap::new(),
            generation: 0,
        }
    }

    /// Evaluate `expr` over every project file matching `glob`, in stable
    /// file order, returning matches in document order per file.
    pub fn find(&mut self, project: &dyn Project, glob: &str, expr: &str) -> Result<Vec<NodeHandle>> {
        let expr = PathExpr::parse(expr)?;
        let matcher = GlobBuilder::new(glob)
            .literal_separator(true)
            .build()
            .map_err(|e| Error::Parser(format!("invalid search glob `{glob}`: {e}")))?
            .compile_matcher();

        let mut out = Vec::new();
        for path in project.file_names() {
            if !matcher.is_match(&path) {
                continue;
            }
            self.ensure_parsed(project, &path)?;
            if let Some(file) = self.files.get(&path) {
                out.extend(eval_in_file(file, &path, self.generation, &expr));
            }
        }
        debug!(glob, matches = out.len(), "path query");
        Ok(out)
    }

    /// Evaluate a relative expression starting at `handle`.
    pub fn evaluate(&self, handle: &NodeHandle, expr: &str) -> Result<Vec<NodeHandle>> {
        let expr = PathExpr::parse(expr)?;
        let node = self.resolve(handle)?;
        let file = self.parsed(&handle.file)?;
        let start = Cursor { node, steps: handle.steps.clone() };
        Ok(eval_expr(file, start, &expr)
            .into_iter()
            .map(|cursor| to_handle(&handle.file, self.generation, cursor))
            .collect())
    }

    /// The raw children of a node, document order, anonymous tokens included.
    pub fn children_of(&self, handle: &NodeHandle) -> Result<Vec<NodeHandle>> {
        let node = self.resolve(handle)?;
        let mut out = Vec::new();
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            let mut steps = handle.steps.clone();
            steps.push(i);
            out.push(to_handle(&handle.file, self.generation, Cursor { node: child, steps }));
        }
        Ok(out)
    }

    pub fn parent_of(&self, handle: &NodeHandle) -> Result<Option<NodeHandle>> {
        if handle.steps.is_empty() {
            return Ok(None);
        }
        let steps = handle.steps[..handle.steps.len() - 1].to_vec();
        let parent = NodeHandle {
            file: handle.file.clone(),
            kind: String::new(),
            start_byte: 0,
            end_byte: 0,
            steps,
            generation: handle.generation,
        };
        let node = self.resolve(&parent)?;
        Ok(Some(NodeHandle {
            kind: node.kind().to_string(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            ..parent
        }))
    }

    /// Current textual value of a node: the queued replacement if one covers
    /// exactly this range, the source slice otherwise.
    pub fn value_of(&self, handle: &NodeHandle) -> Result<String> {
        let node = self.resolve(handle)?;
        let (start, end) = (node.start_byte(), node.end_byte());
        if let Some(edits) = self.pending.get(&handle.file) {
            if let Some(edit) = edits.iter().find(|e| e.start == start && e.end == end) {
                return Ok(edit.replacement.clone());
            }
        }
        let file = self.parsed(&handle.file)?;
        Ok(file.source[start..end].to_string())
    }

    /// Queue a replacement of the node's source range. Committed on `flush`.
    pub fn set_value(&mut self, handle: &NodeHandle, text: &str) -> Result<()> {
        let node = self.resolve(handle)?;
        let (start, end) = (node.start_byte(), node.end_byte());
        self.pending
            .entry(handle.file.clone())
            .or_default()
            .push(TextEdit { start, end, replacement: text.to_string() });
        Ok(())
    }

    /// Queue a zero-width insertion at a byte offset of `file`.
    pub fn insert_at(&mut self, file: &str, byte: usize, text: &str) {
        self.pending
            .entry(file.to_string())
            .or_default()
            .push(TextEdit { start: byte, end: byte, replacement: text.to_string() });
    }

    /// Commit queued edits to the project and invalidate every handle and
    /// cached tree. Returns the files written, sorted.
    pub fn flush(&mut self, project: &mut dyn Project) -> Result<Vec<String>> {
        let pending = std::mem::take(&mut self.pending);
        let mut touched = Vec::new();
        for (path, mut edits) in pending {
            if edits.is_empty() {
                continue;
            }
            let mut source = match self.files.remove(&path) {
                Some(file) => file.source,
                None => project.read_file(&path)?,
            };
            edits.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
            for pair in edits.windows(2) {
                if pair[0].end > pair[1].start {
                    return Err(Error::Parser(format!("overlapping edits queued for {path}")));
                }
            }
            for edit in edits.iter().rev() {
                source.replace_range(edit.start..edit.end, &edit.replacement);
            }
            project.write_file(&path, source)?;
            touched.push(path);
        }
        self.files.clear();
        self.generation += 1;
        touched.sort();
        Ok(touched)
    }

    pub fn has_pending_edits(&self) -> bool {
        self.pending.values().any(|edits| !edits.is_empty())
    }

    /// Drop queued edits without committing them. Cached trees and handles
    /// stay valid.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    fn ensure_parsed(&mut self, project: &dyn Project, path: &str) -> Result<()> {
        if self.files.contains_key(path) {
            return Ok(());
        }
        let source = project.read_file(path)?;
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| Error::Parser(format!("language setup failed: {e}")))?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| Error::Parser(format!("failed to parse {path}")))?;
        self.files.insert(path.to_string(), ParsedFile { source, tree });
        Ok(())
    }

    fn parsed(&self, path: &str) -> Result<&ParsedFile> {
        self.files
            .get(path)
            .ok_or_else(|| Error::Parser(format!("no parsed tree for {path}")))
    }

    fn resolve(&self, handle: &NodeHandle) -> Result<Node<'_>> {
        if handle.generation != self.generation {
            return Err(Error::Parser("stale node handle: the project was flushed since this node was found".to_string()));
        }
        let file = self.parsed(&handle.file)?;
        let mut node = file.tree.root_node();
        for &index in &handle.steps {
            node = node
                .child(index)
                .ok_or_else(|| Error::Parser(format!("node path no longer resolves in {}", handle.file)))?;
        }
        Ok(node)
    }
}

#[derive(Clone)]
struct Cursor<'t> {
    node: Node<'t>,
    steps: Vec<usize>,
}

fn to_handle(file: &str, generation: u64, cursor: Cursor<'_>) -> NodeHandle {
    NodeHandle {
        file: file.to_string(),
        kind: cursor.node.kind().to_string(),
        start_byte: cursor.node.start_byte(),
        end_byte: cursor.node.end_byte(),
        steps: cursor.steps,
        generation,
    }
}

fn eval_in_file(file: &ParsedFile, path: &str, generation: u64, expr: &PathExpr) -> Vec<NodeHandle> {
    let start = Cursor { node: file.tree.root_node(), steps: Vec::new() };
    eval_expr(file, start, expr)
        .into_iter()
        .map(|cursor| to_handle(path, generation, cursor))
        .collect()
}

fn eval_expr<'t>(file: &'t ParsedFile, start: Cursor<'t>, expr: &PathExpr) -> Vec<Cursor<'t>> {
    let mut current = vec![start];
    for step in &expr.steps {
        let mut next = Vec::new();
        let mut seen = HashSet::new();
        for cursor in &current {
            let candidates = match step.axis {
                Axis::Child => child_candidates(cursor),
                Axis::Descendant => descendant_candidates(cursor),
            };
            for candidate in candidates {
                if !name_matches(&candidate, step) {
                    continue;
                }
                if !predicates_hold(file, &candidate, &step.predicates) {
                    continue;
                }
                if seen.insert(candidate.node.id()) {
                    next.push(candidate);
                }
            }
        }
        current = next;
    }
    current
}

/// Children for the `/` axis. The `formal_parameters` / `arguments` wrappers
/// are transparent here so the paren tokens of a parameter or argument list
/// read as direct children of the declaration or call, the way the path
/// expressions address them.
fn child_candidates<'t>(cursor: &Cursor<'t>) -> Vec<Cursor<'t>> {
    let mut out = Vec::new();
    for i in 0..cursor.node.child_count() {
        let Some(child) = cursor.node.child(i) else { continue };
        let mut steps = cursor.steps.clone();
        steps.push(i);
        if kinds::is_transparent(child.kind()) {
            for j in 0..child.child_count() {
                let Some(grandchild) = child.child(j) else { continue };
                let mut inner = steps.clone();
                inner.push(j);
                out.push(Cursor { node: grandchild, steps: inner });
            }
        } else {
            out.push(Cursor { node: child, steps });
        }
    }
    out
}

/// Strict descendants in document order for the `//` axis.
fn descendant_candidates<'t>(cursor: &Cursor<'t>) -> Vec<Cursor<'t>> {
    fn walk<'t>(node: Node<'t>, steps: &[usize], out: &mut Vec<Cursor<'t>>) {
        for i in 0..node.child_count() {
            let Some(child) = node.child(i) else { continue };
            let mut child_steps = steps.to_vec();
            child_steps.push(i);
            out.push(Cursor { node: child, steps: child_steps.clone() });
            walk(child, &child_steps, out);
        }
    }
    let mut out = Vec::new();
    walk(cursor.node, &cursor.steps, &mut out);
    out
}

fn name_matches(candidate: &Cursor<'_>, step: &Step) -> bool {
    if !kinds::matches(&step.name, candidate.node.kind()) {
        return false;
    }
    // Under a property access, an identifier only counts in property
    // position, so `PropertyAccessExpression/Identifier[@value='fn']`
    // matches accesses ending in `fn` and never `fn.other`.
    if step.name == "Identifier" {
        if let Some(parent) = candidate.node.parent() {
            if kinds::is_property_access(parent.kind()) {
                return parent.child_by_field_name("property").map(|p| p.id())
                    == Some(candidate.node.id());
            }
        }
    }
    true
}

fn predicates_hold(file: &ParsedFile, candidate: &Cursor<'_>, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|predicate| match predicate {
        Predicate::Exists(expr) => !eval_expr(file, candidate.clone(), expr).is_empty(),
        Predicate::Value(value) => {
            let text = &file.source[candidate.node.start_byte()..candidate.node.end_byte()];
            kinds::normalized_value(candidate.node.kind(), text) == *value
        }
    })
}
