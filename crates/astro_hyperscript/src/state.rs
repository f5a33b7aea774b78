//! Per-document codegen state and the output artifact.
//!
//! One [`CodegenState`] lives for exactly one document compile: the
//! frontmatter analyzer populates it, the style extractor appends to it, the
//! template walk reads it while emitting, and the driver drains it into an
//! [`Artifact`]. States are never reused across documents.

use rustc_hash::{FxHashMap, FxHashSet};

/// How a component was imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSpecifierKind {
    Default,
    Named,
    Namespace,
}

/// One component binding discovered in the frontmatter.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub specifier_kind: ImportSpecifierKind,
    /// The local name the template refers to.
    pub imported_local_name: String,
    /// The exported name, for named imports where it differs from the local.
    pub imported_exported_name: Option<String>,
    /// The import specifier as written in the frontmatter.
    pub source_url: String,
}

/// Markdown-region marker: a depth counter because `<Markdown>` may nest,
/// plus the scoped class expression from the region's `$scope` attribute.
#[derive(Debug, Clone)]
pub struct MarkdownMarker {
    pub scope: Option<String>,
    pub count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Markers {
    /// `None` iff the walk is outside every Markdown region.
    pub inside_markdown: Option<MarkdownMarker>,
}

/// Mutable state for one document compile.
#[derive(Debug, Default)]
pub struct CodegenState {
    pub filename: String,
    pub file_id: String,
    /// Local name → component info, from frontmatter imports (plus synthesized
    /// custom-element aliases and the injected `Prism` descriptor).
    pub components: FxHashMap<String, ComponentInfo>,
    /// Local name → the verbatim import statements that introduced it, kept
    /// so `client:only` can delete them from the emitted imports.
    pub component_imports: FxHashMap<String, Vec<String>>,
    /// Synthesized module alias → emitted runtime URL, in import order.
    pub custom_element_candidates: Vec<(String, String)>,
    /// Identifiers declared in the frontmatter (functions and variables).
    pub declarations: FxHashSet<String>,
    /// Verbatim import lines, insertion-ordered, deduplicated by equality.
    pub import_statements: Vec<String>,
    /// Verbatim export lines, insertion-ordered, deduplicated by equality.
    pub export_statements: Vec<String>,
    /// Raw CSS blocks in document order.
    pub css: Vec<String>,
    pub markers: Markers,
    /// The emitted frontmatter script, post-transpile.
    pub script: String,
    /// The lifted `getStaticPaths` declaration, verbatim.
    pub get_static_paths: Option<String>,
    pub has_custom_elements: bool,
}

impl CodegenState {
    pub fn new(filename: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            file_id: file_id.into(),
            ..Self::default()
        }
    }

    /// Append an import line unless an identical line is already present.
    pub fn push_import(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !self.import_statements.contains(&line) {
            self.import_statements.push(line);
        }
    }

    /// Append an export line unless an identical line is already present.
    pub fn push_export(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !self.export_statements.contains(&line) {
            self.export_statements.push(line);
        }
    }

    /// Delete every raw import line that introduced `local_name`. Used when a
    /// component turns out to be `client:only` and must not load on the
    /// server.
    pub fn remove_component_imports(&mut self, local_name: &str) {
        if let Some(raw_lines) = self.component_imports.get(local_name) {
            self.import_statements
                .retain(|line| !raw_lines.contains(line));
        }
    }
}

/// The compiled render module, ready for the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// The frontmatter body with imports, prop exports, and `getStaticPaths`
    /// removed, transpiled to plain ECMAScript.
    pub script: String,
    /// Hoisted import lines, deduplicated.
    pub imports: Vec<String>,
    /// Hoisted export lines (`__layout`, `__content`).
    pub exports: Vec<String>,
    /// One balanced hyperscript expression; acceptable as the third argument
    /// of `h(Fragment, null, <html>)`.
    pub html: String,
    /// Extracted CSS blocks joined by a blank line; `None` when the document
    /// has no styles.
    pub css: Option<String>,
    pub get_static_paths: Option<String>,
    pub has_custom_elements: bool,
    /// Synthesized module alias → runtime URL, in import order.
    pub custom_element_candidates: Vec<(String, String)>,
}
