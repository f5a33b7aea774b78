//! Frontmatter analysis.
//!
//! Parses the script block (TypeScript + JSX + top-level await), then
//! classifies every top-level statement:
//!
//! - import declarations register component bindings and are hoisted verbatim
//!   into the artifact's import list;
//! - `export const __layout/__content` are hoisted verbatim into the export
//!   list;
//! - other exported variable declarations are deprecated prop declarations —
//!   warned about and removed;
//! - an exported `getStaticPaths` function is lifted verbatim;
//! - function and variable declarations are recorded so the template walk can
//!   resolve frontmatter-defined components;
//! - everything else stays in place.
//!
//! Before classification, `Astro.fetchContent(<literal>)` calls are rewritten
//! to wrap the argument in `import.meta.globEager(<literal>)`. Removals and
//! rewrites are span-based text splices; no removed statement's source range
//! survives into the emitted script.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, BindingPattern, BindingPatternKind, CallExpression, Declaration, Expression,
    ImportDeclarationSpecifier,
    ImportOrExportKind, Statement,
};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

use crate::ast::Document;
use crate::diagnostic::{
    byte_offset_to_line_column, read_source, CodegenError, ErrorKind, Position,
};
use crate::logging::LogEvent;
use crate::options::CompileOptions;
use crate::printer::components::component_url;
use crate::state::{CodegenState, ComponentInfo, ImportSpecifierKind};
use crate::transpile::transpile_fragment;

/// Node built-in module roots that must be imported with the `node:` scheme.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "worker_threads",
    "zlib",
];

fn bare_builtin(specifier: &str) -> Option<&str> {
    if specifier.starts_with("node:") {
        return None;
    }
    let root = specifier.split('/').next().unwrap_or(specifier);
    NODE_BUILTINS.contains(&root).then_some(root)
}

/// A span-based text splice.
#[derive(Debug, Clone)]
struct Edit {
    span: Span,
    replacement: String,
}

/// Apply edits to `source`, rightmost first so earlier offsets stay valid.
fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.span.start.cmp(&a.span.start));
    let mut out = source.to_string();
    for edit in edits {
        out.replace_range(edit.span.start as usize..edit.span.end as usize, &edit.replacement);
    }
    out
}

/// Slice `span` out of `source` with any edits inside it applied.
fn slice_with_edits(source: &str, span: Span, edits: &[Edit]) -> String {
    let local: Vec<Edit> = edits
        .iter()
        .filter(|e| e.span.start >= span.start && e.span.end <= span.end)
        .map(|e| Edit {
            span: Span::new(e.span.start - span.start, e.span.end - span.start),
            replacement: e.replacement.clone(),
        })
        .collect();
    apply_edits(&source[span.start as usize..span.end as usize], local)
}

/// Collect every identifier bound by a pattern (plain, object, array).
fn collect_binding_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => {
            names.push(id.name.to_string());
        }
        BindingPatternKind::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_binding_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(arr) => {
            for element in &arr.elements {
                if let Some(pattern) = element {
                    collect_binding_names(pattern, names);
                }
            }
            if let Some(rest) = &arr.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        _ => {}
    }
}

/// Finds `Astro.fetchContent(...)` calls and records the argument rewrite.
struct FetchContentRewriter<'s> {
    source: &'s str,
    edits: Vec<Edit>,
    /// Span of the first call whose argument is not a string literal.
    invalid: Option<Span>,
}

impl<'s> FetchContentRewriter<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
            invalid: None,
        }
    }
}

impl<'a> Visit<'a> for FetchContentRewriter<'_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::StaticMemberExpression(member) = &call.callee
            && let Expression::Identifier(object) = &member.object
            && object.name == "Astro"
            && member.property.name == "fetchContent"
        {
            match call.arguments.first().and_then(Argument::as_expression) {
                Some(Expression::StringLiteral(literal)) => {
                    let raw =
                        &self.source[literal.span.start as usize..literal.span.end as usize];
                    self.edits.push(Edit {
                        span: literal.span,
                        replacement: format!("import.meta.globEager({raw})"),
                    });
                }
                _ => {
                    if self.invalid.is_none() {
                        self.invalid = Some(call.span);
                    }
                }
            }
        }
        walk::walk_call_expression(self, call);
    }
}

/// Run the frontmatter pass, populating `state`.
pub(crate) fn analyze(
    document: &Document,
    options: &CompileOptions,
    state: &mut CodegenState,
) -> Result<(), CodegenError> {
    let Some(module) = &document.module else {
        return Ok(());
    };
    let script = module.content.as_str();
    if script.trim().is_empty() {
        return Ok(());
    }

    // Where the script block starts in the original file, for diagnostics.
    let fragment_start = read_source(&options.filename)
        .map(|text| byte_offset_to_line_column(&text, module.span.start as usize))
        .unwrap_or_else(|| Position::new(1, 0));
    let position_of = |offset: u32| {
        byte_offset_to_line_column(script, offset as usize).offset_by(fragment_start)
    };

    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_module(true)
        .with_typescript(true)
        .with_jsx(true);
    let ret = Parser::new(&allocator, script, source_type).parse();
    if let Some(diagnostic) = ret.errors.first() {
        return Err(CodegenError::from_oxc(
            ErrorKind::Parse,
            &options.filename,
            script,
            fragment_start,
            diagnostic,
        ));
    }

    let mut rewriter = FetchContentRewriter::new(script);
    rewriter.visit_program(&ret.program);
    if let Some(span) = rewriter.invalid {
        return Err(CodegenError::new(
            ErrorKind::FetchContentArgument,
            &options.filename,
            position_of(span.start),
            "Astro.fetchContent() only accepts a string literal argument",
        ));
    }
    let rewrites = rewriter.edits;

    let mut removed: Vec<Span> = Vec::new();
    let mut prop_exports: Vec<String> = Vec::new();
    let mut module_counter = 1usize;

    for stmt in &ret.program.body {
        match stmt {
            Statement::ImportDeclaration(import) => {
                let source = import.source.value.as_str();
                if let Some(root) = bare_builtin(source) {
                    return Err(CodegenError::new(
                        ErrorKind::BareBuiltinImport,
                        &options.filename,
                        position_of(import.span.start),
                        format!(
                            "Builtin module \"{root}\" must be imported with the node: scheme (\"node:{root}\")"
                        ),
                    ));
                }

                let raw = &script[import.span.start as usize..import.span.end as usize];
                let mut local_names: Vec<String> = Vec::new();

                if import.import_kind != ImportOrExportKind::Type {
                    match &import.specifiers {
                        Some(specifiers) if !specifiers.is_empty() => {
                            for specifier in specifiers {
                                let info = match specifier {
                                    ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                                        ComponentInfo {
                                            specifier_kind: ImportSpecifierKind::Default,
                                            imported_local_name: spec.local.name.to_string(),
                                            imported_exported_name: None,
                                            source_url: source.to_string(),
                                        }
                                    }
                                    ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                                        ComponentInfo {
                                            specifier_kind: ImportSpecifierKind::Named,
                                            imported_local_name: spec.local.name.to_string(),
                                            imported_exported_name: Some(
                                                spec.imported.name().to_string(),
                                            ),
                                            source_url: source.to_string(),
                                        }
                                    }
                                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
                                        ComponentInfo {
                                            specifier_kind: ImportSpecifierKind::Namespace,
                                            imported_local_name: spec.local.name.to_string(),
                                            imported_exported_name: None,
                                            source_url: source.to_string(),
                                        }
                                    }
                                };
                                local_names.push(info.imported_local_name.clone());
                                state
                                    .components
                                    .insert(info.imported_local_name.clone(), info);
                            }
                        }
                        _ => {
                            // A specifier-less import. When the parser flagged
                            // custom elements, this is a custom-element module:
                            // synthesize a namespace alias for the registry.
                            if document.meta.has_custom_elements() {
                                let alias = format!("$$module{module_counter}");
                                module_counter += 1;
                                state
                                    .custom_element_candidates
                                    .push((alias.clone(), component_url(source, options)));
                                local_names.push(alias.clone());
                                state.components.insert(
                                    alias.clone(),
                                    ComponentInfo {
                                        specifier_kind: ImportSpecifierKind::Namespace,
                                        imported_local_name: alias,
                                        imported_exported_name: None,
                                        source_url: source.to_string(),
                                    },
                                );
                            }
                        }
                    }
                }

                state.push_import(raw);
                for local in local_names {
                    state
                        .component_imports
                        .entry(local)
                        .or_default()
                        .push(raw.to_string());
                }
                removed.push(import.span);
            }

            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::VariableDeclaration(var)) => {
                    let mut names = Vec::new();
                    for declarator in &var.declarations {
                        collect_binding_names(&declarator.id, &mut names);
                    }
                    let span = export.span;
                    if names.iter().any(|n| n == "__layout" || n == "__content") {
                        let raw = &script[span.start as usize..span.end as usize];
                        state.push_export(raw);
                    } else if names.iter().any(|n| n == "getStaticPaths") {
                        state.get_static_paths =
                            Some(slice_with_edits(script, var.span, &rewrites));
                    } else {
                        prop_exports.extend(names);
                    }
                    removed.push(span);
                }
                Some(Declaration::FunctionDeclaration(func))
                    if func.id.as_ref().is_some_and(|id| id.name == "getStaticPaths") =>
                {
                    state.get_static_paths = Some(slice_with_edits(script, func.span, &rewrites));
                    removed.push(export.span);
                }
                _ => {}
            },

            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    state.declarations.insert(id.name.to_string());
                }
            }

            Statement::VariableDeclaration(var) => {
                let mut names = Vec::new();
                for declarator in &var.declarations {
                    collect_binding_names(&declarator.id, &mut names);
                }
                state.declarations.extend(names);
            }

            _ => {}
        }
    }

    if !prop_exports.is_empty() {
        options.logging.warn(LogEvent {
            filename: &options.filename,
            frame: None,
            start: Some(fragment_start),
            message: &format!(
                "Exported variable declarations as component props are deprecated: {}",
                prop_exports.join(", ")
            ),
        });
    }

    if !rewrites.is_empty() {
        state.push_import(options.fetch_content_import());
    }

    // Splice the surviving script back together: removals plus any rewrite
    // that is not inside a removed range (removed ranges carry their rewrites
    // with them, e.g. inside the lifted getStaticPaths).
    let mut edits: Vec<Edit> = removed
        .iter()
        .map(|span| Edit {
            span: *span,
            replacement: String::new(),
        })
        .collect();
    edits.extend(rewrites.iter().filter(|e| {
        !removed
            .iter()
            .any(|r| e.span.start >= r.start && e.span.end <= r.end)
    }).cloned());

    let reconstructed = apply_edits(script, edits);
    state.script = if reconstructed.trim().is_empty() {
        String::new()
    } else {
        transpile_fragment(options, &reconstructed, module.span)?
    };

    Ok(())
}
