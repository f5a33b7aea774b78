//! Template code generation.
//!
//! An in-order walk over the template tree that emits one balanced
//! hyperscript expression. The walk keeps two output buffers — the ordinary
//! stream and a raw-text buffer for Markdown regions — plus an explicit
//! parenthesis counter (`-1` sentinel) tracking unclosed `h(` calls, because
//! slot wrapping and hydration wrappers insert calls that are not 1:1 with
//! tree nodes.
//!
//! This module is split into focused submodules:
//!
//! - [`attributes`] — attribute-node → `(name, code)` resolution
//! - [`components`] — tag resolution, hydration directives, wrapper synthesis
//! - [`markdown`] — Markdown-region buffering and flushing

use cow_utils::CowUtils;
use oxc_span::Span;

use crate::ast::{Code, Document, Element, Fragment, MustacheTag, TemplateNode, Text};
use crate::diagnostic::{
    byte_offset_to_line_column, read_source, CodegenError, ErrorKind, Position,
};
use crate::logging::LogEvent;
use crate::options::CompileOptions;
use crate::state::{Artifact, CodegenState, ComponentInfo, ImportSpecifierKind};
use crate::transpile::transpile_fragment;
use crate::{frontmatter, styles};

mod attributes;
pub(crate) mod components;
mod markdown;

use attributes::take_slot_attribute;
use components::{Hydration, ResolvedComponent};

/// Runtime identifiers referenced by generated code.
pub(crate) mod runtime {
    pub const FRAGMENT: &str = "Fragment";
    pub const COMPONENT: &str = "__astro_component";
    pub const SLOT: &str = "__astro_slot";
    pub const SLOT_CONTENT: &str = "__astro_slot_content";
    pub const ELEMENT_REGISTRY: &str = "__astro_element_registry";
    pub const CONTEXT: &str = "__astroContext";
}

/// Sentinel the parser writes for an escaped `{` inside `<code>` content.
const ESCAPED_LEFT_CURLY: &str = "ASTRO_ESCAPED_LEFT_CURLY_BRACKET\0";

/// Expression results that render nothing and are skipped outright.
const FALSY_EXPRESSIONS: &[&str] = &["false", "null", "undefined", "void 0"];

/// Compile a parsed document into a render-module artifact.
///
/// The pipeline is explicitly sequenced: the frontmatter pass fully
/// populates the state before the template walk starts, so component
/// resolution never races import collection.
pub fn codegen(document: &Document, options: &CompileOptions) -> Result<Artifact, CodegenError> {
    let mut state = CodegenState::new(&options.filename, &options.file_id);
    state.has_custom_elements = document.meta.has_custom_elements();

    frontmatter::analyze(document, options, &mut state)?;
    styles::extract(document, &mut state);
    let html = print_template(&document.html.children, &mut state, options)?;

    let css = if state.css.is_empty() {
        None
    } else {
        Some(state.css.join("\n\n"))
    };

    Ok(Artifact {
        script: state.script,
        imports: state.import_statements,
        exports: state.export_statements,
        html,
        css,
        get_static_paths: state.get_static_paths,
        has_custom_elements: state.has_custom_elements,
        custom_element_candidates: state.custom_element_candidates,
    })
}

/// Run the template walk over `nodes` and return the cleaned-up expression.
/// Markdown flushes re-enter here for the rendered subtree.
pub(crate) fn print_template(
    nodes: &[TemplateNode],
    state: &mut CodegenState,
    options: &CompileOptions,
) -> Result<String, CodegenError> {
    let mut printer = TemplatePrinter::new(state, options);
    printer.print_children(nodes, None)?;
    Ok(cleanup(&printer.out))
}

/// Which buffer the walk is currently writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Buffer {
    Out,
    Markdown,
}

/// How an element-like node reached the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeClass {
    /// A plain tag the parser did not recognize as a component.
    Element,
    /// A component reference.
    Component,
}

pub(crate) struct TemplatePrinter<'a> {
    state: &'a mut CodegenState,
    options: &'a CompileOptions,
    /// The ordinary hyperscript stream.
    out: String,
    /// Raw text accumulating inside a Markdown region.
    markdown: String,
    curr: Buffer,
    /// Unclosed `h(` calls in the ordinary stream; `-1` when none.
    paren: i32,
}

impl<'a> TemplatePrinter<'a> {
    fn new(state: &'a mut CodegenState, options: &'a CompileOptions) -> Self {
        Self {
            state,
            options,
            out: String::new(),
            markdown: String::new(),
            curr: Buffer::Out,
            paren: -1,
        }
    }

    pub(super) fn print_children(
        &mut self,
        nodes: &[TemplateNode],
        parent: Option<&str>,
    ) -> Result<(), CodegenError> {
        for node in nodes {
            self.print_node(node, parent)?;
        }
        Ok(())
    }

    fn print_node(&mut self, node: &TemplateNode, parent: Option<&str>) -> Result<(), CodegenError> {
        match node {
            TemplateNode::Element(el)
            | TemplateNode::Head(el)
            | TemplateNode::Title(el)
            | TemplateNode::Body(el) => self.print_element(el, NodeClass::Element),
            TemplateNode::InlineComponent(el) => self.print_element(el, NodeClass::Component),
            TemplateNode::Slot(el) => self.print_slot(el),
            TemplateNode::SlotTemplate(el) => self.print_slot_template(el),
            TemplateNode::Fragment(fragment) => self.print_fragment(fragment),
            TemplateNode::Text(text) => self.print_text(text, parent),
            TemplateNode::MustacheTag(tag) => self.print_mustache(tag),
            TemplateNode::Expression(expr) => self.print_expression(expr),
            TemplateNode::CodeSpan(code) | TemplateNode::CodeFence(code) => self.print_code(code),
            TemplateNode::Comment(_) => Ok(()),
            TemplateNode::Style(style) => {
                // Styles are collected, never inlined; the subtree is dropped.
                self.state.css.push(style.content.clone());
                Ok(())
            }
        }
    }

    // --- Element-class nodes ---

    fn print_element(&mut self, el: &Element, class: NodeClass) -> Result<(), CodegenError> {
        // Legacy `<Name:method />` hydration normalizes before resolution.
        let (tag, legacy_method) = match components::split_legacy_hydration(&el.name) {
            Some((head, method)) => {
                self.options.logging.warn(LogEvent {
                    filename: &self.options.filename,
                    frame: None,
                    start: Some(self.position_of(el.span.start)),
                    message: &format!(
                        "<{}> hydration syntax is deprecated; use <{head} client:{method}> instead",
                        el.name
                    ),
                });
                (head.to_string(), Some(method.to_string()))
            }
            None => (el.name.clone(), None),
        };

        if class == NodeClass::Component && tag == "Markdown" {
            return self.print_markdown_component(el);
        }
        if class == NodeClass::Component && tag == "Prism" {
            self.inject_prism();
        }

        let mut attrs = self.resolve_attributes(&el.attributes)?;
        let mut hydration = components::classify_hydration(&mut attrs);
        if let Some(method) = legacy_method {
            hydration = Some(Hydration {
                method,
                value: None,
            });
        }

        let needs_resolution = class == NodeClass::Component
            || components::is_component_name(&tag)
            || (self.state.has_custom_elements && components::is_custom_element_name(&tag));
        let resolved = if needs_resolution {
            Some(self.resolve_component(&tag, el.span)?)
        } else {
            None
        };

        let slot_code = take_slot_attribute(&mut attrs);

        self.flush_if_markdown()?;
        self.push_element_comma();
        if let Some(code) = &slot_code {
            self.open_slot_content(code);
        }

        match &resolved {
            None => {
                self.out
                    .push_str(&format!("h({},{}", json_string(&tag), generate_attributes(&attrs)));
            }
            Some(ResolvedComponent::Fragment | ResolvedComponent::FrontmatterDefined) => {
                if hydration.is_some() {
                    return Err(CodegenError::new(
                        ErrorKind::HydrationDirective,
                        &self.options.filename,
                        self.position_of(el.span.start),
                        format!(
                            "Unable to hydrate <{tag}>: client directives are only allowed on imported components"
                        ),
                    ));
                }
                self.out
                    .push_str(&format!("h({tag},{}", generate_attributes(&attrs)));
            }
            Some(ResolvedComponent::CustomElement) => {
                let wrapper = components::custom_element_wrapper(&tag, hydration.as_ref());
                self.state.push_import(self.options.element_registry_import());
                self.state.push_import(self.options.component_wrapper_import());
                self.out
                    .push_str(&format!("h({wrapper},{}", generate_attributes(&attrs)));
            }
            Some(ResolvedComponent::Imported(info)) => {
                let wrapper = self.imported_component_wrapper(&tag, hydration.as_ref(), info);
                self.state.push_import(self.options.component_wrapper_import());
                self.state.push_import(self.options.hydrate_import());
                if hydration.as_ref().is_some_and(|h| h.method == "only") {
                    let root = tag.split('.').next().unwrap_or(tag.as_str()).to_string();
                    self.state.remove_component_imports(&root);
                }
                self.out
                    .push_str(&format!("h({wrapper},{}", generate_attributes(&attrs)));
            }
        }

        self.paren += 1;
        self.print_element_children(&el.children, tag.as_str())?;
        self.close_element(slot_code.is_some());
        Ok(())
    }

    /// Walk an element's subtree with Markdown buffering suspended. An
    /// element mid-region was flushed before emission, so its children are
    /// ordinary template content; only the text *after* it, back at region
    /// level, belongs to the Markdown buffer again.
    fn print_element_children(
        &mut self,
        children: &[TemplateNode],
        parent: &str,
    ) -> Result<(), CodegenError> {
        let saved = self.state.markers.inside_markdown.take();
        self.print_children(children, Some(parent))?;
        self.state.markers.inside_markdown = saved;
        Ok(())
    }

    fn print_slot(&mut self, el: &Element) -> Result<(), CodegenError> {
        let mut attrs = self.resolve_attributes(&el.attributes)?;
        // Directives are meaningless on slot placeholders.
        let _ = components::classify_hydration(&mut attrs);
        let slot_code = take_slot_attribute(&mut attrs);

        self.flush_if_markdown()?;
        self.push_element_comma();
        if let Some(code) = &slot_code {
            self.open_slot_content(code);
        }
        self.out.push_str(&format!(
            "h({},{},children",
            runtime::SLOT,
            generate_attributes(&attrs)
        ));
        self.paren += 1;
        self.print_element_children(&el.children, "slot")?;
        self.close_element(slot_code.is_some());
        Ok(())
    }

    fn print_slot_template(&mut self, el: &Element) -> Result<(), CodegenError> {
        self.flush_if_markdown()?;
        self.push_element_comma();
        self.out.push_str("h(Fragment, null, children");
        self.paren += 1;
        self.print_element_children(&el.children, el.name.as_str())?;
        self.close_element(false);
        Ok(())
    }

    fn print_fragment(&mut self, fragment: &Fragment) -> Result<(), CodegenError> {
        self.flush_if_markdown()?;
        self.push_element_comma();
        self.out.push_str("h(Fragment, null,");
        let saved = self.state.markers.inside_markdown.take();
        self.print_children(&fragment.children, None)?;
        self.state.markers.inside_markdown = saved;
        self.out.push(')');
        Ok(())
    }

    /// Inject the fixed Prism import and a synthetic component descriptor so
    /// `<Prism>` resolves like any other imported component.
    fn inject_prism(&mut self) {
        if self.state.components.contains_key("Prism") {
            return;
        }
        let line = self.options.prism_import().to_string();
        self.state.push_import(line.clone());
        self.state
            .component_imports
            .entry("Prism".to_string())
            .or_default()
            .push(line);
        self.state.components.insert(
            "Prism".to_string(),
            ComponentInfo {
                specifier_kind: ImportSpecifierKind::Default,
                imported_local_name: "Prism".to_string(),
                imported_exported_name: None,
                source_url: "astro/components/Prism.astro".to_string(),
            },
        );
    }

    // --- Leaf nodes ---

    fn print_text(&mut self, text: &Text, parent: Option<&str>) -> Result<(), CodegenError> {
        if self.state.markers.inside_markdown.is_some() {
            self.curr = Buffer::Markdown;
            self.markdown.push_str(&text.data);
            return Ok(());
        }
        if text.data.trim().is_empty() {
            return Ok(());
        }
        let data = if parent == Some("code") {
            text.data.cow_replace(ESCAPED_LEFT_CURLY, "{").into_owned()
        } else {
            text.data.clone()
        };
        self.out.push(',');
        self.out.push_str(&json_string(&data));
        Ok(())
    }

    fn print_mustache(&mut self, tag: &MustacheTag) -> Result<(), CodegenError> {
        if self.state.markers.inside_markdown.is_some() {
            self.curr = Buffer::Markdown;
            self.markdown.push_str(&format!("{{{}}}", tag.expression));
            return Ok(());
        }
        self.emit_expression_code(&tag.expression, tag.span)
    }

    fn print_expression(&mut self, expr: &crate::ast::Expression) -> Result<(), CodegenError> {
        let assembled = self.assemble_expression(expr)?;
        self.emit_expression_code(&assembled, expr.span)
    }

    /// Reassemble an expression: code chunks with each embedded template
    /// child compiled to a hyperscript expression and spliced in between.
    fn assemble_expression(&mut self, expr: &crate::ast::Expression) -> Result<String, CodegenError> {
        let mut assembled = String::new();
        let count = expr.code_chunks.len().max(expr.children.len());
        for index in 0..count {
            if let Some(chunk) = expr.code_chunks.get(index) {
                assembled.push_str(chunk);
            }
            if let Some(child) = expr.children.get(index) {
                let saved = self.state.markers.inside_markdown.take();
                let child_code =
                    print_template(std::slice::from_ref(child), &mut *self.state, self.options)?;
                self.state.markers.inside_markdown = saved;
                assembled.push_str(&child_code);
            }
        }
        Ok(assembled)
    }

    fn emit_expression_code(&mut self, source: &str, span: Span) -> Result<(), CodegenError> {
        let code = match transpile_fragment(self.options, source, span) {
            Ok(code) => code,
            Err(error) => {
                // Recovered locally: report through the sink and keep
                // compiling the rest of the template.
                self.options.logging.parse_error(LogEvent {
                    filename: &error.filename,
                    frame: error.frame.as_deref(),
                    start: Some(error.start),
                    message: &error.message,
                });
                return Ok(());
            }
        };
        if FALSY_EXPRESSIONS.contains(&code.trim()) {
            return Ok(());
        }
        if self.state.markers.inside_markdown.is_some() {
            self.curr = Buffer::Markdown;
            self.markdown.push_str(&format!("{{{code}}}"));
        } else {
            self.out.push_str(&format!(",({code})"));
        }
        Ok(())
    }

    fn print_code(&mut self, code: &Code) -> Result<(), CodegenError> {
        if self.state.markers.inside_markdown.is_some() {
            self.curr = Buffer::Markdown;
            self.markdown.push_str(&code.data);
            return Ok(());
        }
        self.out.push(',');
        self.out.push_str(&json_string(&code.data));
        Ok(())
    }

    // --- Emission helpers ---

    fn push_element_comma(&mut self) {
        if !self.out.is_empty() {
            self.out.push(',');
        }
    }

    fn open_slot_content(&mut self, slot_code: &str) {
        self.out.push_str(&format!(
            "h({}, {{ name: {slot_code} }},",
            runtime::SLOT_CONTENT
        ));
    }

    fn close_element(&mut self, had_slot_wrapper: bool) {
        if self.paren >= 0 {
            self.out.push(')');
            self.paren -= 1;
        }
        if had_slot_wrapper {
            self.out.push(')');
        }
    }

    fn flush_if_markdown(&mut self) -> Result<(), CodegenError> {
        if self.curr == Buffer::Markdown {
            self.flush_markdown()?;
        }
        Ok(())
    }

    /// Best-effort position of a byte offset, from the re-read source file.
    pub(super) fn position_of(&self, offset: u32) -> Position {
        read_source(&self.options.filename)
            .map(|text| byte_offset_to_line_column(&text, offset as usize))
            .unwrap_or_else(|| Position::new(1, 0))
    }
}

/// Serialize a string as a JavaScript string literal.
pub(crate) fn json_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// Build the props object for a node: the context key first, then the
/// resolved attributes in document order.
pub(crate) fn generate_attributes(attrs: &[(String, String)]) -> String {
    let mut out = format!("{{[{0}]:props[{0}]", runtime::CONTEXT);
    for (name, value) in attrs {
        out.push(',');
        if name.starts_with("...") {
            out.push_str(name);
        } else {
            out.push_str(&json_string(name));
            out.push(':');
            out.push_str(value);
        }
    }
    out.push('}');
    out
}

/// Post-walk text repairs, in order: strip a leading comma, collapse `,)`,
/// collapse comma runs, and restore the comma between `)` and a following
/// `h`. These absorb the over-aggressive commas emitted around skipped
/// expressions.
fn cleanup(out: &str) -> String {
    let out = out.strip_prefix(',').unwrap_or(out);
    let out = out.cow_replace(",)", ")");
    let mut out = out.into_owned();
    while out.contains(",,") {
        out = out.cow_replace(",,", ",").into_owned();
    }
    out.cow_replace(")h", "),h").into_owned()
}
