//! End-to-end codegen tests.
//!
//! Documents are assembled as ASTs (the front-end parser is external), the
//! Markdown renderer and re-parser are stubs, and assertions run against the
//! finished artifact.

use std::sync::{Arc, Mutex};

use astro_hyperscript::ast::{
    Attribute, AttributeItem, AttributeSegment, AttributeValue, Document, DocumentMeta, Element,
    Expression, HtmlRoot, Script, Span, TemplateNode, Text, FEATURE_CUSTOM_ELEMENT,
};
use astro_hyperscript::{
    codegen, Artifact, AstroConfig, CodegenError, CompileOptions, ErrorKind, ExternalError,
    LogEvent, LogSink, MarkdownRenderer, TemplateReparser,
};

const CONTEXT_PROPS: &str = "{[__astroContext]:props[__astroContext]}";

// --- AST builders ---

fn span() -> Span {
    Span::new(0, 0)
}

fn document(script: Option<&str>, children: Vec<TemplateNode>) -> Document {
    Document {
        module: script.map(|content| Script {
            content: content.to_string(),
            span: Span::new(4, 4 + content.len() as u32),
        }),
        styles: Vec::new(),
        html: HtmlRoot {
            children,
            span: span(),
        },
        meta: DocumentMeta::default(),
    }
}

fn element(name: &str, attributes: Vec<AttributeItem>, children: Vec<TemplateNode>) -> TemplateNode {
    TemplateNode::Element(Element {
        name: name.to_string(),
        attributes,
        children,
        span: span(),
    })
}

fn component(name: &str, attributes: Vec<AttributeItem>, children: Vec<TemplateNode>) -> TemplateNode {
    TemplateNode::InlineComponent(Element {
        name: name.to_string(),
        attributes,
        children,
        span: span(),
    })
}

fn text(data: &str) -> TemplateNode {
    TemplateNode::Text(Text {
        data: data.to_string(),
        span: span(),
    })
}

fn expression(code_chunks: &[&str], children: Vec<TemplateNode>) -> TemplateNode {
    TemplateNode::Expression(Expression {
        code_chunks: code_chunks.iter().map(ToString::to_string).collect(),
        children,
        span: span(),
    })
}

fn attr_true(name: &str) -> AttributeItem {
    AttributeItem::Attribute(Attribute {
        name: name.to_string(),
        value: AttributeValue::True,
        span: span(),
    })
}

fn attr_text(name: &str, value: &str) -> AttributeItem {
    AttributeItem::Attribute(Attribute {
        name: name.to_string(),
        value: AttributeValue::Segments(vec![AttributeSegment::Text {
            raw: value.to_string(),
            span: span(),
        }]),
        span: span(),
    })
}

fn attr_empty(name: &str) -> AttributeItem {
    AttributeItem::Attribute(Attribute {
        name: name.to_string(),
        value: AttributeValue::Segments(vec![]),
        span: span(),
    })
}

fn attr_mixed(name: &str, raw: &str, expr: &str) -> AttributeItem {
    AttributeItem::Attribute(Attribute {
        name: name.to_string(),
        value: AttributeValue::Segments(vec![
            AttributeSegment::Text {
                raw: raw.to_string(),
                span: span(),
            },
            AttributeSegment::MustacheTag {
                expression: expr.to_string(),
                span: span(),
            },
        ]),
        span: span(),
    })
}

fn attr_shorthand(name: &str) -> AttributeItem {
    AttributeItem::Shorthand(astro_hyperscript::ast::Shorthand {
        name: name.to_string(),
        span: span(),
    })
}

fn attr_spread(expression: &str) -> AttributeItem {
    AttributeItem::Spread(astro_hyperscript::ast::Spread {
        expression: expression.to_string(),
        span: span(),
    })
}

// --- Stub externals ---

/// Collects sink events for assertions.
#[derive(Clone, Default)]
struct CollectingSink {
    events: Arc<Mutex<Vec<(&'static str, String)>>>,
}

impl CollectingSink {
    fn messages(&self, level: &str) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl LogSink for CollectingSink {
    fn warn(&self, event: LogEvent<'_>) {
        self.events
            .lock()
            .unwrap()
            .push(("warn", event.message.to_string()));
    }
    fn error(&self, event: LogEvent<'_>) {
        self.events
            .lock()
            .unwrap()
            .push(("error", event.message.to_string()));
    }
    fn parse_error(&self, event: LogEvent<'_>) {
        self.events
            .lock()
            .unwrap()
            .push(("parse_error", event.message.to_string()));
    }
}

/// Renders `# Heading` lines and wraps everything else in a paragraph.
struct HeadingRenderer;

impl MarkdownRenderer for HeadingRenderer {
    fn render(&self, source: &str, _scope: Option<&str>) -> Result<String, ExternalError> {
        let trimmed = source.trim();
        Ok(match trimmed.strip_prefix("# ") {
            Some(rest) => format!("<h1>{rest}</h1>"),
            None => format!("<p>{trimmed}</p>"),
        })
    }
}

/// Re-parses the single-element HTML the stub renderer produces.
struct SingleElementReparser;

impl TemplateReparser for SingleElementReparser {
    fn reparse(&self, html: &str) -> Result<Vec<TemplateNode>, ExternalError> {
        let html = html.trim();
        let inner = html
            .strip_prefix("<h1>")
            .and_then(|rest| rest.strip_suffix("</h1>"))
            .map(|body| ("h1", body))
            .or_else(|| {
                html.strip_prefix("<p>")
                    .and_then(|rest| rest.strip_suffix("</p>"))
                    .map(|body| ("p", body))
            });
        let Some((tag, body)) = inner else {
            return Err(format!("unexpected HTML: {html}").into());
        };
        Ok(vec![element(tag, vec![], vec![text(body)])])
    }
}

fn options() -> CompileOptions {
    CompileOptions::new("/X.astro", "X")
}

fn compile(document: &Document) -> Result<Artifact, CodegenError> {
    codegen(document, &options())
}

// --- end-to-end scenarios ---

#[test]
fn empty_document() {
    let artifact = compile(&document(Some(""), vec![])).unwrap();
    assert_eq!(artifact.script, "");
    assert!(artifact.imports.is_empty());
    assert!(artifact.exports.is_empty());
    assert_eq!(artifact.html, "");
    assert_eq!(artifact.css, None);
    assert!(!artifact.has_custom_elements);
    assert!(artifact.get_static_paths.is_none());
}

#[test]
fn single_static_element() {
    let artifact = compile(&document(None, vec![element("h1", vec![], vec![text("Hi")])])).unwrap();
    assert_eq!(artifact.html, format!("h(\"h1\",{CONTEXT_PROPS},\"Hi\")"));
}

#[test]
fn imported_component_with_load_hydration() {
    let artifact = compile(&document(
        Some("import X from './X.jsx';"),
        vec![component("X", vec![attr_true("client:load")], vec![])],
    ))
    .unwrap();

    assert!(artifact
        .imports
        .contains(&"import { __astro_component } from \"astro/internal/__astro_component.js\";".to_string()));
    assert!(artifact
        .imports
        .contains(&"import { h, Fragment } from \"astro/internal/h.js\";".to_string()));
    assert!(artifact
        .imports
        .contains(&"import X from './X.jsx';".to_string()));
    assert_eq!(
        artifact.html,
        format!(
            "h(__astro_component(X, {{ hydrate: \"load\", displayName: \"X\", \
             componentUrl: \"/_astro/X.js\", componentExport: {{\"value\":\"default\"}}, \
             value: null }}),{CONTEXT_PROPS})"
        )
    );
}

#[test]
fn client_only_collapses_to_fragment_and_drops_the_import() {
    let artifact = compile(&document(
        Some("import X from './X.jsx';"),
        vec![component("X", vec![attr_true("client:only")], vec![])],
    ))
    .unwrap();

    assert!(
        artifact.html.contains("__astro_component(Fragment, {"),
        "html: {}",
        artifact.html
    );
    assert!(
        !artifact.imports.contains(&"import X from './X.jsx';".to_string()),
        "imports: {:?}",
        artifact.imports
    );
    assert!(artifact
        .imports
        .contains(&"import { h, Fragment } from \"astro/internal/h.js\";".to_string()));
}

#[test]
fn fetch_content_is_rewritten_and_the_runtime_import_injected() {
    let artifact = compile(&document(
        Some("const x = Astro.fetchContent('./*.md');"),
        vec![],
    ))
    .unwrap();

    assert!(
        artifact.script.contains("import.meta.globEager('./*.md')"),
        "script: {}",
        artifact.script
    );
    assert!(artifact
        .imports
        .contains(&"import { fetchContent } from \"astro/internal/fetch-content.js\";".to_string()));
}

#[test]
fn markdown_region_renders_reparses_and_reenters_codegen() {
    let doc = document(None, vec![component("Markdown", vec![], vec![text("# Hi")])]);
    let options = options()
        .with_markdown_renderer(HeadingRenderer)
        .with_template_reparser(SingleElementReparser);
    let artifact = codegen(&doc, &options).unwrap();
    assert_eq!(artifact.html, format!("h(\"h1\",{CONTEXT_PROPS},\"Hi\")"));
}

// --- universal properties ---

fn compound_document() -> Document {
    document(
        Some("import X from './X.jsx';\nconst who = 'world';"),
        vec![element(
            "div",
            vec![attr_text("class", "wrap")],
            vec![
                element("h1", vec![], vec![text("Hi")]),
                expression(&["who"], vec![]),
                component("X", vec![attr_true("client:load")], vec![]),
                element("p", vec![attr_text("slot", "footer")], vec![text("bye")]),
            ],
        )],
    )
}

#[test]
fn parentheses_balance() {
    let artifact = compile(&compound_document()).unwrap();
    let open = artifact.html.matches('(').count();
    let close = artifact.html.matches(')').count();
    assert_eq!(open, close, "html: {}", artifact.html);
}

#[test]
fn emission_is_idempotent() {
    let doc = compound_document();
    let first = compile(&doc).unwrap();
    let second = compile(&doc).unwrap();
    assert_eq!(first, second);
}

#[test]
fn imports_contain_no_duplicates() {
    let artifact = compile(&document(
        Some("import './global.css';\nimport X from './X.jsx';"),
        vec![
            component("X", vec![attr_true("client:load")], vec![]),
            component("X", vec![attr_true("client:load")], vec![]),
        ],
    ))
    .unwrap();

    let mut deduped = artifact.imports.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), artifact.imports.len(), "{:?}", artifact.imports);
}

#[test]
fn one_h_call_per_element() {
    let artifact = compile(&document(
        None,
        vec![element(
            "ul",
            vec![],
            vec![
                element("li", vec![], vec![text("a")]),
                element("li", vec![], vec![text("b")]),
            ],
        )],
    ))
    .unwrap();
    assert_eq!(artifact.html.matches("h(").count(), 3, "{}", artifact.html);
}

#[test]
fn slot_names_round_trip() {
    let artifact = compile(&document(
        Some("import X from './X.jsx';"),
        vec![component(
            "X",
            vec![],
            vec![element("p", vec![attr_text("slot", "footer")], vec![text("bye")])],
        )],
    ))
    .unwrap();
    assert!(
        artifact
            .html
            .contains("h(__astro_slot_content, { name: \"footer\" },"),
        "html: {}",
        artifact.html
    );
}

// --- emission details ---

#[test]
fn frontmatter_defined_components_render_unquoted() {
    let artifact = compile(&document(
        Some("function Card() { return null; }"),
        vec![component("Card", vec![], vec![text("x")])],
    ))
    .unwrap();
    assert_eq!(artifact.html, format!("h(Card,{CONTEXT_PROPS},\"x\")"));
}

#[test]
fn namespace_component_export_uses_the_member_name() {
    let artifact = compile(&document(
        Some("import * as UI from './ui.ts';"),
        vec![component("UI.Button", vec![attr_true("client:idle")], vec![])],
    ))
    .unwrap();
    assert!(
        artifact.html.contains("componentExport: {\"value\":\"Button\"}"),
        "html: {}",
        artifact.html
    );
    assert!(
        artifact.html.contains("componentUrl: \"/_astro/ui.js\""),
        "html: {}",
        artifact.html
    );
    assert!(
        artifact.html.contains("displayName: \"UI.Button\""),
        "html: {}",
        artifact.html
    );
}

#[test]
fn falsy_expressions_are_skipped() {
    let artifact = compile(&document(
        None,
        vec![element("div", vec![], vec![expression(&["false"], vec![])])],
    ))
    .unwrap();
    assert_eq!(artifact.html, format!("h(\"div\",{CONTEXT_PROPS})"));
}

#[test]
fn expression_children_splice_between_chunks() {
    let artifact = compile(&document(
        None,
        vec![element(
            "div",
            vec![],
            vec![expression(
                &["visible && ", ""],
                vec![element("span", vec![], vec![text("x")])],
            )],
        )],
    ))
    .unwrap();
    assert!(artifact.html.contains("visible &&"), "{}", artifact.html);
    assert_eq!(artifact.html.matches("h(").count(), 2, "{}", artifact.html);
}

#[test]
fn custom_elements_go_through_the_registry() {
    let mut doc = document(
        Some("import './my-el.js';"),
        vec![element("my-el", vec![attr_true("client:load")], vec![])],
    );
    doc.meta = DocumentMeta {
        features: FEATURE_CUSTOM_ELEMENT,
    };
    let artifact = compile(&doc).unwrap();

    assert!(artifact.has_custom_elements);
    assert_eq!(
        artifact.custom_element_candidates,
        vec![("$$module1".to_string(), "/_astro/my-el.js".to_string())]
    );
    assert!(
        artifact
            .html
            .contains("__astro_element_registry.astroComponentArgs(\"my-el\", { hydrate: \"load\""),
        "html: {}",
        artifact.html
    );
    assert!(artifact
        .imports
        .contains(&"import { AstroElementRegistry } from \"astro/internal/element-registry.js\";".to_string()));
}

#[test]
fn styles_are_joined_with_blank_lines() {
    let mut doc = document(None, vec![element("div", vec![], vec![text("x")])]);
    doc.styles = vec![
        astro_hyperscript::ast::Style {
            content: ".a {}".to_string(),
            span: span(),
        },
        astro_hyperscript::ast::Style {
            content: ".b {}".to_string(),
            span: span(),
        },
    ];
    let artifact = compile(&doc).unwrap();
    assert_eq!(artifact.css.as_deref(), Some(".a {}\n\n.b {}"));
}

#[test]
fn attribute_resolution_rules() {
    let artifact = compile(&document(
        None,
        vec![element(
            "input",
            vec![
                attr_true("disabled"),
                attr_text("class", "a"),
                attr_empty("data-x"),
                attr_shorthand("value"),
                attr_spread("rest"),
                attr_mixed("style", "color: ", "tone"),
            ],
            vec![],
        )],
    ))
    .unwrap();

    assert_eq!(
        artifact.html,
        "h(\"input\",{[__astroContext]:props[__astroContext],\
         \"disabled\":true,\"class\":\"a\",\"data-x\":\"\",\"value\":(value),\
         ...(rest),\"style\":(\"color: \"+tone)})"
    );
}

#[test]
fn code_fences_emit_string_literals() {
    let artifact = compile(&document(
        None,
        vec![TemplateNode::CodeFence(astro_hyperscript::ast::Code {
            data: "const x = 1;".to_string(),
            span: span(),
        })],
    ))
    .unwrap();
    assert_eq!(artifact.html, "\"const x = 1;\"");
}

#[test]
fn template_styles_are_extracted_not_inlined() {
    let artifact = compile(&document(
        None,
        vec![element(
            "div",
            vec![],
            vec![
                TemplateNode::Style(astro_hyperscript::ast::Style {
                    content: ".x { color: red; }".to_string(),
                    span: span(),
                }),
                text("hi"),
            ],
        )],
    ))
    .unwrap();
    assert_eq!(artifact.html, format!("h(\"div\",{CONTEXT_PROPS},\"hi\")"));
    assert_eq!(artifact.css.as_deref(), Some(".x { color: red; }"));
}

#[test]
fn markdown_regions_interleave_with_elements() {
    let doc = document(
        None,
        vec![component(
            "Markdown",
            vec![],
            vec![
                text("# Hi\n"),
                element("div", vec![], vec![text("mid")]),
                text("bye"),
            ],
        )],
    );
    let options = options()
        .with_markdown_renderer(HeadingRenderer)
        .with_template_reparser(SingleElementReparser);
    let artifact = codegen(&doc, &options).unwrap();

    assert_eq!(
        artifact.html,
        format!(
            "h(\"h1\",{CONTEXT_PROPS},\"Hi\"),\
             h(\"div\",{CONTEXT_PROPS},\"mid\"),\
             h(\"p\",{CONTEXT_PROPS},\"bye\")"
        )
    );
}

// --- error paths ---

#[test]
fn unresolved_components_are_fatal() {
    let error = compile(&document(None, vec![component("Missing", vec![], vec![])])).unwrap_err();
    assert_eq!(error.kind, ErrorKind::UnresolvedComponent);
    assert!(
        error.message.contains("Unable to render \"Missing\" because it is undefined"),
        "{}",
        error.message
    );
}

#[test]
fn hydrating_a_frontmatter_component_is_fatal() {
    let error = compile(&document(
        Some("function Local() { return null; }"),
        vec![component("Local", vec![attr_true("client:load")], vec![])],
    ))
    .unwrap_err();
    assert_eq!(error.kind, ErrorKind::HydrationDirective);
}

#[test]
fn template_transpile_failures_are_recovered_locally() {
    let sink = CollectingSink::default();
    let doc = document(
        None,
        vec![element(
            "div",
            vec![],
            vec![expression(&["const ="], vec![]), text("after")],
        )],
    );
    let artifact = codegen(&doc, &options().with_log_sink(sink.clone())).unwrap();

    assert_eq!(sink.messages("parse_error").len(), 1);
    assert!(artifact.html.contains("\"after\""), "{}", artifact.html);
    let open = artifact.html.matches('(').count();
    assert_eq!(open, artifact.html.matches(')').count(), "{}", artifact.html);
}

// --- warning paths ---

#[test]
fn legacy_colon_hydration_warns_and_hydrates() {
    let sink = CollectingSink::default();
    let doc = document(
        Some("import Counter from './Counter.jsx';"),
        vec![component("Counter:load", vec![], vec![])],
    );
    let artifact = codegen(&doc, &options().with_log_sink(sink.clone())).unwrap();

    let warnings = sink.messages("warn");
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("deprecated"), "{warnings:?}");
    assert!(
        artifact.html.contains("hydrate: \"load\""),
        "html: {}",
        artifact.html
    );
    assert!(
        artifact.html.contains("displayName: \"Counter\""),
        "html: {}",
        artifact.html
    );
}

#[test]
fn exported_props_warn_and_are_removed() {
    let sink = CollectingSink::default();
    let doc = document(Some("export let title = 'x';\nconst keep = 1;"), vec![]);
    let artifact = codegen(&doc, &options().with_log_sink(sink.clone())).unwrap();

    let warnings = sink.messages("warn");
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(warnings[0].contains("title"), "{warnings:?}");
    assert!(!artifact.script.contains("title"), "{}", artifact.script);
    assert!(artifact.script.contains("const keep = 1"));
}

#[test]
fn relative_path_attributes_warn_outside_pages() {
    let sink = CollectingSink::default();
    let doc = document(
        None,
        vec![element("img", vec![attr_text("src", "./photo.png")], vec![])],
    );
    codegen(&doc, &options().with_log_sink(sink.clone())).unwrap();
    assert_eq!(sink.messages("warn").len(), 1);

    // Page files resolve relative paths; no warning there.
    let sink = CollectingSink::default();
    let page_options = CompileOptions::new("/src/pages/index.astro", "index")
        .with_astro_config(AstroConfig::default())
        .with_log_sink(sink.clone());
    codegen(&doc, &page_options).unwrap();
    assert!(sink.messages("warn").is_empty());
}

#[test]
fn get_static_paths_is_lifted_into_the_artifact() {
    let artifact = compile(&document(
        Some("export function getStaticPaths() {\n  return [];\n}\nconst a = 1;"),
        vec![],
    ))
    .unwrap();
    let lifted = artifact.get_static_paths.unwrap();
    assert!(lifted.starts_with("function getStaticPaths"), "{lifted}");
    assert!(!artifact.script.contains("getStaticPaths"));
    assert!(artifact.script.contains("const a = 1"));
}

#[test]
fn layout_and_content_exports_are_hoisted() {
    let artifact = compile(&document(
        Some("export const __layout = 'base';\nexport const __content = { title: 'x' };"),
        vec![],
    ))
    .unwrap();
    assert_eq!(
        artifact.exports,
        vec![
            "export const __layout = 'base';",
            "export const __content = { title: 'x' };"
        ]
    );
}
