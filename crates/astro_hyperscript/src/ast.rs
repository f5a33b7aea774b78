//! Input AST for the hyperscript codegen.
//!
//! The front-end template parser is a separate tool; these types are its
//! output contract. A [`Document`] has three parts — an optional frontmatter
//! [`Script`], the ordered [`Style`] blocks the parser already split out, and
//! the template tree under an [`HtmlRoot`]. Every node carries a byte-range
//! [`Span`] into the original `.astro` source so diagnostics can point at the
//! user's file.

pub use oxc_span::Span;

/// Bit set in [`DocumentMeta::features`] when the parser saw a custom-element
/// declaration (a specifier-less import paired with a hyphenated tag).
pub const FEATURE_CUSTOM_ELEMENT: u32 = 1 << 0;

/// Feature bitmask attached to a parsed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentMeta {
    pub features: u32,
}

impl DocumentMeta {
    pub fn has_custom_elements(&self) -> bool {
        self.features & FEATURE_CUSTOM_ELEMENT != 0
    }
}

/// A parsed single-file component document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// The frontmatter script block, if the file has one.
    pub module: Option<Script>,
    /// `<style>` blocks the parser lifted out of the template, in document order.
    pub styles: Vec<Style>,
    /// The template tree.
    pub html: HtmlRoot,
    pub meta: DocumentMeta,
}

/// The frontmatter script block: raw text plus its range in the source file.
#[derive(Debug, Clone)]
pub struct Script {
    pub content: String,
    pub span: Span,
}

/// Raw CSS text from a `<style>` block.
#[derive(Debug, Clone)]
pub struct Style {
    pub content: String,
    pub span: Span,
}

/// The template root. Its children are emitted as one balanced hyperscript
/// expression; the root itself produces no output (the consumer wraps the
/// result in `h(Fragment, null, ...)`).
#[derive(Debug, Clone, Default)]
pub struct HtmlRoot {
    pub children: Vec<TemplateNode>,
    pub span: Span,
}

/// A node in the template tree.
#[derive(Debug, Clone)]
pub enum TemplateNode {
    /// A plain HTML element (lowercase tag).
    Element(Element),
    /// A component reference (capitalized or dotted tag).
    InlineComponent(Element),
    /// An explicit `<>...</>` fragment.
    Fragment(Fragment),
    /// A `<slot>` placeholder.
    Slot(Element),
    /// A `<template slot=...>` scoped-slot wrapper.
    SlotTemplate(Element),
    Head(Element),
    Title(Element),
    Body(Element),
    /// Raw text.
    Text(Text),
    /// A `{...}` tag as it appears inside Markdown regions, where the parser
    /// leaves the expression source untouched.
    MustacheTag(MustacheTag),
    /// A `{...}` template expression: code chunks alternating with template
    /// children to be spliced between them.
    Expression(Expression),
    /// Inline code (`` `...` `` in Markdown regions).
    CodeSpan(Code),
    /// A fenced code block.
    CodeFence(Code),
    /// An HTML comment. Never emitted.
    Comment(Comment),
    /// A `<style>` element the parser left inline in the template.
    Style(Style),
}

impl TemplateNode {
    pub fn span(&self) -> Span {
        match self {
            TemplateNode::Element(el)
            | TemplateNode::InlineComponent(el)
            | TemplateNode::Slot(el)
            | TemplateNode::SlotTemplate(el)
            | TemplateNode::Head(el)
            | TemplateNode::Title(el)
            | TemplateNode::Body(el) => el.span,
            TemplateNode::Fragment(f) => f.span,
            TemplateNode::Text(t) => t.span,
            TemplateNode::MustacheTag(m) => m.span,
            TemplateNode::Expression(e) => e.span,
            TemplateNode::CodeSpan(c) | TemplateNode::CodeFence(c) => c.span,
            TemplateNode::Comment(c) => c.span,
            TemplateNode::Style(s) => s.span,
        }
    }
}

/// An element-like node: tag name, attributes, children.
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<AttributeItem>,
    pub children: Vec<TemplateNode>,
    pub span: Span,
}

/// An explicit fragment's children.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub children: Vec<TemplateNode>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Text {
    pub data: String,
    pub span: Span,
}

/// A mustache tag carrying its expression source verbatim.
#[derive(Debug, Clone)]
pub struct MustacheTag {
    pub expression: String,
    pub span: Span,
}

/// A template expression. `code_chunks` and `children` alternate:
/// `chunk[0] child[0] chunk[1] child[1] ... chunk[n]`. The children are
/// template subtrees the parser found embedded in the expression source;
/// codegen compiles each to a hyperscript expression and splices it between
/// the surrounding chunks before transpiling the whole thing.
#[derive(Debug, Clone)]
pub struct Expression {
    pub code_chunks: Vec<String>,
    pub children: Vec<TemplateNode>,
    pub span: Span,
}

/// Inline or fenced code content, already unescaped by the parser.
#[derive(Debug, Clone)]
pub struct Code {
    pub data: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub data: String,
    pub span: Span,
}

/// One attribute on an element.
///
/// The kinds are closed here, so the "unknown attribute kind" failure of the
/// source system is unrepresentable: the parser can only hand us these.
#[derive(Debug, Clone)]
pub enum AttributeItem {
    Attribute(Attribute),
    /// `{...expr}` spread.
    Spread(Spread),
    /// `{name}` shorthand.
    Shorthand(Shorthand),
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// Bare boolean attribute (`<input disabled>`).
    True,
    /// Explicitly false or undefined; the attribute is omitted from output.
    False,
    /// A (possibly empty) list of value segments. Quoted values with embedded
    /// expressions produce multiple segments.
    Segments(Vec<AttributeSegment>),
}

#[derive(Debug, Clone)]
pub enum AttributeSegment {
    /// Raw attribute text.
    Text { raw: String, span: Span },
    /// An embedded `{expr}` with its source verbatim.
    MustacheTag { expression: String, span: Span },
    /// An embedded expression that itself carried code chunks.
    Expression { code_chunks: Vec<String>, span: Span },
}

#[derive(Debug, Clone)]
pub struct Spread {
    pub expression: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Shorthand {
    pub name: String,
    pub span: Span,
}
