//! Astro hyperscript codegen
//!
//! Compiles a parsed Astro single-file component — frontmatter script block,
//! style blocks, and an HTML-like template with embedded expressions and
//! component references — into a self-contained JavaScript render module.
//!
//! ## Output shape
//!
//! The [`Artifact`] carries the pieces the bundler assembles into a module:
//!
//! ```js
//! // imports: hoisted user + runtime import lines
//! import { h, Fragment } from "astro/internal/h.js";
//! import X from './X.jsx';
//!
//! // script: frontmatter body, transpiled, with imports/exports stripped
//! const title = "Hello";
//!
//! // html: one balanced hyperscript expression
//! h("h1",{[__astroContext]:props[__astroContext]},"Hi")
//! ```
//!
//! The pipeline runs in fixed order over one [`CodegenState`] per document:
//! frontmatter analysis (imports, declarations, `getStaticPaths`,
//! `Astro.fetchContent` rewriting), CSS extraction, then the template walk
//! that rewrites every element, expression, component reference, hydration
//! directive, and Markdown region into hyperscript calls.
//!
//! The front-end parser, the Markdown renderer, and the expression
//! transpiler are external collaborators; see [`CompileOptions`] for their
//! seams. An oxc-backed [`OxcTranspiler`] ships in-crate as the default
//! transpiler.

pub mod ast;
mod diagnostic;
mod frontmatter;
mod logging;
mod options;
mod printer;
mod state;
mod styles;
mod transpile;

pub use diagnostic::{byte_offset_to_line_column, code_frame, CodegenError, ErrorKind, Position};
pub use logging::{LogEvent, LogSink, TracingSink};
pub use options::{
    AstroConfig, CompileOptions, ExternalError, MarkdownRenderer, TemplateReparser,
};
pub use printer::codegen;
pub use state::{
    Artifact, CodegenState, ComponentInfo, ImportSpecifierKind, MarkdownMarker, Markers,
};
pub use transpile::{ExpressionTranspiler, OxcTranspiler, TranspileFailure};
