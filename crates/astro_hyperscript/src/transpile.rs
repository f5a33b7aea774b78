//! Expression transpilation seam.
//!
//! The codegen hands source fragments (frontmatter, template expressions,
//! attribute expressions) to an [`ExpressionTranspiler`] and gets plain
//! ECMAScript back. [`transpile_fragment`] is the adapter around the seam:
//! it shifts failure positions by the fragment's start so diagnostics point
//! at the user's file, renders a code frame from the re-read source, and
//! strips trailing semicolons and whitespace on success.
//!
//! [`OxcTranspiler`] is the in-crate implementation: parse as a TypeScript
//! module, strip types with `oxc_transformer`, re-emit with `oxc_codegen`.

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

use crate::diagnostic::{
    byte_offset_to_line_column, read_source, CodegenError, ErrorKind, Position,
};
use crate::options::CompileOptions;

/// A transpile failure, positioned in the *fragment's* coordinates.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TranspileFailure {
    pub start: Position,
    pub end: Position,
    pub message: String,
}

/// Source-fragment to plain-ECMAScript transformation.
pub trait ExpressionTranspiler {
    fn transpile(&self, source: &str) -> Result<String, TranspileFailure>;
}

/// Adapter around the transpiler seam. `span` is the fragment's range in the
/// original file; reported positions are shifted into file coordinates.
pub(crate) fn transpile_fragment(
    options: &CompileOptions,
    source: &str,
    span: Span,
) -> Result<String, CodegenError> {
    match options.transpiler.transpile(source) {
        Ok(code) => Ok(strip_trailing_semicolons(&code).to_string()),
        Err(failure) => {
            let fragment_start = read_source(&options.filename)
                .map(|text| byte_offset_to_line_column(&text, span.start as usize))
                .unwrap_or_else(|| Position::new(1, 0));
            Err(CodegenError::new(
                ErrorKind::Transpile,
                &options.filename,
                failure.start.offset_by(fragment_start),
                failure.message,
            ))
        }
    }
}

/// Remove trailing whitespace and any run of trailing semicolons.
fn strip_trailing_semicolons(code: &str) -> &str {
    let mut out = code.trim_end();
    while let Some(stripped) = out.strip_suffix(';') {
        out = stripped.trim_end();
    }
    out
}

/// oxc-backed transpiler: TS/JSX module in, plain ECMAScript out.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcTranspiler;

impl ExpressionTranspiler for OxcTranspiler {
    fn transpile(&self, source: &str) -> Result<String, TranspileFailure> {
        let allocator = Allocator::default();
        let source_type = SourceType::mjs().with_typescript(true).with_jsx(true);
        let ret = Parser::new(&allocator, source, source_type).parse();

        if let Some(diagnostic) = ret.errors.first() {
            let offset = diagnostic
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| label.offset())
                .unwrap_or(0);
            let start = byte_offset_to_line_column(source, offset);
            return Err(TranspileFailure {
                start,
                end: start,
                message: diagnostic.message.to_string(),
            });
        }

        let mut program = ret.program;
        let scoping = oxc_semantic::SemanticBuilder::new()
            .with_excess_capacity(2.0)
            .build(&program)
            .semantic
            .into_scoping();

        let mut options = oxc_transformer::TransformOptions::default();
        // Imported identifiers often only appear inside emitted code strings,
        // invisible to semantic analysis; keep value imports regardless.
        options.typescript.only_remove_type_imports = true;
        let _ = oxc_transformer::Transformer::new(&allocator, std::path::Path::new(""), &options)
            .build_with_scoping(scoping, &mut program);

        let codegen_options = oxc_codegen::CodegenOptions {
            // Frontmatter mostly arrives single-quoted; keep it that way so
            // spliced-in rewrites survive re-emission verbatim.
            single_quote: true,
            ..oxc_codegen::CodegenOptions::default()
        };
        let result = Codegen::new().with_options(codegen_options).build(&program);
        Ok(result.code)
    }
}
