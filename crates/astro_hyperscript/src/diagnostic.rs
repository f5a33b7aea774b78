//! Error and position types for the codegen.
//!
//! Every fatal error carries the filename, a position in the *original*
//! file's coordinates (fragment offsets already added), an optional code
//! frame rendered from the re-read source text, and a message. Parse errors
//! from oxc are mapped into this shape before reaching the caller.

use oxc_diagnostics::OxcDiagnostic;

/// A source position: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Offset a position reported against a fragment by the fragment's start
    /// position, yielding coordinates in the enclosing file.
    pub fn offset_by(self, fragment_start: Position) -> Position {
        if self.line == 1 {
            Position::new(fragment_start.line, fragment_start.column + self.column)
        } else {
            Position::new(fragment_start.line + self.line - 1, self.column)
        }
    }
}

/// What went wrong, for programmatic matching. The human-readable details
/// live on [`CodegenError`] itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Frontmatter failed to parse.
    Parse,
    /// An expression or the frontmatter failed to transpile.
    Transpile,
    /// A template tag resolved to nothing.
    UnresolvedComponent,
    /// `Astro.fetchContent` called with a non-literal argument.
    FetchContentArgument,
    /// A node built-in module imported without the `node:` scheme.
    BareBuiltinImport,
    /// A `client:*` directive on a component that never ships to the client.
    HydrationDirective,
    /// An external collaborator (Markdown renderer, template re-parser)
    /// failed or was not configured.
    External,
}

/// A fatal error for one document compile.
#[derive(Debug, thiserror::Error)]
#[error("{filename}:{}:{}: {message}", .start.line, .start.column)]
pub struct CodegenError {
    pub kind: ErrorKind,
    pub filename: String,
    pub start: Position,
    pub frame: Option<String>,
    pub message: String,
}

impl CodegenError {
    pub fn new(
        kind: ErrorKind,
        filename: impl Into<String>,
        start: Position,
        message: impl Into<String>,
    ) -> Self {
        let filename = filename.into();
        let frame = read_source(&filename).map(|text| code_frame(&text, start));
        Self {
            kind,
            filename,
            start,
            frame,
            message: message.into(),
        }
    }

    /// Map the first of a batch of oxc diagnostics. `fragment` is the text
    /// that was handed to oxc and `fragment_start` its position in the
    /// original file; label offsets are file-local after the shift.
    pub fn from_oxc(
        kind: ErrorKind,
        filename: &str,
        fragment: &str,
        fragment_start: Position,
        diagnostic: &OxcDiagnostic,
    ) -> Self {
        let local = diagnostic
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| byte_offset_to_line_column(fragment, label.offset()))
            .unwrap_or_default();
        Self::new(
            kind,
            filename,
            local.offset_by(fragment_start),
            diagnostic.message.to_string(),
        )
    }
}

/// Convert a UTF-8 byte offset to a position (1-based line, 0-based column).
pub fn byte_offset_to_line_column(source: &str, offset: usize) -> Position {
    let mut line = 1u32;
    let mut col = 0u32;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    Position::new(line, col)
}

/// Best-effort read of the compiled file's own text. Only the diagnostic
/// path touches the filesystem.
pub fn read_source(filename: &str) -> Option<String> {
    std::fs::read_to_string(filename).ok()
}

/// Render a gutter-numbered excerpt around `start` with a caret line:
///
/// ```text
///   1 | const a = 1;
/// > 2 | const b = ;
///     |           ^
///   3 | const c = 3;
/// ```
pub fn code_frame(source: &str, start: Position) -> String {
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let target = (start.line as usize).clamp(1, lines.len());
    let first = target.saturating_sub(2).max(1);
    let last = (target + 2).min(lines.len());
    let gutter_width = last.to_string().len();

    let mut frame = String::new();
    for number in first..=last {
        let marker = if number == target { ">" } else { " " };
        frame.push_str(&format!(
            "{marker} {number:>gutter_width$} | {}\n",
            lines[number - 1]
        ));
        if number == target {
            let pad = " ".repeat(start.column as usize);
            frame.push_str(&format!("  {} | {pad}^\n", " ".repeat(gutter_width)));
        }
    }
    frame
}
