//! CSS extraction.
//!
//! Styles are collected verbatim; minification and global-file assembly
//! happen downstream. The parser already lifts `<style>` blocks out of the
//! template; any `Style` node it left inline is picked up by the template
//! walk instead, which skips the subtree so nothing is inlined twice.

use crate::ast::Document;
use crate::state::CodegenState;

/// Append the document's style blocks to `state.css`, in document order.
pub(crate) fn extract(document: &Document, state: &mut CodegenState) {
    for style in &document.styles {
        state.css.push(style.content.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Style;
    use oxc_span::Span;

    #[test]
    fn styles_are_collected_in_order() {
        let document = Document {
            styles: vec![
                Style {
                    content: ".a { color: red; }".to_string(),
                    span: Span::new(0, 0),
                },
                Style {
                    content: ".b { color: blue; }".to_string(),
                    span: Span::new(0, 0),
                },
            ],
            ..Document::default()
        };
        let mut state = CodegenState::new("a.astro", "a");
        extract(&document, &mut state);
        assert_eq!(state.css.len(), 2);
        assert!(state.css[0].contains(".a"));
        assert!(state.css[1].contains(".b"));
    }
}
