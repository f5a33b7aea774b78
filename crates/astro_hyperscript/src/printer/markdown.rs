//! Markdown regions.
//!
//! Inside `<Markdown>` the walk stops emitting hyperscript and accumulates
//! raw text into a side buffer. Leaving the outermost region (or hitting an
//! element mid-region) flushes the buffer: dedent, render to HTML through the
//! external renderer, re-parse the HTML into template nodes, run the regular
//! template codegen over them, and splice the result into the ordinary
//! stream.

use crate::ast::Element;
use crate::diagnostic::{CodegenError, ErrorKind, Position};
use crate::state::MarkdownMarker;

use super::{generate_attributes, print_template, Buffer, TemplatePrinter};

/// Strip the common leading indentation from every line.
pub(super) fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|line| if line.len() >= indent { &line[indent..] } else { line.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

impl TemplatePrinter<'_> {
    /// Enter a `<Markdown>` component: bump the region depth, emit any
    /// `Name.__render({attrs})` call for attributed regions, switch the
    /// active buffer, walk the children, and flush on leaving the outermost
    /// region.
    pub(super) fn print_markdown_component(&mut self, el: &Element) -> Result<(), CodegenError> {
        let mut attrs = self.resolve_attributes(&el.attributes)?;
        let scope = attrs
            .iter()
            .find(|(name, _)| name == "$scope")
            .map(|(_, value)| value.clone());
        attrs.retain(|(name, _)| name != "$scope");

        if let Some(marker) = self.state.markers.inside_markdown.as_mut() {
            marker.count += 1;
        } else {
            self.state.markers.inside_markdown = Some(MarkdownMarker { scope, count: 1 });
        }

        if !attrs.is_empty() {
            if self.curr == Buffer::Markdown {
                self.flush_markdown()?;
            }
            self.out.push_str(&format!(
                ",{}.__render({}),",
                el.name,
                generate_attributes(&attrs)
            ));
        }
        self.curr = Buffer::Markdown;

        self.print_children(&el.children, Some(el.name.as_str()))?;

        let left_outermost_region = self
            .state
            .markers
            .inside_markdown
            .as_mut()
            .is_some_and(|marker| {
                marker.count -= 1;
                marker.count == 0
            });
        if left_outermost_region {
            self.flush_markdown()?;
            self.state.markers.inside_markdown = None;
        }
        Ok(())
    }

    /// Render the accumulated Markdown and splice the re-compiled result
    /// into the ordinary stream. Resets the buffer and reactivates it.
    pub(super) fn flush_markdown(&mut self) -> Result<(), CodegenError> {
        self.curr = Buffer::Out;
        let text = std::mem::take(&mut self.markdown);
        if text.trim().is_empty() {
            return Ok(());
        }

        let scope = self
            .state
            .markers
            .inside_markdown
            .as_ref()
            .and_then(|marker| marker.scope.clone());

        let renderer = self
            .options
            .markdown_renderer
            .as_deref()
            .ok_or_else(|| self.external_error("no Markdown renderer configured"))?;
        let rendered = renderer
            .render(&dedent(&text), scope.as_deref())
            .map_err(|error| self.external_error(format!("Markdown render failed: {error}")))?;

        let reparser = self
            .options
            .template_reparser
            .as_deref()
            .ok_or_else(|| self.external_error("no template re-parser configured"))?;
        let nodes = reparser
            .reparse(&rendered)
            .map_err(|error| self.external_error(format!("Markdown re-parse failed: {error}")))?;

        // The rendered subtree compiles as ordinary template, outside any
        // Markdown region.
        let saved = self.state.markers.inside_markdown.take();
        let spliced = print_template(&nodes, &mut *self.state, self.options)?;
        self.state.markers.inside_markdown = saved;

        self.out.push(',');
        self.out.push_str(&spliced);
        Ok(())
    }

    fn external_error(&self, message: impl Into<String>) -> CodegenError {
        CodegenError::new(
            ErrorKind::External,
            &self.options.filename,
            Position::new(1, 0),
            message,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedent_strips_the_common_indent() {
        assert_eq!(dedent("  # Hi\n\n  text"), "# Hi\n\ntext");
        assert_eq!(dedent("    a\n      b"), "a\n  b");
        assert_eq!(dedent("a\nb"), "a\nb");
    }
}
