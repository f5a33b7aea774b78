//! Attribute resolution.
//!
//! Converts an element's parsed attribute nodes into an ordered
//! `(name, code)` map. Every value becomes a JavaScript expression fragment:
//! quoted text is JSON-stringified, embedded expressions are transpiled, and
//! mixed values are joined with `+`.

use crate::ast::{AttributeItem, AttributeSegment, AttributeValue};
use crate::diagnostic::CodegenError;
use crate::logging::LogEvent;
use crate::transpile::transpile_fragment;

use super::{json_string, TemplatePrinter};

/// Remove the `slot` entry from a resolved attribute map, returning its
/// value expression so the element can be wrapped in slot content.
pub(super) fn take_slot_attribute(attrs: &mut Vec<(String, String)>) -> Option<String> {
    let index = attrs.iter().position(|(name, _)| name == "slot")?;
    Some(attrs.remove(index).1)
}

impl TemplatePrinter<'_> {
    /// Resolve every attribute on a node into `(name, code)` entries,
    /// preserving document order.
    pub(super) fn resolve_attributes(
        &self,
        attrs: &[AttributeItem],
    ) -> Result<Vec<(String, String)>, CodegenError> {
        let mut resolved = Vec::with_capacity(attrs.len());

        for item in attrs {
            match item {
                AttributeItem::Spread(spread) => {
                    let code = transpile_fragment(self.options, &spread.expression, spread.span)?;
                    resolved.push((format!("...({code})"), String::new()));
                }
                AttributeItem::Shorthand(shorthand) => {
                    resolved.push((shorthand.name.clone(), format!("({})", shorthand.name)));
                }
                AttributeItem::Attribute(attr) => match &attr.value {
                    AttributeValue::True => {
                        resolved.push((attr.name.clone(), "true".to_string()));
                    }
                    AttributeValue::False => {}
                    AttributeValue::Segments(segments) if segments.is_empty() => {
                        resolved.push((attr.name.clone(), "\"\"".to_string()));
                    }
                    AttributeValue::Segments(segments) if segments.len() == 1 => {
                        match &segments[0] {
                            AttributeSegment::Text { raw, span } => {
                                self.warn_if_relative_path(&attr.name, raw, span.start);
                                resolved.push((attr.name.clone(), json_string(raw)));
                            }
                            AttributeSegment::MustacheTag { expression, span } => {
                                let code =
                                    transpile_fragment(self.options, expression, *span)?;
                                resolved.push((attr.name.clone(), format!("({code})")));
                            }
                            AttributeSegment::Expression { code_chunks, .. } => {
                                let chunk = code_chunks.first().cloned().unwrap_or_default();
                                resolved.push((attr.name.clone(), format!("({chunk})")));
                            }
                        }
                    }
                    AttributeValue::Segments(segments) => {
                        let mut parts = Vec::with_capacity(segments.len());
                        for segment in segments {
                            parts.push(match segment {
                                AttributeSegment::Text { raw, .. } => json_string(raw),
                                AttributeSegment::MustacheTag { expression, span } => {
                                    transpile_fragment(self.options, expression, *span)?
                                }
                                AttributeSegment::Expression { code_chunks, .. } => {
                                    code_chunks.first().cloned().unwrap_or_default()
                                }
                            });
                        }
                        resolved.push((attr.name.clone(), format!("({})", parts.join("+"))));
                    }
                },
            }
        }

        Ok(resolved)
    }

    /// Relative string literals usually break once the bundler moves the
    /// emitted module; warn unless this is a page file, where they resolve.
    fn warn_if_relative_path(&self, name: &str, value: &str, offset: u32) {
        if self.options.is_page_file() {
            return;
        }
        if value.starts_with("./") || value.starts_with("../") {
            self.options.logging.warn(LogEvent {
                filename: &self.options.filename,
                frame: None,
                start: Some(self.position_of(offset)),
                message: &format!(
                    "Relative path \"{value}\" in attribute \"{name}\" will not resolve from a component; use Astro.resolve() or an absolute path"
                ),
            });
        }
    }
}
