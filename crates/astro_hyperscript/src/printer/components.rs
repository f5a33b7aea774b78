//! Component resolution, hydration classification, and wrapper synthesis.
//!
//! A template tag resolves against the frontmatter symbol table to one of:
//! an imported component, a frontmatter-defined component, a custom element
//! (hyphenated tag handled through the element registry), or the built-in
//! `Fragment`. Imported components are emitted through an
//! `__astro_component(...)` wrapper that carries the hydration method and the
//! synthesized runtime URL the client uses to fetch the module.

use oxc_span::Span;

use crate::diagnostic::{CodegenError, ErrorKind};
use crate::options::CompileOptions;
use crate::state::{ComponentInfo, ImportSpecifierKind};

use super::{json_string, runtime, TemplatePrinter};

const HYDRATION_METHODS: &[&str] = &["load", "idle", "visible", "media", "only"];

pub(crate) fn is_hydration_method(name: &str) -> bool {
    HYDRATION_METHODS.contains(&name)
}

/// Components start uppercase or use dot (namespace) access.
pub(crate) fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) || name.contains('.')
}

/// Custom elements are lowercase tags containing a hyphen.
pub(crate) fn is_custom_element_name(name: &str) -> bool {
    name.contains('-') && !name.chars().any(|c| c.is_ascii_uppercase())
}

/// Detect the legacy `<Name:method />` hydration form. Returns the bare tag
/// and the method when the suffix is a known hydration method.
pub(crate) fn split_legacy_hydration(name: &str) -> Option<(&str, &str)> {
    let (head, tail) = name.split_once(':')?;
    is_hydration_method(tail).then_some((head, tail))
}

/// A parsed `client:*` directive.
#[derive(Debug, Clone)]
pub(crate) struct Hydration {
    /// The suffix after `client:` (`load`, `idle`, `visible`, `media`, `only`).
    pub method: String,
    /// The directive's value expression, `None` when it was a bare boolean.
    pub value: Option<String>,
}

/// Pull the first `client:<method>` entry out of a resolved attribute map.
pub(crate) fn classify_hydration(attrs: &mut Vec<(String, String)>) -> Option<Hydration> {
    let index = attrs.iter().position(|(name, _)| {
        name.strip_prefix("client:")
            .is_some_and(is_hydration_method)
    })?;
    let (name, value) = attrs.remove(index);
    let method = name["client:".len()..].to_string();
    let value = (value != "true").then_some(value);
    Some(Hydration { method, value })
}

/// What a tag name resolved to.
#[derive(Debug, Clone)]
pub(crate) enum ResolvedComponent {
    Imported(ComponentInfo),
    FrontmatterDefined,
    CustomElement,
    Fragment,
}

/// Synthesize the runtime URL for an imported component: join the specifier
/// against the compiled file's path, strip the project root, rewrite the
/// extension (`.js/.jsx/.ts/.tsx` collapse to `.js`, anything else keeps its
/// extension and gains `.js`), and prefix `/_astro/`.
pub(crate) fn component_url(specifier: &str, options: &CompileOptions) -> String {
    let joined = if specifier.starts_with('.') {
        let dir = std::path::Path::new(&options.filename)
            .parent()
            .unwrap_or_else(|| std::path::Path::new(""));
        normalize_path(&dir.join(specifier))
    } else {
        specifier.to_string()
    };

    let root = options.astro_config.project_root.trim_end_matches('/');
    let local = joined
        .strip_prefix(root)
        .unwrap_or(&joined)
        .trim_start_matches('/');

    let rewritten = match local.rsplit_once('.') {
        Some((stem, ext)) if matches!(ext, "js" | "jsx" | "ts" | "tsx") => format!("{stem}.js"),
        _ => format!("{local}.js"),
    };
    format!("/_astro/{rewritten}")
}

/// Resolve `.` and `..` segments without touching the filesystem.
fn normalize_path(path: &std::path::Path) -> String {
    use std::path::Component;
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                } else {
                    parts.push(component);
                }
            }
            _ => parts.push(component),
        }
    }
    let result: std::path::PathBuf = parts.iter().collect();
    result.to_string_lossy().replace('\\', "/")
}

/// Build the registry-args wrapper for a custom-element tag.
pub(crate) fn custom_element_wrapper(tag: &str, hydration: Option<&Hydration>) -> String {
    let hydrate = hydration.map_or_else(|| "undefined".to_string(), |h| json_string(&h.method));
    format!(
        "{}(...{}.astroComponentArgs({}, {{ hydrate: {}, displayName: {} }}))",
        runtime::COMPONENT,
        runtime::ELEMENT_REGISTRY,
        json_string(tag),
        hydrate,
        json_string(tag)
    )
}

impl TemplatePrinter<'_> {
    /// Resolve a tag name against the frontmatter symbol table.
    pub(super) fn resolve_component(
        &self,
        tag: &str,
        span: Span,
    ) -> Result<ResolvedComponent, CodegenError> {
        let root = tag.split('.').next().unwrap_or(tag);
        if let Some(info) = self.state.components.get(root) {
            return Ok(ResolvedComponent::Imported(info.clone()));
        }
        if self.state.has_custom_elements && is_custom_element_name(tag) {
            return Ok(ResolvedComponent::CustomElement);
        }
        if self.state.declarations.contains(root) {
            return Ok(ResolvedComponent::FrontmatterDefined);
        }
        if tag == "Fragment" {
            return Ok(ResolvedComponent::Fragment);
        }
        Err(CodegenError::new(
            ErrorKind::UnresolvedComponent,
            &self.options.filename,
            self.position_of(span.start),
            format!("Unable to render \"{tag}\" because it is undefined"),
        ))
    }

    /// Build the `__astro_component(...)` wrapper for an imported component.
    pub(super) fn imported_component_wrapper(
        &self,
        tag: &str,
        hydration: Option<&Hydration>,
        info: &ComponentInfo,
    ) -> String {
        let Some(hydration) = hydration else {
            return format!(
                "{}({tag}, {{ hydrate: undefined, displayName: {}, value: null }})",
                runtime::COMPONENT,
                json_string(tag)
            );
        };

        let url = component_url(&info.source_url, self.options);
        let export_name = match info.specifier_kind {
            ImportSpecifierKind::Default => "default".to_string(),
            ImportSpecifierKind::Named => info
                .imported_exported_name
                .clone()
                .unwrap_or_else(|| info.imported_local_name.clone()),
            ImportSpecifierKind::Namespace => {
                tag.split('.').nth(1).unwrap_or(tag).to_string()
            }
        };
        // client:only components never load on the server; the identifier
        // collapses to Fragment and the raw import is dropped by the caller.
        let identifier = if hydration.method == "only" {
            runtime::FRAGMENT
        } else {
            tag
        };
        let value = hydration.value.as_deref().unwrap_or("null");

        format!(
            "{}({identifier}, {{ hydrate: {}, displayName: {}, componentUrl: {}, componentExport: {{\"value\":{}}}, value: {value} }})",
            runtime::COMPONENT,
            json_string(&hydration.method),
            json_string(tag),
            json_string(&url),
            json_string(&export_name)
        )
    }
}
