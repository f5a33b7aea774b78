//! Options for one document compile.
//!
//! Mirrors the driver's external contract: the filename and file id used in
//! diagnostics, the project configuration, and the external collaborators
//! (expression transpiler, Markdown renderer, template re-parser, log sink)
//! supplied as trait objects.

use crate::ast::TemplateNode;
use crate::logging::{LogSink, TracingSink};
use crate::transpile::{ExpressionTranspiler, OxcTranspiler};

/// Errors surfaced by external collaborators.
pub type ExternalError = Box<dyn std::error::Error + Send + Sync>;

/// Renders a Markdown region to HTML. `scope` is the scoped class expression
/// taken from the region's `$scope` attribute, when present.
pub trait MarkdownRenderer {
    fn render(&self, source: &str, scope: Option<&str>) -> Result<String, ExternalError>;
}

/// Re-parses rendered Markdown HTML into template nodes. The returned nodes
/// must already have the template-transform pass applied, i.e. be in the same
/// shape as the parser's primary output.
pub trait TemplateReparser {
    fn reparse(&self, html: &str) -> Result<Vec<TemplateNode>, ExternalError>;
}

/// Project-level configuration the codegen reads.
#[derive(Debug, Clone)]
pub struct AstroConfig {
    /// Absolute project root; stripped from synthesized runtime URLs.
    pub project_root: String,
    /// Absolute pages root; files under it skip the relative-path warning.
    pub pages: String,
}

impl Default for AstroConfig {
    fn default() -> Self {
        Self {
            project_root: "/".to_string(),
            pages: "/src/pages".to_string(),
        }
    }
}

/// Options for compiling one document.
pub struct CompileOptions {
    /// The filename of the component being compiled, used in diagnostics and
    /// runtime URL synthesis.
    pub filename: String,
    /// A stable identifier for the file, used in diagnostics.
    pub file_id: String,
    pub astro_config: AstroConfig,
    /// Base specifier for synthesized runtime imports.
    pub internal_url: String,
    pub transpiler: Box<dyn ExpressionTranspiler>,
    /// Required only when the template contains a Markdown region.
    pub markdown_renderer: Option<Box<dyn MarkdownRenderer>>,
    /// Required only when the template contains a Markdown region.
    pub template_reparser: Option<Box<dyn TemplateReparser>>,
    pub logging: Box<dyn LogSink>,
}

impl CompileOptions {
    pub fn new(filename: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            file_id: file_id.into(),
            astro_config: AstroConfig::default(),
            internal_url: "astro/internal".to_string(),
            transpiler: Box::new(OxcTranspiler),
            markdown_renderer: None,
            template_reparser: None,
            logging: Box::new(TracingSink),
        }
    }

    /// Set the project configuration.
    #[must_use]
    pub fn with_astro_config(mut self, config: AstroConfig) -> Self {
        self.astro_config = config;
        self
    }

    /// Set the base specifier for synthesized runtime imports.
    #[must_use]
    pub fn with_internal_url(mut self, url: impl Into<String>) -> Self {
        self.internal_url = url.into();
        self
    }

    /// Replace the expression transpiler.
    #[must_use]
    pub fn with_transpiler(mut self, transpiler: impl ExpressionTranspiler + 'static) -> Self {
        self.transpiler = Box::new(transpiler);
        self
    }

    /// Set the Markdown renderer.
    #[must_use]
    pub fn with_markdown_renderer(mut self, renderer: impl MarkdownRenderer + 'static) -> Self {
        self.markdown_renderer = Some(Box::new(renderer));
        self
    }

    /// Set the re-parser for rendered Markdown HTML.
    #[must_use]
    pub fn with_template_reparser(mut self, reparser: impl TemplateReparser + 'static) -> Self {
        self.template_reparser = Some(Box::new(reparser));
        self
    }

    /// Replace the log sink.
    #[must_use]
    pub fn with_log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.logging = Box::new(sink);
        self
    }

    /// Whether the compiled file lives under the configured pages root.
    pub(crate) fn is_page_file(&self) -> bool {
        self.filename.starts_with(&self.astro_config.pages)
    }

    // --- Synthesized import lines ---

    pub(crate) fn component_wrapper_import(&self) -> String {
        format!(
            "import {{ __astro_component }} from \"{}/__astro_component.js\";",
            self.internal_url
        )
    }

    pub(crate) fn hydrate_import(&self) -> String {
        format!("import {{ h, Fragment }} from \"{}/h.js\";", self.internal_url)
    }

    pub(crate) fn element_registry_import(&self) -> String {
        format!(
            "import {{ AstroElementRegistry }} from \"{}/element-registry.js\";",
            self.internal_url
        )
    }

    pub(crate) fn fetch_content_import(&self) -> String {
        format!(
            "import {{ fetchContent }} from \"{}/fetch-content.js\";",
            self.internal_url
        )
    }

    pub(crate) fn prism_import(&self) -> &'static str {
        "import Prism from \"astro/components/Prism.astro\";"
    }
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("filename", &self.filename)
            .field("file_id", &self.file_id)
            .field("astro_config", &self.astro_config)
            .field("internal_url", &self.internal_url)
            .field(
                "markdown_renderer",
                &self.markdown_renderer.as_ref().map(|_| "Some(<renderer>)"),
            )
            .field(
                "template_reparser",
                &self.template_reparser.as_ref().map(|_| "Some(<reparser>)"),
            )
            .finish_non_exhaustive()
    }
}
