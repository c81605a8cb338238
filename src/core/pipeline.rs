/// Render entry points: a configured `Renderer` and the free functions
/// built on its defaults.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::context::Ctx;
use crate::core::node::{Node, RenderError, Scope};
use crate::schema::features::Features;
use crate::schema::value::Value;

/// Deepest node nesting a render walk may reach by default.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Settings for a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Nesting limit; deeper walks fail with `DepthExceeded`.
    pub max_depth: usize,
    /// Features seen by phrase elements with no enclosing `LangConfig`.
    pub features: Features,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            features: Features::default(),
        }
    }
}

impl RenderConfig {
    /// Parse a config from a RON string; omitted fields keep their defaults.
    pub fn parse_ron(input: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(input)
    }
}

/// Runs render passes with a fixed configuration. Built via
/// `Renderer::builder()`.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

/// Builder for constructing a `Renderer`.
#[derive(Debug, Default)]
pub struct RendererBuilder {
    config: Option<RenderConfig>,
    max_depth: Option<usize>,
    features: Option<Features>,
}

impl Renderer {
    pub fn builder() -> RendererBuilder {
        RendererBuilder::default()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render `node` to text, recording every visited node in `ctx`.
    pub fn render(&self, node: impl Into<Node>, ctx: &mut Ctx) -> Result<String, RenderError> {
        let text = self.evaluate(node, ctx)?.to_text();
        debug!("rendered {} char(s), context holds {}", text.len(), ctx.len());
        Ok(text)
    }

    /// Reduce `node` to its primitive value without converting to text.
    pub fn evaluate(&self, node: impl Into<Node>, ctx: &mut Ctx) -> Result<Value, RenderError> {
        let scope = Scope::new(self.config.features, self.config.max_depth);
        node.into().reduce(ctx, scope)
    }
}

impl RendererBuilder {
    /// Start from a whole config; individual setters still override it.
    pub fn config(mut self, config: RenderConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn features(mut self, features: Features) -> Self {
        self.features = Some(features);
        self
    }

    pub fn build(self) -> Renderer {
        let mut config = self.config.unwrap_or_default();
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(features) = self.features {
            config.features = features;
        }
        Renderer { config }
    }
}

/// Render `node` against a fresh context.
pub fn render(node: impl Into<Node>) -> Result<String, RenderError> {
    let mut ctx = Ctx::new();
    render_with(node, &mut ctx)
}

/// Render `node` against `ctx`. Reusing one context across calls is what
/// lets later sentences know what earlier ones already mentioned.
pub fn render_with(node: impl Into<Node>, ctx: &mut Ctx) -> Result<String, RenderError> {
    Renderer::default().render(node, ctx)
}
