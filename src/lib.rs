//! Aida: composable expression trees for natural-language text generation.
//!
//! Trees of nodes evaluate conditions, pick among alternatives, remember
//! what has already been mentioned, and resolve grammatical agreement
//! (language, number, person, gender) when rendered to text.

pub mod core;
pub mod schema;

pub use crate::core::branching::{create_alt, create_match, create_once, create_ref, Branch};
pub use crate::core::choices::Choices;
pub use crate::core::context::{Ctx, NodeKey};
pub use crate::core::enumeration::Enumeration;
pub use crate::core::injector::{Injector, Repeat};
pub use crate::core::lexicon::{records_from_ron, Lexicon, LexiconError};
pub use crate::core::node::{Node, RenderError, Var};
pub use crate::core::operation::{Expr, Op, Operation};
pub use crate::core::phrase::{LangConfig, PhraseElement, PhraseKind};
pub use crate::core::pipeline::{render, render_with, RenderConfig, Renderer, RendererBuilder};
pub use crate::schema::features::{Feature, FeatureSet, Features, GNumber, GPerson, Gender, Lang};
pub use crate::schema::value::{Record, Value};
