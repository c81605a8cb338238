/// Grammatical agreement: phrase elements that realize differently
/// depending on the language, number, person and gender worn by the
/// subtree they render in.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::core::context::Ctx;
use crate::core::node::{Node, RenderError, Scope};
use crate::schema::features::{Feature, FeatureSet, Features, GNumber, GPerson, Gender, Lang};
use crate::schema::value::Value;

/// Syntactic role of a phrase element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhraseKind {
    /// NP
    Noun,
    /// VP
    Verb,
}

impl Default for PhraseKind {
    fn default() -> Self {
        Self::Noun
    }
}

/// A lexical item: a base form plus alternate realizations keyed by
/// feature sets.
///
/// At render time the mapping whose key shares the most features with
/// the active set wins; ties go to the earliest declared mapping, and
/// the base form is used when no key shares any feature.
#[derive(Debug, Clone)]
pub struct PhraseElement {
    kind: PhraseKind,
    base: String,
    mappings: IndexMap<FeatureSet, String>,
    stack: Vec<Vec<Feature>>,
}

impl PhraseElement {
    pub fn new(kind: PhraseKind, base: impl Into<String>) -> Self {
        Self {
            kind,
            base: base.into(),
            mappings: IndexMap::new(),
            stack: Vec::new(),
        }
    }

    pub fn noun(base: impl Into<String>) -> Self {
        Self::new(PhraseKind::Noun, base)
    }

    pub fn verb(base: impl Into<String>) -> Self {
        Self::new(PhraseKind::Verb, base)
    }

    /// Register `text` for `features` plus every feature on the stack.
    /// Re-registering an identical key replaces the text in place.
    pub fn add_mapping(mut self, text: impl Into<String>, features: &[Feature]) -> Self {
        let key: FeatureSet = features
            .iter()
            .copied()
            .chain(self.stack.iter().flatten().copied())
            .collect();
        self.mappings.insert(key, text.into());
        self
    }

    /// Push a frame of features shared by the mappings added after it.
    pub fn push(mut self, features: &[Feature]) -> Self {
        self.stack.push(features.to_vec());
        self
    }

    /// Drop the most recently pushed frame.
    pub fn pop(mut self) -> Self {
        self.stack.pop();
        self
    }

    pub fn clear(mut self) -> Self {
        self.stack.clear();
        self
    }

    pub fn kind(&self) -> PhraseKind {
        self.kind
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Mappings in declaration order.
    pub fn mappings(&self) -> impl Iterator<Item = (&FeatureSet, &str)> {
        self.mappings.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// The realization chosen for `active`.
    pub fn resolve(&self, active: &Features) -> &str {
        let mut best: Option<(&str, usize)> = None;
        for (key, text) in &self.mappings {
            let score = active.overlap(key);
            if score > best.map_or(0, |(_, s)| s) {
                best = Some((text.as_str(), score));
            }
        }
        best.map_or(self.base.as_str(), |(text, _)| text)
    }

    pub(crate) fn hash_identity<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.base.hash(state);
        for (key, text) in &self.mappings {
            key.hash(state);
            text.hash(state);
        }
    }

    pub(crate) fn reduce(&self, scope: Scope) -> Value {
        let text = self.resolve(&scope.features);
        debug!(
            "{:?} '{}' resolved to '{}' under {:?}",
            self.kind, self.base, text, scope.features
        );
        Value::Str(text.to_string())
    }
}

/// Ambient grammatical features attached to a subtree.
///
/// Clones share the features, so a host can hold a `LangConfig`, change
/// its language or person between renders, and re-render the same tree.
#[derive(Debug, Clone)]
pub struct LangConfig(Rc<LangConfigInner>);

#[derive(Debug)]
struct LangConfigInner {
    body: Node,
    features: Cell<Features>,
}

impl LangConfig {
    /// English, singular, first person, neutral.
    pub fn new(body: impl Into<Node>) -> Self {
        Self::with_features(body, Features::default())
    }

    pub fn with_features(body: impl Into<Node>, features: Features) -> Self {
        Self(Rc::new(LangConfigInner {
            body: body.into(),
            features: Cell::new(features),
        }))
    }

    /// Default features in the language named by `tag`.
    pub fn with_tag(body: impl Into<Node>, tag: &str) -> Result<Self, RenderError> {
        let features = Features {
            lang: tag.parse()?,
            ..Features::default()
        };
        Ok(Self::with_features(body, features))
    }

    pub fn body(&self) -> &Node {
        &self.0.body
    }

    pub fn features(&self) -> Features {
        self.0.features.get()
    }

    pub fn set_features(&self, features: Features) -> &Self {
        self.0.features.set(features);
        self
    }

    pub fn set_lang(&self, lang: Lang) -> &Self {
        self.set_features(Features {
            lang,
            ..self.features()
        })
    }

    pub fn set_number(&self, number: GNumber) -> &Self {
        self.set_features(Features {
            number,
            ..self.features()
        })
    }

    pub fn set_person(&self, person: GPerson) -> &Self {
        self.set_features(Features {
            person,
            ..self.features()
        })
    }

    pub fn set_gender(&self, gender: Gender) -> &Self {
        self.set_features(Features {
            gender,
            ..self.features()
        })
    }

    pub(crate) fn reduce(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        self.0.body.reduce(ctx, scope.with_features(self.features()))
    }
}
