/// Renderable expression trees: the `Node` handle, leaf kinds, identity
/// keys, and the recursive render walk.

use log::trace;
use rustc_hash::FxHasher;
use std::cell::{OnceCell, RefCell};
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::core::branching::Branch;
use crate::core::choices::Choices;
use crate::core::context::{Ctx, NodeKey};
use crate::core::enumeration::Enumeration;
use crate::core::injector::{Injector, Repeat};
use crate::core::operation::{Op, Operation};
use crate::core::phrase::{LangConfig, PhraseElement};
use crate::schema::features::Features;
use crate::schema::value::Value;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("variable '{0}' rendered before a value was assigned")]
    UnassignedVariable(String),
    #[error("operation '{op}' takes {expected} operand(s), got {found}")]
    InvalidOperationArity { op: Op, expected: usize, found: usize },
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
    #[error("injector rendered with no pending records")]
    EmptyInjectorQueue,
    #[error("cannot use {0} as a literal value")]
    InvalidCast(String),
    #[error("operation '{op}' cannot be applied to {found}")]
    TypeMismatch { op: Op, found: String },
    #[error("branch condition must be a boolean, got {0:?}")]
    NonBooleanCondition(Value),
    #[error("render walk exceeded {0} nested nodes")]
    DepthExceeded(usize),
}

/// State carried down one render walk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope {
    pub features: Features,
    depth: usize,
    max_depth: usize,
}

impl Scope {
    pub(crate) fn new(features: Features, max_depth: usize) -> Self {
        Self {
            features,
            depth: 0,
            max_depth,
        }
    }

    pub(crate) fn with_features(self, features: Features) -> Self {
        Self { features, ..self }
    }

    fn descend(self) -> Result<Self, RenderError> {
        if self.depth >= self.max_depth {
            return Err(RenderError::DepthExceeded(self.max_depth));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }
}

/// A renderable tree element.
///
/// `Node` is a cheap, shared handle: cloning it shares the underlying
/// element, including any mutable state it carries (a `Choices`
/// generator, a `Var` slot, an `Injector` queue).
#[derive(Debug, Clone)]
pub struct Node(Rc<NodeInner>);

#[derive(Debug)]
struct NodeInner {
    kind: NodeKind,
    key: OnceCell<NodeKey>,
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Const(Value),
    Var(Var),
    Concat { items: Vec<Node>, sep: String },
    Sentence(Node),
    Operation(Operation),
    Branch(Branch),
    Choices(Choices),
    Enumeration(Enumeration),
    Phrase(PhraseElement),
    LangConfig(LangConfig),
    Injector(Injector),
    Repeat(Repeat),
}

impl NodeKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Const(_) => "const",
            Self::Var(_) => "var",
            Self::Concat { .. } => "concat",
            Self::Sentence(_) => "sentence",
            Self::Operation(_) => "operation",
            Self::Branch(_) => "branch",
            Self::Choices(_) => "choices",
            Self::Enumeration(_) => "enumeration",
            Self::Phrase(_) => "phrase",
            Self::LangConfig(_) => "lang-config",
            Self::Injector(_) => "injector",
            Self::Repeat(_) => "repeat",
        }
    }

    fn hash_identity<H: Hasher>(&self, state: &mut H) {
        self.label().hash(state);
        match self {
            Self::Const(v) => hash_value(v, state),
            Self::Var(var) => var.name().hash(state),
            Self::Concat { items, sep } => {
                sep.hash(state);
                hash_nodes(items, state);
            }
            Self::Sentence(child) => child.key().hash(state),
            Self::Operation(op) => op.hash_identity(state),
            Self::Branch(b) => b.hash_identity(state),
            Self::Choices(c) => hash_nodes(c.items(), state),
            Self::Enumeration(e) => e.hash_identity(state),
            Self::Phrase(p) => p.hash_identity(state),
            Self::LangConfig(c) => c.body().key().hash(state),
            Self::Injector(i) => i.hash_identity(state),
            Self::Repeat(r) => r.hash_identity(state),
        }
    }
}

pub(crate) fn hash_nodes<H: Hasher>(nodes: &[Node], state: &mut H) {
    nodes.len().hash(state);
    for node in nodes {
        node.key().hash(state);
    }
}

fn hash_value<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Bool(b) => b.hash(state),
        Value::Int(i) => i.hash(state),
        Value::Float(x) => x.to_bits().hash(state),
        Value::Str(s) => s.hash(state),
    }
}

impl Node {
    pub(crate) fn from_kind(kind: NodeKind) -> Self {
        Self(Rc::new(NodeInner {
            kind,
            key: OnceCell::new(),
        }))
    }

    /// A literal leaf.
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::from_kind(NodeKind::Const(value.into()))
    }

    /// The empty string literal.
    pub fn empty() -> Self {
        Self::constant("")
    }

    /// Render every item in order and join their text with `sep`.
    pub fn concat<I, T>(items: I, sep: &str) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        Self::from_kind(NodeKind::Concat {
            items: items.into_iter().map(Into::into).collect(),
            sep: sep.to_string(),
        })
    }

    /// `self` followed by `rhs`, joined with `sep`. A concatenation with the
    /// same separator gains `rhs` as one more item, so chained words stay
    /// one level deep however long the chain grows.
    pub(crate) fn joined(&self, rhs: Node, sep: &str) -> Node {
        let items = match &self.0.kind {
            NodeKind::Concat { items, sep: own } if own == sep => {
                let mut items = items.clone();
                items.push(rhs);
                items
            }
            _ => vec![self.clone(), rhs],
        };
        Self::from_kind(NodeKind::Concat {
            items,
            sep: sep.to_string(),
        })
    }

    /// Identity key recorded in a [`Ctx`]. Computed once; the parts of a
    /// node that can change after construction never feed into it.
    pub fn key(&self) -> NodeKey {
        *self.0.key.get_or_init(|| {
            let mut hasher = FxHasher::default();
            self.0.kind.hash_identity(&mut hasher);
            NodeKey(hasher.finish())
        })
    }

    /// The literal value, if this node is a constant.
    pub fn as_const(&self) -> Option<&Value> {
        match &self.0.kind {
            NodeKind::Const(v) => Some(v),
            _ => None,
        }
    }

    /// Reduce this node to a primitive with the default render settings.
    pub fn evaluate(&self, ctx: &mut Ctx) -> Result<Value, RenderError> {
        crate::core::pipeline::Renderer::default().evaluate(self, ctx)
    }

    /// The render walk. Children are reduced first; the node itself is
    /// recorded in `ctx` once it has produced its value.
    pub(crate) fn reduce(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        let scope = scope.descend()?;
        trace!("render {} {:?}", self.0.kind.label(), self.key());

        let value = match &self.0.kind {
            NodeKind::Const(v) => v.clone(),
            NodeKind::Var(var) => var.reduce(ctx, scope)?,
            NodeKind::Concat { items, sep } => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(item.reduce(ctx, scope)?.to_text());
                }
                Value::Str(parts.join(sep))
            }
            NodeKind::Sentence(child) => {
                Value::Str(to_sentence(&child.reduce(ctx, scope)?.to_text()))
            }
            NodeKind::Operation(op) => op.evaluate(ctx, scope)?,
            NodeKind::Branch(b) => b.reduce(ctx, scope)?,
            NodeKind::Choices(c) => c.reduce(ctx, scope)?,
            NodeKind::Enumeration(e) => e.reduce(ctx, scope)?,
            NodeKind::Phrase(p) => p.reduce(scope),
            NodeKind::LangConfig(c) => c.reduce(ctx, scope)?,
            NodeKind::Injector(i) => i.reduce(ctx, scope)?,
            NodeKind::Repeat(r) => r.reduce(ctx, scope)?,
        };

        ctx.add(self);
        Ok(value)
    }
}

/// Upper-case the first character and close with a full stop.
fn to_sentence(text: &str) -> String {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out: String = first.to_uppercase().collect();
    out.push_str(chars.as_str());
    if !out.ends_with(|c: char| matches!(c, '.' | '!' | '?')) {
        out.push('.');
    }
    out
}

static ANONYMOUS_VARS: AtomicU64 = AtomicU64::new(0);

/// A named, mutable slot. Clones share the slot, so a template built from
/// a `Var` sees every later `assign`.
#[derive(Debug, Clone)]
pub struct Var(Rc<VarInner>);

#[derive(Debug)]
struct VarInner {
    name: String,
    value: RefCell<Option<Node>>,
}

impl Var {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(VarInner {
            name: name.into(),
            value: RefCell::new(None),
        }))
    }

    /// A variable with a generated, process-unique name.
    pub fn anonymous() -> Self {
        let id = ANONYMOUS_VARS.fetch_add(1, Ordering::Relaxed);
        Self::new(format!("#{}", id))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn assign(&self, value: impl Into<Node>) -> &Self {
        *self.0.value.borrow_mut() = Some(value.into());
        self
    }

    pub fn clear(&self) -> &Self {
        *self.0.value.borrow_mut() = None;
        self
    }

    pub fn is_assigned(&self) -> bool {
        self.0.value.borrow().is_some()
    }

    pub fn value(&self) -> Option<Node> {
        self.0.value.borrow().clone()
    }

    fn reduce(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        // Clone the handle out so the slot is not borrowed while the value
        // renders; an injector below may reassign it.
        let value = self
            .value()
            .ok_or_else(|| RenderError::UnassignedVariable(self.0.name.clone()))?;
        value.reduce(ctx, scope)
    }
}

impl From<Value> for Node {
    fn from(v: Value) -> Self {
        Node::constant(v)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::constant(s)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::constant(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::constant(b)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::constant(i)
    }
}

impl From<i32> for Node {
    fn from(i: i32) -> Self {
        Node::constant(i)
    }
}

impl From<f64> for Node {
    fn from(x: f64) -> Self {
        Node::constant(x)
    }
}

impl From<&Node> for Node {
    fn from(n: &Node) -> Self {
        n.clone()
    }
}

impl From<Var> for Node {
    fn from(v: Var) -> Self {
        Node::from_kind(NodeKind::Var(v))
    }
}

impl From<&Var> for Node {
    fn from(v: &Var) -> Self {
        Node::from_kind(NodeKind::Var(v.clone()))
    }
}

impl From<Operation> for Node {
    fn from(op: Operation) -> Self {
        Node::from_kind(NodeKind::Operation(op))
    }
}

impl From<Branch> for Node {
    fn from(b: Branch) -> Self {
        Node::from_kind(NodeKind::Branch(b))
    }
}

impl From<Choices> for Node {
    fn from(c: Choices) -> Self {
        Node::from_kind(NodeKind::Choices(c))
    }
}

impl From<Enumeration> for Node {
    fn from(e: Enumeration) -> Self {
        Node::from_kind(NodeKind::Enumeration(e))
    }
}

impl From<PhraseElement> for Node {
    fn from(p: PhraseElement) -> Self {
        Node::from_kind(NodeKind::Phrase(p))
    }
}

impl From<LangConfig> for Node {
    fn from(c: LangConfig) -> Self {
        Node::from_kind(NodeKind::LangConfig(c))
    }
}

impl From<&LangConfig> for Node {
    fn from(c: &LangConfig) -> Self {
        Node::from_kind(NodeKind::LangConfig(c.clone()))
    }
}

impl From<Injector> for Node {
    fn from(i: Injector) -> Self {
        Node::from_kind(NodeKind::Injector(i))
    }
}

impl From<&Injector> for Node {
    fn from(i: &Injector) -> Self {
        Node::from_kind(NodeKind::Injector(i.clone()))
    }
}

impl From<Repeat> for Node {
    fn from(r: Repeat) -> Self {
        Node::from_kind(NodeKind::Repeat(r))
    }
}

impl From<&Repeat> for Node {
    fn from(r: &Repeat) -> Self {
        Node::from_kind(NodeKind::Repeat(r.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::operation::Expr;
    use crate::core::pipeline::{render, render_with, Renderer};

    #[test]
    fn const_renders_its_value() {
        assert_eq!(render(Node::constant("Alice")).unwrap(), "Alice");
        assert_eq!(render(Node::constant(3)).unwrap(), "3");
        assert_eq!(render(Node::empty()).unwrap(), "");
    }

    #[test]
    fn equal_literals_share_identity() {
        assert_eq!(Node::constant("Alice").key(), Node::constant("Alice").key());
        assert_ne!(Node::constant("Alice").key(), Node::constant("Bob").key());
        assert_ne!(Node::constant(1).key(), Node::constant("1").key());
    }

    #[test]
    fn unassigned_var_fails() {
        let x = Var::new("name");
        let err = render(&x).unwrap_err();
        assert!(matches!(err, RenderError::UnassignedVariable(ref n) if n == "name"));
    }

    #[test]
    fn var_identity_is_stable_across_assignment() {
        let x = Var::new("name");
        let before = Node::from(&x).key();
        x.assign("Alice");
        assert_eq!(Node::from(&x).key(), before);
        x.assign("Bob");
        assert_eq!(Node::from(&x).key(), before);
    }

    #[test]
    fn anonymous_vars_are_distinct() {
        let a = Var::anonymous();
        let b = Var::anonymous();
        assert_ne!(a.name(), b.name());
        assert_ne!(Node::from(&a).key(), Node::from(&b).key());
    }

    #[test]
    fn reassignment_changes_later_renders() {
        let x = Var::new("name");
        let node = x.then("is a").then("person.");
        let mut ctx = Ctx::new();

        x.assign("Alice");
        assert_eq!(render_with(&node, &mut ctx).unwrap(), "Alice is a person.");

        x.assign("Bob");
        assert_eq!(render_with(&node, &mut ctx).unwrap(), "Bob is a person.");
    }

    #[test]
    fn concat_with_and_without_separator() {
        let node = Node::concat(["Toss", "a", "coin"], " ");
        assert_eq!(render(node).unwrap(), "Toss a coin");

        let node = Node::constant("Geralt").append(".");
        assert_eq!(render(node).unwrap(), "Geralt.");
    }

    #[test]
    fn long_word_chains_render_flat() {
        let mut node = Node::constant("w0");
        for i in 1..1000 {
            node = node.then(format!("w{}", i));
        }
        match &node.0.kind {
            NodeKind::Concat { items, sep } => {
                assert_eq!(items.len(), 1000);
                assert_eq!(sep, " ");
            }
            other => panic!("expected a concatenation, got {:?}", other),
        }

        let expected: Vec<String> = (0..1000).map(|i| format!("w{}", i)).collect();
        assert_eq!(render(&node).unwrap(), expected.join(" "));

        let mut glued = Node::empty();
        for _ in 0..600 {
            glued = glued.append("ab");
        }
        assert_eq!(render(&glued).unwrap(), "ab".repeat(600));
    }

    #[test]
    fn chaining_leaves_the_prefix_untouched() {
        let prefix = Node::constant("Alice").then("is");
        let good = prefix.then("good.");
        let bad = prefix.then("bad.");
        assert_eq!(render(&prefix).unwrap(), "Alice is");
        assert_eq!(render(&good).unwrap(), "Alice is good.");
        assert_eq!(render(&bad).unwrap(), "Alice is bad.");

        // A different separator nests instead of extending.
        let mixed = prefix.append("!");
        assert_eq!(render(&mixed).unwrap(), "Alice is!");
    }

    #[test]
    fn sentence_capitalizes_and_closes() {
        let node = Node::empty().append("this is a phrase").sentence();
        assert_eq!(render(node).unwrap(), "This is a phrase.");

        let node = Node::constant("really?").sentence();
        assert_eq!(render(node).unwrap(), "Really?");

        assert_eq!(render(Node::empty().sentence()).unwrap(), "");
    }

    #[test]
    fn rendered_nodes_are_recorded() {
        let k = Node::constant("Alice");
        let mut ctx = Ctx::new();
        assert!(!ctx.contains(&k));

        render_with(&k, &mut ctx).unwrap();
        assert!(ctx.contains(&k));
        assert!(!Ctx::new().contains(&k));
    }

    #[test]
    fn self_referencing_var_hits_depth_limit() {
        let x = Var::new("loop");
        x.assign(&x);
        let renderer = Renderer::builder().max_depth(32).build();
        let err = renderer.render(&x, &mut Ctx::new()).unwrap_err();
        assert!(matches!(err, RenderError::DepthExceeded(32)));
    }

    #[test]
    fn to_sentence_keeps_unicode() {
        assert_eq!(to_sentence("ótimo dia"), "Ótimo dia.");
    }
}
