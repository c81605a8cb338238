/// Conditional selection and the first-mention / co-reference helpers.

use std::hash::{Hash, Hasher};

use crate::core::choices::Choices;
use crate::core::context::Ctx;
use crate::core::node::{Node, RenderError, Scope};
use crate::core::operation::Expr;
use crate::schema::value::Value;

/// Renders `left` when `cond` is true and `right` otherwise. The side not
/// taken is never rendered.
#[derive(Debug)]
pub struct Branch {
    cond: Node,
    left: Node,
    right: Node,
}

impl Branch {
    pub fn new(cond: impl Into<Node>, left: impl Into<Node>, right: impl Into<Node>) -> Self {
        Self {
            cond: cond.into(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// A branch whose false side renders nothing.
    pub fn when(cond: impl Into<Node>, left: impl Into<Node>) -> Self {
        Self::new(cond, left, Node::empty())
    }

    pub(crate) fn hash_identity<H: Hasher>(&self, state: &mut H) {
        self.cond.key().hash(state);
        self.left.key().hash(state);
        self.right.key().hash(state);
    }

    pub(crate) fn reduce(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        let chosen = match self.cond.reduce(ctx, scope)? {
            Value::Bool(true) => &self.left,
            Value::Bool(false) => &self.right,
            other => return Err(RenderError::NonBooleanCondition(other)),
        };
        chosen.reduce(ctx, scope)
    }
}

/// Render `main` on first mention and a pick from `pool` once `main` is
/// already recorded in the context.
pub fn create_ref(main: impl Into<Node>, pool: impl Into<Node>) -> Node {
    let main = main.into();
    Branch::new(main.in_ctx().not(), main.clone(), pool).into()
}

/// Like [`create_ref`], with the pool built from `alternatives`. A seed
/// makes the alternative picks reproducible.
pub fn create_alt<I, T>(main: impl Into<Node>, alternatives: I, seed: Option<u64>) -> Node
where
    I: IntoIterator<Item = T>,
    T: Into<Node>,
{
    let pool = match seed {
        Some(seed) => Choices::seeded(alternatives, seed),
        None => Choices::new(alternatives),
    };
    create_ref(main, pool)
}

/// Render `node` the first time only; later occurrences render nothing.
pub fn create_once(node: impl Into<Node>) -> Node {
    create_ref(node, Node::empty())
}

/// Multi-way dispatch on `selector`: the first case whose label equals the
/// selector's value wins, falling through to `default`.
pub fn create_match<I, L, T>(selector: impl Into<Node>, default: impl Into<Node>, cases: I) -> Node
where
    I: IntoIterator<Item = (L, T)>,
    L: Into<Value>,
    T: Into<Node>,
{
    let selector = selector.into();
    let cases: Vec<(L, T)> = cases.into_iter().collect();
    cases
        .into_iter()
        .rev()
        .fold(default.into(), |rest, (label, case)| {
            Branch::new(selector.equals(Node::constant(label)), case, rest).into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::Var;
    use crate::core::pipeline::{render, render_with};

    #[test]
    fn unchosen_side_is_never_rendered() {
        let missing = Var::new("missing");
        let branch: Node = Branch::new(Node::constant(false), &missing, "fallback").into();
        assert_eq!(render(&branch).unwrap(), "fallback");

        let branch: Node = Branch::new(Node::constant(true), "taken", &missing).into();
        assert_eq!(render(&branch).unwrap(), "taken");
    }

    #[test]
    fn non_boolean_condition_fails() {
        let branch: Node = Branch::new(Node::constant("yes"), "a", "b").into();
        assert!(matches!(
            render(&branch),
            Err(RenderError::NonBooleanCondition(Value::Str(_)))
        ));
    }

    #[test]
    fn when_renders_empty_on_false() {
        let branch: Node = Branch::when(Node::constant(false), "shown").into();
        assert_eq!(render(&branch).unwrap(), "");
    }

    #[test]
    fn alt_renders_main_then_alternative() {
        let mut ctx = Ctx::new();
        let alt = create_alt("Alice", ["Bob", "Chris"], Some(42));

        assert_eq!(render_with(&alt, &mut ctx).unwrap(), "Alice");
        let second = render_with(&alt, &mut ctx).unwrap();
        assert!(second == "Bob" || second == "Chris", "got {}", second);

        // A fresh context starts over.
        assert_eq!(render(&alt).unwrap(), "Alice");
    }

    #[test]
    fn ref_carries_across_sentences() {
        let r = create_ref("Geralt of Rivia", Choices::new(["Geralt"]));
        let sentence = Node::empty()
            .append("Toss a coin to")
            .then(r.append("."));
        let mut ctx = Ctx::new();

        assert_eq!(
            render_with(&sentence, &mut ctx).unwrap(),
            "Toss a coin to Geralt of Rivia."
        );
        assert_eq!(render_with(&sentence, &mut ctx).unwrap(), "Toss a coin to Geralt.");
        assert_eq!(render_with(&sentence, &mut ctx).unwrap(), "Toss a coin to Geralt.");

        let sentence2 = r.then("is nice.");
        assert_eq!(render_with(&sentence2, &mut ctx).unwrap(), "Geralt is nice.");
    }

    #[test]
    fn once_renders_a_single_time() {
        let once = create_once("Once upon a time,");
        let mut ctx = Ctx::new();
        assert_eq!(render_with(&once, &mut ctx).unwrap(), "Once upon a time,");
        assert_eq!(render_with(&once, &mut ctx).unwrap(), "");
    }

    #[test]
    fn match_picks_first_equal_case() {
        let label = Var::new("time");
        let node = create_match(
            &label,
            "later",
            [("now", "is"), ("soon", "will soon be"), ("now", "unreachable")],
        );

        label.assign("now");
        assert_eq!(render(&node).unwrap(), "is");
        label.assign("soon");
        assert_eq!(render(&node).unwrap(), "will soon be");
        label.assign("evening");
        assert_eq!(render(&node).unwrap(), "later");
    }

    #[test]
    fn match_without_cases_is_default() {
        let label = Var::new("unused");
        let node = create_match(&label, Node::empty(), Vec::<(&str, &str)>::new());
        assert_eq!(render(&node).unwrap(), "");
    }
}
