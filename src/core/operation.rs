/// Lazily evaluated expressions used as branch conditions.
///
/// Building `x.gt(3).and(t.equals(true))` only constructs a tree; nothing is
/// evaluated until the enclosing node renders.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core::context::Ctx;
use crate::core::injector::{Injector, Repeat};
use crate::core::node::{hash_nodes, Node, NodeKind, RenderError, Scope, Var};
use crate::core::phrase::LangConfig;
use crate::schema::value::Value;

/// Operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    And,
    Or,
    Not,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    Add,
    /// Membership of the operand's identity in the render context. The
    /// context itself is the implicit second operand.
    InCtx,
}

impl Op {
    /// Number of node operands the operation takes.
    pub fn arity(&self) -> usize {
        match self {
            Self::Not | Self::InCtx => 1,
            _ => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Add => "add",
            Self::InCtx => "in_ctx",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation code applied to its operand nodes.
#[derive(Debug)]
pub struct Operation {
    op: Op,
    operands: Vec<Node>,
}

impl Operation {
    /// Build an operation, checking the operand count against the op's arity.
    pub fn new(op: Op, operands: Vec<Node>) -> Result<Self, RenderError> {
        if operands.len() != op.arity() {
            return Err(RenderError::InvalidOperationArity {
                op,
                expected: op.arity(),
                found: operands.len(),
            });
        }
        Ok(Self { op, operands })
    }

    fn binary(op: Op, lhs: Node, rhs: Node) -> Node {
        Self {
            op,
            operands: vec![lhs, rhs],
        }
        .into()
    }

    fn unary(op: Op, operand: Node) -> Node {
        Self {
            op,
            operands: vec![operand],
        }
        .into()
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operands(&self) -> &[Node] {
        &self.operands
    }

    pub(crate) fn hash_identity<H: Hasher>(&self, state: &mut H) {
        self.op.hash(state);
        hash_nodes(&self.operands, state);
    }

    pub(crate) fn evaluate(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        match (self.op, self.operands.as_slice()) {
            (Op::InCtx, [target]) => Ok(Value::Bool(ctx.contains(target))),
            (Op::Not, [operand]) => match operand.reduce(ctx, scope)? {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(RenderError::TypeMismatch {
                    op: Op::Not,
                    found: other.kind().to_string(),
                }),
            },
            (op, [lhs, rhs]) if op.arity() == 2 => {
                let lhs = lhs.reduce(ctx, scope)?;
                let rhs = rhs.reduce(ctx, scope)?;
                apply(op, lhs, rhs)
            }
            (op, operands) => Err(RenderError::InvalidOperationArity {
                op,
                expected: op.arity(),
                found: operands.len(),
            }),
        }
    }
}

fn mismatch(op: Op, lhs: &Value, rhs: &Value) -> RenderError {
    RenderError::TypeMismatch {
        op,
        found: format!("{} and {}", lhs.kind(), rhs.kind()),
    }
}

fn apply(op: Op, lhs: Value, rhs: Value) -> Result<Value, RenderError> {
    match op {
        Op::And => match (&lhs, &rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a && *b)),
            _ => Err(mismatch(op, &lhs, &rhs)),
        },
        // Logical on two booleans, space-separated text otherwise.
        Op::Or => match (&lhs, &rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(*a || *b)),
            _ => Ok(Value::Str(format!("{} {}", lhs, rhs))),
        },
        Op::Add => add(lhs, rhs),
        Op::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        Op::Ne => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        Op::Gt | Op::Ge | Op::Lt | Op::Le => {
            let ordering = compare(op, &lhs, &rhs)?;
            let result = match (op, ordering) {
                (_, None) => false,
                (Op::Gt, Some(o)) => o == Ordering::Greater,
                (Op::Ge, Some(o)) => o != Ordering::Less,
                (Op::Lt, Some(o)) => o == Ordering::Less,
                (_, Some(o)) => o != Ordering::Greater,
            };
            Ok(Value::Bool(result))
        }
        Op::Not | Op::InCtx => Err(RenderError::InvalidOperationArity {
            op,
            expected: op.arity(),
            found: 2,
        }),
    }
}

fn add(lhs: Value, rhs: Value) -> Result<Value, RenderError> {
    match (&lhs, &rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(a
            .checked_add(*b)
            .map(Value::Int)
            .unwrap_or(Value::Float(*a as f64 + *b as f64))),
        (Value::Bool(_), _) | (_, Value::Bool(_)) => Err(mismatch(Op::Add, &lhs, &rhs)),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Ok(Value::Str(format!("{}{}", lhs, rhs))),
        },
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a == b,
        _ if lhs.is_numeric() && rhs.is_numeric() => lhs.as_f64() == rhs.as_f64(),
        _ => lhs == rhs,
    }
}

fn compare(op: Op, lhs: &Value, rhs: &Value) -> Result<Option<Ordering>, RenderError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
            _ => Err(mismatch(op, lhs, rhs)),
        },
    }
}

/// Builders for operation and concatenation trees.
///
/// Implemented by every handle that can stand in an expression; each
/// method returns a new node and evaluates nothing.
pub trait Expr {
    fn to_node(&self) -> Node;

    fn and(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::And, self.to_node(), rhs.into())
    }

    /// Logical OR of two booleans; for any other operands, their text
    /// joined by a single space.
    fn or(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::Or, self.to_node(), rhs.into())
    }

    fn not(&self) -> Node {
        Operation::unary(Op::Not, self.to_node())
    }

    fn gt(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::Gt, self.to_node(), rhs.into())
    }

    fn ge(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::Ge, self.to_node(), rhs.into())
    }

    fn lt(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::Lt, self.to_node(), rhs.into())
    }

    fn le(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::Le, self.to_node(), rhs.into())
    }

    fn equals(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::Eq, self.to_node(), rhs.into())
    }

    fn not_equals(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::Ne, self.to_node(), rhs.into())
    }

    /// Numeric sum, or text concatenation without a separator.
    fn plus(&self, rhs: impl Into<Node>) -> Node {
        Operation::binary(Op::Add, self.to_node(), rhs.into())
    }

    /// True once this node's identity has been recorded in the context.
    fn in_ctx(&self) -> Node {
        Operation::unary(Op::InCtx, self.to_node())
    }

    /// `self` and `rhs` joined by a space.
    fn then(&self, rhs: impl Into<Node>) -> Node {
        self.to_node().joined(rhs.into(), " ")
    }

    /// `self` and `rhs` joined with no separator.
    fn append(&self, rhs: impl Into<Node>) -> Node {
        self.to_node().joined(rhs.into(), "")
    }

    fn sentence(&self) -> Node {
        Node::from_kind(NodeKind::Sentence(self.to_node()))
    }
}

impl Expr for Node {
    fn to_node(&self) -> Node {
        self.clone()
    }
}

impl Expr for Var {
    fn to_node(&self) -> Node {
        self.into()
    }
}

impl Expr for LangConfig {
    fn to_node(&self) -> Node {
        self.into()
    }
}

impl Expr for Injector {
    fn to_node(&self) -> Node {
        self.into()
    }
}

impl Expr for Repeat {
    fn to_node(&self) -> Node {
        self.into()
    }
}
