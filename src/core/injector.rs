/// Batch generation: binding queued records to variables, and rendering a
/// node a fixed number of times.

use log::debug;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::core::context::Ctx;
use crate::core::node::{Node, RenderError, Scope, Var};
use crate::schema::value::{Record, Value};

/// Binds one queued record per render to a fixed set of variables, then
/// renders the template with those values in effect.
#[derive(Debug, Clone)]
pub struct Injector(Rc<InjectorInner>);

#[derive(Debug)]
struct InjectorInner {
    vars: Vec<Var>,
    template: Node,
    queue: RefCell<VecDeque<Record>>,
}

impl Injector {
    pub fn new(vars: impl IntoIterator<Item = Var>, template: impl Into<Node>) -> Self {
        Self(Rc::new(InjectorInner {
            vars: vars.into_iter().collect(),
            template: template.into(),
            queue: RefCell::new(VecDeque::new()),
        }))
    }

    /// Replace the pending queue.
    pub fn assign(&self, records: impl IntoIterator<Item = Record>) -> &Self {
        *self.0.queue.borrow_mut() = records.into_iter().collect();
        self
    }

    /// Number of records not yet rendered.
    pub fn pending(&self) -> usize {
        self.0.queue.borrow().len()
    }

    pub fn vars(&self) -> &[Var] {
        &self.0.vars
    }

    pub fn template(&self) -> &Node {
        &self.0.template
    }

    pub(crate) fn hash_identity<H: Hasher>(&self, state: &mut H) {
        for var in &self.0.vars {
            var.name().hash(state);
        }
        self.0.template.key().hash(state);
    }

    pub(crate) fn reduce(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        let record = self
            .0
            .queue
            .borrow_mut()
            .pop_front()
            .ok_or(RenderError::EmptyInjectorQueue)?;
        debug!("injecting record with {} field(s), {} left", record.len(), self.pending());

        // A variable missing from the record is left unassigned rather than
        // keeping the previous record's value.
        for var in &self.0.vars {
            match record.get(var.name()) {
                Some(value) => var.assign(value.clone()),
                None => var.clear(),
            };
        }
        self.0.template.reduce(ctx, scope)
    }
}

/// Renders its child `count` times, joining the outputs with a separator.
/// The child is expected to advance its own state per render, as an
/// [`Injector`] does.
#[derive(Debug, Clone)]
pub struct Repeat(Rc<RepeatInner>);

#[derive(Debug)]
struct RepeatInner {
    child: Node,
    count: Cell<usize>,
    separator: String,
}

impl Repeat {
    /// Renders once, separated by a single space, until assigned a count.
    pub fn new(child: impl Into<Node>) -> Self {
        Self::with_separator(child, " ")
    }

    pub fn with_separator(child: impl Into<Node>, separator: &str) -> Self {
        Self(Rc::new(RepeatInner {
            child: child.into(),
            count: Cell::new(1),
            separator: separator.to_string(),
        }))
    }

    pub fn assign(&self, count: usize) -> &Self {
        self.0.count.set(count);
        self
    }

    pub fn count(&self) -> usize {
        self.0.count.get()
    }

    pub fn child(&self) -> &Node {
        &self.0.child
    }

    pub(crate) fn hash_identity<H: Hasher>(&self, state: &mut H) {
        self.0.child.key().hash(state);
        self.0.separator.hash(state);
    }

    pub(crate) fn reduce(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        let count = self.count();
        debug!("repeating child {} time(s)", count);
        let mut parts = Vec::with_capacity(count);
        for _ in 0..count {
            parts.push(self.0.child.reduce(ctx, scope)?.to_text());
        }
        Ok(Value::Str(parts.join(&self.0.separator)))
    }
}
