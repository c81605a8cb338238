/// Uniform random selection among candidate nodes.
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

use crate::core::context::Ctx;
use crate::core::node::{Node, RenderError, Scope};
use crate::schema::value::Value;

/// Picks one candidate per render. Each `Choices` owns its generator; a
/// seeded one yields the same sequence of picks across repeated renders,
/// advancing on every call rather than resetting.
///
/// Sequences come from `rand`'s `StdRng`: a seed reproduces the same picks
/// with this crate and `rand` version, not those of any other generator.
#[derive(Debug)]
pub struct Choices {
    items: Vec<Node>,
    seed: Option<u64>,
    rng: RefCell<StdRng>,
}

impl Choices {
    /// Candidates picked with a generator seeded from OS entropy.
    pub fn new<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            seed: None,
            rng: RefCell::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded<I, T>(items: I, seed: u64) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            seed: Some(seed),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub(crate) fn reduce(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        if self.items.is_empty() {
            return Ok(Value::Str(String::new()));
        }
        let index = self.rng.borrow_mut().gen_range(0..self.items.len());
        debug!("choices picked {} of {}", index, self.items.len());
        self.items[index].reduce(ctx, scope)
    }
}
