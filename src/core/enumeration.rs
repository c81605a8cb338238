/// Natural-language list joining ("A, B, and C").
use std::hash::{Hash, Hasher};

use crate::core::context::Ctx;
use crate::core::node::{hash_nodes, Node, RenderError, Scope};
use crate::schema::features::Lang;
use crate::schema::value::Value;

#[derive(Debug)]
pub struct Enumeration {
    items: Vec<Node>,
    /// `None` takes the language of the enclosing `LangConfig`.
    lang: Option<Lang>,
}

impl Enumeration {
    pub fn new<I, T>(items: I, lang: Lang) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            lang: Some(lang),
        }
    }

    /// Build from a language tag such as `"en-US"` or `"pt"`.
    pub fn with_tag<I, T>(items: I, tag: &str) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        Ok(Self::new(items, tag.parse()?))
    }

    /// An enumeration in whatever language is active where it renders.
    pub fn ambient<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            lang: None,
        }
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    pub fn lang(&self) -> Option<Lang> {
        self.lang
    }

    pub(crate) fn hash_identity<H: Hasher>(&self, state: &mut H) {
        self.lang.hash(state);
        hash_nodes(&self.items, state);
    }

    pub(crate) fn reduce(&self, ctx: &mut Ctx, scope: Scope) -> Result<Value, RenderError> {
        let lang = self.lang.unwrap_or(scope.features.lang);
        let mut rendered = Vec::with_capacity(self.items.len());
        for item in &self.items {
            rendered.push(item.reduce(ctx, scope)?.to_text());
        }
        Ok(Value::Str(join_items(&rendered, rendered.len(), lang)))
    }
}

/// Recursive join: the head, a comma, and the join of the tail. The final
/// pair takes the conjunction, with a serial comma only when the whole
/// list has three or more items and the language uses one.
fn join_items(items: &[String], total: usize, lang: Lang) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, last] => {
            let comma = if total > 2 && lang.serial_comma() { "," } else { "" };
            format!("{}{} {} {}", first, comma, lang.conjunction(), last)
        }
        [first, rest @ ..] => format!("{}, {}", first, join_items(rest, total, lang)),
    }
}
