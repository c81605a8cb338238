/// Lexicons of phrase elements and record batches, read from RON strings.

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::core::node::{Node, RenderError};
use crate::core::phrase::{PhraseElement, PhraseKind};
use crate::schema::features::Feature;
use crate::schema::value::{Record, Value};

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

// RON shapes differ from the runtime types, so entries pass through these
// intermediate structs.

#[derive(Debug, Deserialize)]
struct RonMapping {
    text: String,
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Phrase")]
struct RonPhrase {
    base: String,
    #[serde(default)]
    kind: PhraseKind,
    #[serde(default)]
    mappings: Vec<RonMapping>,
}

/// A set of named phrase elements.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, PhraseElement>,
}

impl Lexicon {
    /// Parse a lexicon from a RON map of name to `Phrase(...)` entries.
    /// Mappings keep the order they are listed in.
    pub fn parse_ron(input: &str) -> Result<Lexicon, LexiconError> {
        let raw: HashMap<String, RonPhrase> = ron::from_str(input)?;
        let mut entries = HashMap::with_capacity(raw.len());

        for (name, phrase) in raw {
            let mut element = PhraseElement::new(phrase.kind, phrase.base);
            for mapping in phrase.mappings {
                element = element.add_mapping(mapping.text, &mapping.features);
            }
            entries.insert(name, element);
        }

        Ok(Lexicon { entries })
    }

    pub fn insert(&mut self, name: impl Into<String>, element: PhraseElement) {
        self.entries.insert(name.into(), element);
    }

    pub fn get(&self, name: &str) -> Option<&PhraseElement> {
        self.entries.get(name)
    }

    /// The named element as a renderable node.
    pub fn node(&self, name: &str) -> Option<Node> {
        self.entries.get(name).cloned().map(Node::from)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Merge another lexicon into this one. Entries from `other` override
    /// entries in `self` with the same name.
    pub fn merge(&mut self, other: Lexicon) {
        self.entries.extend(other.entries);
    }
}

/// Parse a RON list of records, e.g. `[{"name": "Alice", "age": 30}]`.
///
/// `None` and `()` leave the field out of the record. Lists, maps and
/// other non-literal values fail with `InvalidCast`.
pub fn records_from_ron(input: &str) -> Result<Vec<Record>, LexiconError> {
    let raw: Vec<HashMap<String, ron::Value>> = ron::from_str(input)?;
    let mut records = Vec::with_capacity(raw.len());

    for fields in raw {
        let mut record = Record::new();
        for (name, value) in fields {
            if let Some(value) = literal(&name, value)? {
                record.insert(name, value);
            }
        }
        records.push(record);
    }

    Ok(records)
}

fn literal(field: &str, value: ron::Value) -> Result<Option<Value>, RenderError> {
    match value {
        ron::Value::Bool(b) => Ok(Some(Value::Bool(b))),
        ron::Value::Char(c) => Ok(Some(Value::Str(c.to_string()))),
        ron::Value::String(s) => Ok(Some(Value::Str(s))),
        ron::Value::Number(n) => Ok(Some(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.into_f64()),
        })),
        ron::Value::Option(Some(inner)) => literal(field, *inner),
        ron::Value::Option(None) | ron::Value::Unit => Ok(None),
        other => Err(RenderError::InvalidCast(format!(
            "field '{}' holding {:?}",
            field, other
        ))),
    }
}
