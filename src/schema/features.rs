use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::core::node::RenderError;

/// Languages the engine can realize text in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lang {
    /// `en-US`
    English,
    /// `pt`
    Portuguese,
}

impl Default for Lang {
    fn default() -> Self {
        Self::English
    }
}

impl Lang {
    /// Canonical language tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::Portuguese => "pt",
        }
    }

    /// Word joining the last two items of a list: "and", "e".
    pub fn conjunction(&self) -> &'static str {
        match self {
            Self::English => "and",
            Self::Portuguese => "e",
        }
    }

    /// Whether lists of three or more put a comma before the conjunction.
    pub fn serial_comma(&self) -> bool {
        matches!(self, Self::English)
    }
}

impl FromStr for Lang {
    type Err = RenderError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "en-US" | "en" => Ok(Self::English),
            "pt" | "pt-BR" => Ok(Self::Portuguese),
            other => Err(RenderError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Grammatical number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GNumber {
    Singular,
    Plural,
}

impl Default for GNumber {
    fn default() -> Self {
        Self::Singular
    }
}

/// Grammatical person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GPerson {
    First,
    Second,
    Third,
}

impl Default for GPerson {
    fn default() -> Self {
        Self::First
    }
}

/// Grammatical gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Neutral,
    Male,
    Female,
}

impl Default for Gender {
    fn default() -> Self {
        Self::Neutral
    }
}

/// A single grammatical feature value, usable as part of a mapping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Feature {
    Lang(Lang),
    Number(GNumber),
    Person(GPerson),
    Gender(Gender),
}

impl From<Lang> for Feature {
    fn from(l: Lang) -> Self {
        Self::Lang(l)
    }
}

impl From<GNumber> for Feature {
    fn from(n: GNumber) -> Self {
        Self::Number(n)
    }
}

impl From<GPerson> for Feature {
    fn from(p: GPerson) -> Self {
        Self::Person(p)
    }
}

impl From<Gender> for Feature {
    fn from(g: Gender) -> Self {
        Self::Gender(g)
    }
}

/// Key of a phrase-element mapping. Ordered so keys hash and compare
/// independently of declaration order.
pub type FeatureSet = BTreeSet<Feature>;

/// The active grammatical features worn by a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub lang: Lang,
    pub number: GNumber,
    pub person: GPerson,
    pub gender: Gender,
}

impl Features {
    pub fn new(lang: Lang, number: GNumber, person: GPerson, gender: Gender) -> Self {
        Self {
            lang,
            number,
            person,
            gender,
        }
    }

    pub fn as_array(&self) -> [Feature; 4] {
        [
            Feature::Lang(self.lang),
            Feature::Number(self.number),
            Feature::Person(self.person),
            Feature::Gender(self.gender),
        ]
    }

    pub fn contains(&self, feature: &Feature) -> bool {
        match feature {
            Feature::Lang(l) => *l == self.lang,
            Feature::Number(n) => *n == self.number,
            Feature::Person(p) => *p == self.person,
            Feature::Gender(g) => *g == self.gender,
        }
    }

    /// Number of features in `key` that are active here.
    pub fn overlap(&self, key: &FeatureSet) -> usize {
        key.iter().filter(|f| self.contains(f)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_supported_tags() {
        assert_eq!("en-US".parse::<Lang>().unwrap(), Lang::English);
        assert_eq!("en".parse::<Lang>().unwrap(), Lang::English);
        assert_eq!("pt".parse::<Lang>().unwrap(), Lang::Portuguese);
    }

    #[test]
    fn unsupported_tag_is_rejected() {
        let err = "fr".parse::<Lang>().unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedLanguage(ref t) if t == "fr"));
    }

    #[test]
    fn default_features() {
        let f = Features::default();
        assert_eq!(f.lang, Lang::English);
        assert_eq!(f.number, GNumber::Singular);
        assert_eq!(f.person, GPerson::First);
        assert_eq!(f.gender, Gender::Neutral);
    }

    #[test]
    fn overlap_counts_shared_features() {
        let active = Features::new(Lang::English, GNumber::Plural, GPerson::First, Gender::Neutral);
        let key: FeatureSet = [
            Feature::Person(GPerson::First),
            Feature::Number(GNumber::Plural),
            Feature::Gender(Gender::Male),
        ]
        .into_iter()
        .collect();
        assert_eq!(active.overlap(&key), 2);
        assert_eq!(active.overlap(&FeatureSet::new()), 0);
    }

    #[test]
    fn array_lists_every_active_feature() {
        let active =
            Features::new(Lang::Portuguese, GNumber::Plural, GPerson::Third, Gender::Female);
        let all = active.as_array();
        assert_eq!(
            all,
            [
                Feature::Lang(Lang::Portuguese),
                Feature::Number(GNumber::Plural),
                Feature::Person(GPerson::Third),
                Feature::Gender(Gender::Female),
            ]
        );
        assert!(all.iter().all(|f| active.contains(f)));

        let key: FeatureSet = all.into_iter().collect();
        assert_eq!(active.overlap(&key), 4);
    }

    #[test]
    fn features_from_ron() {
        let f: Features = ron::from_str("(lang: Portuguese, number: Plural)").unwrap();
        assert_eq!(f.lang, Lang::Portuguese);
        assert_eq!(f.number, GNumber::Plural);
        assert_eq!(f.person, GPerson::First);
    }
}
