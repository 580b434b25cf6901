// src/schema/levels.rs

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{Result, TableError};

/// Expected level names of a row or column index.
///
/// Every accepted spelling (a single name, a list of names, a [`LevelEnum`],
/// or nothing at all) is coerced into this one value at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<LevelsRepr>", into = "Option<Vec<String>>")]
pub enum Levels {
    /// Any level count and any names are accepted.
    #[default]
    Unconstrained,
    Named(Vec<String>),
}

/// A fixed set of level names, typically implemented by a marker type per
/// table kind.
///
/// ```
/// use structured_table::{LevelEnum, Levels};
///
/// struct Keypoints;
/// impl LevelEnum for Keypoints {
///     const LEVELS: &'static [&'static str] = &["individual", "bodypart", "coord"];
/// }
///
/// assert_eq!(Levels::of::<Keypoints>().len(), 3);
/// ```
pub trait LevelEnum {
    const LEVELS: &'static [&'static str];
}

impl Levels {
    pub fn of<E: LevelEnum>() -> Self {
        Levels::Named(E::LEVELS.iter().map(|s| s.to_string()).collect())
    }

    pub fn is_constrained(&self) -> bool {
        matches!(self, Levels::Named(_))
    }

    pub fn names(&self) -> Option<&[String]> {
        match self {
            Levels::Unconstrained => None,
            Levels::Named(names) => Some(names),
        }
    }

    /// Number of named levels; 0 when unconstrained.
    pub fn len(&self) -> usize {
        self.names().map_or(0, <[String]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many levels a reader that only sees positions should parse:
    /// the named count, or a single level when unconstrained.
    pub fn positional_count(&self) -> usize {
        match self {
            Levels::Unconstrained => 1,
            Levels::Named(names) => names.len(),
        }
    }

    /// Level names as carried by an index: the canonical names when
    /// constrained, `count` unnamed levels otherwise.
    pub fn index_names(&self, count: usize) -> Vec<Option<String>> {
        match self {
            Levels::Unconstrained => vec![None; count],
            Levels::Named(names) => names.iter().cloned().map(Some).collect(),
        }
    }

    /// Whether an index with `actual` names satisfies this schema.
    pub fn matches(&self, actual: &[Option<String>]) -> bool {
        match self {
            Levels::Unconstrained => true,
            Levels::Named(names) => {
                names.len() == actual.len()
                    && names
                        .iter()
                        .zip(actual)
                        .all(|(want, got)| got.as_deref() == Some(want.as_str()))
            }
        }
    }

    pub(crate) fn check_distinct(&self) -> Result<()> {
        if let Levels::Named(names) = self {
            let mut seen = HashSet::with_capacity(names.len());
            if names.is_empty() {
                return Err(TableError::Shape("a named schema needs at least one level".into()));
            }
            for name in names {
                if !seen.insert(name.as_str()) {
                    return Err(TableError::DuplicateLevel(name.clone()));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Levels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Levels::Unconstrained => f.write_str("<unconstrained>"),
            Levels::Named(names) => write!(f, "({})", names.join(", ")),
        }
    }
}

impl From<&str> for Levels {
    fn from(name: &str) -> Self {
        Levels::Named(vec![name.to_string()])
    }
}

impl From<String> for Levels {
    fn from(name: String) -> Self {
        Levels::Named(vec![name])
    }
}

impl From<Vec<String>> for Levels {
    fn from(names: Vec<String>) -> Self {
        Levels::Named(names)
    }
}

impl From<Vec<&str>> for Levels {
    fn from(names: Vec<&str>) -> Self {
        Levels::Named(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Levels {
    fn from(names: &[&str]) -> Self {
        Levels::Named(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Levels {
    fn from(names: [&str; N]) -> Self {
        Levels::Named(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<T: Into<Levels>> From<Option<T>> for Levels {
    fn from(levels: Option<T>) -> Self {
        levels.map_or(Levels::Unconstrained, Into::into)
    }
}

/// Config spelling: `"frame"`, `["individual", "bodypart"]` or `null`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LevelsRepr {
    One(String),
    Many(Vec<String>),
}

impl From<LevelsRepr> for Levels {
    fn from(repr: LevelsRepr) -> Self {
        match repr {
            LevelsRepr::One(name) => name.into(),
            LevelsRepr::Many(names) => names.into(),
        }
    }
}

impl From<Levels> for Option<Vec<String>> {
    fn from(levels: Levels) -> Self {
        match levels {
            Levels::Unconstrained => None,
            Levels::Named(names) => Some(names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Frame;
    impl LevelEnum for Frame {
        const LEVELS: &'static [&'static str] = &["frame"];
    }

    #[test]
    fn test_coercions_agree() {
        let one: Levels = "frame".into();
        assert_eq!(one, Levels::from(vec!["frame"]));
        assert_eq!(one, Levels::from(["frame"]));
        assert_eq!(one, Levels::of::<Frame>());
        assert_eq!(Levels::from(None::<&str>), Levels::Unconstrained);
        assert_eq!(Levels::from(Some("frame")), one);
    }

    #[test]
    fn test_matches_is_exact_ordered() {
        let want = Levels::from(["a", "b"]);
        assert!(want.matches(&[Some("a".into()), Some("b".into())]));
        assert!(!want.matches(&[Some("b".into()), Some("a".into())]));
        assert!(!want.matches(&[Some("a".into())]));
        assert!(!want.matches(&[Some("a".into()), None]));
        assert!(Levels::Unconstrained.matches(&[None, None, None]));
    }

    #[test]
    fn test_positional_count() {
        assert_eq!(Levels::Unconstrained.positional_count(), 1);
        assert_eq!(Levels::from(["a", "b"]).positional_count(), 2);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Levels::from(["a", "a"]).check_distinct().unwrap_err();
        assert!(matches!(err, TableError::DuplicateLevel(name) if name == "a"));
    }

    #[test]
    fn test_deserialize_spellings() {
        let one: Levels = serde_json::from_str(r#""frame""#).unwrap();
        let many: Levels = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        let none: Levels = serde_json::from_str("null").unwrap();
        assert_eq!(one, Levels::from("frame"));
        assert_eq!(many, Levels::from(["a", "b"]));
        assert_eq!(none, Levels::Unconstrained);
    }
}
