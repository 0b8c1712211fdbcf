use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A name carried through the IR: callees, property keys, breakpoint and
/// token names.
///
/// Names are copied into every generated arm and map entry, so the text is
/// shared behind an `Arc` and cloning never reallocates.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Atom(Arc<str>);

impl Atom {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name can be written bare as an identifier or an object
    /// key (`mobile`, `_gap`, `$x1`). Anything else (`2xl`, `line-height`,
    /// the empty name) must be quoted.
    pub fn is_identifier(&self) -> bool {
        let mut chars = self.0.chars();
        chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
            && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
    }
}

impl PartialEq<str> for Atom {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Atom {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl std::ops::Deref for Atom {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Atom {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for Atom {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Atom> for String {
    fn from(atom: Atom) -> Self {
        atom.as_str().to_owned()
    }
}

impl std::fmt::Display for Atom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_with_str() {
        let a = Atom::from("responsiveValue");
        assert_eq!(a.clone(), a);
        assert_eq!(a, "responsiveValue");
        assert!(Atom::from("laptop") < Atom::from("mobile"));
    }

    #[test]
    fn map_lookup_by_str() {
        let mut widths = std::collections::HashMap::new();
        widths.insert(Atom::from("mobile"), 390.0);
        assert_eq!(widths.get("mobile"), Some(&390.0));
    }

    #[test]
    fn identifier_names() {
        for name in ["mobile", "_gap", "$x1", "tablet2", "écran"] {
            assert!(Atom::from(name).is_identifier(), "{name}");
        }
        for name in ["", "2xl", "line-height", "big screen"] {
            assert!(!Atom::from(name).is_identifier(), "{name}");
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let atom: Atom = serde_json::from_str("\"a\\\"b\"").unwrap();
        assert_eq!(atom, "a\"b");
        assert_eq!(serde_json::to_string(&atom).unwrap(), "\"a\\\"b\"");
    }
}
