use serde::{Deserialize, Serialize};

use crate::atom::Atom;

/// An expression node as seen by the precompiler.
///
/// This is deliberately a small subset of a full ECMAScript expression tree:
/// enough to recognize call sites, inspect literal arguments and build the
/// replacement dispatch tables. Anything the host does not map onto one of
/// these variants arrives as [`Node::Raw`] and is never eligible.
///
/// Nodes serialize to JSON so that compiled replacements can be stored as
/// text in the transformation cache and reconstituted on a hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Node {
    Literal(Literal),
    Identifier(Atom),
    Call(Call),
    Member(Member),
    Array(Vec<Node>),
    Object(Vec<ObjectMember>),
    Binary(Binary),
    /// Zero-argument arrow function.
    Arrow(Box<Node>),
    /// Multi-way branch on a discriminant; every arm yields a value.
    Switch(Switch),
    /// Host source the IR does not model (template literals, JSX, ...).
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Literal {
    Number(f64),
    String(Atom),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: Box<Node>,
    pub args: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub object: Box<Node>,
    pub property: Atom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binary {
    pub op: Atom,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectMember {
    Property(Property),
    Spread(Node),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKey {
    Identifier(Atom),
    String(Atom),
    Number(f64),
    Computed(Box<Node>),
}

impl PropertyKey {
    /// Key for `name`, quoted only when it is not a valid identifier.
    pub fn named(name: impl Into<Atom>) -> Self {
        let name = name.into();
        if name.is_identifier() {
            Self::Identifier(name)
        } else {
            Self::String(name)
        }
    }

    /// The key's name when it is spelled literally (`a`, `"a"`, `1`).
    pub fn literal_name(&self) -> Option<String> {
        match self {
            Self::Identifier(name) | Self::String(name) => Some(name.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Computed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub discriminant: Box<Node>,
    pub arms: Vec<SwitchArm>,
    pub default: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchArm {
    pub test: Literal,
    pub value: Node,
}

impl Node {
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Self::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Callee name for plain `name(...)` calls. Member callees
    /// (`lib.name(...)`) resolve to the property name.
    pub fn callee_name(&self) -> Option<&Atom> {
        match self.as_call()?.callee.as_ref() {
            Self::Identifier(name) => Some(name),
            Self::Member(member) => Some(&member.property),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Literal(Literal::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&Atom> {
        match self {
            Self::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[ObjectMember]> {
        match self {
            Self::Object(members) => Some(members),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callee_name_of_plain_and_member_calls() {
        let plain = Node::call("responsiveValue", vec![Node::number(24.0)]);
        assert_eq!(plain.callee_name().map(Atom::as_str), Some("responsiveValue"));

        let member = Node::Call(Call {
            callee: Box::new(Node::member(Node::ident("vp"), "responsiveValue")),
            args: vec![],
        });
        assert_eq!(member.callee_name().map(Atom::as_str), Some("responsiveValue"));

        assert!(Node::number(1.0).callee_name().is_none());
    }

    #[test]
    fn literal_accessors() {
        assert_eq!(Node::number(-3.5).as_number(), Some(-3.5));
        assert!(Node::ident("size").as_number().is_none());
        assert_eq!(Node::string("fontSize").as_str().map(Atom::as_str), Some("fontSize"));
        assert!(Node::Literal(Literal::Null).is_literal());
    }

    #[test]
    fn property_key_literal_names() {
        assert_eq!(
            PropertyKey::Identifier("padding".into()).literal_name().as_deref(),
            Some("padding")
        );
        assert_eq!(PropertyKey::Number(2.0).literal_name().as_deref(), Some("2"));
        let computed = PropertyKey::Computed(Box::new(Node::ident("k")));
        assert!(computed.literal_name().is_none());
    }

    #[test]
    fn named_keys_quote_non_identifiers() {
        assert_eq!(PropertyKey::named("mobile"), PropertyKey::Identifier("mobile".into()));
        assert_eq!(PropertyKey::named("2xl"), PropertyKey::String("2xl".into()));
        assert_eq!(PropertyKey::named("line-height"), PropertyKey::String("line-height".into()));
    }

    #[test]
    fn json_roundtrip_preserves_structure() {
        let node = Node::call(
            "responsiveValue",
            vec![
                Node::number(24.0),
                Node::object(vec![("token", Node::string("fontSize"))]),
            ],
        );
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
