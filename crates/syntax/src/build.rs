//! Node constructors used by code generation and by hosts mapping their own
//! trees onto [`Node`].

use crate::atom::Atom;
use crate::node::{
    Binary, Call, Literal, Member, Node, ObjectMember, Property, PropertyKey, Switch, SwitchArm,
};

impl Node {
    pub fn number(value: f64) -> Self {
        Self::Literal(Literal::Number(value))
    }

    pub fn string(value: impl Into<Atom>) -> Self {
        Self::Literal(Literal::String(value.into()))
    }

    pub fn ident(name: impl Into<Atom>) -> Self {
        Self::Identifier(name.into())
    }

    /// `callee(args...)` with a plain identifier callee.
    pub fn call(callee: impl Into<Atom>, args: Vec<Node>) -> Self {
        Self::Call(Call {
            callee: Box::new(Self::ident(callee)),
            args,
        })
    }

    pub fn member(object: Node, property: impl Into<Atom>) -> Self {
        Self::Member(Member {
            object: Box::new(object),
            property: property.into(),
        })
    }

    pub fn array(items: Vec<Node>) -> Self {
        Self::Array(items)
    }

    /// Object literal with the given keys, in order. Keys that are not
    /// identifiers are written as strings.
    pub fn object<K: Into<Atom>>(props: Vec<(K, Node)>) -> Self {
        Self::Object(
            props
                .into_iter()
                .map(|(key, value)| {
                    ObjectMember::Property(Property {
                        key: PropertyKey::named(key),
                        value,
                    })
                })
                .collect(),
        )
    }

    pub fn binary(op: impl Into<Atom>, left: Node, right: Node) -> Self {
        Self::Binary(Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn arrow(body: Node) -> Self {
        Self::Arrow(Box::new(body))
    }

    /// Named-arm selector: `switch (discriminant) { case k: return v; ... default: return d; }`.
    pub fn switch(discriminant: Node, arms: Vec<SwitchArm>, default: Node) -> Self {
        Self::Switch(Switch {
            discriminant: Box::new(discriminant),
            arms,
            default: Box::new(default),
        })
    }
}

impl SwitchArm {
    /// Arm selected by a string case label.
    pub fn named(name: impl Into<Atom>, value: Node) -> Self {
        Self {
            test: Literal::String(name.into()),
            value,
        }
    }
}
