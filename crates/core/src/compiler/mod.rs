//! Call-site classification, eligibility and dispatch-table generation.
//!
//! ```text
//!   call node ──▶ ShapeRegistry::classify ──▶ CallShape
//!                                               │
//!                      check_eligibility ◀──────┘
//!                               │ Ok
//!                               ▼
//!        single_value::compile / aggregate::compile ──▶ replacement Node
//! ```
//!
//! Eligibility is purely syntactic: arguments must be literals, nothing is
//! evaluated.

pub mod aggregate;
pub mod single_value;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vpscale_syntax::{Atom, Literal, Node, ObjectMember};

/// Runtime helper wrapping a thunk so it recomputes only when the active
/// breakpoint changes.
pub const MEMO_HELPER: &str = "breakpointMemo";
/// Runtime accessor for the active breakpoint (`{ name, width, height }`).
pub const ACTIVE_BREAKPOINT_HELPER: &str = "currentBreakpoint";
/// Runtime helper resolving a map of per-breakpoint style values.
pub const STYLE_HELPER: &str = "precomputedStyle";

/// Which declaration-only accessor a call refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Breakpoint,
    Layout,
    Style,
}

/// The closed set of call shapes the precompiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallShape {
    /// `responsiveValue(24, { token: "fontSize" })`
    SingleValue,
    /// `responsiveStyle({ fontSize: 24, padding: 16, color: "red" })`
    Aggregate,
    /// Accessors whose transform only marks the unit as transformed.
    DeclarationOnly(DeclarationKind),
}

impl CallShape {
    pub fn name(self) -> &'static str {
        match self {
            Self::SingleValue => "single-value",
            Self::Aggregate => "aggregate",
            Self::DeclarationOnly(DeclarationKind::Breakpoint) => "breakpoint-accessor",
            Self::DeclarationOnly(DeclarationKind::Layout) => "layout-accessor",
            Self::DeclarationOnly(DeclarationKind::Style) => "style-accessor",
        }
    }

    /// Runtime helpers the generated replacement references.
    pub fn runtime_helpers(self) -> &'static [&'static str] {
        match self {
            Self::SingleValue => &[MEMO_HELPER, ACTIVE_BREAKPOINT_HELPER],
            Self::Aggregate => &[STYLE_HELPER],
            Self::DeclarationOnly(_) => &[],
        }
    }
}

/// Maps callee names onto call shapes.
#[derive(Debug, Clone)]
pub struct ShapeRegistry {
    shapes: IndexMap<Atom, CallShape>,
}

impl ShapeRegistry {
    /// Registry with no callees.
    pub fn empty() -> Self {
        Self {
            shapes: IndexMap::new(),
        }
    }

    /// The runtime's public API: `responsiveValue`, `responsiveStyle`,
    /// `useBreakpoint`, `useLayout`, `useResponsiveStyle`.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("responsiveValue", CallShape::SingleValue);
        registry.register("responsiveStyle", CallShape::Aggregate);
        registry.register(
            "useBreakpoint",
            CallShape::DeclarationOnly(DeclarationKind::Breakpoint),
        );
        registry.register(
            "useLayout",
            CallShape::DeclarationOnly(DeclarationKind::Layout),
        );
        registry.register(
            "useResponsiveStyle",
            CallShape::DeclarationOnly(DeclarationKind::Style),
        );
        registry
    }

    /// Register (or re-point) a callee. Returns the previous shape, if any.
    pub fn register(&mut self, callee: impl Into<Atom>, shape: CallShape) -> Option<CallShape> {
        self.shapes.insert(callee.into(), shape)
    }

    pub fn classify(&self, node: &Node) -> Option<CallShape> {
        self.shapes.get(node.callee_name()?.as_str()).copied()
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.classify(node).is_some()
    }

    pub fn callees(&self) -> impl Iterator<Item = (&Atom, CallShape)> {
        self.shapes.iter().map(|(name, shape)| (name, *shape))
    }
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Why a recognized call cannot be precomputed. Not an error: the call is
/// simply left as written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IneligibleReason {
    #[error("expected {expected} argument(s), found {found}")]
    Arity { expected: &'static str, found: usize },
    #[error("value argument is not a numeric literal")]
    NonLiteralValue,
    #[error("argument is not an object literal")]
    NotAnObjectLiteral,
    #[error("object literal has a spread or computed key")]
    DynamicKey,
    #[error("option `{0}` is not a literal")]
    NonLiteralOption(String),
}

/// Syntactic eligibility test for `shape` applied to `args`.
pub fn check_eligibility(shape: CallShape, args: &[Node]) -> Result<(), IneligibleReason> {
    match shape {
        CallShape::DeclarationOnly(_) => Ok(()),
        CallShape::SingleValue => {
            if args.is_empty() || args.len() > 2 {
                return Err(IneligibleReason::Arity {
                    expected: "1 or 2",
                    found: args.len(),
                });
            }
            if args[0].as_number().is_none() {
                return Err(IneligibleReason::NonLiteralValue);
            }
            match args.get(1) {
                None => Ok(()),
                Some(options) => {
                    let members = options
                        .as_object()
                        .ok_or(IneligibleReason::NotAnObjectLiteral)?;
                    for (key, value) in literal_properties(members)? {
                        if !value.is_literal() {
                            return Err(IneligibleReason::NonLiteralOption(key));
                        }
                    }
                    Ok(())
                }
            }
        }
        CallShape::Aggregate => {
            if args.len() != 1 {
                return Err(IneligibleReason::Arity {
                    expected: "1",
                    found: args.len(),
                });
            }
            let members = args[0]
                .as_object()
                .ok_or(IneligibleReason::NotAnObjectLiteral)?;
            literal_properties(members).map(|_| ())
        }
    }
}

/// `(name, value)` for every member, or `DynamicKey` if any member is a
/// spread or has a computed key.
fn literal_properties(members: &[ObjectMember]) -> Result<Vec<(String, &Node)>, IneligibleReason> {
    members
        .iter()
        .map(|member| match member {
            ObjectMember::Property(prop) => prop
                .key
                .literal_name()
                .map(|name| (name, &prop.value))
                .ok_or(IneligibleReason::DynamicKey),
            ObjectMember::Spread(_) => Err(IneligibleReason::DynamicKey),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("`{callee}` is missing argument {index}")]
    MissingArgument { callee: &'static str, index: usize },
    #[error("`{callee}` argument {index} is not a numeric literal")]
    NotNumeric { callee: &'static str, index: usize },
    #[error("`{callee}` argument is not an object literal")]
    NotAnObject { callee: &'static str },
    #[error("literal {0} is not a finite number")]
    NonFiniteLiteral(f64),
    #[error("scaling {value} for breakpoint `{breakpoint}` produced a non-finite result")]
    NonFiniteResult { value: f64, breakpoint: Atom },
}

/// Semantic tokens inferred from style property names.
pub const SIZE_TOKEN: &str = "fontSize";
pub const SPACING_TOKEN: &str = "spacing";
pub const RADIUS_TOKEN: &str = "radius";

/// Guess a token from a style property name. First match wins:
/// `*size*` → size, `*padding*`/`*margin*` → spacing, `*radius*` → radius.
pub fn infer_token(property: &str) -> Option<&'static str> {
    let lower = property.to_ascii_lowercase();
    if lower.contains("size") {
        Some(SIZE_TOKEN)
    } else if lower.contains("padding") || lower.contains("margin") {
        Some(SPACING_TOKEN)
    } else if lower.contains("radius") {
        Some(RADIUS_TOKEN)
    } else {
        None
    }
}

/// The `token` option of a single-value call, if it is a string literal.
pub(crate) fn literal_token(options: Option<&Node>) -> Option<Atom> {
    let members = options?.as_object()?;
    members.iter().find_map(|member| match member {
        ObjectMember::Property(prop) if prop.key.literal_name().as_deref() == Some("token") => {
            match &prop.value {
                Node::Literal(Literal::String(token)) => Some(token.clone()),
                other => {
                    tracing::debug!(value = %other, "ignoring non-string token option");
                    None
                }
            }
        }
        _ => None,
    })
}
