use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use vpscale_syntax::Atom;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("configuration declares no breakpoints")]
    NoBreakpoints,
}

/// A named viewport profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub name: Atom,
    pub width: f64,
    pub height: f64,
    /// Alternate display name (e.g. "iPhone 14" for `mobile`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<Atom>,
}

impl Viewport {
    pub fn new(name: impl Into<Atom>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<Atom>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Same name and dimensions. `alias` is only a display label and does
    /// not take part.
    pub fn same_profile(&self, other: &Viewport) -> bool {
        self.name == other.name && self.width == other.width && self.height == other.height
    }
}

/// A viewport participating in the ordered target set of a configuration.
pub type Breakpoint = Viewport;

/// Which viewport dimension (or derived metric) drives the scaling ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Width,
    Height,
    Min,
    Max,
    Diagonal,
    Area,
}

impl Origin {
    /// Size of `viewport` under this metric.
    pub fn measure(self, viewport: &Viewport) -> f64 {
        let (w, h) = (viewport.width, viewport.height);
        match self {
            Self::Width => w,
            Self::Height => h,
            Self::Min => w.min(h),
            Self::Max => w.max(h),
            Self::Diagonal => (w * w + h * h).sqrt(),
            Self::Area => w * h,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMode {
    #[default]
    Nearest,
    Floor,
    Ceil,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rounding {
    #[serde(default)]
    pub mode: RoundingMode,
    /// Quantum to round to. `0` (or anything non-positive) disables rounding.
    #[serde(default)]
    pub precision: f64,
}

impl Rounding {
    pub fn new(mode: RoundingMode, precision: f64) -> Self {
        Self { mode, precision }
    }

    /// Round `value` to a multiple of `precision`. `Nearest` breaks ties
    /// toward positive infinity, like the runtime's `Math.round`: `-2.5`
    /// steps round to `-2`, not `-3`.
    pub fn apply(&self, value: f64) -> f64 {
        if self.precision <= 0.0 {
            return value;
        }
        let steps = value / self.precision;
        let steps = match self.mode {
            RoundingMode::Nearest => round_half_up(steps),
            RoundingMode::Floor => steps.floor(),
            RoundingMode::Ceil => steps.ceil(),
        };
        steps * self.precision
    }
}

/// Nearest integer, ties toward positive infinity.
pub(crate) fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Two-argument scale formula, invoked as `formula(value, ratio)`.
pub type ScaleFormula = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// How a token rescales a value that has already been scaled by the
/// viewport ratio.
#[derive(Clone)]
pub enum ScaleRule {
    Constant(f64),
    Formula(ScaleFormula),
}

impl ScaleRule {
    pub fn formula(f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::Formula(Arc::new(f))
    }

    pub fn apply(&self, value: f64, ratio: f64) -> f64 {
        match self {
            Self::Constant(factor) => value * factor,
            Self::Formula(f) => f(value, ratio),
        }
    }
}

impl Default for ScaleRule {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

impl std::fmt::Debug for ScaleRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(factor) => f.debug_tuple("Constant").field(factor).finish(),
            Self::Formula(_) => f.write_str("Formula(..)"),
        }
    }
}

impl PartialEq for ScaleRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Constant(a), Self::Constant(b)) => a == b,
            (Self::Formula(a), Self::Formula(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// Constants travel as plain numbers; formulas only exist in code.
impl Serialize for ScaleRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Constant(factor) => serializer.serialize_f64(*factor),
            Self::Formula(_) => Err(serde::ser::Error::custom(
                "formula scale rules cannot be serialized",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for ScaleRule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(Self::Constant)
    }
}

/// Constraint set for one semantic value category (font size, spacing, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenRule {
    #[serde(default)]
    pub scale: ScaleRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Atom>,
}

impl TokenRule {
    pub fn scaled(scale: ScaleRule) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<Atom>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Apply the rule to a value already scaled by the viewport ratio.
    ///
    /// The scale runs with `ratio = 1` so formulas never see the viewport
    /// ratio a second time. Step quantization happens before clamping.
    pub fn constrain(&self, value: f64) -> f64 {
        let mut value = self.scale.apply(value, 1.0);
        if let Some(step) = self.step
            && step > 0.0
        {
            value = round_half_up(value / step) * step;
        }
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }
        value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalingStrategy {
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub tokens: IndexMap<Atom, TokenRule>,
    #[serde(default)]
    pub rounding: Rounding,
}

/// The developer's responsive configuration: a reference viewport, the
/// ordered breakpoints values are specialized for, and the scaling rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsiveConfig {
    pub base: Viewport,
    pub breakpoints: Vec<Breakpoint>,
    #[serde(default)]
    pub strategy: ScalingStrategy,
}

impl ResponsiveConfig {
    pub fn new(
        base: Viewport,
        breakpoints: Vec<Breakpoint>,
        strategy: ScalingStrategy,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            base,
            breakpoints,
            strategy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks presence of required fields only. Duplicate breakpoint names
    /// are accepted: the later breakpoint's value wins in generated tables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.breakpoints.is_empty() {
            return Err(ConfigError::NoBreakpoints);
        }
        let duplicates = self.duplicate_breakpoint_names();
        if !duplicates.is_empty() {
            tracing::warn!(
                names = ?duplicates,
                "duplicate breakpoint names; later entries shadow earlier ones"
            );
        }
        Ok(())
    }

    /// Names declared by more than one breakpoint, in first-seen order.
    pub fn duplicate_breakpoint_names(&self) -> Vec<Atom> {
        let mut seen: IndexMap<&str, usize> = IndexMap::new();
        for bp in &self.breakpoints {
            *seen.entry(bp.name.as_str()).or_default() += 1;
        }
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| Atom::from(name))
            .collect()
    }

    /// Breakpoint by name; with duplicates, the last declared one.
    pub fn breakpoint(&self, name: &str) -> Option<&Breakpoint> {
        self.breakpoints.iter().rev().find(|bp| bp.name == name)
    }

    pub fn token(&self, name: &str) -> Option<&TokenRule> {
        self.strategy.tokens.get(name)
    }
}

impl Default for ResponsiveConfig {
    fn default() -> Self {
        let mut tokens = IndexMap::new();
        tokens.insert(
            Atom::from("fontSize"),
            TokenRule::scaled(ScaleRule::Constant(0.85)).with_range(Some(12.0), Some(72.0)),
        );
        tokens.insert(
            Atom::from("spacing"),
            TokenRule::default().with_step(2.0).with_range(Some(0.0), None),
        );
        tokens.insert(
            Atom::from("radius"),
            TokenRule::default().with_range(Some(0.0), Some(32.0)),
        );

        Self {
            base: Viewport::new("desktop", 1920.0, 1080.0),
            breakpoints: vec![
                Viewport::new("mobile", 390.0, 844.0),
                Viewport::new("tablet", 768.0, 1024.0),
                Viewport::new("laptop", 1366.0, 768.0),
                Viewport::new("desktop", 1920.0, 1080.0),
            ],
            strategy: ScalingStrategy {
                origin: Origin::Width,
                tokens,
                rounding: Rounding::new(RoundingMode::Nearest, 0.5),
            },
        }
    }
}
