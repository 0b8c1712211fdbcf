//! Value scaling engine.
//!
//! Converts a value authored against one viewport into the value for
//! another: ratio of the origin metric, then the token's own scale, step and
//! clamp, then the strategy's rounding. Results are memoized per engine. The
//! memo is dropped whenever the configuration is replaced, and cleared when it
//! reaches its entry limit.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use vpscale_syntax::{Atom, format_number};

use crate::config::{ResponsiveConfig, Viewport};

/// Unit appended when a token does not name its own.
pub const DEFAULT_UNIT: &str = "px";

/// Memoized results kept before the memo is cleared.
pub const DEFAULT_MEMO_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ViewportKey {
    width: u64,
    height: u64,
}

impl From<&Viewport> for ViewportKey {
    fn from(vp: &Viewport) -> Self {
        Self {
            width: vp.width.to_bits(),
            height: vp.height.to_bits(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ScaleKey {
    value: u64,
    from: ViewportKey,
    to: ViewportKey,
    token: Option<Atom>,
}

#[derive(Debug)]
pub struct ScalingEngine {
    config: Arc<ResponsiveConfig>,
    memo: HashMap<ScaleKey, f64>,
    memo_limit: usize,
}

impl ScalingEngine {
    pub fn new(config: Arc<ResponsiveConfig>) -> Self {
        Self {
            config,
            memo: HashMap::new(),
            memo_limit: DEFAULT_MEMO_LIMIT,
        }
    }

    /// Bound the memo to `limit` entries. `0` disables memoization.
    pub fn with_memo_limit(mut self, limit: usize) -> Self {
        self.memo_limit = limit;
        self.memo.clear();
        self
    }

    pub fn config(&self) -> &ResponsiveConfig {
        &self.config
    }

    /// Swap in a new configuration. Previously memoized values are dropped.
    pub fn update_config(&mut self, config: Arc<ResponsiveConfig>) {
        self.config = config;
        self.memo.clear();
    }

    /// Number of memoized results.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Scale `base_value` authored for `from` so it fits `to`.
    ///
    /// Scaling a viewport onto the same profile (see
    /// [`Viewport::same_profile`]) returns `base_value` untouched, whatever
    /// the token. Unknown tokens scale as if no token had been given.
    pub fn scale_value(
        &mut self,
        base_value: f64,
        from: &Viewport,
        to: &Viewport,
        token: Option<&str>,
    ) -> f64 {
        if from.same_profile(to) {
            return base_value;
        }

        let key = ScaleKey {
            value: base_value.to_bits(),
            from: from.into(),
            to: to.into(),
            token: token.map(Atom::from),
        };
        if let Some(&cached) = self.memo.get(&key) {
            return cached;
        }

        let result = compute(&self.config, base_value, from, to, token);
        if self.memo_limit == 0 {
            return result;
        }
        if self.memo.len() >= self.memo_limit {
            tracing::debug!(entries = self.memo.len(), "scale memo full, clearing");
            self.memo.clear();
        }
        self.memo.insert(key, result);
        result
    }

    /// Scale `base_value` from the base viewport to every breakpoint.
    ///
    /// Keyed by breakpoint name in declaration order. A breakpoint repeating
    /// an earlier name overwrites that entry's value in place.
    pub fn scale_for_all_breakpoints(
        &mut self,
        base_value: f64,
        token: Option<&str>,
    ) -> IndexMap<Atom, f64> {
        let config = Arc::clone(&self.config);
        let mut out = IndexMap::with_capacity(config.breakpoints.len());
        for bp in &config.breakpoints {
            let scaled = self.scale_value(base_value, &config.base, bp, token);
            out.insert(bp.name.clone(), scaled);
        }
        out
    }

    /// Like [`Self::scale_for_all_breakpoints`] but formatted with the
    /// token's unit, ready to embed in a generated style map.
    pub fn scale_to_units(&mut self, base_value: f64, token: Option<&str>) -> IndexMap<Atom, String> {
        let unit = self.unit_for(token);
        self.scale_for_all_breakpoints(base_value, token)
            .into_iter()
            .map(|(name, value)| (name, with_unit(value, &unit)))
            .collect()
    }

    /// Unit for values of `token`: the rule's own unit, else [`DEFAULT_UNIT`].
    pub fn unit_for(&self, token: Option<&str>) -> Atom {
        token
            .and_then(|name| self.config.token(name))
            .and_then(|rule| rule.unit.clone())
            .unwrap_or_else(|| Atom::from(DEFAULT_UNIT))
    }
}

/// `24` + `px` → `"24px"`.
pub fn with_unit(value: f64, unit: &str) -> String {
    format!("{}{unit}", format_number(value))
}

fn compute(
    config: &ResponsiveConfig,
    base_value: f64,
    from: &Viewport,
    to: &Viewport,
    token: Option<&str>,
) -> f64 {
    let strategy = &config.strategy;
    let ratio = strategy.origin.measure(to) / strategy.origin.measure(from);
    let mut scaled = base_value * ratio;

    if let Some(rule) = token.and_then(|name| config.token(name)) {
        scaled = rule.constrain(scaled);
    }

    strategy.rounding.apply(scaled)
}
