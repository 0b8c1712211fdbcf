pub mod cache;
pub mod compiler;
pub mod config;
pub mod context;
pub mod options;
pub mod scaling;

pub use cache::{CacheStats, Metrics, TransformCache};
pub use compiler::{CallShape, CompileError, DeclarationKind, IneligibleReason, ShapeRegistry};
pub use config::{
    Breakpoint, ConfigError, Origin, ResponsiveConfig, Rounding, RoundingMode, ScaleRule,
    ScalingStrategy, TokenRule, Viewport,
};
pub use context::{CallSite, CompilerContext, SiteOutcome, UnitMetrics, UnitState};
pub use options::{CompileFailure, ErrorCallback, TransformOptions};
pub use scaling::ScalingEngine;
