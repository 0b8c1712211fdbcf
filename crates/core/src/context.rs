//! Per-session compiler context.
//!
//! One [`CompilerContext`] owns the scaling engine, the transformation cache
//! and the options for a build session. Hosts that compile units in parallel
//! create one context per worker; nothing here is shared behind a lock.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use vpscale_syntax::{Atom, Call, Node, NodeEditor, SourceLocation};

use crate::cache::{CacheStats, TransformCache};
use crate::compiler::{
    CallShape, CompileError, IneligibleReason, ShapeRegistry, aggregate, check_eligibility,
    single_value,
};
use crate::config::ResponsiveConfig;
use crate::options::{CompileFailure, TransformOptions};
use crate::scaling::ScalingEngine;

/// One visited call expression.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub call: Node,
    pub location: SourceLocation,
    /// The call's original source text, when the host has it.
    pub source: Option<String>,
}

impl CallSite {
    pub fn new(call: Node) -> Self {
        Self {
            call,
            location: SourceLocation::default(),
            source: None,
        }
    }

    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = SourceLocation { line, column };
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Original text if known, else the printed node.
    pub fn source_text(&self) -> Cow<'_, str> {
        match &self.source {
            Some(text) => Cow::Borrowed(text),
            None => Cow::Owned(self.call.to_string()),
        }
    }
}

/// Counters for one compilation unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitMetrics {
    pub compiled: u32,
    pub cache_hits: u32,
    pub ineligible: u32,
    pub errors: u32,
}

/// State the host keeps per compilation unit and hands to every call.
#[derive(Debug, Clone, Default)]
pub struct UnitState {
    pub file: Atom,
    pub has_transformations: bool,
    /// `"importedName:sourceModule"` entries already bound in the unit.
    pub existing_imports: BTreeSet<String>,
    /// Helpers the generated code needs that the unit does not import yet.
    pub required_imports: BTreeSet<String>,
    pub metrics: UnitMetrics,
}

impl UnitState {
    pub fn new(file: impl Into<Atom>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    pub fn with_existing_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.existing_imports
            .extend(imports.into_iter().map(Into::into));
        self
    }

    fn require_import(&mut self, name: &str, source: &str) {
        let import = format!("{name}:{source}");
        if !self.existing_imports.contains(&import) {
            self.required_imports.insert(import);
        }
    }
}

/// What happened at one call site.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteOutcome {
    /// Not a call the registry knows.
    Unrecognized,
    /// Recognized, but the options turn this shape off.
    Skipped,
    /// Recognized, but arguments are not all literals.
    Ineligible(IneligibleReason),
    /// Declaration-only accessor; node untouched, unit flagged.
    Marked,
    Compiled { from_cache: bool },
    /// Compilation failed; node untouched, failure reported.
    Failed,
}

#[derive(Debug)]
pub struct CompilerContext {
    options: TransformOptions,
    registry: ShapeRegistry,
    engine: ScalingEngine,
    cache: TransformCache,
}

impl CompilerContext {
    pub fn new(config: ResponsiveConfig, options: TransformOptions) -> Self {
        let cache = TransformCache::new(options.cache_size);
        Self {
            engine: ScalingEngine::new(Arc::new(config)),
            registry: ShapeRegistry::standard(),
            cache,
            options,
        }
    }

    pub fn with_registry(mut self, registry: ShapeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ShapeRegistry {
        &mut self.registry
    }

    pub fn engine_mut(&mut self) -> &mut ScalingEngine {
        &mut self.engine
    }

    pub fn cache(&self) -> &TransformCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TransformCache {
        &mut self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Replace the configuration. Cached outputs were generated from the old
    /// one and are dropped with the engine's memo.
    pub fn update_config(&mut self, config: ResponsiveConfig) {
        self.engine.update_config(Arc::new(config));
        self.cache.clear();
    }

    /// Classify, check and (if eligible) rewrite one call site through
    /// `editor`. Never fails: on any error the node stays as written.
    pub fn process_call(
        &mut self,
        site: &CallSite,
        state: &mut UnitState,
        editor: &mut dyn NodeEditor,
    ) -> SiteOutcome {
        let Some(shape) = self.registry.classify(&site.call) else {
            return SiteOutcome::Unrecognized;
        };
        let Some(call) = site.call.as_call() else {
            return SiteOutcome::Unrecognized;
        };

        match shape {
            CallShape::DeclarationOnly(kind) => {
                tracing::debug!(?kind, file = %state.file, "declaration-only call");
                state.has_transformations = true;
                return SiteOutcome::Marked;
            }
            CallShape::Aggregate if !self.options.generate_styles => return SiteOutcome::Skipped,
            _ if !self.options.precompute => return SiteOutcome::Skipped,
            CallShape::SingleValue | CallShape::Aggregate => {}
        }

        if let Err(reason) = check_eligibility(shape, &call.args) {
            tracing::debug!(shape = shape.name(), %reason, "call left as written");
            state.metrics.ineligible += 1;
            return SiteOutcome::Ineligible(reason);
        }

        let started = Instant::now();
        let source = site.source_text();

        if self.options.enable_caching
            && let Some(node) = self.cache.get_with(&source, &self.options, |text| {
                serde_json::from_str::<Node>(text).ok()
            })
        {
            editor.replace(node);
            self.finish(shape, state);
            state.metrics.cache_hits += 1;
            self.cache.update_metrics(elapsed_ms(started), false);
            return SiteOutcome::Compiled { from_cache: true };
        }

        match self.compile(shape, call) {
            Ok(node) => {
                if self.options.enable_caching {
                    match serde_json::to_string(&node) {
                        Ok(text) => self.cache.set(&source, text, &self.options),
                        Err(error) => tracing::debug!(%error, "compiled output not cached"),
                    }
                }
                editor.replace(node);
                self.finish(shape, state);
                self.cache.update_metrics(elapsed_ms(started), false);
                SiteOutcome::Compiled { from_cache: false }
            }
            Err(error) => {
                self.report(&CompileFailure {
                    error,
                    file: state.file.clone(),
                    location: site.location,
                    snippet: source.into_owned(),
                });
                state.metrics.errors += 1;
                self.cache.update_metrics(elapsed_ms(started), true);
                SiteOutcome::Failed
            }
        }
    }

    fn compile(&mut self, shape: CallShape, call: &Call) -> Result<Node, CompileError> {
        match shape {
            CallShape::SingleValue => single_value::compile(call, &mut self.engine),
            CallShape::Aggregate => aggregate::compile(call, &mut self.engine),
            CallShape::DeclarationOnly(_) => Ok(Node::Call(call.clone())),
        }
    }

    fn finish(&self, shape: CallShape, state: &mut UnitState) {
        state.has_transformations = true;
        state.metrics.compiled += 1;
        for helper in shape.runtime_helpers() {
            state.require_import(helper, &self.options.import_source);
        }
    }

    fn report(&self, failure: &CompileFailure) {
        if self.options.development {
            tracing::warn!(%failure, "responsive call not precompiled");
        } else {
            tracing::debug!(%failure, "responsive call not precompiled");
        }
        if let Some(on_error) = &self.options.on_error {
            on_error(failure);
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
