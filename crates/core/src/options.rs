use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vpscale_syntax::{Atom, SourceLocation};

use crate::cache::DEFAULT_CAPACITY;
use crate::compiler::CompileError;

pub const DEFAULT_IMPORT_SOURCE: &str = "@vpscale/runtime";

/// A call site that could not be compiled. The site itself is left as
/// written; this is what the error callback and the logs see.
#[derive(Debug, Clone)]
pub struct CompileFailure {
    pub error: CompileError,
    pub file: Atom,
    pub location: SourceLocation,
    pub snippet: String,
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {} in `{}`", self.file, self.location, self.error, self.snippet)
    }
}

pub type ErrorCallback = Arc<dyn Fn(&CompileFailure) + Send + Sync>;

/// Options recognized by the precompiler. Unknown fields are ignored so a
/// host can pass its whole plugin options object through.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Replace eligible value/style calls with precomputed tables.
    pub precompute: bool,
    /// Louder failure logging.
    pub development: bool,
    pub enable_caching: bool,
    pub cache_size: usize,
    /// Module the generated runtime helpers are imported from.
    pub import_source: String,
    /// Rewrite `responsiveStyle` calls.
    pub generate_styles: bool,
    /// Where the host loaded the configuration from. Only used to keep cache
    /// entries of different configurations apart.
    pub config_path: Option<String>,
    #[serde(skip)]
    pub on_error: Option<ErrorCallback>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            precompute: true,
            development: false,
            enable_caching: true,
            cache_size: DEFAULT_CAPACITY,
            import_source: DEFAULT_IMPORT_SOURCE.to_string(),
            generate_styles: true,
            config_path: None,
            on_error: None,
        }
    }
}

impl std::fmt::Debug for TransformOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformOptions")
            .field("precompute", &self.precompute)
            .field("development", &self.development)
            .field("enable_caching", &self.enable_caching)
            .field("cache_size", &self.cache_size)
            .field("import_source", &self.import_source)
            .field("generate_styles", &self.generate_styles)
            .field("config_path", &self.config_path)
            .field("on_error", &self.on_error.as_ref().map(|_| ".."))
            .finish()
    }
}
