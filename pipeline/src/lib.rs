//! Feed curation pipeline library
//!
//! Provides the stage implementations (reducer, curator, action compiler,
//! action executor), the collaborator seams they depend on, and real clients
//! for the classification service and the browser-automation sidecar.

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod stages;
pub mod traits;
pub mod types;

// Re-export main types
pub use config::{ClassifierConfig, CompilerConfig, CuratorConfig, PacingConfig, PipelineConfig, RubricSource};
pub use core::{ActionCompiler, ActionExecutor, CategoryMinimum, Curator, KeywordRule, QueryPolicy, Reducer};
pub use error::{PipelineError, PipelineResult};
pub use traits::*;
pub use types::*;
