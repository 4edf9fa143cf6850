//! Pipeline core business logic

pub mod compiler;
pub mod curator;
pub mod executor;
pub mod policy;
pub mod prompt;
pub mod reducer;
pub mod sampling;

pub use compiler::ActionCompiler;
pub use curator::Curator;
pub use executor::ActionExecutor;
pub use policy::{CategoryMinimum, KeywordRule, QueryPolicy};
pub use reducer::Reducer;
pub use sampling::sample_preserving_order;
