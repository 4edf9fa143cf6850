//! Service implementations
//!
//! Real implementations of the orchestrator's service traits.

pub mod stage_process;

#[cfg(test)]
mod tests;

pub use stage_process::RealStageRunner;
