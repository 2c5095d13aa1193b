pub mod batch;
pub mod core;

#[cfg(test)]
mod tests;

pub use self::batch::ResolutionBatch;
pub use self::core::{BatchReport, CapabilityEngine};
