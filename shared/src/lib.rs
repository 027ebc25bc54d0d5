mod threshold;

pub mod github;

#[cfg(feature = "client")]
pub mod workflow;

pub use threshold::*;
