pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliArgs, LocalStorage};

pub use config::ReplenishConfig;
pub use core::{
    cancel::CancellationToken,
    engine::ReplenishEngine,
    pipeline::{Collaborators, ReplenishmentPipeline},
};
pub use utils::error::{ReplenishError, Result};
