//! Target-driven media compression.
//!
//! Assets are probed for metadata, the user's objective is resolved into
//! concrete encoder parameters, and an external encoder produces the output.

pub mod analyzer;
pub mod asset;
pub mod cli;
pub mod config;
pub mod drift;
pub mod encoder;
pub mod error;
pub mod package;
pub mod queue;
pub mod resolver;
pub mod result;
pub mod settings;
pub mod utils;

pub use asset::{Asset, MediaKind};
pub use error::{AppError, CompressError, ReductionUndefined};
pub use result::CompressionResult;
pub use settings::{Modifiers, Objective, Settings};
