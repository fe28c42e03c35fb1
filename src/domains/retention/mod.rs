//! Retention domain module.
//!
//! Some plugins copy source files into the build directory so that they can
//! still be rendered after the workspace is gone. This module decides what
//! happens to those copies in older builds.
//!
//! ## Architecture
//!
//! - `strategy.rs` - The retention strategies and their cleanup functions
//! - `build.rs` - Access to the builds of a job
//! - `error.rs` - Retention-specific error types

mod build;
mod error;
mod strategy;

pub use build::{BuildRecord, LocalBuild};
pub use error::RetentionError;
pub use strategy::SourceCodeRetention;
