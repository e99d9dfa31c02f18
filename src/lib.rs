pub mod boundary;
pub mod changelog;
pub mod config;
pub mod domain;
pub mod error;
pub mod files;
pub mod git;
pub mod metrics;
pub mod notify;
pub mod release;
pub mod runner;
pub mod ui;

pub use error::{ReleaseError, Result};
