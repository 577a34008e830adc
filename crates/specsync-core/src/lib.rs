pub mod adf;
pub mod config;
pub mod error;
pub mod estimate;
pub mod io;
pub mod markup;
pub mod paths;
pub mod preflight;
pub mod project;
pub mod remote;
pub mod runner;
pub mod spec_state;
pub mod sync;
pub mod tasks_doc;
pub mod types;
pub mod validate;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SyncError};
