//! Compile and cache dependency-linked CSS, LESS and JavaScript libraries.
//!
//! [`CompilationService`] assembles a library and its dependencies into a
//! single artifact. [`ScriptManager`] puts the [cache](stitch_cache) in
//! front of it and populates the cache off the request path through a
//! [`JobQueue`].

pub mod error;
mod jobs;
pub mod logging;
mod manager;
mod service;

pub use crate::jobs::{DEFAULT_CONCURRENCY, JobHandle, JobQueue, RebuildJob, Written, rebuild};
pub use crate::manager::{ScriptManager, Served};
pub use crate::service::CompilationService;
