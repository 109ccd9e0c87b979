#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end runs of the diet insights pipeline.
//!
//! Three entry points share the same building blocks:
//!
//! - [`local::run_local`]: file on disk, then analysis, then optional
//!   charts and result document.
//! - [`function::run_function`]: blob download, then analysis, then
//!   result document.
//! - [`upload::upload_dataset`]: local file to blob storage, with
//!   verification and listing.
//!
//! Every failure is a [`PipelineError`] whose [`PipelineError::kind`] maps
//! onto the user-facing [`ErrorKind`] taxonomy.

pub mod config;
pub mod error;
pub mod function;
pub mod local;
pub mod report;
pub mod upload;

pub use error::{ErrorKind, PipelineError};
