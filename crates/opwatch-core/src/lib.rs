//! # opwatch-core
//!
//! Wait primitive for long-running operations on a remote platform API.
//!
//! API calls such as scaling or restarting an app answer immediately with a
//! `Location` header that points at an *operation*. This crate follows that
//! operation to the end:
//!
//! - [`OperationRef`] - owner + id parsed from the location URL
//! - [`OperationsApi`] / [`HttpClient`] - fetch an [`Operation`] snapshot
//! - [`Monitor`] - poll until `done`/`error`, driving a [`Presenter`]
//! - [`attach_url`] - read the attach endpoint of a one-off container
//! - [`Config`] - profiles with API URL and token
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use opwatch_core::{HttpClient, Monitor, NoopPresenter, OperationRef};
//!
//! let client = Arc::new(HttpClient::new("https://api.example.com", &token)?);
//! let op_ref = OperationRef::from_headers(response.headers(), "my-app")?;
//!
//! let outcome = Monitor::new(client).watch(&op_ref, None, &NoopPresenter).await;
//! let elapsed = outcome.into_result()?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod monitor;
pub mod operation;
pub mod progress;

pub use client::{ApiError, HttpClient, OperationsApi};
pub use config::{Config, ConfigError, Profile};
pub use error::{CoreError, Result};
pub use monitor::{Monitor, POLL_INTERVAL, PollOutcome, attach_url, wait_for_operation};
pub use operation::{Operation, OperationRef, OperationStatus, OperationType, StartOneOffData};
pub use progress::{Banner, NoopPresenter, Presenter};
