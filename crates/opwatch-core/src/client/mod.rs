//! Operations API access
//!
//! The monitor only needs one capability from the remote service: fetch an
//! operation by owner and id. That capability is the [`OperationsApi`] trait,
//! so the monitor can be driven by [`HttpClient`] in production and by a
//! scripted fake in tests.

mod error;
mod http;

pub use error::ApiError;
pub use http::HttpClient;

use async_trait::async_trait;

use crate::operation::Operation;

/// Fetch operation snapshots from the remote service
#[async_trait]
pub trait OperationsApi: Send + Sync {
    /// Fetch the current state of operation `operation_id` owned by `app`
    async fn fetch_operation(
        &self,
        app: &str,
        operation_id: &str,
    ) -> Result<Operation, ApiError>;
}
