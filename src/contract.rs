//! # contract: interface to the discount code API
//!
//! This module defines the single trait ([`DiscountCodesApi`]) through which
//! the rest of the crate talks to the commerce platform. The production
//! implementation is the REST client in [`crate::client`]; tests use the
//! generated mock.
//!
//! ## Interface & Extensibility
//! - Implement [`DiscountCodesApi`] to target another backend (a different
//!   platform region, a recording proxy, a fixture server).
//! - All methods are async and return [`ApiResult`]; implementations map
//!   their transport errors into [`crate::error::ApiError`].
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::ApiResult;
use crate::models::{DiscountCode, DiscountCodeDraft, DiscountCodeUpdate};

/// Operations on the platform's discount code endpoint.
///
/// Implementations must treat the platform as the source of truth: every
/// method reports what the platform returned, never a locally cached view.
///
/// The trait is `Send + Sync` and intended for async/await usage.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DiscountCodesApi: Send + Sync {
    /// Create a discount code from a draft. Fails with a 400-mapped error if
    /// the code string already exists in the project.
    async fn create(&self, draft: &DiscountCodeDraft) -> ApiResult<DiscountCode>;

    /// Fetch a single discount code by its platform ID. `NotFound` if it no
    /// longer exists.
    async fn get_by_id(&self, id: &str) -> ApiResult<DiscountCode>;

    /// Look up a discount code by its unique code string. Returns `None`
    /// when no code matches, which is an answer rather than an error.
    async fn find_by_code(&self, code: &str) -> ApiResult<Option<DiscountCode>>;

    /// List every discount code in the project, following pagination until
    /// exhausted.
    async fn list_all(&self) -> ApiResult<Vec<DiscountCode>>;

    /// Apply an ordered list of update actions at the given version.
    /// Returns the updated resource with its new version.
    async fn update(&self, id: &str, update: &DiscountCodeUpdate) -> ApiResult<DiscountCode>;

    /// Delete a discount code at the given version, erasing redemption data
    /// with it. Returns the final state of the deleted resource.
    async fn delete(&self, id: &str, version: i64) -> ApiResult<DiscountCode>;
}
