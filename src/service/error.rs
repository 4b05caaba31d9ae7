//! Error type for catalog service operations.

use thiserror::Error;

use crate::catalog::StoreError;

/// Errors a caller of [`CatalogService`](super::CatalogService) can see.
///
/// Cache and log failures are absorbed by the service; only the
/// authoritative store can fail a request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("catalog store error: {0}")]
    Store(#[from] StoreError),
}
