use std::path::PathBuf;
use thiserror::Error;

use crate::world::BlockPos;

/// Faults raised while building shops or loading configuration.
///
/// Transaction failures are not errors; see
/// [`TransactionOutcome`](crate::shop::TransactionOutcome).
#[derive(Debug, Error)]
pub enum ShopError {
    #[error("unknown shop type '{0}'")]
    UnknownShopType(String),

    #[error("batch amount must be at least 1, got {0}")]
    InvalidAmount(u32),

    #[error("price must be a finite, non-negative number, got {0}")]
    InvalidPrice(f64),

    #[error("no wall sign at {0}")]
    NotASign(BlockPos),

    #[error("a shop is already registered at {0}")]
    DuplicateShop(BlockPos),

    #[error("failed to load {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },
}
