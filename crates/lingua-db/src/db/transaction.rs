//! Transaction utilities
//!
//! Services open a transaction with `Store::begin`, run every step of an operation
//! against it and hand the outcome to `commit_or_rollback`, which commits on success and
//! rolls back on the first error. Nothing from a failed operation persists.
//!
//! # Example
//!
//! ```ignore
//! use lingua_db::{commit_or_rollback, Store};
//!
//! async fn example(store: &dyn Store) -> Result<(), AppError> {
//!     let mut tx = store.begin().await?;
//!     let result = apply(&mut *tx).await;
//!     commit_or_rollback(tx, result).await
//! }
//! ```

use lingua_core::AppError;

use super::store::StoreTx;

/// Commit the transaction if `result` is `Ok`, otherwise roll it back and return the
/// original error. A failed rollback is logged; the operation's error still wins.
pub async fn commit_or_rollback<T>(
    tx: Box<dyn StoreTx>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(
                    error = %rollback_err,
                    original_error = %err,
                    "Failed to roll back transaction"
                );
            } else {
                tracing::debug!(error = %err, "Transaction rolled back");
            }
            Err(err)
        }
    }
}
