//! Cart service errors.

use thiserror::Error;

use crate::cart::{guest::GuestStoreError, remote::RemoteStoreError};

/// Failures surfaced at the cart façade boundary. All are terminal: the
/// in-memory state is left at its last-good value and exactly one error
/// notification has been emitted.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// An add was attempted on a product that cannot be purchased.
    #[error("{name} is out of stock")]
    OutOfStock {
        /// Display name of the rejected product.
        name: String,
    },

    /// A remote cart-store call failed.
    #[error("cart sync failed")]
    Remote(#[source] RemoteStoreError),

    /// Writing the guest cart to local storage failed.
    #[error("guest cart storage failed")]
    Guest(#[source] GuestStoreError),
}

impl From<RemoteStoreError> for CartServiceError {
    fn from(error: RemoteStoreError) -> Self {
        Self::Remote(error)
    }
}

impl From<GuestStoreError> for CartServiceError {
    fn from(error: GuestStoreError) -> Self {
        Self::Guest(error)
    }
}
