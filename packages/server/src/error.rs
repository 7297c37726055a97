//! Process-level errors returned by [`run`](crate::ui::run).

use thiserror::Error;

use crate::domain::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to open message store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
