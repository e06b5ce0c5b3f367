pub mod client;
pub mod error;
pub mod retry;

pub use client::BackendClient;
pub use error::{extract_message, BackendError};
pub use retry::{RetryPolicy, RetryResult};
