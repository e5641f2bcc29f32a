pub mod client;
pub mod error;

pub use client::{ApiClient, LogResponse};
pub use error::{ApiError, Result};
pub use trainerdeck_api;
