//! Classification of AWS SDK errors
//!
//! Service errors carry an error code and map through
//! [`BackendErrorKind::from_code`]. Errors raised before any service response
//! (timeouts, DNS, TLS, missing credentials) have no code and count as network
//! failures.

use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;

use crate::error::{BackendErrorKind, BackendFailure};

impl BackendFailure {
    /// Categorize an SDK error by its service error code
    pub fn from_sdk_error<E>(err: &E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let message = err
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| DisplayErrorContext(err).to_string());
        match err.code() {
            Some(code) => Self::from_code(code, message),
            None => Self::new(BackendErrorKind::Network, message),
        }
    }
}
