//! Runtime error taxonomy, stable error codes, and host-facing rendering.

pub mod error;
pub mod error_codes;
pub mod report;

pub use error::{Blame, RuntimeError};
pub use error_codes::ErrorCode;
pub use report::ErrorReport;
