//! Result type alias for Vigil

use super::errors::VigilError;

/// Result type alias for Vigil operations
///
/// # Examples
///
/// ```
/// use vigil::domain::result::Result;
/// use vigil::domain::errors::VigilError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(VigilError::InvalidDate("2025-13-01".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, VigilError>;
