//! Result type alias for the exporter

use super::errors::ExporterError;

/// Result type alias using [`ExporterError`] as the error type
///
/// # Examples
///
/// ```
/// use resource_exporter::domain::result::Result;
/// use resource_exporter::domain::errors::ExporterError;
///
/// fn failing_function() -> Result<()> {
///     Err(ExporterError::Configuration("entrypoint not provided".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ExporterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
