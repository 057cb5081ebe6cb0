//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::ApiError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Precondition(inner) => format!("Invalid request: {}", inner),
        ApiError::Resolution(inner) => format!("Resolver unavailable: {}", inner),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PreconditionError, ResolutionError};

    #[test]
    fn test_map_error_categories() {
        let e = ApiError::from(PreconditionError::UnknownMatrix("Q".to_string()));
        assert!(map_error(&e).starts_with("Invalid request: "));

        let e = ApiError::from(ResolutionError::Configuration("missing key".to_string()));
        assert!(map_error(&e).starts_with("Resolver unavailable: "));

        let e = ApiError::Runtime("boom".to_string());
        assert_eq!(map_error(&e), "Runtime error: boom");
    }
}
