//! Container name validation
//!
//! Azure Blob Storage container names must be 3-63 characters of lowercase
//! letters, digits and hyphens, start and end with a letter or digit, and
//! never contain two hyphens in a row.

use crate::error::{LifecycleError, Result};
use regex::Regex;

const MIN_NAME_LENGTH: usize = 3;
const MAX_NAME_LENGTH: usize = 63;

/// Validate a container name against the service naming rules
pub fn validate_container_name(name: &str) -> Result<()> {
    if name.len() < MIN_NAME_LENGTH || name.len() > MAX_NAME_LENGTH {
        return Err(LifecycleError::invalid_container_name(
            name,
            format!("must be {MIN_NAME_LENGTH}-{MAX_NAME_LENGTH} characters long"),
        ));
    }

    let re = Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$")?;
    if !re.is_match(name) {
        return Err(LifecycleError::invalid_container_name(
            name,
            "only lowercase letters, digits and hyphens are allowed, and it must start and end with a letter or digit",
        ));
    }

    if name.contains("--") {
        return Err(LifecycleError::invalid_container_name(
            name,
            "consecutive hyphens are not allowed",
        ));
    }

    Ok(())
}

/// Check if a name is a valid container name
pub fn is_valid_container_name(name: &str) -> bool {
    validate_container_name(name).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_container_names() {
        assert!(is_valid_container_name("abc"));
        assert!(is_valid_container_name("blob-storage-dev-guide-example-8"));
        assert!(is_valid_container_name("0logs"));
        assert!(is_valid_container_name(&"a".repeat(63)));
    }

    #[test]
    fn test_invalid_container_names() {
        assert!(!is_valid_container_name("ab")); // Too short
        assert!(!is_valid_container_name(&"a".repeat(64))); // Too long
        assert!(!is_valid_container_name("Upper")); // Uppercase
        assert!(!is_valid_container_name("-leading"));
        assert!(!is_valid_container_name("trailing-"));
        assert!(!is_valid_container_name("double--hyphen"));
        assert!(!is_valid_container_name("under_score"));
    }

    #[test]
    fn test_error_names_the_container() {
        let err = validate_container_name("Bad").unwrap_err();
        assert!(err.to_string().contains("'Bad'"));
    }
}
