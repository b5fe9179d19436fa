use super::ApiError;
use crate::constants::limits::MAX_USERNAME_LEN;
use crate::domain::RecordId;

const MAX_ID_LEN: usize = 64;

pub fn validate_record_id(id: &str) -> Result<RecordId, ApiError> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(ApiError::validation(format!(
            "Invalid ID: must be between 1 and {} characters",
            MAX_ID_LEN
        )));
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ApiError::validation(
            "Invalid ID: only letters, numbers and hyphens are allowed",
        ));
    }

    Ok(RecordId::from(id))
}

pub fn validate_username_base(base: &str) -> Result<&str, ApiError> {
    let trimmed = base.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }

    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be {} characters or less",
            MAX_USERNAME_LEN
        )));
    }

    Ok(trimmed)
}

pub fn validate_rating(rating: f64) -> Result<f64, ApiError> {
    if !rating.is_finite() || rating < 0.0 {
        return Err(ApiError::validation(format!(
            "Invalid rating: {}. Rating must be a non-negative number",
            rating
        )));
    }
    Ok(rating)
}

pub fn validate_skill(skill: &str) -> Result<&str, ApiError> {
    let trimmed = skill.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Skill name cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_record_id() {
        assert!(validate_record_id("6f9619ff-8b86-d011-b42d-00c04fc964ff").is_ok());
        assert!(validate_record_id("abc123").is_ok());
        assert!(validate_record_id("").is_err());
        assert!(validate_record_id("a".repeat(65).as_str()).is_err());
        assert!(validate_record_id("../etc").is_err());
        assert!(validate_record_id("id with space").is_err());
    }

    #[test]
    fn test_validate_username_base() {
        assert_eq!(validate_username_base("  alex ").unwrap(), "alex");
        assert!(validate_username_base("   ").is_err());
        assert!(validate_username_base("x".repeat(65).as_str()).is_err());
    }

    #[test]
    fn test_validate_rating() {
        assert!(validate_rating(0.0).is_ok());
        assert!(validate_rating(4.5).is_ok());
        assert!(validate_rating(-1.0).is_err());
        assert!(validate_rating(f64::NAN).is_err());
        assert!(validate_rating(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_skill() {
        assert_eq!(validate_skill(" Rust ").unwrap(), "Rust");
        assert!(validate_skill("").is_err());
    }
}
