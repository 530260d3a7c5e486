//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum number of interest tags a user may declare.
const MAX_TAGS: usize = 5;
/// Maximum length of a single tag.
const MAX_TAG_LENGTH: usize = 32;

/// Validates a declared interest tag set: at most five tags, each non-blank
/// and at most 32 characters.
pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        let mut err = ValidationError::new("too_many_tags");
        err.message = Some(format!("at most {MAX_TAGS} tags allowed (got {})", tags.len()).into());
        return Err(err);
    }

    for tag in tags {
        if tag.trim().is_empty() {
            let mut err = ValidationError::new("blank_tag");
            err.message = Some("tags must not be blank".into());
            return Err(err);
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            let mut err = ValidationError::new("tag_too_long");
            err.message =
                Some(format!("tags must be at most {MAX_TAG_LENGTH} characters").into());
            return Err(err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn accepts_reasonable_tag_sets() {
        assert!(validate_tags(&tags(&[])).is_ok());
        assert!(validate_tags(&tags(&["music"])).is_ok());
        assert!(validate_tags(&tags(&["music", "art", "gym", "tech", "food"])).is_ok());
    }

    #[test]
    fn rejects_more_than_five_tags() {
        let too_many = tags(&["a", "b", "c", "d", "e", "f"]);
        assert!(validate_tags(&too_many).is_err());
    }

    #[test]
    fn rejects_blank_and_oversized_tags() {
        assert!(validate_tags(&tags(&["   "])).is_err());
        assert!(validate_tags(&tags(&[&"x".repeat(33)])).is_err());
    }
}
