use thiserror::Error;
use url::Url;

use crate::storage::{FoodDraft, FoodPatch};

use super::strip_control_chars;

/// Maximum length of a menu or category name, in characters.
pub const MAX_NAME_LENGTH: usize = 50;
/// Maximum length of an emoji field, in characters (ZWJ sequences count per scalar).
pub const MAX_EMOJI_LENGTH: usize = 4;
/// Maximum length of a menu description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;
/// Maximum length of an image URL, in characters.
pub const MAX_URL_LENGTH: usize = 500;
/// Largest `--limit` accepted when listing history.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Malformed or missing input. Surfaced to the caller, never retried.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("id must be a positive integer, got '{0}'")]
    InvalidId(String),

    #[error("name cannot be empty or whitespace-only")]
    EmptyName,

    #[error("name exceeds {MAX_NAME_LENGTH} characters")]
    NameTooLong,

    #[error("emoji exceeds {MAX_EMOJI_LENGTH} characters")]
    EmojiTooLong,

    #[error("description exceeds {MAX_DESCRIPTION_LENGTH} characters")]
    DescriptionTooLong,

    #[error("image URL exceeds {MAX_URL_LENGTH} characters")]
    UrlTooLong,

    #[error("image URL is not a valid http(s) URL: {0}")]
    InvalidImageUrl(String),
}

/// Parse a numeric identifier from the command line.
///
/// The same rule the REST backend applies to path and query ids: the value
/// must be a positive integer. `0`, negatives, and non-numeric input are
/// rejected rather than coerced.
pub fn parse_positive_id(raw: &str) -> Result<i64, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidId(raw.to_owned())),
    }
}

/// Sanitize and validate a display name.
///
/// Strips control characters (terminal escape injection), trims whitespace,
/// and rejects empty or oversized results.
pub fn sanitize_name(name: &str) -> Result<String, ValidationError> {
    let sanitized = strip_control_chars(name);
    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(trimmed.to_owned())
}

fn check_emoji(emoji: &str) -> Result<(), ValidationError> {
    if emoji.chars().count() > MAX_EMOJI_LENGTH {
        return Err(ValidationError::EmojiTooLong);
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), ValidationError> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}

fn check_image_url(raw: &str) -> Result<(), ValidationError> {
    if raw.chars().count() > MAX_URL_LENGTH {
        return Err(ValidationError::UrlTooLong);
    }
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidImageUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ValidationError::InvalidImageUrl(format!(
            "unsupported scheme '{scheme}'"
        ))),
    }
}

/// Validate a new menu item before it enters the catalog.
///
/// Returns the draft with its name sanitized. Category existence is
/// deliberately not checked here: the catalog tolerates dangling category
/// references and simply excludes them from the candidate pool.
pub fn validate_draft(mut draft: FoodDraft) -> Result<FoodDraft, ValidationError> {
    draft.name = sanitize_name(&draft.name)?;
    check_emoji(&draft.emoji)?;
    if let Some(description) = &draft.description {
        check_description(description)?;
    }
    if let Some(image_url) = &draft.image_url {
        check_image_url(image_url)?;
    }
    Ok(draft)
}

/// Validate a partial update. Fields left as `None` are not touched;
/// `Some(None)` on an optional field clears it and needs no validation.
pub fn validate_patch(mut patch: FoodPatch) -> Result<FoodPatch, ValidationError> {
    if let Some(name) = &patch.name {
        patch.name = Some(sanitize_name(name)?);
    }
    if let Some(emoji) = &patch.emoji {
        check_emoji(emoji)?;
    }
    if let Some(Some(description)) = &patch.description {
        check_description(description)?;
    }
    if let Some(Some(image_url)) = &patch.image_url {
        check_image_url(image_url)?;
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FoodDraft;

    #[test]
    fn positive_id_parses() {
        assert_eq!(parse_positive_id("42").unwrap(), 42);
        assert_eq!(parse_positive_id(" 7 ").unwrap(), 7);
    }

    #[test]
    fn zero_and_negative_ids_rejected() {
        assert!(parse_positive_id("0").is_err());
        assert!(parse_positive_id("-3").is_err());
    }

    #[test]
    fn non_numeric_id_rejected() {
        assert!(parse_positive_id("abc").is_err());
        assert!(parse_positive_id("1.5").is_err());
        assert!(parse_positive_id("").is_err());
    }

    #[test]
    fn name_is_trimmed_and_stripped() {
        assert_eq!(sanitize_name("  김치찌개  ").unwrap(), "김치찌개");
        assert_eq!(sanitize_name("\x1b피자").unwrap(), "피자");
    }

    #[test]
    fn empty_name_rejected() {
        assert!(matches!(sanitize_name("   "), Err(ValidationError::EmptyName)));
    }

    #[test]
    fn overlong_name_rejected() {
        let name = "가".repeat(MAX_NAME_LENGTH + 1);
        assert!(matches!(sanitize_name(&name), Err(ValidationError::NameTooLong)));
    }

    #[test]
    fn draft_with_bad_image_url_rejected() {
        let draft = FoodDraft {
            name: "피자".into(),
            emoji: "🍕".into(),
            category_id: 3,
            description: None,
            image_url: Some("ftp://example.com/pizza.png".into()),
        };
        assert!(matches!(
            validate_draft(draft),
            Err(ValidationError::InvalidImageUrl(_))
        ));
    }

    #[test]
    fn draft_with_https_image_url_accepted() {
        let draft = FoodDraft {
            name: "피자".into(),
            emoji: "🍕".into(),
            category_id: 3,
            description: Some("치즈 가득".into()),
            image_url: Some("https://example.com/pizza.png".into()),
        };
        assert!(validate_draft(draft).is_ok());
    }

    #[test]
    fn patch_clearing_description_needs_no_validation() {
        let patch = FoodPatch {
            description: Some(None),
            ..FoodPatch::default()
        };
        assert!(validate_patch(patch).is_ok());
    }

    #[test]
    fn patch_with_overlong_description_rejected() {
        let patch = FoodPatch {
            description: Some(Some("가".repeat(MAX_DESCRIPTION_LENGTH + 1))),
            ..FoodPatch::default()
        };
        assert!(matches!(
            validate_patch(patch),
            Err(ValidationError::DescriptionTooLong)
        ));
    }
}
