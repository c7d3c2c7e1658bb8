//! Shared validation and text helpers.
//!
//! Menu names come from user input and end up on the terminal, so they are
//! sanitized (control characters stripped, whitespace trimmed) before they
//! reach the stores. Identifier parsing enforces the positive-integer rule
//! shared with the companion REST backend.

mod text;
mod validation;

pub use text::{display_width, strip_control_chars};
pub use validation::{
    parse_positive_id, sanitize_name, validate_draft, validate_patch, ValidationError,
    MAX_DESCRIPTION_LENGTH, MAX_EMOJI_LENGTH, MAX_HISTORY_LIMIT, MAX_NAME_LENGTH, MAX_URL_LENGTH,
};
