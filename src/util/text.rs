use std::borrow::Cow;

use unicode_width::UnicodeWidthStr;

/// Calculates the display width of a string in terminal columns.
///
/// Menu names mix hangul, emoji and ASCII; hangul and most emoji occupy two
/// columns each, so byte or char counts produce ragged tables.
///
/// # Examples
///
/// ```
/// use nyam::util::display_width;
///
/// assert_eq!(display_width("pizza"), 5);
/// assert_eq!(display_width("김치찌개"), 8); // 4 hangul syllables * 2 columns
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Removes control characters from a string.
///
/// Names are echoed back to the terminal, so escape sequences smuggled into
/// a stored menu name must never reach stdout. Everything in the Unicode
/// control category is dropped, including ESC, DEL and raw newlines; a menu
/// name is a single display line.
///
/// Returns `Cow::Borrowed` when the input is already clean.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| !c.is_control()).collect())
}
