//! Input validation utilities
//!
//! Checks applied to values before they reach the shadow database.

/// Characters that would break a colon-delimited, line-oriented record
const FORBIDDEN: [char; 4] = [':', '\n', '\r', '\0'];

/// Validate that a field can be stored in a shadow record as-is
pub fn is_valid_field(input: &str) -> bool {
    !input.contains(FORBIDDEN)
}
