//! DoS prevention constants.
//!
//! These limits prevent pathological inputs from causing quadratic or
//! worse time complexity.

/// Maximum nesting depth for block containers (lists, blockquotes, tags)
pub const MAX_BLOCK_NESTING: usize = 64;

/// Maximum live frames on the inline delimiter stack
pub const MAX_DELIMITER_FRAMES: usize = 4096;

/// Maximum backtick run length for code spans (prevents O(n^2) matching)
/// Longer runs are treated as literal text
pub const MAX_CODE_SPAN_BACKTICKS: u32 = 32;

/// Maximum parentheses nesting in link destinations (CommonMark spec: 32)
pub const MAX_LINK_PAREN_DEPTH: u32 = 32;

/// Maximum digits in ordered list marker (prevents big-integer parsing)
pub const MAX_LIST_MARKER_DIGITS: u32 = 9;

/// Maximum length of a link label between brackets
pub const MAX_LINK_LABEL_LEN: u32 = 999;

/// Maximum length of a documentation tag name
pub const MAX_TAG_NAME_LEN: u32 = 64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_reasonable() {
        const { assert!(MAX_BLOCK_NESTING >= 16) };
        const { assert!(MAX_CODE_SPAN_BACKTICKS >= 16) };
        const { assert!(MAX_LIST_MARKER_DIGITS <= 9) };
        const { assert!(MAX_LINK_LABEL_LEN <= 999) };
    }
}
