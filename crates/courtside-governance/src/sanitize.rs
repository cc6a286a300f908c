// crates/courtside-governance/src/sanitize.rs
// ============================================================================
// Module: Input Sanitization
// Description: Strips invisible code points and markup from proposal text.
// Purpose: Keep raw governor input from smuggling structure to the model.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Sanitization runs before classification and interpretation: invisible and
//! control code points are removed, HTML-like tags are stripped, and
//! whitespace is collapsed. The raw text is preserved verbatim on the
//! proposal for audit; only the sanitized copy reaches the model.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum sanitized proposal length in characters.
pub const MAX_PROPOSAL_CHARS: usize = 2_000;

// ============================================================================
// SECTION: Sanitization
// ============================================================================

/// Returns true for code points sanitization removes outright.
fn is_invisible(character: char) -> bool {
    let code = character as u32;
    character.is_control() && character != '\n' && character != '\t'
        || (0x200B..=0x200F).contains(&code)
        || (0x202A..=0x202E).contains(&code)
        || (0x2060..=0x2064).contains(&code)
        || code == 0xFEFF
}

/// Sanitizes raw proposal text.
///
/// Strips invisible code points, removes `<...>` spans, collapses runs of
/// whitespace to single spaces, and truncates to [`MAX_PROPOSAL_CHARS`].
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut in_tag = false;
    for character in raw.chars() {
        match character {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag || is_invisible(character) => {}
            _ => cleaned.push(character),
        }
    }
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(MAX_PROPOSAL_CHARS).collect()
}
