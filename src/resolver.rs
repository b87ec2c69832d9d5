//! Locating labels and function ends by scanning the token array.
//!
//! There is no precomputed jump table: every branch and every function
//! declaration walks the tokens, comparing content and ignoring positions.

use crate::token::{ControlLabel, Token, TokenType};

/// Index of the first window at or after `start` whose contents equal
/// `pattern`. A window that reaches the end-of-process sentinel ends the scan.
pub fn find_sequence(tokens: &[Token], start: usize, pattern: &[TokenType]) -> Option<usize> {
    let mut index = start;
    loop {
        let end = (index + pattern.len()).min(tokens.len());
        let window = tokens.get(index..end)?;
        if window.is_empty() || window.iter().any(Token::is_end) {
            return None;
        }
        if window.len() == pattern.len()
            && window
                .iter()
                .zip(pattern.iter())
                .all(|(token, expected)| token.tokentype == *expected)
        {
            return Some(index);
        }
        index += 1;
    }
}

/// Position of the `lbl <label>` declaration, searching from the start.
pub fn find_label(tokens: &[Token], label: &str) -> Option<usize> {
    find_sequence(tokens, 0, &label_marker(label))
}

/// Tokens from `start` up to, not including, `efn <name>`.
pub fn capture_function_body(tokens: &[Token], start: usize, name: &str) -> Option<Vec<Token>> {
    let end = find_sequence(tokens, start, &function_end_marker(name))?;
    Some(tokens[start..end].to_vec())
}

pub fn label_marker(label: &str) -> [TokenType; 2] {
    [
        TokenType::ControlLabel(ControlLabel::Label),
        TokenType::Identifier(label.to_string()),
    ]
}

pub fn function_end_marker(name: &str) -> [TokenType; 2] {
    [
        TokenType::ControlLabel(ControlLabel::FunctionEnd),
        TokenType::Identifier(name.to_string()),
    ]
}
