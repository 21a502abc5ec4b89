//! Short-link token generation for recipes.
//!
//! Encodes the recipe-save event (creation timestamp, author id, cooking
//! time) into a compact alphanumeric token. The encoding is reversible and
//! not cryptographic; the triple is effectively unique per save because the
//! timestamp has millisecond resolution, and the recipes table enforces
//! token uniqueness on top of that.

use sqids::Sqids;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShortLinkError {
    #[error("Failed to encode short link: {0}")]
    Encode(#[from] sqids::Error),
}

/// Generate the public short-link token for a recipe.
///
/// Must be called exactly once, when the recipe is first persisted. The
/// stored token is immutable: updates must keep the existing token rather
/// than calling this again.
pub fn generate_short_link(
    creation_timestamp_ms: u64,
    author_id: u64,
    cooking_time: u64,
) -> Result<String, ShortLinkError> {
    let sqids = Sqids::default();
    Ok(sqids.encode(&[creation_timestamp_ms, author_id, cooking_time])?)
}

/// Decode a token back into the integer sequence it was generated from.
///
/// Returns an empty vector for tokens that were not produced by
/// [`generate_short_link`]. Resolution of a token to a recipe goes through
/// the recipes table; this exists for diagnostics.
pub fn decode_short_link(token: &str) -> Vec<u64> {
    Sqids::default().decode(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_short_link(1_700_000_000_000, 42, 30).unwrap();
        let b = generate_short_link(1_700_000_000_000, 42, 30).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tokens_are_alphanumeric() {
        let token = generate_short_link(1_700_000_000_000, 42, 30).unwrap();
        assert!(!token.is_empty());
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_different_inputs_produce_different_tokens() {
        let base = generate_short_link(1_700_000_000_000, 42, 30).unwrap();
        let later = generate_short_link(1_700_000_000_001, 42, 30).unwrap();
        let other_author = generate_short_link(1_700_000_000_000, 43, 30).unwrap();
        let other_time = generate_short_link(1_700_000_000_000, 42, 45).unwrap();
        assert_ne!(base, later);
        assert_ne!(base, other_author);
        assert_ne!(base, other_time);
    }

    #[test]
    fn test_decode_round_trips() {
        let token = generate_short_link(1_700_000_000_000, 42, 30).unwrap();
        assert_eq!(decode_short_link(&token), vec![1_700_000_000_000, 42, 30]);
    }

    #[test]
    fn test_decode_garbage_is_empty() {
        assert_eq!(decode_short_link("!!not a token!!"), Vec::<u64>::new());
    }
}
