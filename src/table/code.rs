//! Table code generation and normalization.

use super::errors::{TableError, TableResult};
use crate::constants::{CODE_ALPHABET, CODE_LENGTH, MAX_CODE_ATTEMPTS};
use crate::store::TableStore;
use rand::Rng;

/// Draw a six-character code uniformly from the restricted alphabet.
pub fn generate_code<R: Rng>(rng: &mut R) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generate a code that no table currently uses.
///
/// Uniqueness is checked with read-only lookups and retried up to
/// [`MAX_CODE_ATTEMPTS`] times. This is a best-effort precondition:
/// the subsequent create is not atomic against a racing creator.
///
/// # Errors
///
/// * `TableError::CodeGenerationExhausted` if every attempt collided
/// * `TableError::Store` if a lookup failed
pub async fn create_unique_code<S>(store: &S) -> TableResult<String>
where
    S: TableStore + ?Sized,
{
    let mut rng = rand::rng();
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_code(&mut rng);
        if store.get(&code).await?.is_none() {
            return Ok(code);
        }
        log::debug!("table code {code} already taken, retrying");
    }
    Err(TableError::CodeGenerationExhausted)
}

/// Canonical form of a user-supplied or route-supplied code: strip
/// everything non-alphanumeric and uppercase the rest.
pub fn normalize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
