//! Notes hashing.
//!
//! Only the SHA-256 digest of the notes goes on-chain. Encrypting the
//! plaintext and storing it off-chain is an external dependency this crate
//! does not implement; callers must not assume the text is recoverable.

use sha2::{Digest, Sha256};

/// SHA-256 of the UTF-8 notes text.
pub fn hash_notes(notes: &str) -> [u8; 32] {
    Sha256::digest(notes.as_bytes()).into()
}

pub fn hash_notes_hex(notes: &str) -> String {
    hex::encode(hash_notes(notes))
}
