//! Session token generation
//!
//! Tokens are opaque URL-safe strings drawn from a secure random source.
//! Uniqueness against the stored population is the repository's job; this
//! module only produces candidates.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Random bytes per token; 128 bits keeps collisions negligible
pub const TOKEN_BYTES: usize = 16;

/// Generate a URL-safe random session token
pub fn new_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
