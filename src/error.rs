//! Crate-wide error type.
//!
//! Mirrors the four error kinds called out by the directory subsystem: a
//! malformed token stream, a well-formed-but-wrong-shape document, a failed
//! cryptographic check, or a failed address resolution. The first three abort
//! whatever parse or install was in progress; the caller decides what to do
//! next (the previous directory, if any, is always left untouched). Failed
//! resolutions never reach this type — they are logged and the affected
//! descriptor is dropped in place (see `resolve::resolve_and_compact`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed armored block, unknown keyword, too many arguments, or a
    /// keyword line with no terminating newline.
    #[error("lexical error: {0}")]
    Lexical(String),

    /// Required token missing or out of order, wrong argument count, or a
    /// numeric field that is zero where the grammar requires non-zero.
    #[error("structural error: {0}")]
    Structural(String),

    /// Key parse failure, wrong signature length, or a signature that does
    /// not match the expected digest.
    #[error("cryptographic error: {0}")]
    Cryptographic(String),
}
