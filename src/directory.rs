//! Directory parsing: header, recommended-software line, the sequence of
//! router descriptors, and the trailing signature block.

use rsa::RsaPublicKey;

use crate::crypto;
use crate::descriptor::{self, RelayDescriptor};
use crate::error::Error;
use crate::scanner::{Keyword, Scanner, Token};

/// Hard upper bound on the number of descriptors a directory may hold.
/// Descriptors past this are dropped (and logged) rather than aborting the
/// parse.
pub const MAX_ROUTERS_IN_DIR: usize = 1024;

/// The parsed, in-memory router directory.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub routers: Vec<RelayDescriptor>,
    /// Comma-separated list of acceptable client versions. Non-empty iff
    /// this directory came from [`parse_signed_directory`] rather than
    /// [`parse_router_list`].
    pub software_versions: String,
}

const SIGNED_DIRECTORY_ANCHOR: &str = "signed-directory";
const DIRECTORY_SIGNATURE_ANCHOR: &str = "directory-signature";

/// Locate the exact byte range `[signed-directory … directory-signature\n]`
/// and return its SHA-1 digest. This is the range the directory signer
/// actually hashed.
fn signed_range_digest(input: &str) -> Result<[u8; crypto::DIGEST_LEN], Error> {
    let start = input
        .find(SIGNED_DIRECTORY_ANCHOR)
        .ok_or_else(|| Error::Structural(format!("couldn't find {SIGNED_DIRECTORY_ANCHOR:?}")))?;
    let after_start = &input[start..];
    let sig_offset = after_start.find(DIRECTORY_SIGNATURE_ANCHOR).ok_or_else(|| {
        Error::Structural(format!("couldn't find {DIRECTORY_SIGNATURE_ANCHOR:?}"))
    })?;
    let after_sig_keyword = &after_start[sig_offset..];
    let newline_offset = after_sig_keyword
        .find('\n')
        .ok_or_else(|| Error::Structural("couldn't find end of line for directory-signature".to_string()))?;
    let end = start + sig_offset + newline_offset + 1;
    Ok(crypto::sha1_digest(input[start..end].as_bytes()))
}

fn push_descriptor(routers: &mut Vec<RelayDescriptor>, descriptor: RelayDescriptor) {
    if routers.len() >= MAX_ROUTERS_IN_DIR {
        tracing::warn!(
            address = %descriptor.address,
            "dropping router descriptor past MAX_ROUTERS_IN_DIR ({MAX_ROUTERS_IN_DIR})"
        );
        return;
    }
    routers.push(descriptor);
}

/// Parse the bare sequence of `router` descriptors that follows, with no
/// header, footer, or signature. Leaves `software_versions` empty.
pub fn parse_router_list(input: &str) -> Result<Directory, Error> {
    let mut scanner = Scanner::new(input);
    let mut routers = Vec::new();
    let mut token = scanner.next_token();

    loop {
        match token {
            Token::Keyword { keyword: Keyword::Router, args } => {
                let (descriptor, next) = descriptor::parse_descriptor(&mut scanner, args)?;
                push_descriptor(&mut routers, descriptor);
                token = next;
            }
            Token::Eof => break,
            Token::Err(msg) => return Err(Error::Lexical(msg)),
            other => {
                return Err(Error::Structural(format!("expected \"router\" or end of input, got {other:?}")))
            }
        }
    }

    Ok(Directory { routers, software_versions: String::new() })
}

/// Parse a complete signed directory document, optionally verifying its
/// signature against `trusted_key`. If any step fails the partial
/// directory is discarded.
pub fn parse_signed_directory(input: &str, trusted_key: Option<&RsaPublicKey>) -> Result<Directory, Error> {
    let digest = signed_range_digest(input)?;

    let mut scanner = Scanner::new(input);

    match scanner.next_token() {
        Token::Keyword { keyword: Keyword::SignedDirectory, .. } => {}
        Token::Err(msg) => return Err(Error::Lexical(msg)),
        other => return Err(Error::Structural(format!("expected \"signed-directory\", got {other:?}"))),
    }

    let software_versions = match scanner.next_token() {
        Token::Keyword { keyword: Keyword::RecommendedSoftware, args } if args.len() == 1 => {
            args[0].to_string()
        }
        Token::Keyword { keyword: Keyword::RecommendedSoftware, .. } => {
            return Err(Error::Structural("invalid recommended-software line".to_string()))
        }
        Token::Err(msg) => return Err(Error::Lexical(msg)),
        other => return Err(Error::Structural(format!("expected \"recommended-software\", got {other:?}"))),
    };

    let mut routers = Vec::new();
    let mut token = scanner.next_token();
    while let Token::Keyword { keyword: Keyword::Router, args } = token {
        let (descriptor, next) = descriptor::parse_descriptor(&mut scanner, args)?;
        push_descriptor(&mut routers, descriptor);
        token = next;
    }

    match token {
        Token::Keyword { keyword: Keyword::DirectorySignature, .. } => {}
        Token::Err(msg) => return Err(Error::Lexical(msg)),
        other => return Err(Error::Structural(format!("expected \"directory-signature\", got {other:?}"))),
    }

    let signature = match scanner.next_token() {
        Token::Signature(sig) => sig,
        Token::Err(msg) => return Err(Error::Lexical(msg)),
        other => return Err(Error::Structural(format!("expected signature block, got {other:?}"))),
    };

    if let Some(key) = trusted_key {
        crypto::verify_signature(key, &signature, &digest)?;
    }

    match scanner.next_token() {
        Token::Eof => {}
        Token::Err(msg) => return Err(Error::Lexical(msg)),
        other => return Err(Error::Structural(format!("expected end of directory, got {other:?}"))),
    }

    Ok(Directory { routers, software_versions })
}

/// Check the caller's own version string against a directory's
/// recommended-software list by exact, length-equal substring match (no
/// prefix matching: `"1.0"` does not match a list containing `"1.0.0"`).
pub fn check_version(software_versions: &str, my_version: &str) -> bool {
    software_versions.split(',').any(|v| v == my_version)
}
