//! Lexical scanner for directory documents.
//!
//! Turns a `&str` cursor into a stream of [`Token`]s: recognized keyword
//! lines (with up to [`MAX_ARGS`] arguments), PEM-armored RSA public keys,
//! base64-armored signatures, end-of-input, or a lexical error. Whitespace
//! (the standard ASCII rule) and `#`-comments are skipped between tokens.
//!
//! The scanner never allocates except for the decoded payload of a key or
//! signature token — everything else borrows from the input buffer.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_till1, take_until, take_while, take_while1};
use nom::character::complete::line_ending;
use nom::combinator::map;
use nom::IResult;
use rsa::RsaPublicKey;

use crate::crypto;

/// Upper bound on arguments accepted on a single keyword line.
pub const MAX_ARGS: usize = 8;

const KEY_BEGIN: &str = "-----BEGIN RSA PUBLIC KEY-----\n";
const KEY_END: &str = "-----END RSA PUBLIC KEY-----";
const SIG_BEGIN: &str = "-----BEGIN SIGNATURE-----\n";
const SIG_END: &str = "-----END SIGNATURE-----";

/// The fixed table of keywords this document format understands. Any other
/// leading word is a lexical error — implementations must not silently
/// ignore unrecognized keywords here (unlike the richer per-relay descriptor
/// formats this one was distilled from).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Accept,
    DirectorySignature,
    Reject,
    Router,
    RecommendedSoftware,
    SignedDirectory,
    SigningKey,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Keyword> {
        Some(match word {
            "accept" => Keyword::Accept,
            "directory-signature" => Keyword::DirectorySignature,
            "reject" => Keyword::Reject,
            "router" => Keyword::Router,
            "recommended-software" => Keyword::RecommendedSoftware,
            "signed-directory" => Keyword::SignedDirectory,
            "signing-key" => Keyword::SigningKey,
            _ => return None,
        })
    }
}

/// One lexical unit of a directory document.
pub enum Token<'a> {
    Keyword { keyword: Keyword, args: Vec<&'a str> },
    PublicKey(Box<RsaPublicKey>),
    Signature(Box<[u8; crypto::SIGNATURE_LEN]>),
    Eof,
    Err(String),
}

impl std::fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Keyword { keyword, args } => {
                f.debug_struct("Keyword").field("keyword", keyword).field("args", args).finish()
            }
            Token::PublicKey(_) => f.write_str("PublicKey(..)"),
            Token::Signature(_) => f.write_str("Signature(..)"),
            Token::Eof => f.write_str("Eof"),
            Token::Err(msg) => f.debug_tuple("Err").field(msg).finish(),
        }
    }
}

fn is_keyword_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn is_intraline_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn keyword_word(input: &str) -> IResult<&str, &str> {
    take_while1(is_keyword_char)(input)
}

fn arg_word(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| is_intraline_space(c) || c == '\n')(input)
}

/// Consume the arguments following a keyword, stopping at the newline. Does
/// not enforce [`MAX_ARGS`] itself — the caller checks the count so that
/// "too many arguments" is reported with the same diagnostic regardless of
/// how many extra words were present.
fn args_line(mut input: &str) -> IResult<&str, Vec<&str>> {
    let mut args = Vec::new();
    loop {
        let (rest, _) = take_while(is_intraline_space)(input)?;
        input = rest;
        if input.is_empty() || input.starts_with('\n') {
            break;
        }
        let (rest, word) = arg_word(input)?;
        args.push(word);
        input = rest;
    }
    Ok((input, args))
}

fn pem_key_block(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag(KEY_BEGIN)(input)?;
    let (input, body) = take_until(KEY_END)(input)?;
    let (input, _) = tag(KEY_END)(input)?;
    let (input, _) = line_ending(input)?;
    Ok((input, body))
}

fn signature_block(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag(SIG_BEGIN)(input)?;
    let (input, body) = take_until(SIG_END)(input)?;
    let (input, _) = tag(SIG_END)(input)?;
    let (input, _) = line_ending(input)?;
    Ok((input, body))
}

fn armored_block(input: &str) -> IResult<&str, ArmoredBlock<'_>> {
    alt((map(pem_key_block, ArmoredBlock::Key), map(signature_block, ArmoredBlock::Signature)))(input)
}

enum ArmoredBlock<'a> {
    Key(&'a str),
    Signature(&'a str),
}

/// A pure, allocation-free (except for decoded payloads) cursor over a
/// directory document. Identical input at an identical position always
/// yields the identical token and the identical advance.
pub struct Scanner<'a> {
    input: &'a str,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Scanner { input }
    }

    /// The unconsumed remainder of the buffer.
    pub fn remaining(&self) -> &'a str {
        self.input
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let before = self.input.len();
            self.input = self.input.trim_start_matches(|c: char| c.is_ascii_whitespace());
            if self.input.starts_with('#') {
                self.input = match self.input.find('\n') {
                    Some(idx) => &self.input[idx..],
                    None => "",
                };
            }
            if self.input.len() == before {
                break;
            }
        }
    }

    /// Produce the next token, advancing the cursor past it.
    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace_and_comments();

        if self.input.is_empty() {
            return Token::Eof;
        }

        if self.input.starts_with('-') {
            return match armored_block(self.input) {
                Ok((rest, ArmoredBlock::Key(body))) => {
                    self.input = rest;
                    match crypto::parse_public_key(body) {
                        Ok(key) => Token::PublicKey(Box::new(key)),
                        Err(e) => Token::Err(e.to_string()),
                    }
                }
                Ok((rest, ArmoredBlock::Signature(body))) => {
                    self.input = rest;
                    match crypto::decode_signature(body) {
                        Ok(sig) => Token::Signature(Box::new(sig)),
                        Err(e) => Token::Err(e.to_string()),
                    }
                }
                Err(_) => Token::Err("unrecognized begin line".to_string()),
            };
        }

        self.scan_keyword_line()
    }

    fn scan_keyword_line(&mut self) -> Token<'a> {
        let (rest, word) = match keyword_word(self.input) {
            Ok(ok) => ok,
            Err(_) => return Token::Err("unrecognized command".to_string()),
        };
        let keyword = match Keyword::from_word(word) {
            Some(k) => k,
            None => return Token::Err(format!("unrecognized command {word:?}")),
        };

        let (rest, args) = match args_line(rest) {
            Ok(ok) => ok,
            Err(_) => return Token::Err("unexpected EOF in argument list".to_string()),
        };
        if args.len() > MAX_ARGS {
            return Token::Err("too many arguments".to_string());
        }

        match line_ending::<&str, nom::error::Error<&str>>(rest) {
            Ok((rest, _)) => {
                self.input = rest;
                Token::Keyword { keyword, args }
            }
            Err(_) => Token::Err("no newline at EOF".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_keyword_with_args() {
        let mut s = Scanner::new("router relay1 9001 0 0 1000\nrouter relay2 9002 0 0 2000\n");
        match s.next_token() {
            Token::Keyword { keyword: Keyword::Router, args } => {
                assert_eq!(args, vec!["relay1", "9001", "0", "0", "1000"]);
            }
            other => panic!("unexpected token: {other:?}"),
        }
        assert_eq!(s.remaining(), "router relay2 9002 0 0 2000\n");
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let mut s = Scanner::new("# a comment\n\n   \nrouter r 1 2 3 4\n");
        match s.next_token() {
            Token::Keyword { keyword: Keyword::Router, .. } => {}
            other => panic!("unexpected token: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_keyword() {
        let mut s = Scanner::new("bogus 1 2 3\n");
        match s.next_token() {
            Token::Err(_) => {}
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_too_many_arguments() {
        let mut s = Scanner::new("accept 1 2 3 4 5 6 7 8 9\n");
        match s.next_token() {
            Token::Err(msg) => assert!(msg.contains("too many")),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn armored_block_preserves_hash_verbatim() {
        // A '#' inside an armored block is not a comment introducer; the
        // block is consumed byte-for-byte up to its end tag.
        let input = "-----BEGIN RSA PUBLIC KEY-----\nAB#CD\n-----END RSA PUBLIC KEY-----\nrest\n";
        let (rest, consumed) = pem_key_block(input).unwrap();
        assert_eq!(rest, "rest\n");
        assert!(consumed.contains("AB#CD"));
    }

    #[test]
    fn eof_at_end_of_buffer() {
        let mut s = Scanner::new("   \n# trailing comment");
        match s.next_token() {
            Token::Eof => {}
            other => panic!("expected Eof, got {other:?}"),
        }
    }
}
