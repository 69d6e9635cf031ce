//! A single relay's advertised endpoint, keys, and exit policy.

use rsa::RsaPublicKey;

use crate::error::Error;
use crate::exit_policy::{self, ExitPolicyRule, PolicyKind};
use crate::scanner::{Keyword, Scanner, Token};

/// One record from a directory: one relay, as advertised by the `router`
/// line and everything that follows it.
#[derive(Debug, Clone)]
pub struct RelayDescriptor {
    /// Original textual hostname, as advertised.
    pub address: String,
    /// Resolved 32-bit numeric address, host byte order. Zero until the
    /// resolver pass runs.
    pub addr: u32,
    pub or_port: u16,
    pub ap_port: u16,
    pub dir_port: u16,
    pub bandwidth: u64,
    pub identity_key: RsaPublicKey,
    pub signing_key: Option<RsaPublicKey>,
    pub exit_policy: Vec<ExitPolicyRule>,
}

fn parse_field<T: std::str::FromStr>(s: &str, field: &str) -> Result<T, Error> {
    s.parse().map_err(|_| Error::Structural(format!("invalid {field} {s:?} on router line")))
}

/// Parse one router descriptor, given the five arguments already read off
/// the `router` line. Continues pulling tokens from `scanner` for the
/// identity key, optional signing key, and exit policy, and returns the
/// assembled descriptor along with the first token that is not part of it
/// (typically another `router`, `directory-signature`, or end-of-input).
pub fn parse_descriptor<'a>(
    scanner: &mut Scanner<'a>,
    args: Vec<&'a str>,
) -> Result<(RelayDescriptor, Token<'a>), Error> {
    if args.len() != 5 {
        return Err(Error::Structural(format!(
            "wrong number of arguments to \"router\" (expected 5, got {})",
            args.len()
        )));
    }

    let address = args[0].to_string();
    let or_port: u16 = parse_field(args[1], "or_port")?;
    let ap_port: u16 = parse_field(args[2], "ap_port")?;
    let dir_port: u16 = parse_field(args[3], "dir_port")?;
    let bandwidth: u64 = parse_field(args[4], "bandwidth")?;

    if or_port == 0 {
        return Err(Error::Structural("or_port unreadable or 0".to_string()));
    }
    if bandwidth == 0 {
        return Err(Error::Structural("bandwidth unreadable or 0".to_string()));
    }

    let identity_key = match scanner.next_token() {
        Token::PublicKey(key) => *key,
        Token::Err(msg) => return Err(Error::Lexical(msg)),
        _ => return Err(Error::Structural("missing public key".to_string())),
    };

    let mut token = scanner.next_token();
    let signing_key = if let Token::Keyword { keyword: Keyword::SigningKey, args } = &token {
        if !args.is_empty() {
            return Err(Error::Structural("signing-key takes no arguments".to_string()));
        }
        let key = match scanner.next_token() {
            Token::PublicKey(key) => *key,
            Token::Err(msg) => return Err(Error::Lexical(msg)),
            _ => return Err(Error::Structural("missing signing key".to_string())),
        };
        token = scanner.next_token();
        Some(key)
    } else {
        None
    };

    let mut exit_policy = Vec::new();
    loop {
        let kind = match &token {
            Token::Keyword { keyword: Keyword::Accept, .. } => PolicyKind::Accept,
            Token::Keyword { keyword: Keyword::Reject, .. } => PolicyKind::Reject,
            _ => break,
        };
        let args = match token {
            Token::Keyword { args, .. } => args,
            _ => unreachable!(),
        };
        if args.len() != 1 {
            return Err(Error::Structural("exit policy line takes exactly one argument".to_string()));
        }
        exit_policy.push(exit_policy::parse_rule(kind, args[0])?);
        token = scanner.next_token();
    }

    let descriptor = RelayDescriptor {
        address,
        addr: 0,
        or_port,
        ap_port,
        dir_port,
        bandwidth,
        identity_key,
        signing_key,
        exit_policy,
    };

    Ok((descriptor, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    const SAMPLE_KEY: &str = "-----BEGIN RSA PUBLIC KEY-----\nMIGJAoGBALD6Dbj1okBj4mmz/sCgIGFJk/CTWlMsT3CS1kP7Q2gAaDewEbo1+me3\nX5f3QpvZ9Yh2l5Q+btU4a/Yib3pg/KhyX96Z5zrvz9dGPPXGORpwawMIH7Aa+jtp\nv2l0misfGCloIamfI5dzayTu9gR4emuKm34tipkfIz6hLkO7xW1nAgMBAAE=\n-----END RSA PUBLIC KEY-----\n";

    #[test]
    fn parses_minimal_descriptor() {
        let body = format!("{SAMPLE_KEY}router other 1 2 3 4\n");
        let mut scanner = Scanner::new(&body);
        let (descriptor, lookahead) =
            parse_descriptor(&mut scanner, vec!["relay", "9001", "0", "0", "1000"]).unwrap();
        assert_eq!(descriptor.address, "relay");
        assert_eq!(descriptor.or_port, 9001);
        assert_eq!(descriptor.bandwidth, 1000);
        assert!(descriptor.signing_key.is_none());
        assert!(descriptor.exit_policy.is_empty());
        assert!(matches!(
            lookahead,
            Token::Keyword { keyword: Keyword::Router, .. }
        ));
    }

    #[test]
    fn rejects_zero_or_port() {
        let mut scanner = Scanner::new(SAMPLE_KEY);
        let err = parse_descriptor(&mut scanner, vec!["relay", "0", "0", "0", "1000"]).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn rejects_wrong_argument_count() {
        let mut scanner = Scanner::new(SAMPLE_KEY);
        let err = parse_descriptor(&mut scanner, vec!["relay", "9001", "0", "0"]).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn parses_exit_policy_and_signing_key() {
        let body = format!(
            "signing-key\n{SAMPLE_KEY}reject *:25\naccept *:*\ndirectory-signature\n"
        );
        let mut scanner = Scanner::new(&body);
        let (descriptor, lookahead) =
            parse_descriptor(&mut scanner, vec!["relay", "9001", "0", "0", "1000"]).unwrap();
        assert!(descriptor.signing_key.is_some());
        assert_eq!(descriptor.exit_policy.len(), 2);
        assert!(matches!(
            lookahead,
            Token::Keyword { keyword: Keyword::DirectorySignature, .. }
        ));
    }
}
