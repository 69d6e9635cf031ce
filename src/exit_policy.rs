//! A relay's exit policy: an ordered sequence of accept/reject rules.
//!
//! The original format represents this as a singly-linked, intrusive list;
//! per the redesign notes, a descriptor instead owns a contiguous
//! `Vec<ExitPolicyRule>` in declaration order, since nothing here benefits
//! from linked-list traversal.

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Accept,
    Reject,
}

/// A parsed port pattern: either the literal wildcard or an exact decimal
/// port number. Ranges are not part of this wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortPattern {
    Wildcard,
    Port(u16),
}

impl PortPattern {
    fn matches(self, port: u16) -> bool {
        match self {
            PortPattern::Wildcard => true,
            PortPattern::Port(p) => p == port,
        }
    }
}

/// One `accept`/`reject` directive.
///
/// `address` is parsed and retained for round-trip and future use, but (per
/// the source behavior this format preserves) is **not** consulted by
/// [`evaluate`] — only `port` decides a match.
#[derive(Debug, Clone)]
pub struct ExitPolicyRule {
    pub kind: PolicyKind,
    pub address: String,
    pub port: PortPattern,
    pub raw: String,
}

/// Parse the single `ADDR:PORT` argument of an `accept`/`reject` line.
pub fn parse_rule(kind: PolicyKind, arg: &str) -> Result<ExitPolicyRule, Error> {
    let keyword = match kind {
        PolicyKind::Accept => "accept",
        PolicyKind::Reject => "reject",
    };
    let raw = format!("{keyword} {arg}");

    let colon = arg
        .find(':')
        .ok_or_else(|| Error::Structural(format!("couldn't parse exit policy line '{raw}'")))?;
    let (address, port_str) = (&arg[..colon], &arg[colon + 1..]);

    let port = if port_str == "*" {
        PortPattern::Wildcard
    } else {
        let port: u16 = port_str
            .parse()
            .map_err(|_| Error::Structural(format!("couldn't parse exit policy line '{raw}'")))?;
        PortPattern::Port(port)
    };

    Ok(ExitPolicyRule { kind, address: address.to_string(), port, raw })
}

/// Evaluate a destination `port` against an ordered policy list. The first
/// rule whose port matches decides the verdict; an empty or
/// entirely-non-matching list defaults to accept.
pub fn evaluate(policy: &[ExitPolicyRule], port: u16) -> PolicyKind {
    for rule in policy {
        if rule.port.matches(port) {
            return rule.kind;
        }
    }
    PolicyKind::Accept
}
