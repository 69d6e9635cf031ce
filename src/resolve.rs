//! Hostname resolution and directory compaction.
//!
//! Each descriptor arrives from the wire with a textual `address` and a
//! zero `addr`. Before a directory is usable, every descriptor's address
//! must be resolved to a numeric IPv4 address; descriptors that fail to
//! resolve are dropped rather than aborting the whole directory, and the
//! one descriptor (if any) that resolves to the caller's own identity is
//! pulled out of the list rather than treated as just another peer.

use std::fmt;
use std::net::Ipv4Addr;

use crate::descriptor::RelayDescriptor;
use crate::directory::Directory;

/// A hostname lookup failed. Carries enough to log a useful warning; never
/// propagated past [`resolve_and_compact`].
#[derive(Debug)]
pub struct ResolveError {
    pub host: String,
    pub reason: String,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "couldn't resolve {:?}: {}", self.host, self.reason)
    }
}

impl std::error::Error for ResolveError {}

/// Pluggable hostname resolver, so the directory subsystem itself never
/// touches the network (or a DNS stub resolver) directly.
pub trait Resolver {
    fn resolve(&self, name: &str) -> Result<Ipv4Addr, ResolveError>;
}

/// Resolve every descriptor's `address` in place, dropping the ones that
/// fail, and detach the descriptor (if any) that matches `local_identity`
/// — this node's own `(addr, or_port)` — returning it to the caller instead
/// of leaving it mixed in with the rest of the peers.
///
/// Compaction is swap-with-last: order among the surviving descriptors is
/// not preserved.
pub fn resolve_and_compact(
    dir: &mut Directory,
    resolver: &dyn Resolver,
    local_identity: Option<(u32, u16)>,
) -> Option<RelayDescriptor> {
    let mut own = None;
    let mut i = 0;
    while i < dir.routers.len() {
        let addr = match resolver.resolve(&dir.routers[i].address) {
            Ok(addr) => addr,
            Err(e) => {
                tracing::warn!(error = %e, "dropping router with unresolvable address");
                dir.routers.swap_remove(i);
                continue;
            }
        };
        dir.routers[i].addr = u32::from(addr);

        let is_self = local_identity
            .map(|(self_addr, self_port)| self_addr == dir.routers[i].addr && self_port == dir.routers[i].or_port)
            .unwrap_or(false);
        if is_self {
            own = Some(dir.routers.swap_remove(i));
            continue;
        }

        i += 1;
    }
    own
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_policy::ExitPolicyRule;
    use rsa::RsaPublicKey;

    const SAMPLE_KEY_BODY: &str = "MIGJAoGBALD6Dbj1okBj4mmz/sCgIGFJk/CTWlMsT3CS1kP7Q2gAaDewEbo1+me3\nX5f3QpvZ9Yh2l5Q+btU4a/Yib3pg/KhyX96Z5zrvz9dGPPXGORpwawMIH7Aa+jtp\nv2l0misfGCloIamfI5dzayTu9gR4emuKm34tipkfIz6hLkO7xW1nAgMBAAE=";

    fn sample_key() -> RsaPublicKey {
        crate::crypto::parse_public_key(SAMPLE_KEY_BODY).unwrap()
    }

    struct StaticResolver;
    impl Resolver for StaticResolver {
        fn resolve(&self, name: &str) -> Result<Ipv4Addr, ResolveError> {
            match name {
                "self.example" => Ok(Ipv4Addr::new(10, 0, 0, 1)),
                "peer.example" => Ok(Ipv4Addr::new(10, 0, 0, 2)),
                other => Err(ResolveError { host: other.to_string(), reason: "nxdomain".to_string() }),
            }
        }
    }

    fn descriptor(address: &str, or_port: u16) -> RelayDescriptor {
        RelayDescriptor {
            address: address.to_string(),
            addr: 0,
            or_port,
            ap_port: 0,
            dir_port: 0,
            bandwidth: 1000,
            identity_key: sample_key(),
            signing_key: None,
            exit_policy: Vec::<ExitPolicyRule>::new(),
        }
    }

    #[test]
    fn drops_unresolvable_descriptors() {
        let mut dir = Directory {
            routers: vec![descriptor("peer.example", 9001), descriptor("nowhere.invalid", 9002)],
            software_versions: String::new(),
        };
        let own = resolve_and_compact(&mut dir, &StaticResolver, None);
        assert!(own.is_none());
        assert_eq!(dir.routers.len(), 1);
        assert_eq!(dir.routers[0].addr, u32::from(Ipv4Addr::new(10, 0, 0, 2)));
    }

    #[test]
    fn detaches_own_identity() {
        let mut dir = Directory {
            routers: vec![descriptor("peer.example", 9001), descriptor("self.example", 9002)],
            software_versions: String::new(),
        };
        let local = Some((u32::from(Ipv4Addr::new(10, 0, 0, 1)), 9002));
        let own = resolve_and_compact(&mut dir, &StaticResolver, local).unwrap();
        assert_eq!(own.address, "self.example");
        assert_eq!(dir.routers.len(), 1);
        assert_eq!(dir.routers[0].address, "peer.example");
    }

    #[test]
    fn no_local_identity_keeps_everyone() {
        let mut dir = Directory {
            routers: vec![descriptor("peer.example", 9001), descriptor("self.example", 9002)],
            software_versions: String::new(),
        };
        let own = resolve_and_compact(&mut dir, &StaticResolver, None);
        assert!(own.is_none());
        assert_eq!(dir.routers.len(), 2);
    }
}
