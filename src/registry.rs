//! The directory registry: the single long-lived handle a node holds onto
//! its current view of the network, plus its own installed descriptor.
//!
//! Unlike the global-state original, nothing here is reached through a
//! process-wide singleton — a [`DirectoryRegistry`] is an ordinary value
//! the caller owns and threads through.

use rsa::pkcs1::EncodeRsaPublicKey;
use rsa::RsaPublicKey;

use crate::descriptor::RelayDescriptor;
use crate::directory::Directory;
use crate::exit_policy::{self, PolicyKind};

/// Connection bookkeeping the registry needs in order to retry dead links,
/// abstracted so this crate never touches a socket directly.
pub trait Connector {
    fn connection_exists(&self, addr: u32, port: u16) -> bool;
    fn connect(&self, descriptor: &RelayDescriptor);
}

/// A node's current directory plus, if it is itself a relay, its own
/// installed descriptor (kept out of the peer list — see
/// [`crate::resolve::resolve_and_compact`]).
#[derive(Debug, Default)]
pub struct DirectoryRegistry {
    directory: Option<Directory>,
    my_router: Option<RelayDescriptor>,
}

impl DirectoryRegistry {
    pub fn new() -> Self {
        DirectoryRegistry::default()
    }

    /// Replace the current directory wholesale. Used after a freshly parsed
    /// and verified directory is ready to take effect.
    pub fn install(&mut self, directory: Directory) {
        tracing::info!(routers = directory.routers.len(), "installing new directory");
        self.directory = Some(directory);
    }

    /// Install (or clear) this node's own descriptor.
    pub fn set_my_router(&mut self, descriptor: Option<RelayDescriptor>) {
        self.my_router = descriptor;
    }

    pub fn my_router(&self) -> Option<&RelayDescriptor> {
        self.my_router.as_ref()
    }

    /// A read-only snapshot of the currently installed directory, if any.
    pub fn snapshot(&self) -> Option<&Directory> {
        self.directory.as_ref()
    }

    fn routers(&self) -> impl Iterator<Item = &RelayDescriptor> {
        self.directory.iter().flat_map(|d| d.routers.iter())
    }

    /// Find a router by its resolved address and OR port. This node's own
    /// router, if installed, is never in `self.directory` (it's detached
    /// during resolve — see [`crate::resolve::resolve_and_compact`]) and so
    /// is never returned here.
    pub fn find_by_addr_port(&self, addr: u32, port: u16) -> Option<&RelayDescriptor> {
        self.routers().find(|r| r.addr == addr && r.or_port == port)
    }

    /// Find a router by identity key (compared by DER encoding, since
    /// `RsaPublicKey` itself isn't `PartialEq`).
    pub fn find_by_public_key(&self, key: &RsaPublicKey) -> Option<&RelayDescriptor> {
        let target = key.to_pkcs1_der().ok()?;
        self.routers().find(|r| r.identity_key.to_pkcs1_der().map(|d| d.as_bytes() == target.as_bytes()).unwrap_or(false))
    }

    /// Pick any router known to also serve as a directory mirror (nonzero
    /// `dir_port`). Returns the first match; callers wanting load spreading
    /// should shuffle their own router list before installing it.
    pub fn pick_directory_server(&self) -> Option<&RelayDescriptor> {
        self.routers().find(|r| r.dir_port != 0)
    }

    /// Remove a router from the directory by address and OR port. Unlike
    /// the behavior this format was distilled from — which decremented a
    /// router count without actually freeing the entry, leaking it — this
    /// drops the descriptor outright.
    pub fn forget(&mut self, addr: u32, port: u16) -> bool {
        let Some(directory) = self.directory.as_mut() else { return false };
        let before = directory.routers.len();
        directory.routers.retain(|r| !(r.addr == addr && r.or_port == port));
        directory.routers.len() != before
    }

    /// Attempt a connection to every known router that doesn't already have
    /// one open.
    pub fn retry_connections(&self, connector: &dyn Connector) {
        for router in self.routers() {
            if !connector.connection_exists(router.addr, router.or_port) {
                connector.connect(router);
            }
        }
    }

    /// Whether this node, acting as an exit, permits a connection to
    /// `port`. With no installed router of our own there is no exit policy
    /// to consult, so the connection is refused.
    pub fn exit_policy_allows(&self, port: u16) -> bool {
        match &self.my_router {
            Some(router) => exit_policy::evaluate(&router.exit_policy, port) == PolicyKind::Accept,
            None => {
                tracing::warn!("exit policy check with no local router installed; rejecting");
                false
            }
        }
    }
}
