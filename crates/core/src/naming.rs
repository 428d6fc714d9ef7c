// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic ids for human-named things
//!
//! Any component can compute the id of a registry, repo or unix domain from
//! its name without a lookup service: the id is the UUIDv5 of
//! `"<kind>:<name>"` under a configured namespace.

use crate::id::EntityId;
use uuid::Uuid;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: Uuid = Uuid::from_u128(0x6f0c_5d1e_8a5e_4a3b_9c1f_2f7c_0e9a_d4b1);

/// Stateless id derivation, injected wherever names are turned into ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namer {
    namespace: Uuid,
}

impl Namer {
    pub fn new(namespace: Uuid) -> Self {
        Self { namespace }
    }

    pub fn namespace(&self) -> Uuid {
        self.namespace
    }

    /// Id of `name` within `kind`
    pub fn id(&self, kind: &str, name: &str) -> EntityId {
        let key = format!("{}:{}", kind, name);
        EntityId(Uuid::new_v5(&self.namespace, key.as_bytes()))
    }

    /// Id of the fleet root aggregate
    pub fn main_id(&self, main_name: &str) -> EntityId {
        self.id("main", main_name)
    }

    pub fn registry_id(&self, registry: &str) -> EntityId {
        self.id("registry", registry)
    }

    /// Repos are named by their registry and their immutable global path
    pub fn repo_id(&self, registry: &str, global_path: &str) -> EntityId {
        self.id("repo", &format!("{}:{}", registry, global_path))
    }

    pub fn unix_domain_id(&self, domain: &str) -> EntityId {
        self.id("unixdomain", domain)
    }
}

impl Default for Namer {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_deterministic() {
        let a = Namer::default();
        let b = Namer::new(DEFAULT_NAMESPACE);
        assert_eq!(a.registry_id("fooReg"), b.registry_id("fooReg"));
        assert_eq!(a.repo_id("fooReg", "/foo/1"), b.repo_id("fooReg", "/foo/1"));
    }

    #[test]
    fn ids_are_version_5() {
        let id = Namer::default().registry_id("fooReg");
        assert_eq!(id.as_uuid().get_version_num(), 5);
    }

    #[test]
    fn kind_separates_namespaces() {
        let namer = Namer::default();
        assert_ne!(namer.registry_id("x"), namer.unix_domain_id("x"));
        assert_ne!(namer.main_id("x"), namer.registry_id("x"));
    }

    #[test]
    fn namespace_changes_ids() {
        let a = Namer::default();
        let b = Namer::new(Uuid::from_u128(1));
        assert_ne!(a.registry_id("fooReg"), b.registry_id("fooReg"));
    }

    #[test]
    fn repo_id_depends_on_registry() {
        let namer = Namer::default();
        assert_ne!(namer.repo_id("a", "/foo"), namer.repo_id("b", "/foo"));
    }
}
