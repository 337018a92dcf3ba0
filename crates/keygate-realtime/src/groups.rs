//! Named subscription groups.
//!
//! A group is an addressable fan-out target: the identity-scoped group
//! `user:{id}` every connection auto-joins, plus arbitrary resource
//! groups a client subscribes to explicitly.

use std::collections::HashSet;

use dashmap::DashMap;

use keygate_core::types::IdentityId;

use crate::connection::ConnectionId;

/// Prefix reserved for identity-scoped groups. Clients cannot subscribe
/// to these; membership comes from authenticating.
pub const IDENTITY_GROUP_PREFIX: &str = "user:";

/// The group every connection of an identity belongs to.
pub fn identity_group(identity_id: IdentityId) -> String {
    format!("{IDENTITY_GROUP_PREFIX}{identity_id}")
}

/// Group name → member connections, with a reverse index for cleanup.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: DashMap<String, HashSet<ConnectionId>>,
    memberships: DashMap<ConnectionId, HashSet<String>>,
}

impl GroupRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    /// Adds a connection to a group. Returns false if it was already a
    /// member.
    pub fn join(&self, group: &str, conn_id: ConnectionId) -> bool {
        let added = self
            .groups
            .entry(group.to_string())
            .or_default()
            .insert(conn_id);
        if added {
            self.memberships
                .entry(conn_id)
                .or_default()
                .insert(group.to_string());
        }
        added
    }

    /// Removes a connection from a group. Empty groups are dropped.
    pub fn leave(&self, group: &str, conn_id: ConnectionId) -> bool {
        let mut removed = false;
        if let Some(mut members) = self.groups.get_mut(group) {
            removed = members.remove(&conn_id);
            if members.is_empty() {
                drop(members);
                self.groups.remove(group);
            }
        }
        if removed {
            if let Some(mut groups) = self.memberships.get_mut(&conn_id) {
                groups.remove(group);
            }
        }
        removed
    }

    /// Removes a connection from every group it joined.
    pub fn leave_all(&self, conn_id: ConnectionId) {
        let Some((_, groups)) = self.memberships.remove(&conn_id) else {
            return;
        };
        for group in groups {
            if let Some(mut members) = self.groups.get_mut(&group) {
                members.remove(&conn_id);
                if members.is_empty() {
                    drop(members);
                    self.groups.remove(&group);
                }
            }
        }
    }

    /// Member connections of a group.
    pub fn members(&self, group: &str) -> Vec<ConnectionId> {
        self.groups
            .get(group)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of groups with at least one member.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
