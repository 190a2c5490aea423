use log::debug;

use crate::{ActorId, ReplicationError};

/// Who besides the authority may write a field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WritePolicy {
    /// Only the authoritative actor writes
    AuthorityOnly,
    /// The authority, and the single delegated owner if one is set
    OwnerWritable,
}

/// Binds a field to its write policy, its authority and (optionally) the
/// owner it delegates writes to. Checked synchronously at every mutation
/// entry point, before any dirty flag or change log is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionEntry {
    authority: ActorId,
    policy: WritePolicy,
    owner: Option<ActorId>,
}

impl PermissionEntry {
    pub fn authority_only(authority: ActorId) -> Self {
        Self {
            authority,
            policy: WritePolicy::AuthorityOnly,
            owner: None,
        }
    }

    pub fn owner_writable(authority: ActorId, owner: ActorId) -> Self {
        Self {
            authority,
            policy: WritePolicy::OwnerWritable,
            owner: Some(owner),
        }
    }

    pub fn authority(&self) -> ActorId {
        self.authority
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn owner(&self) -> Option<ActorId> {
        self.owner
    }

    pub fn is_authority(&self, actor: ActorId) -> bool {
        actor == self.authority
    }

    pub fn can_write(&self, actor: ActorId) -> bool {
        if self.is_authority(actor) {
            return true;
        }
        match self.policy {
            WritePolicy::AuthorityOnly => false,
            WritePolicy::OwnerWritable => self.owner == Some(actor),
        }
    }

    /// Returns `PermissionDenied` unless `actor` may write
    pub fn check_write(&self, actor: ActorId) -> Result<(), ReplicationError> {
        if self.can_write(actor) {
            return Ok(());
        }
        debug!(
            "Rejected write from {} ({:?}, authority {}, owner {:?})",
            actor, self.policy, self.authority, self.owner
        );
        Err(ReplicationError::PermissionDenied {
            actor,
            authority: self.authority,
            owner: self.owner,
        })
    }

    /// Change the write policy and delegated owner. Only the authority may
    /// redelegate a field.
    pub fn delegate(
        &mut self,
        actor: ActorId,
        policy: WritePolicy,
        owner: Option<ActorId>,
    ) -> Result<(), ReplicationError> {
        if !self.is_authority(actor) {
            return Err(ReplicationError::PermissionDenied {
                actor,
                authority: self.authority,
                owner: self.owner,
            });
        }
        self.policy = policy;
        self.owner = owner;
        Ok(())
    }
}
