//! Identity registry component
//!
//! Enforces at most one registration per identity and global uniqueness
//! of the external identifier, and maps sequential registration ids to
//! identity metadata. Registrations are write-once: there is no update
//! and no delete.

use crate::error::{Error, Result};
use crate::types::{IdentityKey, Profile, Registration, RegistrationId};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};

/// Registry of write-once identity registrations
///
/// Uniqueness is enforced through two reverse-lookup indexes kept in
/// lockstep with the primary map; an insert touches all three or none.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    /// Primary store, keyed by registration id
    registrations: BTreeMap<RegistrationId, Registration>,

    /// Reverse index: identity -> registration id
    by_identity: HashMap<IdentityKey, RegistrationId>,

    /// Reverse index: external identifier -> registration id
    by_external_id: HashMap<String, RegistrationId>,

    /// Ids issued so far; the next successful call issues `issued + 1`
    issued: RegistrationId,
}

impl IdentityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity under a unique external identifier
    ///
    /// Fails with `AlreadyRegistered` if the identity already holds a
    /// registration, then with `DuplicateExternalId` if the identifier is
    /// bound to any registration (case-sensitive exact match), in that
    /// order. The id counter advances only on success, so failed attempts
    /// never leave gaps.
    pub fn register(
        &mut self,
        identity: IdentityKey,
        external_id: impl Into<String>,
        profile: Option<Profile>,
    ) -> Result<RegistrationId> {
        if identity.is_null() {
            return Err(Error::InvalidRecipient);
        }

        let external_id = external_id.into();

        if self.by_identity.contains_key(&identity) {
            return Err(Error::AlreadyRegistered(identity));
        }

        if self.by_external_id.contains_key(&external_id) {
            return Err(Error::DuplicateExternalId(external_id));
        }

        let id = self.issued + 1;
        let registration = Registration {
            id,
            identity: identity.clone(),
            external_id: external_id.clone(),
            profile,
            created_at: Utc::now(),
        };

        self.by_identity.insert(identity.clone(), id);
        self.by_external_id.insert(external_id, id);
        self.registrations.insert(id, registration);
        self.issued = id;

        tracing::info!(%identity, registration_id = id, "registered identity");

        Ok(id)
    }

    /// Look up a registration by id
    ///
    /// Fails with `NotFound` for id 0 and any id beyond the counter.
    pub fn registration(&self, id: RegistrationId) -> Result<&Registration> {
        self.registrations.get(&id).ok_or(Error::NotFound(id))
    }

    /// Identity that owns a registration, with the same not-found semantics
    pub fn owner_of(&self, id: RegistrationId) -> Result<&IdentityKey> {
        self.registration(id).map(|r| &r.identity)
    }

    /// Registration id held by an identity, if any
    pub fn registration_of(&self, identity: &IdentityKey) -> Option<RegistrationId> {
        self.by_identity.get(identity).copied()
    }

    /// Number of registrations issued
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether no registration has been issued yet
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}
