//! Owner and trusted identities.
//!
//! The store is created empty and initialized exactly once during bootstrap.
//! The owner is published through a [`OnceLock`], so every thread that
//! observes the store as initialized also observes the owner and the initial
//! trusted set. The trusted set itself is a [`DashSet`] and can be mutated
//! concurrently without an outer lock.

use std::sync::OnceLock;

use dashmap::DashSet;
use parking_lot::Mutex;
use tracing::{info, instrument};

use crate::base::{error::IdentityError, types::Identity};

/// Process-wide holder of the owner identity and the trusted identities.
#[derive(Debug, Default)]
pub struct IdentityStore {
    owner: OnceLock<Identity>,
    trusted: DashSet<Identity>,
    init_lock: Mutex<()>,
}

impl IdentityStore {
    /// Creates an uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the owner and replaces the trusted set.
    ///
    /// Fails with [`IdentityError::AlreadyInitialized`] on a second call, and with
    /// [`IdentityError::InvalidArgument`] if `owner` is blank. Neither failure
    /// mutates the store.
    #[instrument(name = "IdentityStore::initialize", skip_all)]
    pub fn initialize<I, S>(&self, owner: impl Into<Identity>, initial_trusted: I) -> Result<(), IdentityError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Identity>,
    {
        let _guard = self.init_lock.lock();

        if self.is_initialized() {
            return Err(IdentityError::AlreadyInitialized);
        }

        let owner = owner.into();
        if owner.trim().is_empty() {
            return Err(IdentityError::InvalidArgument("owner identity cannot be blank".to_string()));
        }

        self.trusted.clear();
        for identity in initial_trusted {
            self.trusted.insert(identity.into());
        }

        info!("Identity store initialized with owner {} and {} trusted identities", owner, self.trusted.len());

        self.owner.set(owner).map_err(|_| IdentityError::AlreadyInitialized)
    }

    /// Whether `initialize` has completed.
    pub fn is_initialized(&self) -> bool {
        self.owner.get().is_some()
    }

    /// The owner identity.
    pub fn owner_identity(&self) -> Result<&str, IdentityError> {
        self.owner.get().map(String::as_str).ok_or(IdentityError::NotInitialized)
    }

    /// Strict membership in the trusted set; the owner is not special-cased.
    pub fn is_trusted(&self, identity: &str) -> Result<bool, IdentityError> {
        self.check_initialized()?;
        Ok(self.trusted.contains(identity))
    }

    /// Adds an identity to the trusted set. Returns whether it was newly added.
    pub fn add_trusted(&self, identity: impl Into<Identity>) -> Result<bool, IdentityError> {
        self.check_initialized()?;
        Ok(self.trusted.insert(identity.into()))
    }

    /// Removes an identity from the trusted set. Returns whether it was present.
    pub fn remove_trusted(&self, identity: &str) -> Result<bool, IdentityError> {
        self.check_initialized()?;
        Ok(self.trusted.remove(identity).is_some())
    }

    /// Sorted snapshot of the trusted set.
    pub fn trusted_identities(&self) -> Result<Vec<Identity>, IdentityError> {
        self.check_initialized()?;

        let mut identities: Vec<Identity> = self.trusted.iter().map(|i| i.key().clone()).collect();
        identities.sort();

        Ok(identities)
    }

    fn check_initialized(&self) -> Result<(), IdentityError> {
        if self.is_initialized() { Ok(()) } else { Err(IdentityError::NotInitialized) }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn initialized() -> IdentityStore {
        let store = IdentityStore::new();
        store.initialize("U1", ["U1", "U2"]).unwrap();
        store
    }

    #[test]
    fn accessors_fail_before_initialize() {
        let store = IdentityStore::new();

        assert!(!store.is_initialized());
        assert_eq!(store.owner_identity(), Err(IdentityError::NotInitialized));
        assert_eq!(store.is_trusted("U1"), Err(IdentityError::NotInitialized));
        assert_eq!(store.add_trusted("U1"), Err(IdentityError::NotInitialized));
        assert_eq!(store.remove_trusted("U1"), Err(IdentityError::NotInitialized));
        assert_eq!(store.trusted_identities(), Err(IdentityError::NotInitialized));
    }

    #[test]
    fn initialize_sets_owner_and_trusted() {
        let store = initialized();

        assert!(store.is_initialized());
        assert_eq!(store.owner_identity(), Ok("U1"));
        assert_eq!(store.is_trusted("U2"), Ok(true));
        assert_eq!(store.is_trusted("U3"), Ok(false));
    }

    #[test]
    fn second_initialize_fails_and_keeps_state() {
        let store = initialized();

        assert_eq!(store.initialize("U9", ["U9"]), Err(IdentityError::AlreadyInitialized));
        assert_eq!(store.owner_identity(), Ok("U1"));
        assert_eq!(store.trusted_identities(), Ok(vec!["U1".to_string(), "U2".to_string()]));
    }

    #[test]
    fn blank_owner_is_rejected_without_mutation() {
        let store = IdentityStore::new();

        assert!(matches!(store.initialize("", Vec::<String>::new()), Err(IdentityError::InvalidArgument(_))));
        assert!(matches!(store.initialize("  ", ["U2"]), Err(IdentityError::InvalidArgument(_))));
        assert!(!store.is_initialized());

        // A valid initialize still succeeds afterwards.
        store.initialize("U1", Vec::<String>::new()).unwrap();
        assert_eq!(store.is_trusted("U2"), Ok(false));
    }

    #[test]
    fn owner_is_not_implicitly_trusted() {
        let store = IdentityStore::new();
        store.initialize("U1", ["U2"]).unwrap();

        assert_eq!(store.is_trusted("U1"), Ok(false));
    }

    #[test]
    fn add_and_remove_trusted() {
        let store = initialized();

        assert_eq!(store.add_trusted("U3"), Ok(true));
        assert_eq!(store.add_trusted("U3"), Ok(false));
        assert_eq!(store.is_trusted("U3"), Ok(true));

        assert_eq!(store.remove_trusted("U3"), Ok(true));
        assert_eq!(store.remove_trusted("U3"), Ok(false));
        assert_eq!(store.is_trusted("U3"), Ok(false));
    }

    #[test]
    fn racing_initializers_have_one_winner() {
        let store = Arc::new(IdentityStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.initialize(format!("U{i}"), Vec::<String>::new()).is_ok())
            })
            .collect();

        let winners = handles.into_iter().map(|h| h.join().unwrap()).filter(|won| *won).count();

        assert_eq!(winners, 1);
        assert!(store.is_initialized());
    }

    #[test]
    fn concurrent_mutation_matches_net_effect() {
        let store = Arc::new(IdentityStore::new());
        store.initialize("owner", Vec::<String>::new()).unwrap();

        // Each worker adds its own 100 identities, then removes the odd ones,
        // while probing a shared identity nobody adds.
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for n in 0..100 {
                        store.add_trusted(format!("W{worker}-{n}")).unwrap();
                        assert_eq!(store.is_trusted("ghost"), Ok(false));
                    }
                    for n in (1..100).step_by(2) {
                        assert_eq!(store.remove_trusted(&format!("W{worker}-{n}")), Ok(true));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let trusted = store.trusted_identities().unwrap();
        assert_eq!(trusted.len(), 8 * 50);

        for worker in 0..8 {
            for n in 0..100 {
                assert_eq!(store.is_trusted(&format!("W{worker}-{n}")), Ok(n % 2 == 0));
            }
        }
    }
}
