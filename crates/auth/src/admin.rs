//! Administrator registry (identity → admin flag).

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplychain_core::{DomainError, DomainResult, Identity};
use supplychain_events::{Event, EventBus, EventEnvelope, EventLog, InMemoryEventBus, Subscription};

use crate::authorize::{AdminAuthority, authorize_admin};

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Event emitted when an identity becomes an administrator (including the
/// deployer seeded at construction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminGranted {
    pub identity: Identity,
    pub granted_by: Identity,
    pub occurred_at: DateTime<Utc>,
}

/// Event emitted when an identity loses the administrator flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRevoked {
    pub identity: Identity,
    pub revoked_by: Identity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminEvent {
    Granted(AdminGranted),
    Revoked(AdminRevoked),
}

impl Event for AdminEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AdminEvent::Granted(_) => "auth.admin.granted",
            AdminEvent::Revoked(_) => "auth.admin.revoked",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AdminEvent::Granted(e) => e.occurred_at,
            AdminEvent::Revoked(e) => e.occurred_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct AdminState {
    flags: HashMap<Identity, bool>,
    log: EventLog<AdminEvent>,
}

impl AdminState {
    fn is_admin(&self, identity: &Identity) -> bool {
        self.flags.get(identity).copied().unwrap_or(false)
    }

    fn admin_count(&self) -> usize {
        self.flags.values().filter(|flag| **flag).count()
    }
}

/// Authoritative store of administrator identities.
///
/// # Invariants
/// - The deployer is an administrator immediately after construction.
/// - At least one administrator exists at all times.
/// - Only an administrator can grant or revoke the flag.
#[derive(Debug)]
pub struct AdminRegistry {
    deployer: Identity,
    state: RwLock<AdminState>,
    bus: InMemoryEventBus<EventEnvelope<AdminEvent>>,
}

impl AdminRegistry {
    /// Deploy a registry with `deployer` seeded as the first administrator.
    pub fn new(deployer: Identity) -> Self {
        let mut state = AdminState::default();
        state.flags.insert(deployer, true);
        state.log.append(AdminEvent::Granted(AdminGranted {
            identity: deployer,
            granted_by: deployer,
            occurred_at: Utc::now(),
        }));

        tracing::info!(%deployer, "admin registry deployed");

        Self {
            deployer,
            state: RwLock::new(state),
            bus: InMemoryEventBus::new(),
        }
    }

    pub fn deployer(&self) -> Identity {
        self.deployer
    }

    /// Whether `identity` is currently an administrator. Never fails.
    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.read().is_admin(identity)
    }

    /// Current administrators, sorted.
    pub fn admins(&self) -> Vec<Identity> {
        let state = self.read();
        let mut admins: Vec<Identity> = state
            .flags
            .iter()
            .filter_map(|(identity, flag)| flag.then_some(*identity))
            .collect();
        admins.sort();
        admins
    }

    /// Grant the administrator flag to `identity`.
    ///
    /// - `Unauthorized` if `caller` is not an administrator.
    /// - `InvalidState` if `identity` already is one.
    pub fn grant_admin(&self, caller: &Identity, identity: Identity) -> DomainResult<()> {
        let mut state = self.write();

        if let Err(e) = authorize_admin(&*state, caller) {
            tracing::warn!(%caller, %identity, error = %e, "admin grant rejected");
            return Err(e.into());
        }
        if state.is_admin(&identity) {
            tracing::warn!(%caller, %identity, "admin grant rejected: already an administrator");
            return Err(DomainError::invalid_state("identity is already an administrator"));
        }

        state.flags.insert(identity, true);
        let envelope = state
            .log
            .append(AdminEvent::Granted(AdminGranted {
                identity,
                granted_by: *caller,
                occurred_at: Utc::now(),
            }))
            .clone();
        drop(state);

        tracing::info!(%caller, %identity, "admin granted");
        self.publish(envelope);
        Ok(())
    }

    /// Revoke the administrator flag from `identity`.
    ///
    /// - `Unauthorized` if `caller` is not an administrator.
    /// - `NotFound` if `identity` is not an administrator.
    /// - `InvalidState` if `identity` is the last remaining administrator.
    pub fn revoke_admin(&self, caller: &Identity, identity: Identity) -> DomainResult<()> {
        let mut state = self.write();

        if let Err(e) = authorize_admin(&*state, caller) {
            tracing::warn!(%caller, %identity, error = %e, "admin revoke rejected");
            return Err(e.into());
        }
        if !state.is_admin(&identity) {
            tracing::warn!(%caller, %identity, "admin revoke rejected: not an administrator");
            return Err(DomainError::not_found());
        }
        if state.admin_count() == 1 {
            tracing::warn!(%caller, %identity, "admin revoke rejected: last administrator");
            return Err(DomainError::invalid_state("cannot revoke the last administrator"));
        }

        state.flags.insert(identity, false);
        let envelope = state
            .log
            .append(AdminEvent::Revoked(AdminRevoked {
                identity,
                revoked_by: *caller,
                occurred_at: Utc::now(),
            }))
            .clone();
        drop(state);

        tracing::info!(%caller, %identity, "admin revoked");
        self.publish(envelope);
        Ok(())
    }

    /// Every committed admin event, oldest first.
    pub fn events(&self) -> Vec<EventEnvelope<AdminEvent>> {
        self.read().log.entries().to_vec()
    }

    /// Subscribe to admin events committed from now on.
    pub fn subscribe(&self) -> Subscription<EventEnvelope<AdminEvent>> {
        self.bus.subscribe()
    }

    fn publish(&self, envelope: EventEnvelope<AdminEvent>) {
        let sequence = envelope.sequence_number();
        if let Err(e) = self.bus.publish(envelope) {
            tracing::warn!(sequence, error = %e, "admin event publication failed");
        }
    }

    // Every mutation is a single insert after all checks, so a poisoned lock
    // still guards a consistent store.
    fn read(&self) -> RwLockReadGuard<'_, AdminState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AdminState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AdminAuthority for AdminState {
    fn is_admin(&self, identity: &Identity) -> bool {
        AdminState::is_admin(self, identity)
    }
}

impl AdminAuthority for AdminRegistry {
    fn is_admin(&self, identity: &Identity) -> bool {
        AdminRegistry::is_admin(self, identity)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployer_is_seeded_as_admin() {
        let deployer = Identity::new();
        let registry = AdminRegistry::new(deployer);

        assert!(registry.is_admin(&deployer));
        assert_eq!(registry.admins(), vec![deployer]);
        assert_eq!(registry.deployer(), deployer);
    }

    #[test]
    fn unknown_identity_is_not_admin() {
        let registry = AdminRegistry::new(Identity::new());
        assert!(!registry.is_admin(&Identity::new()));
    }

    #[test]
    fn seeding_is_recorded_as_a_grant() {
        let deployer = Identity::new();
        let registry = AdminRegistry::new(deployer);

        let events = registry.events();
        assert_eq!(events.len(), 1);
        let AdminEvent::Granted(e) = events[0].payload() else {
            panic!("expected AdminGranted event");
        };
        assert_eq!(e.identity, deployer);
        assert_eq!(e.granted_by, deployer);
    }

    #[test]
    fn admin_can_grant_admin() {
        let deployer = Identity::new();
        let alice = Identity::new();
        let registry = AdminRegistry::new(deployer);
        let sub = registry.subscribe();

        registry.grant_admin(&deployer, alice).unwrap();

        assert!(registry.is_admin(&alice));
        let delivered = sub.drain();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].event_type(), "auth.admin.granted");
        assert_eq!(delivered[0].sequence_number(), 2);
    }

    #[test]
    fn non_admin_cannot_grant_admin() {
        let registry = AdminRegistry::new(Identity::new());
        let mallory = Identity::new();

        let err = registry.grant_admin(&mallory, mallory).unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
        assert!(!registry.is_admin(&mallory));
        assert_eq!(registry.events().len(), 1);
    }

    #[test]
    fn granting_existing_admin_is_invalid_state() {
        let deployer = Identity::new();
        let registry = AdminRegistry::new(deployer);

        let err = registry.grant_admin(&deployer, deployer).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn admin_can_revoke_another_admin() {
        let deployer = Identity::new();
        let alice = Identity::new();
        let registry = AdminRegistry::new(deployer);
        registry.grant_admin(&deployer, alice).unwrap();

        registry.revoke_admin(&alice, deployer).unwrap();

        assert!(!registry.is_admin(&deployer));
        assert_eq!(registry.admins(), vec![alice]);
        let AdminEvent::Revoked(e) = registry.events()[2].payload().clone() else {
            panic!("expected AdminRevoked event");
        };
        assert_eq!(e.identity, deployer);
        assert_eq!(e.revoked_by, alice);
    }

    #[test]
    fn revoked_admin_loses_privileges() {
        let deployer = Identity::new();
        let alice = Identity::new();
        let bob = Identity::new();
        let registry = AdminRegistry::new(deployer);
        registry.grant_admin(&deployer, alice).unwrap();
        registry.revoke_admin(&deployer, alice).unwrap();

        assert_eq!(registry.grant_admin(&alice, bob), Err(DomainError::Unauthorized));
    }

    #[test]
    fn revoking_non_admin_is_not_found() {
        let deployer = Identity::new();
        let registry = AdminRegistry::new(deployer);

        let err = registry.revoke_admin(&deployer, Identity::new()).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn last_admin_cannot_be_revoked() {
        let deployer = Identity::new();
        let registry = AdminRegistry::new(deployer);

        let err = registry.revoke_admin(&deployer, deployer).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(msg) if msg.contains("last")));
        assert!(registry.is_admin(&deployer));
    }

    #[test]
    fn admin_events_serialize_with_variant_tag() {
        let deployer = Identity::new();
        let registry = AdminRegistry::new(deployer);
        let json = serde_json::to_value(registry.events()[0].payload()).unwrap();
        assert!(json.get("Granted").is_some());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Grant { caller: usize, target: usize },
            Revoke { caller: usize, target: usize },
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0..4usize, 0..4usize).prop_map(|(caller, target)| Op::Grant { caller, target }),
                (0..4usize, 0..4usize).prop_map(|(caller, target)| Op::Revoke { caller, target }),
            ]
        }

        proptest! {
            /// Property: whatever sequence of calls is made, at least one
            /// administrator remains and the log records exactly the successes.
            #[test]
            fn at_least_one_admin_always_remains(ops in proptest::collection::vec(op(), 0..40)) {
                let people: Vec<Identity> = (0..4).map(|_| Identity::new()).collect();
                let registry = AdminRegistry::new(people[0]);
                let mut successes = 1usize;

                for op in ops {
                    let result = match op {
                        Op::Grant { caller, target } => registry.grant_admin(&people[caller], people[target]),
                        Op::Revoke { caller, target } => registry.revoke_admin(&people[caller], people[target]),
                    };
                    if result.is_ok() {
                        successes += 1;
                    }
                    prop_assert!(!registry.admins().is_empty());
                }

                prop_assert_eq!(registry.events().len(), successes);
            }
        }
    }
}
