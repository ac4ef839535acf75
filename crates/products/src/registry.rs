//! Product registry: the authoritative product-record store.
//!
//! Every mutating call runs under the store's write lock from its first check
//! to its last mutation:
//!
//! ```text
//! caller ── authorize ── load/empty aggregate ── handle ── apply ── insert + log ── publish
//! ```
//!
//! Checks run against a copy of the record; the store only changes when the
//! copy is inserted back, so a rejected call commits nothing. Publication
//! happens after the lock is released and cannot fail the call.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use supplychain_auth::{AdminAuthority, authorize_admin};
use supplychain_core::{DomainError, DomainResult, Identity};
use supplychain_events::{EventBus, EventEnvelope, EventLog, InMemoryEventBus, Subscription, execute};

use crate::product::{
    CreateProduct, Product, ProductCommand, ProductEvent, ProductId, ProductRecord, SellProduct,
};

type ProductEnvelope = EventEnvelope<ProductEvent>;

#[derive(Debug, Default)]
struct RegistryState {
    products: HashMap<ProductId, Product>,
    log: EventLog<ProductEvent>,
}

impl RegistryState {
    /// Run `command` against a copy of the stored aggregate and commit the
    /// result. Nothing is written when the command is rejected.
    fn commit(&mut self, product_id: ProductId, command: &ProductCommand) -> DomainResult<Vec<ProductEnvelope>> {
        let mut product = self
            .products
            .get(&product_id)
            .cloned()
            .unwrap_or_else(|| Product::empty(product_id));

        let events = execute(&mut product, command)?;
        self.products.insert(product_id, product);

        Ok(events
            .into_iter()
            .map(|event| self.log.append(event).clone())
            .collect())
    }
}

/// Registry of product records gated by an administrator authority.
///
/// - `A` is the read-only admin query the registry authorizes creations against.
/// - `B` is the bus committed events are published to.
///
/// # Invariants
/// - Product ids are unique for the lifetime of the registry.
/// - A record exists iff its creation succeeded; records are never removed.
/// - State only moves `Created → Sold`.
/// - Each successful mutation appends exactly one event to the log.
#[derive(Debug)]
pub struct ProductRegistry<A, B = InMemoryEventBus<ProductEnvelope>> {
    admins: A,
    state: RwLock<RegistryState>,
    bus: B,
}

impl<A> ProductRegistry<A>
where
    A: AdminAuthority,
{
    /// Deploy a registry that authorizes against `admins`, publishing to a
    /// fresh in-memory bus.
    pub fn new(admins: A) -> Self {
        Self::with_bus(admins, InMemoryEventBus::new())
    }
}

impl<A, B> ProductRegistry<A, B>
where
    A: AdminAuthority,
    B: EventBus<ProductEnvelope>,
{
    pub fn with_bus(admins: A, bus: B) -> Self {
        tracing::info!("product registry deployed");
        Self {
            admins,
            state: RwLock::new(RegistryState::default()),
            bus,
        }
    }

    /// The authority creations are checked against.
    pub fn authority(&self) -> &A {
        &self.admins
    }

    /// Create a product owned by `caller`.
    ///
    /// Checks, first failure wins:
    /// 1. `caller` is an administrator, else `Unauthorized`.
    /// 2. `product_id` is unused, else `DuplicateId`.
    ///
    /// Emits `ProductCreated(product_id, name, price, caller)`.
    pub fn create_product(
        &self,
        product_id: ProductId,
        name: impl Into<String>,
        price: u64,
        caller: &Identity,
    ) -> DomainResult<()> {
        let mut state = self.write();

        if let Err(e) = authorize_admin(&self.admins, caller) {
            tracing::warn!(%product_id, %caller, error = %e, "create_product rejected");
            return Err(e.into());
        }

        let command = ProductCommand::Create(CreateProduct {
            product_id,
            name: name.into(),
            price,
            creator: *caller,
            occurred_at: Utc::now(),
        });

        let committed = match state.commit(product_id, &command) {
            Ok(committed) => committed,
            Err(e) => {
                tracing::warn!(%product_id, %caller, error = %e, "create_product rejected");
                return Err(e);
            }
        };
        drop(state);

        tracing::info!(%product_id, creator = %caller, price, "product created");
        self.publish(committed);
        Ok(())
    }

    /// Transfer `product_id` from `caller` to `new_owner` and mark it sold.
    ///
    /// Checks, first failure wins:
    /// 1. the product exists, else `NotFound`.
    /// 2. `caller` is its current owner, else `Unauthorized`.
    /// 3. it has not been sold yet, else `InvalidState`.
    ///
    /// Emits `ProductSold(product_id, previous_owner, new_owner)`.
    pub fn sell_product(
        &self,
        product_id: ProductId,
        new_owner: Identity,
        caller: &Identity,
    ) -> DomainResult<()> {
        let mut state = self.write();

        let command = ProductCommand::Sell(SellProduct {
            product_id,
            new_owner,
            caller: *caller,
            occurred_at: Utc::now(),
        });

        // Unknown ids never reach `commit`, which would otherwise insert an
        // empty aggregate for a rejected call.
        if !state.products.contains_key(&product_id) {
            tracing::warn!(%product_id, %caller, "sell_product rejected: not found");
            return Err(DomainError::not_found());
        }

        let committed = match state.commit(product_id, &command) {
            Ok(committed) => committed,
            Err(e) => {
                tracing::warn!(%product_id, %caller, error = %e, "sell_product rejected");
                return Err(e);
            }
        };
        drop(state);

        tracing::info!(%product_id, previous_owner = %caller, %new_owner, "product sold");
        self.publish(committed);
        Ok(())
    }

    /// Subscribe to product events committed from now on.
    pub fn subscribe(&self) -> Subscription<ProductEnvelope> {
        self.bus.subscribe()
    }

    fn publish(&self, committed: Vec<ProductEnvelope>) {
        for envelope in committed {
            let sequence = envelope.sequence_number();
            if let Err(e) = self.bus.publish(envelope) {
                tracing::warn!(sequence, error = %e, "product event publication failed");
            }
        }
    }
}

impl<A, B> ProductRegistry<A, B> {
    /// Look up a product; `NotFound` if it was never created.
    pub fn get_product(&self, product_id: ProductId) -> DomainResult<ProductRecord> {
        self.read()
            .products
            .get(&product_id)
            .ok_or_else(DomainError::not_found)?
            .to_record()
    }

    /// Whether `identity` currently owns `product_id` (`false` for unknown ids).
    pub fn is_owner(&self, product_id: ProductId, identity: &Identity) -> bool {
        self.read()
            .products
            .get(&product_id)
            .is_some_and(|product| product.is_owned_by(identity))
    }

    /// All products, ordered by id.
    pub fn products(&self) -> Vec<ProductRecord> {
        let state = self.read();
        let mut records: Vec<ProductRecord> = state
            .products
            .values()
            .filter_map(|product| product.to_record().ok())
            .collect();
        records.sort_by_key(|record| record.product_id);
        records
    }

    pub fn len(&self) -> usize {
        self.read().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every committed product event, oldest first.
    pub fn events(&self) -> Vec<ProductEnvelope> {
        self.read().log.entries().to_vec()
    }

    // Commits are a single insert after all checks, so a poisoned lock still
    // guards a consistent store.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
