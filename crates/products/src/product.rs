use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use supplychain_core::{Aggregate, AggregateRoot, DomainError, DomainResult, Identity};
use supplychain_events::Event;

/// Product identifier, assigned by the creator (never auto-incremented).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl ProductId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ProductId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<u64>()
            .map_err(|e| DomainError::invalid_id(format!("ProductId: {e}")))?;
        Ok(Self(id))
    }
}

/// Product lifecycle state. `Sold` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ProductState {
    Created = 0,
    Sold = 1,
}

impl ProductState {
    /// Numeric discriminant (`Created = 0`, `Sold = 1`).
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Read-only snapshot of a product as returned by lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: ProductId,
    pub name: String,
    pub price: u64,
    pub current_owner: Identity,
    pub state: ProductState,
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    name: String,
    price: u64,
    current_owner: Option<Identity>,
    state: ProductState,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            name: String::new(),
            price: 0,
            current_owner: None,
            state: ProductState::Created,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    /// `None` until the product has been created.
    pub fn current_owner(&self) -> Option<Identity> {
        self.current_owner
    }

    pub fn state(&self) -> ProductState {
        self.state
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.current_owner.as_ref() == Some(identity)
    }

    /// Snapshot of a created product; `NotFound` for an empty aggregate.
    pub fn to_record(&self) -> DomainResult<ProductRecord> {
        match (self.created, self.current_owner) {
            (true, Some(current_owner)) => Ok(ProductRecord {
                product_id: self.id,
                name: self.name.clone(),
                price: self.price,
                current_owner,
                state: self.state,
            }),
            _ => Err(DomainError::not_found()),
        }
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct. `creator` becomes the first owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub name: String,
    pub price: u64,
    pub creator: Identity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SellProduct. `caller` must be the current owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellProduct {
    pub product_id: ProductId,
    pub new_owner: Identity,
    pub caller: Identity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    Create(CreateProduct),
    Sell(SellProduct),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub name: String,
    pub price: u64,
    pub creator: Identity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSold {
    pub product_id: ProductId,
    pub previous_owner: Identity,
    pub new_owner: Identity,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    Created(ProductCreated),
    Sold(ProductSold),
}

impl ProductEvent {
    pub fn product_id(&self) -> ProductId {
        match self {
            ProductEvent::Created(e) => e.product_id,
            ProductEvent::Sold(e) => e.product_id,
        }
    }
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::Created(_) => "products.product.created",
            ProductEvent::Sold(_) => "products.product.sold",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::Created(e) => e.occurred_at,
            ProductEvent::Sold(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::Created(e) => {
                self.id = e.product_id;
                self.name = e.name.clone();
                self.price = e.price;
                self.current_owner = Some(e.creator);
                self.state = ProductState::Created;
                self.created = true;
            }
            ProductEvent::Sold(e) => {
                self.current_owner = Some(e.new_owner);
                self.state = ProductState::Sold;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::Create(cmd) => self.handle_create(cmd),
            ProductCommand::Sell(cmd) => self.handle_sell(cmd),
        }
    }
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invalid_id(format!(
                "command targets product {product_id}, aggregate is {}",
                self.id
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::duplicate_id(cmd.product_id));
        }
        self.ensure_product_id(cmd.product_id)?;

        Ok(vec![ProductEvent::Created(ProductCreated {
            product_id: cmd.product_id,
            name: cmd.name.clone(),
            price: cmd.price,
            creator: cmd.creator,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_sell(&self, cmd: &SellProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_product_id(cmd.product_id)?;

        let Some(previous_owner) = self.current_owner.filter(|owner| *owner == cmd.caller) else {
            return Err(DomainError::Unauthorized);
        };

        if self.state == ProductState::Sold {
            return Err(DomainError::invalid_state("product has already been sold"));
        }

        Ok(vec![ProductEvent::Sold(ProductSold {
            product_id: cmd.product_id,
            previous_owner,
            new_owner: cmd.new_owner,
            occurred_at: cmd.occurred_at,
        })])
    }
}
