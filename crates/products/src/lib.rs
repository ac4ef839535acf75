//! Products domain module.
//!
//! Business rules for the product lifecycle (`Created → Sold`) as a pure
//! aggregate, plus the [`ProductRegistry`] that owns every product record and
//! authorizes callers against an [`AdminAuthority`](supplychain_auth::AdminAuthority).

pub mod product;
pub mod registry;

pub use product::{
    CreateProduct, Product, ProductCommand, ProductCreated, ProductEvent, ProductId,
    ProductRecord, ProductSold, ProductState, SellProduct,
};
pub use registry::ProductRegistry;
