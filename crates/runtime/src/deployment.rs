//! Deployment wiring: one admin registry, one product registry bound to it.

use std::sync::Arc;

use supplychain_auth::AdminRegistry;
use supplychain_core::{DomainResult, Identity};
use supplychain_products::ProductRegistry;

use crate::script::{AccountBook, Call, CallOutcome, CallScript, CallStatus, ScriptReport};

pub struct Deployment {
    admins: Arc<AdminRegistry>,
    products: ProductRegistry<Arc<AdminRegistry>>,
}

impl Deployment {
    /// Deploy the admin registry with `deployer` as its first administrator,
    /// then the product registry authorizing against it.
    pub fn deploy(deployer: Identity) -> Self {
        let admins = Arc::new(AdminRegistry::new(deployer));

        let products = ProductRegistry::new(Arc::clone(&admins));
        tracing::info!("product registry deployed");

        Self { admins, products }
    }

    pub fn deployer(&self) -> Identity {
        self.admins.deployer()
    }

    pub fn admins(&self) -> &AdminRegistry {
        &self.admins
    }

    pub fn products(&self) -> &ProductRegistry<Arc<AdminRegistry>> {
        &self.products
    }

    /// Replay `script` in order. A rejected call is recorded and the run
    /// continues with the next one.
    pub fn run_script(&self, script: &CallScript) -> ScriptReport {
        let mut book = AccountBook::new(self.deployer());

        let outcomes = script
            .calls
            .iter()
            .enumerate()
            .map(|(index, call)| {
                let status = match self.dispatch(&mut book, call) {
                    Ok(()) => CallStatus::Ok,
                    Err(e) => CallStatus::from(&e),
                };
                tracing::debug!(index, op = call.op(), ?status, "script call finished");
                CallOutcome {
                    index,
                    op: call.op(),
                    status,
                }
            })
            .collect::<Vec<_>>();

        let rejected = outcomes.iter().filter(|o| !o.is_ok()).count();
        tracing::info!(calls = outcomes.len(), rejected, "script finished");

        ScriptReport {
            deployer: self.deployer(),
            accounts: book.into_labels(),
            outcomes,
            admins: self.admins.admins(),
            products: self.products.products(),
        }
    }

    fn dispatch(&self, book: &mut AccountBook, call: &Call) -> DomainResult<()> {
        match call {
            Call::CreateProduct {
                caller,
                product_id,
                name,
                price,
            } => {
                let caller = book.resolve(caller);
                self.products
                    .create_product(*product_id, name.as_str(), *price, &caller)
            }
            Call::SellProduct {
                caller,
                product_id,
                new_owner,
            } => {
                let caller = book.resolve(caller);
                let new_owner = book.resolve(new_owner);
                self.products.sell_product(*product_id, new_owner, &caller)
            }
            Call::GrantAdmin { caller, identity } => {
                let caller = book.resolve(caller);
                let identity = book.resolve(identity);
                self.admins.grant_admin(&caller, identity)
            }
            Call::RevokeAdmin { caller, identity } => {
                let caller = book.resolve(caller);
                let identity = book.resolve(identity);
                self.admins.revoke_admin(&caller, identity)
            }
        }
    }
}
