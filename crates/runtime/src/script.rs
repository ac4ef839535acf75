//! JSON call scripts.
//!
//! A script is an ordered list of registry calls, each naming its caller:
//!
//! ```json
//! { "calls": [
//!     { "op": "create_product", "caller": "deployer", "product_id": 1, "name": "Widget", "price": 100 },
//!     { "op": "sell_product", "caller": "deployer", "product_id": 1, "new_owner": "bob" }
//! ] }
//! ```
//!
//! Accounts are written as `"deployer"`, a UUID, or any other label. A label
//! stands for a fresh identity allocated on first use and reused for the rest
//! of the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use supplychain_core::{DomainError, Identity};
use supplychain_products::{ProductId, ProductRecord};

pub const DEPLOYER_ACCOUNT: &str = "deployer";

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed script: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Account reference as written in a script.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Account {
    Deployer,
    Id(Identity),
    Label(String),
}

impl TryFrom<String> for Account {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("account reference must not be empty".to_string());
        }
        if trimmed == DEPLOYER_ACCOUNT {
            return Ok(Account::Deployer);
        }
        Ok(match trimmed.parse::<Identity>() {
            Ok(identity) => Account::Id(identity),
            Err(_) => Account::Label(trimmed.to_string()),
        })
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        match account {
            Account::Deployer => DEPLOYER_ACCOUNT.to_string(),
            Account::Id(identity) => identity.to_string(),
            Account::Label(label) => label,
        }
    }
}

/// One registry call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    CreateProduct {
        caller: Account,
        product_id: ProductId,
        name: String,
        price: u64,
    },
    SellProduct {
        caller: Account,
        product_id: ProductId,
        new_owner: Account,
    },
    GrantAdmin {
        caller: Account,
        identity: Account,
    },
    RevokeAdmin {
        caller: Account,
        identity: Account,
    },
}

impl Call {
    /// Operation name, as written in the `"op"` tag.
    pub fn op(&self) -> &'static str {
        match self {
            Call::CreateProduct { .. } => "create_product",
            Call::SellProduct { .. } => "sell_product",
            Call::GrantAdmin { .. } => "grant_admin",
            Call::RevokeAdmin { .. } => "revoke_admin",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallScript {
    pub calls: Vec<Call>,
}

impl CallScript {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Resolves script accounts to identities for the duration of one run.
#[derive(Debug)]
pub(crate) struct AccountBook {
    deployer: Identity,
    labels: BTreeMap<String, Identity>,
}

impl AccountBook {
    pub(crate) fn new(deployer: Identity) -> Self {
        Self {
            deployer,
            labels: BTreeMap::new(),
        }
    }

    pub(crate) fn resolve(&mut self, account: &Account) -> Identity {
        match account {
            Account::Deployer => self.deployer,
            Account::Id(identity) => *identity,
            Account::Label(label) => *self.labels.entry(label.clone()).or_default(),
        }
    }

    pub(crate) fn into_labels(self) -> BTreeMap<String, Identity> {
        self.labels
    }
}

/// Result of a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallStatus {
    Ok,
    Rejected { kind: String, message: String },
}

impl From<&DomainError> for CallStatus {
    fn from(error: &DomainError) -> Self {
        CallStatus::Rejected {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallOutcome {
    pub index: usize,
    pub op: &'static str,
    #[serde(flatten)]
    pub status: CallStatus,
}

impl CallOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, CallStatus::Ok)
    }

    /// Error kind of a rejected call (see [`DomainError::kind`]).
    pub fn rejection_kind(&self) -> Option<&str> {
        match &self.status {
            CallStatus::Ok => None,
            CallStatus::Rejected { kind, .. } => Some(kind),
        }
    }
}

/// Everything a script run produced, printed by the binary.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptReport {
    pub deployer: Identity,
    /// Identities allocated for labelled accounts.
    pub accounts: BTreeMap<String, Identity>,
    pub outcomes: Vec<CallOutcome>,
    pub admins: Vec<Identity>,
    pub products: Vec<ProductRecord>,
}

impl ScriptReport {
    pub fn account(&self, label: &str) -> Option<Identity> {
        self.accounts.get(label).copied()
    }
}
