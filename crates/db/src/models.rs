//! Marketplace records as stored in the document database.
//!
//! Every record keeps client-supplied fields it does not model in `extra`,
//! so inserting a request body preserves it verbatim apart from the id.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Unmodelled document fields
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Marketplace role stored on each user record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Role::Buyer),
            "seller" => Ok(Role::Seller),
            "admin" => Ok(Role::Admin),
            other => Err(anyhow::anyhow!(
                "unknown role '{other}'; expected buyer/seller/admin"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub seller_email: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub is_advertised: bool,
    #[serde(default)]
    pub is_reported: bool,
    #[serde(default)]
    pub is_sold: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Boolean listing flags that can be set by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookFlag {
    Advertised,
    Reported,
}

impl BookFlag {
    /// Document field holding the flag
    pub fn field(&self) -> &'static str {
        match self {
            BookFlag::Advertised => "isAdvertised",
            BookFlag::Reported => "isReported",
        }
    }

    pub fn get(&self, book: &Book) -> bool {
        match self {
            BookFlag::Advertised => book.is_advertised,
            BookFlag::Reported => book.is_reported,
        }
    }

    pub fn set(&self, book: &mut Book, value: bool) {
        match self {
            BookFlag::Advertised => book.is_advertised = value,
            BookFlag::Reported => book.is_reported = value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub buyer_email: String,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub is_reported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default)]
    pub id: String,
    /// Settlement targets; the only fields a payment body must carry
    pub ordered_id: String,
    pub book_id: String,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub user_email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Book listing filter; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    pub category_id: Option<String>,
    pub seller_email: Option<String>,
    pub advertised: Option<bool>,
    pub reported: Option<bool>,
    pub sold: Option<bool>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        self.category_id
            .as_deref()
            .map_or(true, |c| book.category_id == c)
            && self
                .seller_email
                .as_deref()
                .map_or(true, |e| book.seller_email == e)
            && self.advertised.map_or(true, |v| book.is_advertised == v)
            && self.reported.map_or(true, |v| book.is_reported == v)
            && self.sold.map_or(true, |v| book.is_sold == v)
    }
}

/// Outcome of an update addressed by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCount {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeDelete {
    pub books_deleted: u64,
    pub orders_deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerVerification {
    pub user: UpdateCount,
    pub books_verified: u64,
}

/// Result of settling a payment. Nothing is written unless `Settled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Settled { payment_id: String },
    OrderMissing,
    BookMissing,
}
