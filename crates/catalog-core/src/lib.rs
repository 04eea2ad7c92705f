use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

mod model;
mod policy;
pub mod recommend;
pub mod services;
mod store;

#[cfg(test)]
mod testing;

pub use model::{
    Category, CategoryCreate, CategoryPatch, NewUser, Product, ProductCreate, ProductPatch, User,
};
pub use policy::{can_modify, Owned};
pub use recommend::{recommend, Recommendation, RecommendationSource};
pub use store::{CatalogStore, Page, Pagination, ProductScope};

pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const DEFAULT_RECOMMENDATION_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Entity {
    User,
    Category,
    Product,
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Category => write!(f, "Category"),
            Self::Product => write!(f, "Product"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },
    #[error("not enough permissions")]
    Forbidden,
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl CatalogError {
    pub fn not_found(entity: Entity, id: impl Display) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed(message.into())
    }
}

macro_rules! ulid_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub Ulid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ulid::DecodeError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Ulid::from_string(value).map(Self)
            }
        }
    };
}

ulid_id!(UserId);
ulid_id!(CategoryId);
ulid_id!(ProductId);
