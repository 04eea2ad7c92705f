use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{
    Category, CategoryId, Product, ProductId, User, UserId, DEFAULT_LIST_LIMIT,
    DEFAULT_RECOMMENDATION_LIMIT,
};

/// Offset/limit window applied to a listing query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct Pagination {
    pub skip: u32,
    pub limit: u32,
}

impl Pagination {
    #[must_use]
    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }

    #[must_use]
    pub fn listing(skip: Option<u32>, limit: Option<u32>) -> Self {
        Self::new(skip.unwrap_or(0), limit.unwrap_or(DEFAULT_LIST_LIMIT))
    }

    #[must_use]
    pub fn recommendations(skip: Option<u32>, limit: Option<u32>) -> Self {
        Self::new(skip.unwrap_or(0), limit.unwrap_or(DEFAULT_RECOMMENDATION_LIMIT))
    }

}

impl Default for Pagination {
    fn default() -> Self {
        Self::listing(None, None)
    }
}

/// One page of results plus the reported count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: u64,
}

/// Which products a listing may see.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ProductScope {
    All,
    OwnedBy(UserId),
}

impl ProductScope {
    #[must_use]
    pub fn visible_to(user: &User) -> Self {
        if user.is_superuser {
            Self::All
        } else {
            Self::OwnedBy(user.id)
        }
    }

    #[must_use]
    pub fn contains(self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::OwnedBy(owner_id) => product.owner_id == owner_id,
        }
    }
}

/// Persistence port consumed by the catalog services.
///
/// Listings return rows in insertion order unless stated otherwise. Every write is
/// expected to be atomic.
pub trait CatalogStore {
    fn get_user(&self, id: UserId) -> Result<Option<User>>;
    fn insert_user(&mut self, user: &User) -> Result<()>;

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;
    fn count_categories(&self) -> Result<u64>;
    fn list_categories(&self, page: Pagination) -> Result<Vec<Category>>;
    fn insert_category(&mut self, category: &Category) -> Result<()>;
    fn update_category(&mut self, category: &Category) -> Result<()>;
    fn delete_category(&mut self, id: CategoryId) -> Result<()>;

    fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    fn count_products(&self, scope: ProductScope) -> Result<u64>;
    fn list_products(&self, scope: ProductScope, page: Pagination) -> Result<Vec<Product>>;
    fn insert_product(&mut self, product: &Product) -> Result<()>;
    fn update_product(&mut self, product: &Product) -> Result<()>;
    fn delete_product(&mut self, id: ProductId) -> Result<()>;

    /// Products in any category `owner_id` owns a product in, excluding the owner's
    /// own products. The cost must not grow with how many products the owner has.
    fn products_in_owned_categories(
        &self,
        owner_id: UserId,
        page: Pagination,
    ) -> Result<Vec<Product>>;

    /// All products, highest rating first.
    fn products_by_rating(&self, page: Pagination) -> Result<Vec<Product>>;
}
