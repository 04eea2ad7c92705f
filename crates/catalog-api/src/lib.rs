use std::path::PathBuf;

use anyhow::Result;
use catalog_core::services;
use catalog_core::{
    CatalogError, Category, CategoryCreate, CategoryId, CategoryPatch, NewUser, Page, Pagination,
    Product, ProductCreate, ProductId, ProductPatch, User, UserId,
};
use catalog_store_sqlite::{SchemaStatus, SqliteStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MigrateResult {
    pub dry_run: bool,
    pub current_version: i64,
    pub target_version: i64,
    pub would_apply_versions: Vec<i64>,
    pub after_version: Option<i64>,
    pub up_to_date: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Entry point for every catalog operation. Each call opens its own connection, so
/// the value is cheap to clone and share between request handlers.
#[derive(Debug, Clone)]
pub struct CatalogApi {
    db_path: PathBuf,
}

impl CatalogApi {
    #[must_use]
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open(&self.db_path)
    }

    fn open_migrated_store(&self) -> Result<SqliteStore> {
        let mut store = self.open_store()?;
        store.migrate()?;
        Ok(store)
    }

    /// Inspect schema status without mutating data.
    ///
    /// # Errors
    /// Returns an error when the `SQLite` database cannot be opened or queried.
    pub fn schema_status(&self) -> Result<SchemaStatus> {
        let store = self.open_store()?;
        store.schema_status()
    }

    /// Apply pending migrations, or return planned versions for dry-run mode.
    ///
    /// # Errors
    /// Returns an error when migration planning or execution fails.
    pub fn migrate(&self, dry_run: bool) -> Result<MigrateResult> {
        let mut store = self.open_store()?;
        let before = store.schema_status()?;
        if dry_run {
            return Ok(MigrateResult {
                dry_run: true,
                current_version: before.current_version,
                target_version: before.target_version,
                would_apply_versions: before.pending_versions,
                after_version: None,
                up_to_date: None,
            });
        }

        let planned_versions = before.pending_versions;
        store.migrate()?;
        let after = store.schema_status()?;
        if !planned_versions.is_empty() {
            info!(
                from = before.current_version,
                to = after.current_version,
                "applied catalog schema migrations"
            );
        }
        Ok(MigrateResult {
            dry_run: false,
            current_version: before.current_version,
            target_version: before.target_version,
            would_apply_versions: planned_versions,
            after_version: Some(after.current_version),
            up_to_date: Some(after.pending_versions.is_empty()),
        })
    }

    /// # Errors
    /// Returns [`CatalogError::ValidationFailed`] for invalid input, or a store error.
    pub fn create_user(&self, input: NewUser) -> Result<User, CatalogError> {
        let mut store = self.open_migrated_store()?;
        services::create_user(&mut store, input)
    }

    /// # Errors
    /// Returns [`CatalogError::NotFound`] when no user has this id.
    pub fn get_user(&self, id: UserId) -> Result<User, CatalogError> {
        let store = self.open_migrated_store()?;
        services::get_user(&store, id)
    }

    /// # Errors
    /// Returns a store error when the listing fails.
    pub fn list_categories(&self, page: Pagination) -> Result<Page<Category>, CatalogError> {
        let store = self.open_migrated_store()?;
        services::list_categories(&store, page)
    }

    /// # Errors
    /// Returns [`CatalogError::NotFound`] when the category does not exist.
    pub fn get_category(&self, id: CategoryId) -> Result<Category, CatalogError> {
        let store = self.open_migrated_store()?;
        services::get_category(&store, id)
    }

    /// # Errors
    /// Returns [`CatalogError::ValidationFailed`] for invalid input, or a store error.
    pub fn create_category(&self, input: CategoryCreate) -> Result<Category, CatalogError> {
        let mut store = self.open_migrated_store()?;
        services::create_category(&mut store, input)
    }

    /// # Errors
    /// Returns [`CatalogError::NotFound`] or [`CatalogError::ValidationFailed`].
    pub fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> Result<Category, CatalogError> {
        let mut store = self.open_migrated_store()?;
        services::update_category(&mut store, id, patch)
    }

    /// # Errors
    /// Returns [`CatalogError::NotFound`] when the category does not exist.
    pub fn delete_category(&self, id: CategoryId) -> Result<Message, CatalogError> {
        let mut store = self.open_migrated_store()?;
        services::delete_category(&mut store, id)?;
        Ok(Message::new("Category deleted successfully"))
    }

    /// # Errors
    /// Returns a store error when the listing fails.
    pub fn list_products(
        &self,
        user: &User,
        page: Pagination,
    ) -> Result<Page<Product>, CatalogError> {
        let store = self.open_migrated_store()?;
        services::list_products(&store, user, page)
    }

    /// # Errors
    /// Returns [`CatalogError::NotFound`], then [`CatalogError::Forbidden`].
    pub fn get_product(&self, user: &User, id: ProductId) -> Result<Product, CatalogError> {
        let store = self.open_migrated_store()?;
        services::get_product(&store, user, id)
    }

    /// # Errors
    /// Returns [`CatalogError::ValidationFailed`] for invalid input or an unknown category.
    pub fn create_product(
        &self,
        user: &User,
        input: ProductCreate,
    ) -> Result<Product, CatalogError> {
        let mut store = self.open_migrated_store()?;
        services::create_product(&mut store, user, input)
    }

    /// # Errors
    /// Returns [`CatalogError::NotFound`], [`CatalogError::Forbidden`] or
    /// [`CatalogError::ValidationFailed`], in that order of precedence.
    pub fn update_product(
        &self,
        user: &User,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        let mut store = self.open_migrated_store()?;
        services::update_product(&mut store, user, id, patch)
    }

    /// # Errors
    /// Returns [`CatalogError::NotFound`], then [`CatalogError::Forbidden`].
    pub fn delete_product(&self, user: &User, id: ProductId) -> Result<Message, CatalogError> {
        let mut store = self.open_migrated_store()?;
        services::delete_product(&mut store, user, id)?;
        Ok(Message::new("Product deleted successfully"))
    }

    /// Recommendations for `user_id`; the page's `count` is the number of items returned.
    ///
    /// # Errors
    /// Returns [`CatalogError::NotFound`] when the user does not exist.
    pub fn recommendations(
        &self,
        user_id: UserId,
        page: Pagination,
    ) -> Result<Page<Product>, CatalogError> {
        let store = self.open_migrated_store()?;
        let recommendation = catalog_core::recommend(&store, user_id, page)?;
        debug!(
            user_id = %user_id,
            source = recommendation.source.as_str(),
            "served recommendations"
        );
        Ok(recommendation.into_page())
    }
}
