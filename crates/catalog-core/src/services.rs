//! Category, product and user operations over a [`CatalogStore`].
//!
//! Product lookups always check existence before ownership, so a missing id is
//! reported as `NotFound` to every caller.

use tracing::debug;

use crate::{
    can_modify, CatalogError, CatalogStore, Category, CategoryCreate, CategoryId, CategoryPatch,
    Entity, NewUser, Page, Pagination, Product, ProductCreate, ProductId, ProductPatch,
    ProductScope, User, UserId,
};

/// # Errors
/// Returns [`CatalogError::NotFound`] when no user has this id.
pub fn get_user<S: CatalogStore + ?Sized>(store: &S, id: UserId) -> Result<User, CatalogError> {
    store.get_user(id)?.ok_or_else(|| CatalogError::not_found(Entity::User, id))
}

/// # Errors
/// Returns [`CatalogError::ValidationFailed`] for invalid input, or a store error.
pub fn create_user<S: CatalogStore + ?Sized>(
    store: &mut S,
    input: NewUser,
) -> Result<User, CatalogError> {
    input.validate()?;
    let user = input.into_user();
    store.insert_user(&user)?;
    debug!(user_id = %user.id, is_superuser = user.is_superuser, "created user");
    Ok(user)
}

/// # Errors
/// Returns a store error when counting or listing fails.
pub fn list_categories<S: CatalogStore + ?Sized>(
    store: &S,
    page: Pagination,
) -> Result<Page<Category>, CatalogError> {
    let count = store.count_categories()?;
    let data = store.list_categories(page)?;
    Ok(Page { data, count })
}

/// # Errors
/// Returns [`CatalogError::NotFound`] when the category does not exist.
pub fn get_category<S: CatalogStore + ?Sized>(
    store: &S,
    id: CategoryId,
) -> Result<Category, CatalogError> {
    store.get_category(id)?.ok_or_else(|| CatalogError::not_found(Entity::Category, id))
}

/// # Errors
/// Returns [`CatalogError::ValidationFailed`] for invalid input, or a store error.
pub fn create_category<S: CatalogStore + ?Sized>(
    store: &mut S,
    input: CategoryCreate,
) -> Result<Category, CatalogError> {
    input.validate()?;
    let category = input.into_category();
    store.insert_category(&category)?;
    debug!(category_id = %category.id, "created category");
    Ok(category)
}

/// # Errors
/// Returns [`CatalogError::NotFound`] when the category does not exist, or
/// [`CatalogError::ValidationFailed`] when a supplied field is invalid.
pub fn update_category<S: CatalogStore + ?Sized>(
    store: &mut S,
    id: CategoryId,
    patch: CategoryPatch,
) -> Result<Category, CatalogError> {
    let mut category = get_category(&*store, id)?;
    patch.validate()?;
    patch.apply(&mut category);
    store.update_category(&category)?;
    Ok(category)
}

/// # Errors
/// Returns [`CatalogError::NotFound`] when the category does not exist.
pub fn delete_category<S: CatalogStore + ?Sized>(
    store: &mut S,
    id: CategoryId,
) -> Result<(), CatalogError> {
    let category = get_category(&*store, id)?;
    store.delete_category(category.id)?;
    debug!(category_id = %id, "deleted category");
    Ok(())
}

/// Superusers see every product; everyone else sees their own. `count` covers the
/// same scope as `data`.
///
/// # Errors
/// Returns a store error when counting or listing fails.
pub fn list_products<S: CatalogStore + ?Sized>(
    store: &S,
    user: &User,
    page: Pagination,
) -> Result<Page<Product>, CatalogError> {
    let scope = ProductScope::visible_to(user);
    let count = store.count_products(scope)?;
    let data = store.list_products(scope, page)?;
    Ok(Page { data, count })
}

/// # Errors
/// Returns [`CatalogError::NotFound`] when the product does not exist, then
/// [`CatalogError::Forbidden`] when the caller may not access it.
pub fn get_product<S: CatalogStore + ?Sized>(
    store: &S,
    user: &User,
    id: ProductId,
) -> Result<Product, CatalogError> {
    let product =
        store.get_product(id)?.ok_or_else(|| CatalogError::not_found(Entity::Product, id))?;
    if !can_modify(user, &product) {
        debug!(user_id = %user.id, product_id = %id, "product access denied");
        return Err(CatalogError::Forbidden);
    }
    Ok(product)
}

/// The category is checked before anything is written; the caller becomes the owner.
///
/// # Errors
/// Returns [`CatalogError::ValidationFailed`] for invalid input or an unknown category.
pub fn create_product<S: CatalogStore + ?Sized>(
    store: &mut S,
    user: &User,
    input: ProductCreate,
) -> Result<Product, CatalogError> {
    input.validate()?;
    require_category(&*store, input.category_id)?;
    let product = input.into_product(user.id);
    store.insert_product(&product)?;
    debug!(product_id = %product.id, owner_id = %user.id, "created product");
    Ok(product)
}

/// # Errors
/// Returns [`CatalogError::NotFound`], then [`CatalogError::Forbidden`], then
/// [`CatalogError::ValidationFailed`] for invalid fields or an unknown new category.
pub fn update_product<S: CatalogStore + ?Sized>(
    store: &mut S,
    user: &User,
    id: ProductId,
    patch: ProductPatch,
) -> Result<Product, CatalogError> {
    let mut product = get_product(&*store, user, id)?;
    patch.validate()?;
    if let Some(category_id) = patch.category_id {
        if category_id != product.category_id {
            require_category(&*store, category_id)?;
        }
    }
    patch.apply(&mut product);
    store.update_product(&product)?;
    Ok(product)
}

/// # Errors
/// Returns [`CatalogError::NotFound`], then [`CatalogError::Forbidden`].
pub fn delete_product<S: CatalogStore + ?Sized>(
    store: &mut S,
    user: &User,
    id: ProductId,
) -> Result<(), CatalogError> {
    let product = get_product(&*store, user, id)?;
    store.delete_product(product.id)?;
    debug!(product_id = %id, user_id = %user.id, "deleted product");
    Ok(())
}

fn require_category<S: CatalogStore + ?Sized>(
    store: &S,
    id: CategoryId,
) -> Result<(), CatalogError> {
    match store.get_category(id)? {
        Some(_) => Ok(()),
        None => Err(CatalogError::validation(format!("category not found: {id}"))),
    }
}
