use std::collections::BTreeSet;

use anyhow::{anyhow, Result};

use crate::{
    CatalogStore, Category, CategoryId, Pagination, Product, ProductId, ProductScope, User, UserId,
};

/// Vec-backed store for unit tests; keeps insertion order like the SQLite adapter.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    users: Vec<User>,
    categories: Vec<Category>,
    products: Vec<Product>,
}

impl MemoryStore {
    pub(crate) fn add_user(&mut self, email: &str, is_superuser: bool) -> User {
        let user =
            User { id: UserId::new(), email: email.to_string(), full_name: None, is_superuser };
        self.users.push(user.clone());
        user
    }

    pub(crate) fn add_category(&mut self, name: &str) -> CategoryId {
        let id = CategoryId::new();
        self.categories.push(Category { id, name: name.to_string(), description: None });
        id
    }

    pub(crate) fn add_product(
        &mut self,
        owner_id: UserId,
        category_id: CategoryId,
        rating: f64,
    ) -> Product {
        let product = Product {
            id: ProductId::new(),
            name: format!("product-{}", self.products.len()),
            description: None,
            price: 1.0,
            rating,
            category_id,
            owner_id,
        };
        self.products.push(product.clone());
        product
    }

    pub(crate) fn product_count(&self) -> usize {
        self.products.len()
    }
}

impl CatalogStore for MemoryStore {
    fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.iter().find(|user| user.id == id).cloned())
    }

    fn insert_user(&mut self, user: &User) -> Result<()> {
        self.users.push(user.clone());
        Ok(())
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.categories.iter().find(|category| category.id == id).cloned())
    }

    fn count_categories(&self) -> Result<u64> {
        Ok(self.categories.len() as u64)
    }

    fn list_categories(&self, page: Pagination) -> Result<Vec<Category>> {
        Ok(window(page, self.categories.iter().cloned()))
    }

    fn insert_category(&mut self, category: &Category) -> Result<()> {
        self.categories.push(category.clone());
        Ok(())
    }

    fn update_category(&mut self, category: &Category) -> Result<()> {
        let slot = self
            .categories
            .iter_mut()
            .find(|existing| existing.id == category.id)
            .ok_or_else(|| anyhow!("no category row for {}", category.id))?;
        *slot = category.clone();
        Ok(())
    }

    fn delete_category(&mut self, id: CategoryId) -> Result<()> {
        self.categories.retain(|category| category.id != id);
        Ok(())
    }

    fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.iter().find(|product| product.id == id).cloned())
    }

    fn count_products(&self, scope: ProductScope) -> Result<u64> {
        Ok(self.products.iter().filter(|product| scope.contains(product)).count() as u64)
    }

    fn list_products(&self, scope: ProductScope, page: Pagination) -> Result<Vec<Product>> {
        Ok(window(page, self.products.iter().filter(|product| scope.contains(product)).cloned()))
    }

    fn insert_product(&mut self, product: &Product) -> Result<()> {
        self.products.push(product.clone());
        Ok(())
    }

    fn update_product(&mut self, product: &Product) -> Result<()> {
        let slot = self
            .products
            .iter_mut()
            .find(|existing| existing.id == product.id)
            .ok_or_else(|| anyhow!("no product row for {}", product.id))?;
        *slot = product.clone();
        Ok(())
    }

    fn delete_product(&mut self, id: ProductId) -> Result<()> {
        self.products.retain(|product| product.id != id);
        Ok(())
    }

    fn products_in_owned_categories(
        &self,
        owner_id: UserId,
        page: Pagination,
    ) -> Result<Vec<Product>> {
        let categories = self
            .products
            .iter()
            .filter(|product| product.owner_id == owner_id)
            .map(|product| product.category_id)
            .collect::<BTreeSet<_>>();
        Ok(window(
            page,
            self.products
                .iter()
                .filter(|product| {
                    product.owner_id != owner_id && categories.contains(&product.category_id)
                })
                .cloned(),
        ))
    }

    fn products_by_rating(&self, page: Pagination) -> Result<Vec<Product>> {
        let mut ordered = self.products.clone();
        ordered.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        Ok(window(page, ordered))
    }
}

fn window<T>(page: Pagination, items: impl IntoIterator<Item = T>) -> Vec<T> {
    items.into_iter().skip(page.skip as usize).take(page.limit as usize).collect()
}
