//! Product recommendations.
//!
//! A user is first offered products from the categories they already own products
//! in, minus those products themselves. When that yields nothing (including the
//! case where the user owns nothing at all) the globally highest rated products are
//! returned instead. The two selections are never mixed.

use tracing::debug;

use crate::{CatalogError, CatalogStore, Entity, Page, Pagination, Product, ProductScope, UserId};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RecommendationSource {
    /// Same categories as the user's own products.
    Primary,
    /// Highest rating first, unfiltered.
    Fallback,
}

impl RecommendationSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub source: RecommendationSource,
    pub products: Vec<Product>,
}

impl Recommendation {
    /// The reported count is the size of this page, not of any wider result set.
    #[must_use]
    pub fn into_page(self) -> Page<Product> {
        let count = self.products.len() as u64;
        Page { data: self.products, count }
    }
}

/// # Errors
/// Returns [`CatalogError::NotFound`] when `user_id` does not resolve to a user, or a
/// store error when any query fails.
pub fn recommend<S: CatalogStore + ?Sized>(
    store: &S,
    user_id: UserId,
    page: Pagination,
) -> Result<Recommendation, CatalogError> {
    let user =
        store.get_user(user_id)?.ok_or_else(|| CatalogError::not_found(Entity::User, user_id))?;

    let owned = store.count_products(ProductScope::OwnedBy(user.id))?;
    if owned > 0 {
        let products = store.products_in_owned_categories(user.id, page)?;
        if !products.is_empty() {
            debug!(
                user_id = %user.id,
                returned = products.len(),
                "recommendations from owned categories"
            );
            return Ok(Recommendation { source: RecommendationSource::Primary, products });
        }
    }

    let products = store.products_by_rating(page)?;
    debug!(
        user_id = %user.id,
        owned,
        returned = products.len(),
        "recommendations from global rating"
    );
    Ok(Recommendation { source: RecommendationSource::Fallback, products })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::testing::MemoryStore;
    use crate::{CategoryId, User};

    fn rated(
        store: &mut MemoryStore,
        owner: &User,
        category_id: CategoryId,
        rating: f64,
    ) -> Product {
        store.add_product(owner.id, category_id, rating)
    }

    #[test]
    fn unknown_user_is_not_found() {
        let store = MemoryStore::default();
        let result = recommend(&store, UserId::new(), Pagination::recommendations(None, None));
        assert!(matches!(result, Err(CatalogError::NotFound { entity: Entity::User, .. })));
    }

    #[test]
    fn primary_path_draws_from_owned_categories_and_skips_owned_products() {
        let mut store = MemoryStore::default();
        let alice = store.add_user("alice@example.com", false);
        let bob = store.add_user("bob@example.com", false);
        let (a, b, c) = (store.add_category("A"), store.add_category("B"), store.add_category("C"));

        let own_a = rated(&mut store, &alice, a, 1.0);
        let own_b = rated(&mut store, &alice, b, 1.0);
        let other_a = rated(&mut store, &bob, a, 2.0);
        let other_b = rated(&mut store, &bob, b, 3.0);
        let _other_c = rated(&mut store, &bob, c, 5.0);

        let result = recommend(&store, alice.id, Pagination::recommendations(None, None))
            .unwrap_or_else(|err| panic!("recommend: {err}"));

        assert_eq!(result.source, RecommendationSource::Primary);
        let ids = result.products.iter().map(|product| product.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![other_a.id, other_b.id]);
        assert!(!ids.contains(&own_a.id) && !ids.contains(&own_b.id));
    }

    #[test]
    fn user_without_products_gets_top_rated_page_with_page_sized_count() {
        let mut store = MemoryStore::default();
        let newcomer = store.add_user("new@example.com", false);
        let seller = store.add_user("seller@example.com", false);
        let category = store.add_category("Books");
        for step in 0..10_u32 {
            rated(&mut store, &seller, category, f64::from(step) / 2.0);
        }

        let result = recommend(&store, newcomer.id, Pagination::new(0, 4))
            .unwrap_or_else(|err| panic!("recommend: {err}"));
        assert_eq!(result.source, RecommendationSource::Fallback);
        let ratings = result.products.iter().map(|product| product.rating).collect::<Vec<_>>();
        assert_eq!(ratings, vec![4.5, 4.0, 3.5, 3.0]);

        let page = result.into_page();
        assert_eq!(page.count, 4);
    }

    #[test]
    fn empty_primary_result_falls_back_without_blending() {
        let mut store = MemoryStore::default();
        let alice = store.add_user("alice@example.com", false);
        let bob = store.add_user("bob@example.com", false);
        let (niche, popular) = (store.add_category("Niche"), store.add_category("Popular"));
        let own = rated(&mut store, &alice, niche, 0.5);
        let top = rated(&mut store, &bob, popular, 4.9);

        let result = recommend(&store, alice.id, Pagination::recommendations(None, None))
            .unwrap_or_else(|err| panic!("recommend: {err}"));
        assert_eq!(result.source, RecommendationSource::Fallback);
        let ids = result.products.iter().map(|product| product.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![top.id, own.id]);
    }

    #[test]
    fn primary_page_beyond_the_end_triggers_fallback() {
        let mut store = MemoryStore::default();
        let alice = store.add_user("alice@example.com", false);
        let bob = store.add_user("bob@example.com", false);
        let shared = store.add_category("Shared");
        rated(&mut store, &alice, shared, 1.0);
        rated(&mut store, &bob, shared, 2.0);

        let result = recommend(&store, alice.id, Pagination::new(1, 10))
            .unwrap_or_else(|err| panic!("recommend: {err}"));
        assert_eq!(result.source, RecommendationSource::Fallback);
        assert_eq!(result.products.len(), 1);
    }

    proptest! {
        #[test]
        fn reported_count_always_equals_page_length(
            total in 0_usize..15,
            skip in 0_u32..20,
            limit in 0_u32..12,
        ) {
            let mut store = MemoryStore::default();
            let newcomer = store.add_user("new@example.com", false);
            let seller = store.add_user("seller@example.com", false);
            let category = store.add_category("Misc");
            for index in 0..total {
                rated(&mut store, &seller, category, index as f64);
            }

            let page = recommend(&store, newcomer.id, Pagination::new(skip, limit))
                .unwrap_or_else(|err| panic!("recommend: {err}"))
                .into_page();
            prop_assert_eq!(page.count, page.data.len() as u64);
            prop_assert!(page.data.len() <= limit as usize);
            prop_assert!(page.data.windows(2).all(|pair| pair[0].rating >= pair[1].rating));
        }
    }
}
