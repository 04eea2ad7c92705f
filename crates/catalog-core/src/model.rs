use serde::{Deserialize, Deserializer, Serialize};

use crate::{CatalogError, CategoryId, ProductId, UserId};

const MAX_TEXT_LEN: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub is_superuser: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
}

impl NewUser {
    /// # Errors
    /// Returns [`CatalogError::ValidationFailed`] for a blank or malformed email.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(CatalogError::validation("email MUST be a valid address"));
        }
        validate_optional_text("full_name", self.full_name.as_deref())
    }

    #[must_use]
    pub fn into_user(self) -> User {
        User {
            id: UserId::new(),
            email: self.email.trim().to_string(),
            full_name: self.full_name,
            is_superuser: self.is_superuser,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryCreate {
    /// # Errors
    /// Returns [`CatalogError::ValidationFailed`] when a field is out of bounds.
    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_name(&self.name)?;
        validate_optional_text("description", self.description.as_deref())
    }

    #[must_use]
    pub fn into_category(self) -> Category {
        Category { id: CategoryId::new(), name: self.name, description: self.description }
    }
}

/// Fields left as `None` are not touched. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct CategoryPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

impl CategoryPatch {
    /// # Errors
    /// Returns [`CatalogError::ValidationFailed`] when a supplied field is out of bounds.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_optional_text("description", description.as_deref())?;
        }
        Ok(())
    }

    pub fn apply(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(description) = self.description {
            category.description = description;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub rating: f64,
    pub category_id: CategoryId,
    pub owner_id: UserId,
}

/// Creation input. There is no owner field: the acting user always owns the result,
/// and an `owner_id` key in a JSON body is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    pub category_id: CategoryId,
}

impl ProductCreate {
    /// # Errors
    /// Returns [`CatalogError::ValidationFailed`] when a field is out of bounds.
    pub fn validate(&self) -> Result<(), CatalogError> {
        validate_name(&self.name)?;
        validate_optional_text("description", self.description.as_deref())?;
        validate_finite("price", self.price)?;
        validate_finite("rating", self.rating)
    }

    #[must_use]
    pub fn into_product(self, owner_id: UserId) -> Product {
        Product {
            id: ProductId::new(),
            name: self.name,
            description: self.description,
            price: self.price,
            rating: self.rating,
            category_id: self.category_id,
            owner_id,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

impl ProductPatch {
    /// # Errors
    /// Returns [`CatalogError::ValidationFailed`] when a supplied field is out of bounds.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_optional_text("description", description.as_deref())?;
        }
        if let Some(price) = self.price {
            validate_finite("price", price)?;
        }
        if let Some(rating) = self.rating {
            validate_finite("rating", rating)?;
        }
        Ok(())
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = category_id;
        }
    }
}

// A key that is present maps to `Some(..)`, including an explicit `null`; an absent
// key falls back to `#[serde(default)]` and stays `None`.
fn present_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn validate_name(name: &str) -> Result<(), CatalogError> {
    if name.trim().is_empty() {
        return Err(CatalogError::validation("name MUST NOT be blank"));
    }
    validate_optional_text("name", Some(name))
}

fn validate_optional_text(field: &str, value: Option<&str>) -> Result<(), CatalogError> {
    match value {
        Some(value) if value.chars().count() > MAX_TEXT_LEN => Err(CatalogError::validation(
            format!("{field} exceeds {MAX_TEXT_LEN} characters"),
        )),
        _ => Ok(()),
    }
}

fn validate_finite(field: &str, value: f64) -> Result<(), CatalogError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CatalogError::validation(format!("{field} MUST be a finite number")))
    }
}
