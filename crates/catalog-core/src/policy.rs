use crate::{Product, User, UserId};

/// Resources carrying an owning user.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

impl Owned for Product {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

/// Superusers may touch anything; everyone else only what they own.
#[must_use]
pub fn can_modify(user: &User, resource: &impl Owned) -> bool {
    user.is_superuser || resource.owner_id() == user.id
}
