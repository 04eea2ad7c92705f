use catalog_api::CatalogApi;

use crate::config::Environment;

#[derive(Debug, Clone)]
pub struct ServiceState {
    pub api: CatalogApi,
    pub environment: Environment,
}

impl ServiceState {
    #[must_use]
    pub fn new(api: CatalogApi, environment: Environment) -> Self {
        Self { api, environment }
    }
}
