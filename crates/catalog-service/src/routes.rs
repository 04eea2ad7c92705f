use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use catalog_api::Message;
use catalog_core::{
    Category, CategoryCreate, CategoryId, CategoryPatch, NewUser, Page, Pagination, Product,
    ProductCreate, ProductId, ProductPatch, User, UserId,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::ServiceError;
use crate::middleware::request_tracing_middleware;
use crate::state::ServiceState;
use crate::SERVICE_CONTRACT_VERSION;

const OPENAPI_YAML: &str = include_str!("../../../openapi/openapi.yaml");

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    service_contract_version: &'static str,
    status: &'static str,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ListQuery {
    skip: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct RecommendationQuery {
    user_id: UserId,
    skip: Option<u32>,
    limit: Option<u32>,
}

pub(crate) fn app(state: ServiceState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/openapi", get(openapi))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/", get(list_categories).post(create_category))
        .route(
            "/categories/:category_id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/products", get(list_products).post(create_product))
        .route("/products/", get(list_products).post(create_product))
        .route(
            "/products/:product_id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/recommendations", get(recommendations))
        .route("/recommendations/", get(recommendations));

    if state.environment.exposes_private_routes() {
        router = router
            .route("/private/users", post(create_user))
            .route("/private/users/", post(create_user));
    }

    router.layer(from_fn(request_tracing_middleware)).with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { service_contract_version: SERVICE_CONTRACT_VERSION, status: "ok" })
}

async fn openapi() -> impl IntoResponse {
    (StatusCode::OK, [("content-type", "application/yaml; charset=utf-8")], OPENAPI_YAML)
}

async fn list_categories(
    State(state): State<ServiceState>,
    CurrentUser(_user): CurrentUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<Category>>, ServiceError> {
    let Query(query) = query?;
    let page = state.api.list_categories(Pagination::listing(query.skip, query.limit))?;
    Ok(Json(page))
}

async fn get_category(
    State(state): State<ServiceState>,
    CurrentUser(_user): CurrentUser,
    category_id: Result<Path<CategoryId>, PathRejection>,
) -> Result<Json<Category>, ServiceError> {
    let Path(category_id) = category_id?;
    Ok(Json(state.api.get_category(category_id)?))
}

async fn create_category(
    State(state): State<ServiceState>,
    CurrentUser(_user): CurrentUser,
    input: Result<Json<CategoryCreate>, JsonRejection>,
) -> Result<Json<Category>, ServiceError> {
    let Json(input) = input?;
    Ok(Json(state.api.create_category(input)?))
}

async fn update_category(
    State(state): State<ServiceState>,
    CurrentUser(_user): CurrentUser,
    category_id: Result<Path<CategoryId>, PathRejection>,
    patch: Result<Json<CategoryPatch>, JsonRejection>,
) -> Result<Json<Category>, ServiceError> {
    let Path(category_id) = category_id?;
    let Json(patch) = patch?;
    Ok(Json(state.api.update_category(category_id, patch)?))
}

async fn delete_category(
    State(state): State<ServiceState>,
    CurrentUser(_user): CurrentUser,
    category_id: Result<Path<CategoryId>, PathRejection>,
) -> Result<Json<Message>, ServiceError> {
    let Path(category_id) = category_id?;
    Ok(Json(state.api.delete_category(category_id)?))
}

async fn list_products(
    State(state): State<ServiceState>,
    CurrentUser(user): CurrentUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<Product>>, ServiceError> {
    let Query(query) = query?;
    let page = state.api.list_products(&user, Pagination::listing(query.skip, query.limit))?;
    Ok(Json(page))
}

async fn get_product(
    State(state): State<ServiceState>,
    CurrentUser(user): CurrentUser,
    product_id: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>, ServiceError> {
    let Path(product_id) = product_id?;
    Ok(Json(state.api.get_product(&user, product_id)?))
}

async fn create_product(
    State(state): State<ServiceState>,
    CurrentUser(user): CurrentUser,
    input: Result<Json<ProductCreate>, JsonRejection>,
) -> Result<Json<Product>, ServiceError> {
    let Json(input) = input?;
    Ok(Json(state.api.create_product(&user, input)?))
}

async fn update_product(
    State(state): State<ServiceState>,
    CurrentUser(user): CurrentUser,
    product_id: Result<Path<ProductId>, PathRejection>,
    patch: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>, ServiceError> {
    let Path(product_id) = product_id?;
    let Json(patch) = patch?;
    Ok(Json(state.api.update_product(&user, product_id, patch)?))
}

async fn delete_product(
    State(state): State<ServiceState>,
    CurrentUser(user): CurrentUser,
    product_id: Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Message>, ServiceError> {
    let Path(product_id) = product_id?;
    Ok(Json(state.api.delete_product(&user, product_id)?))
}

async fn recommendations(
    State(state): State<ServiceState>,
    CurrentUser(_user): CurrentUser,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> Result<Json<Page<Product>>, ServiceError> {
    let Query(query) = query?;
    let page = Pagination::recommendations(query.skip, query.limit);
    Ok(Json(state.api.recommendations(query.user_id, page)?))
}

async fn create_user(
    State(state): State<ServiceState>,
    input: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<User>, ServiceError> {
    let Json(input) = input?;
    Ok(Json(state.api.create_user(input)?))
}
