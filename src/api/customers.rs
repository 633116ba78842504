//! `/api/customers` endpoints

use crate::api::common::{hash_password, paginate, require_id, require_text, PageQuery};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::routes::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{is_valid_email, Customer};
use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

const MIN_PASSWORD_LEN: usize = 6;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

fn validate_contact(customer: &Customer) -> ApiResult<()> {
    require_text(&customer.name, "Customer name is required")?;
    require_text(&customer.email, "Customer email is required")?;
    if !is_valid_email(customer.email.trim()) {
        return Err(ApiError::validation("Invalid email format"));
    }
    Ok(())
}

fn validate_password(password: Option<&str>) -> ApiResult<()> {
    match password {
        Some(p) if p.chars().count() >= MIN_PASSWORD_LEN => Ok(()),
        _ => Err(ApiError::validation(
            "Password must be at least 6 characters",
        )),
    }
}

fn load_customer(state: &AppState, id: i64) -> ApiResult<Customer> {
    require_id(id, "customer")?;
    state
        .db
        .get_customer(id)?
        .ok_or_else(|| ApiError::not_found("Customer not found"))
}

async fn list_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Value>> {
    let customers = state.db.list_customers(query.search())?;
    paginate("customers", customers, &query)
}

async fn create_customer(
    State(state): State<AppState>,
    ApiJson(mut customer): ApiJson<Customer>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    validate_contact(&customer)?;
    validate_password(customer.password.as_deref())?;

    if let Some(password) = customer.password.take() {
        customer.password = Some(hash_password(state.hasher.clone(), password).await?);
    }
    let stored = state.db.insert_customer(&customer)?;
    info!(customer_id = stored.id, "Customer added");

    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Customer added successfully", "customer": stored})),
    ))
}

async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    let customer = load_customer(&state, id)?;
    Ok(Json(json!({ "customer": customer })))
}

/// Password is optional here; an absent one keeps the stored credential
async fn update_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(mut customer): ApiJson<Customer>,
) -> ApiResult<Json<Value>> {
    load_customer(&state, id)?;
    validate_contact(&customer)?;

    customer.password = match customer.password.take().filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(Some(&password))?;
            Some(hash_password(state.hasher.clone(), password).await?)
        }
        None => None,
    };

    if !state.db.update_customer(id, &customer)? {
        return Err(ApiError::not_found("Customer not found"));
    }
    let updated = load_customer(&state, id)?;

    Ok(Json(json!({"message": "Customer updated successfully", "customer": updated})))
}

async fn delete_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    load_customer(&state, id)?;
    state.db.delete_customer(id)?;

    Ok(Json(json!({"message": "Customer deleted successfully"})))
}
