//! Helpers shared by the resource handlers: paging, id checks, password hashing

use crate::auth::PasswordHasher;
use crate::error::{ApiError, ApiResult};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: i64 = 10;

/// `?page=&size=&search=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub search: Option<String>,
}

impl PageQuery {
    /// Trimmed search text, `None` when blank
    pub fn search(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn bounds(&self) -> ApiResult<(i64, i64)> {
        let page = self.page.unwrap_or(0);
        let size = self.size.unwrap_or(DEFAULT_PAGE_SIZE);

        if page < 0 {
            return Err(ApiError::validation("Page must not be negative"));
        }
        if size < 1 {
            return Err(ApiError::validation("Page size must be at least 1"));
        }
        Ok((page, size))
    }
}

/// Offset/limit slice of an already materialized list.
///
/// Response: `{<key>: [...], totalElements, totalPages, currentPage, size}`.
/// A page past the end is empty.
pub fn paginate<T: Serialize>(key: &str, items: Vec<T>, query: &PageQuery) -> ApiResult<Json<Value>> {
    let (page, size) = query.bounds()?;
    let total = items.len() as i64;
    let total_pages = total / size + i64::from(total % size != 0);

    let start = page.saturating_mul(size).min(total) as usize;
    let slice: Vec<T> = items.into_iter().skip(start).take(size as usize).collect();

    let mut body = json!({
        "totalElements": total,
        "totalPages": total_pages,
        "currentPage": page,
        "size": size,
    });
    body[key] = serde_json::to_value(slice).map_err(anyhow::Error::from)?;

    Ok(Json(body))
}

/// `{<key>: [...], totalElements}` for unpaged sub-collections
pub fn listing<T: Serialize>(key: &str, items: Vec<T>) -> ApiResult<Json<Value>> {
    let mut body = json!({ "totalElements": items.len() });
    body[key] = serde_json::to_value(items).map_err(anyhow::Error::from)?;
    Ok(Json(body))
}

/// Ids are positive; anything else is "Invalid <entity> ID"
pub fn require_id(id: i64, entity: &str) -> ApiResult<()> {
    if id <= 0 {
        return Err(ApiError::validation(format!("Invalid {} ID", entity)));
    }
    Ok(())
}

/// Non-blank text field
pub fn require_text(value: &str, message: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(message));
    }
    Ok(())
}

/// Hash on the blocking pool
pub async fn hash_password(hasher: Arc<dyn PasswordHasher>, password: String) -> ApiResult<String> {
    let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| anyhow::anyhow!("hash task failed: {}", e))??;
    Ok(hashed)
}
