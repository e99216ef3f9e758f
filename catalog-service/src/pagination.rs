use serde::Deserialize;

use crate::api_error::ApiError;

pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// 1-based `page` query parameter to a LIMIT/OFFSET offset. Out-of-range
/// pages are valid and return empty lists; zero or negative pages are not.
pub fn offset_for(page: Option<i64>) -> Result<i64, ApiError> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(ApiError::validation("page must be a positive integer"));
    }
    Ok((page - 1) * PAGE_SIZE)
}
