use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 15)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 4)]
    pub total_pages: u64,
}

/// Highest page number honoured; larger requests resolve to it. Keeps the
/// row offset well inside `i64` for any page size.
pub const MAX_PAGE: u64 = 1_000_000;

/// Query parameters shared by paginated list endpoints.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageQuery {
    /// Page number, 1-based. Defaults to 1.
    pub page: Option<u64>,
    /// Items per page, 1-100. Defaults to the configured catalog page size.
    pub per_page: Option<u64>,
}

impl PageQuery {
    /// Resolve to a concrete `(page, per_page)` pair.
    pub fn resolve(&self, default_per_page: u64) -> (u64, u64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.per_page.unwrap_or(default_per_page).clamp(1, 100);
        (page, per_page)
    }

    /// Rows to skip for a resolved `(page, per_page)` pair.
    pub fn offset(page: u64, per_page: u64) -> u64 {
        page.saturating_sub(1).saturating_mul(per_page)
    }
}

/// Flash-style confirmation returned by mutations without a body.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Product deleted successfully.")]
    pub message: String,
}

/// Field-level validation messages, keyed by form field name.
///
/// Serializes as `{ "price": ["..."], "gallery_images.1": ["..."] }`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}
