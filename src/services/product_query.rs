use serde::{Deserialize, Serialize};

use crate::database::models::product::{ProductStatus, ProductVisibility, PRODUCTS_TABLE};
use crate::filter::filter_order::FilterOrder;
use crate::filter::{Filter, FilterError, FilterOp, Predicate, SortDirection};
use crate::validation::ValidationErrors;

/// Columns a list request may sort by.
pub const SORTABLE_COLUMNS: &[&str] = &["created_at", "updated_at", "title", "price"];

/// Columns covered by free-text search.
pub const SEARCH_COLUMNS: &[&str] = &["title", "description", "category", "sku"];

/// Raw list query string. Everything arrives as text so that bad values become
/// field errors instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub low_stock_only: Option<String>,
}

/// Validated and defaulted list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    pub visibility: Option<ProductVisibility>,
    pub search: Option<String>,
    pub sort_by: &'static str,
    pub sort_order: SortDirection,
    pub low_stock_only: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i = i64::from(limit.max(1));
        Self { page, limit, total, total_pages: (total + limit_i - 1) / limit_i }
    }
}

impl ProductQuery {
    pub fn parse(params: ProductListParams, limits: PageLimits) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let page = match params.page.as_deref() {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<u32>() {
                Ok(p) if p >= 1 => p,
                _ => {
                    errors.add("page", "Must be a positive integer");
                    1
                }
            },
        };

        let limit = match params.limit.as_deref() {
            None | Some("") => limits.default_page_size,
            Some(raw) => match raw.parse::<u32>() {
                Ok(l) if (1..=limits.max_page_size).contains(&l) => l,
                _ => {
                    errors.add("limit", format!("Must be between 1 and {}", limits.max_page_size));
                    limits.default_page_size
                }
            },
        };

        let status = parse_enum(&mut errors, "status", params.status.as_deref());
        let visibility = parse_enum(&mut errors, "visibility", params.visibility.as_deref());

        let sort_by = match params.sort_by.as_deref() {
            None | Some("") => SORTABLE_COLUMNS[0],
            Some(raw) => match SORTABLE_COLUMNS.iter().find(|c| **c == raw) {
                Some(column) => *column,
                None => {
                    errors.add("sort_by", format!("Must be one of: {}", SORTABLE_COLUMNS.join(", ")));
                    SORTABLE_COLUMNS[0]
                }
            },
        };

        let sort_order = match params.sort_order.as_deref() {
            None | Some("") => SortDirection::Desc,
            Some(raw) => FilterOrder::parse_direction(raw).unwrap_or_else(|| {
                errors.add("sort_order", "Must be 'asc' or 'desc'");
                SortDirection::Desc
            }),
        };

        let low_stock_only = match params.low_stock_only.as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(_) => {
                errors.add("low_stock_only", "Must be a boolean");
                false
            }
        };

        errors.into_result(Self {
            page,
            limit,
            category: non_empty(params.category),
            status,
            visibility,
            search: non_empty(params.search),
            sort_by,
            sort_order,
            low_stock_only,
        })
    }

    /// Anonymous callers only ever see active, visible products.
    pub fn restrict_to_public(&mut self) {
        self.status = Some(ProductStatus::Active);
        self.visibility = Some(ProductVisibility::Visible);
    }

    /// Conditions and ordering, without the page window.
    pub fn to_filter(&self) -> Result<Filter, FilterError> {
        let mut filter = Filter::new(PRODUCTS_TABLE)?;

        if let Some(category) = &self.category {
            filter = filter.where_eq("category", category.as_str());
        }
        if let Some(status) = self.status {
            filter = filter.where_eq("status", status.as_str());
        }
        if let Some(visibility) = self.visibility {
            filter = filter.where_eq("visibility", visibility.as_str());
        }
        if let Some(search) = &self.search {
            filter = filter.where_any(
                SEARCH_COLUMNS
                    .iter()
                    .map(|column| Predicate::contains(*column, search).into())
                    .collect(),
            );
        }
        if self.low_stock_only {
            filter = filter
                .where_eq("track_inventory", true)
                .where_clause(Predicate::columns("inventory_quantity", FilterOp::Lte, "low_stock_threshold"));
        }

        Ok(filter.order(self.sort_by, self.sort_order))
    }
}

fn parse_enum<T: std::str::FromStr>(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> Option<T> {
    match raw {
        None | Some("") => None,
        Some(raw) => match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                errors.add(field, format!("Invalid {} '{}'", field, raw));
                None
            }
        },
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
