use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::Product;

/// Default number of products per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Numeric base price, NULL when the document holds a non-number
const PRICE_EXPR: &str =
    "(CASE WHEN jsonb_typeof(doc->'basePrice') = 'number' THEN (doc->>'basePrice')::float8 END)";

/// SQL query builder for the JSONB `products` table
/// Builds a single parameterized query with filters, sorting, and pagination
pub struct ProductQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: String,
    limit: u32,
    offset: u32,
}

impl ProductQueryBuilder {
    pub fn new() -> Self {
        Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: "id ASC".to_string(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }

    /// Builder pre-populated from a validated filter and page
    pub fn from_filter(filter: &ProductFilter, page: &PageRequest) -> Self {
        let mut builder = Self::new();
        if let Some(ref search) = filter.search {
            builder.add_search_filter(search);
        }
        if let Some(ref category) = filter.category {
            builder.add_category_filter(category);
        }
        builder.add_price_range(filter.min_price, filter.max_price);
        if let Some(field) = filter.sort_field {
            builder.set_sort(field, filter.sort_order);
        }
        builder.set_pagination(page.page, page.limit);
        builder
    }

    /// Partial, case-insensitive match on the product name
    pub fn add_search_filter(&mut self, search: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("doc->>'name' ILIKE ${} ESCAPE '\\'", param_index));
        self.params.push(format!("%{}%", escape_like(search)));
    }

    /// Case-insensitive exact match on the category
    pub fn add_category_filter(&mut self, category: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("doc->>'category' ILIKE ${} ESCAPE '\\'", param_index));
        self.params.push(escape_like(category));
    }

    /// Inclusive bounds on the commission-free base price
    pub fn add_price_range(&mut self, min: Option<f64>, max: Option<f64>) {
        if let Some(min_price) = min {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("{} >= ${}::float8", PRICE_EXPR, param_index));
            self.params.push(min_price.to_string());
        }

        if let Some(max_price) = max {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("{} <= ${}::float8", PRICE_EXPR, param_index));
            self.params.push(max_price.to_string());
        }
    }

    /// Sort on a document field; `id` breaks ties so pages stay stable
    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        let field_expr = match field {
            SortField::Name => "doc->>'name'",
            SortField::Price => PRICE_EXPR,
        };

        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        self.order_clause = format!("{} {}, id ASC", field_expr, order_str);
    }

    /// LIMIT/OFFSET from a 1-indexed page number
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = page.saturating_sub(1).saturating_mul(limit);
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Returns (query, params) selecting one page of documents
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = String::from("SELECT doc FROM products");
        query.push_str(&self.where_sql());
        query.push_str(" ORDER BY ");
        query.push_str(&self.order_clause);

        // LIMIT/OFFSET are integers validated upstream, not bound parameters
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }

    /// Returns (query, params) counting every matching document
    pub fn build_count(&self) -> (String, Vec<String>) {
        let mut query = String::from("SELECT COUNT(*) FROM products");
        query.push_str(&self.where_sql());
        (query, self.params.clone())
    }
}

/// Make user text match literally inside a LIKE pattern
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Default for ProductQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters for GET /api/products
/// All fields are optional to support flexible querying
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductListParams {
    /// Client whose consultant tier applies
    pub client_id: Option<String>,
    /// Agent whose commission applies
    pub agent_id: Option<String>,
    /// Partial, case-insensitive name match
    pub search: Option<String>,
    /// Case-insensitive category match
    pub category: Option<String>,
    /// Minimum base price (inclusive)
    pub min_price: Option<f64>,
    /// Maximum base price (inclusive)
    pub max_price: Option<f64>,
    /// "name" or "price"
    pub sort: Option<String>,
    /// "asc" or "desc"
    pub order: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page
    pub limit: Option<u32>,
}

/// Sort field options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Validated product filter shared by both storage backends
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
}

impl ProductFilter {
    /// In-memory evaluation with the same semantics as the SQL builder
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ref search) = self.search {
            if !product.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(ref category) = self.category {
            if product.category.to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.base_price.is_nan() || product.base_price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.base_price.is_nan() || product.base_price > max {
                return false;
            }
        }
        true
    }
}

/// Validated 1-indexed page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Validation error type
#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates and normalizes listing parameters
    ///
    /// `max_page_size` caps `limit`; larger values are rejected rather than
    /// silently truncated.
    pub fn validate(
        params: &ProductListParams,
        max_page_size: u32,
    ) -> Result<(ProductFilter, PageRequest), ValidationError> {
        let search = Self::normalize_string(params.search.clone());
        let category = Self::normalize_string(params.category.clone());

        let min_price = match params.min_price {
            Some(price) => {
                Self::validate_price(price, "minPrice")?;
                Some(price)
            }
            None => None,
        };
        let max_price = match params.max_price {
            Some(price) => {
                Self::validate_price(price, "maxPrice")?;
                Some(price)
            }
            None => None,
        };

        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ValidationError {
                    message: "minPrice cannot be greater than maxPrice".to_string(),
                });
            }
        }

        let sort_field = match params.sort.as_deref() {
            Some(s) => Some(Self::parse_sort_field(s)?),
            None => None,
        };
        let sort_order = match params.order.as_deref() {
            Some(s) => Self::parse_sort_order(s)?,
            None => SortOrder::Asc,
        };

        let page = match params.page {
            Some(p) => {
                Self::validate_pagination_param(p, "page")?;
                p
            }
            None => 1,
        };
        let limit = match params.limit {
            Some(l) => {
                Self::validate_pagination_param(l, "limit")?;
                if l > max_page_size {
                    return Err(ValidationError {
                        message: format!("limit must not exceed {}", max_page_size),
                    });
                }
                l
            }
            None => DEFAULT_PAGE_SIZE.min(max_page_size),
        };

        Ok((
            ProductFilter {
                search,
                category,
                min_price,
                max_price,
                sort_field,
                sort_order,
            },
            PageRequest { page, limit },
        ))
    }

    /// Trims whitespace; None if the string is empty or whitespace-only
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    /// Price bounds must be finite and non-negative
    fn validate_price(price: f64, param_name: &str) -> Result<(), ValidationError> {
        if price.is_nan() || price.is_infinite() {
            return Err(ValidationError {
                message: format!("{} must be a valid number", param_name),
            });
        }
        if price < 0.0 {
            return Err(ValidationError {
                message: format!("{} must not be negative", param_name),
            });
        }
        Ok(())
    }

    fn parse_sort_field(s: &str) -> Result<SortField, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            _ => Err(ValidationError {
                message: format!("Invalid sort field '{}'. Must be 'name' or 'price'", s),
            }),
        }
    }

    fn parse_sort_order(s: &str) -> Result<SortOrder, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError {
                message: format!("Invalid sort order '{}'. Must be 'asc' or 'desc'", s),
            }),
        }
    }

    fn validate_pagination_param(value: u32, param_name: &str) -> Result<(), ValidationError> {
        if value == 0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number (greater than 0)", param_name),
            });
        }
        Ok(())
    }
}
