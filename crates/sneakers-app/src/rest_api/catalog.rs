//! Catalog listing: turns raw query parameters into filtered, sorted and
//! paginated page of sneakers together with the counts describing the page.
//!
//! Recognized parameters are `_page`, `_limit`, `_search`, `_type`,
//! `_publisher` and `_sort_by`, anything else is just echoed back in `filter`.
//! `_limit=0` means no limit, whole filtered set is returned.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use sneakers_dal::{
    sneaker::{CatalogStore, Sneaker, SneakerFilter, SortBy},
    ListingParams,
};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

pub const PAGE_PARAM: &str = "_page";
pub const LIMIT_PARAM: &str = "_limit";
pub const SEARCH_PARAM: &str = "_search";
pub const TYPE_PARAM: &str = "_type";
pub const PUBLISHER_PARAM: &str = "_publisher";
pub const SORT_PARAM: &str = "_sort_by";

pub const DEFAULT_LIMIT: u32 = 1000;

/// Parsed listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: i64,
    /// 0 is unbounded
    pub limit: i64,
    pub filter: SneakerFilter,
    pub sort: Option<SortBy>,
}

fn parse_count(params: &BTreeMap<String, String>, name: &str) -> ApiResult<Option<i64>> {
    match params.get(name).map(|v| v.trim()) {
        None | Some("") => Ok(None),
        Some(value) => {
            let n: i64 = value
                .parse()
                .map_err(|e| ApiError::InvalidData(format!("{name} '{value}': {e}")))?;
            if n < 0 {
                Err(ApiError::InvalidData(format!(
                    "{name} must not be negative, got {n}"
                )))
            } else {
                Ok(Some(n))
            }
        }
    }
}

fn text_param(params: &BTreeMap<String, String>, name: &str) -> Option<String> {
    params.get(name).filter(|v| !v.is_empty()).cloned()
}

impl ListQuery {
    pub fn parse(params: &BTreeMap<String, String>, default_limit: u32) -> ApiResult<Self> {
        let page = match parse_count(params, PAGE_PARAM)? {
            None | Some(0) => 1,
            Some(page) => page,
        };
        let limit = parse_count(params, LIMIT_PARAM)?.unwrap_or(default_limit.into());

        let query = ListQuery {
            page,
            limit,
            filter: SneakerFilter {
                search: text_param(params, SEARCH_PARAM),
                sneaker_type: text_param(params, TYPE_PARAM),
                publisher: text_param(params, PUBLISHER_PARAM),
            },
            sort: text_param(params, SORT_PARAM).map(|s| SortBy::from_param(&s)),
        };
        // make sure offset is representable
        query.checked_offset()?;
        Ok(query)
    }

    fn checked_offset(&self) -> ApiResult<i64> {
        (self.page - 1)
            .checked_mul(self.limit)
            .ok_or_else(|| ApiError::InvalidData(format!("{PAGE_PARAM} {} is too big", self.page)))
    }

    /// Number of records skipped before this page
    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MAX)
    }

    pub fn listing_params(&self) -> ListingParams {
        let params = if self.limit == 0 {
            ListingParams::unbounded()
        } else {
            ListingParams::new(self.offset(), self.limit)
        };
        match self.sort {
            Some(sort) => params.with_order(vec![sort.order()]),
            None => params,
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CatalogPage {
    /// Received query parameters with effective `_page` and `_limit`
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub filter: Map<String, Value>,
    pub products: Vec<Sneaker>,
    pub products_count_total: u64,
    pub products_count_start: u64,
    pub products_count_end: u64,
}

pub struct CatalogQueryBuilder<'a, S> {
    store: &'a S,
    default_limit: u32,
}

impl<'a, S> CatalogQueryBuilder<'a, S>
where
    S: CatalogStore,
{
    pub fn new(store: &'a S, default_limit: u32) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    pub async fn run(&self, params: BTreeMap<String, String>) -> ApiResult<CatalogPage> {
        let query = ListQuery::parse(&params, self.default_limit)?;
        debug!("Catalog query {query:?}");

        let total = self.store.count(&query.filter).await?;
        let products = self
            .store
            .fetch(&query.filter, query.listing_params())
            .await?;

        let offset: u64 = if query.limit == 0 {
            0
        } else {
            query.offset() as u64
        };
        let (start, end) = if total == 0 {
            (0, 0)
        } else {
            (offset + 1, offset + products.len() as u64)
        };

        let mut filter: Map<String, Value> = params
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        filter.insert(PAGE_PARAM.to_string(), query.page.into());
        filter.insert(LIMIT_PARAM.to_string(), query.limit.into());

        Ok(CatalogPage {
            filter,
            products,
            products_count_total: total,
            products_count_start: start,
            products_count_end: end,
        })
    }
}
