use std::future::Future;

use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{Acquire as _, QueryBuilder};
use tracing::debug;

use crate::{ChosenDB, Error, ListingParams, Order, Pool, error::Result, utc_now};

const TABLE: &str = "sneakers";
const COLUMNS: &str = "id, name, shoe_designer, publisher, publication_year, type, cover, description, price, created_at, updated_at, created_by, updated_by";
const VALID_ORDER_FIELDS: &[&str] = &["id", "name", "publication_year", "created_at", "price"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Sneaker {
    pub id: i64,
    pub name: String,
    pub shoe_designer: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i64>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub sneaker_type: Option<String>,
    pub cover: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
}

/// Fillable attributes, used both for create and (full overwrite) update
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateSneaker {
    #[garde(length(min = 1, max = 255))]
    pub name: String,
    #[garde(length(min = 1, max = 100))]
    pub shoe_designer: String,
    #[garde(length(min = 1, max = 255))]
    #[serde(default)]
    pub publisher: Option<String>,
    #[garde(range(min = 0, max = 9999))]
    #[serde(default, deserialize_with = "deserialize_year")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<i64>))]
    pub publication_year: Option<i64>,
    #[garde(length(min = 1, max = 100))]
    #[serde(default, rename = "type")]
    pub sneaker_type: Option<String>,
    #[garde(url, length(max = 1023))]
    #[serde(default)]
    pub cover: Option<String>,
    #[garde(length(max = 10000))]
    #[serde(default)]
    pub description: Option<String>,
    #[garde(range(min = 0.0))]
    #[serde(default)]
    pub price: Option<f64>,
}

// Year comes either as number or as string like "1969"
fn deserialize_year<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Number(i64),
        Text(String),
    }

    match Option::<Year>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Year::Number(n)) => Ok(Some(n)),
        Some(Year::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Year::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid publication year: {s}"))),
    }
}

/// Conjunctive filters of the catalog listing, empty values are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SneakerFilter {
    pub search: Option<String>,
    pub sneaker_type: Option<String>,
    pub publisher: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// Same folding as SQLite LOWER(), which only knows ASCII letters
fn fold(value: &str) -> String {
    value.to_ascii_lowercase()
}

impl SneakerFilter {
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sneaker_type(mut self, sneaker_type: impl Into<String>) -> Self {
        self.sneaker_type = Some(sneaker_type.into());
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Matching in memory, same semantics as the SQL predicate
    pub fn matches(&self, sneaker: &Sneaker) -> bool {
        let contains = |field: &str, needle: &str| fold(field).contains(&fold(needle));
        non_empty(&self.search).is_none_or(|s| contains(&sneaker.name, s))
            && non_empty(&self.sneaker_type).is_none_or(|t| {
                sneaker
                    .sneaker_type
                    .as_deref()
                    .is_some_and(|v| fold(v) == fold(t))
            })
            && non_empty(&self.publisher).is_none_or(|p| {
                sneaker
                    .publisher
                    .as_deref()
                    .is_some_and(|v| contains(v, p))
            })
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, ChosenDB>) {
        qb.push(" WHERE deleted_at IS NULL");
        if let Some(search) = non_empty(&self.search) {
            qb.push(" AND instr(LOWER(name), LOWER(")
                .push_bind(search.to_string())
                .push(")) > 0");
        }
        if let Some(sneaker_type) = non_empty(&self.sneaker_type) {
            qb.push(" AND LOWER(type) = LOWER(")
                .push_bind(sneaker_type.to_string())
                .push(")");
        }
        if let Some(publisher) = non_empty(&self.publisher) {
            qb.push(" AND instr(LOWER(publisher), LOWER(")
                .push_bind(publisher.to_string())
                .push(")) > 0");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    LatestPublication,
    LatestAdded,
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl SortBy {
    /// Unknown values fall back to latest publication
    pub fn from_param(value: &str) -> Self {
        match value {
            "latest_added" => SortBy::LatestAdded,
            "title_asc" => SortBy::NameAsc,
            "title_desc" => SortBy::NameDesc,
            "price_asc" => SortBy::PriceAsc,
            "price_desc" => SortBy::PriceDesc,
            _ => SortBy::LatestPublication,
        }
    }

    pub fn order(self) -> Order {
        match self {
            SortBy::LatestPublication => Order::Desc("publication_year".into()),
            SortBy::LatestAdded => Order::Desc("created_at".into()),
            SortBy::NameAsc => Order::Asc("name".into()),
            SortBy::NameDesc => Order::Desc("name".into()),
            SortBy::PriceAsc => Order::Asc("price".into()),
            SortBy::PriceDesc => Order::Desc("price".into()),
        }
    }
}

/// Read side of the record store used by catalog listing
pub trait CatalogStore {
    fn count(&self, filter: &SneakerFilter) -> impl Future<Output = Result<u64>> + Send;

    fn fetch(
        &self,
        filter: &SneakerFilter,
        params: ListingParams,
    ) -> impl Future<Output = Result<Vec<Sneaker>>> + Send;
}

pub type SneakerRepository = SneakerRepositoryImpl<Pool>;

pub struct SneakerRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> SneakerRepositoryImpl<E>
where
    for<'a> &'a E:
        sqlx::Executor<'c, Database = ChosenDB> + sqlx::Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn count(&self, filter: &SneakerFilter) -> Result<u64> {
        let mut qb = QueryBuilder::new(format!("SELECT count(*) FROM {TABLE}"));
        filter.push_where(&mut qb);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.executor).await?;
        Ok(count as u64)
    }

    pub async fn list(
        &self,
        filter: &SneakerFilter,
        params: ListingParams,
    ) -> Result<Vec<Sneaker>> {
        let ordering = params.ordering(VALID_ORDER_FIELDS)?;
        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM {TABLE}"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY ");
        if !ordering.is_empty() {
            qb.push(ordering).push(", ");
        }
        qb.push("id");
        match params.limit {
            Some(limit) => {
                qb.push(" LIMIT ").push_bind(limit);
            }
            // sqlite cannot have OFFSET without LIMIT
            None if params.offset > 0 => {
                qb.push(" LIMIT -1");
            }
            None => {}
        }
        if params.limit.is_some() || params.offset > 0 {
            qb.push(" OFFSET ").push_bind(params.offset);
        }
        let records = qb
            .build_query_as::<Sneaker>()
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }

    pub async fn create(&self, payload: CreateSneaker, created_by: i64) -> Result<Sneaker> {
        let now = utc_now();
        let result = sqlx::query(
            "INSERT INTO sneakers (name, shoe_designer, publisher, publication_year, type, cover, description, price, created_at, updated_at, created_by, updated_by) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.name)
        .bind(&payload.shoe_designer)
        .bind(&payload.publisher)
        .bind(payload.publication_year)
        .bind(&payload.sneaker_type)
        .bind(&payload.cover)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(now)
        .bind(now)
        .bind(created_by)
        .bind(created_by)
        .execute(&self.executor)
        .await
        .map_err(|e| Error::on_unique_violation(e, || Error::DuplicateName(payload.name.clone())))?;

        let id = result.last_insert_rowid();
        debug!("Created sneaker {id}");
        self.get(id).await
    }

    pub async fn update(
        &self,
        id: i64,
        payload: CreateSneaker,
        updated_by: i64,
    ) -> Result<Sneaker> {
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin().await?;
        let result = sqlx::query(
            "UPDATE sneakers SET name = ?, shoe_designer = ?, publisher = ?, publication_year = ?, type = ?, cover = ?, description = ?, price = ?, updated_at = ?, updated_by = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&payload.name)
        .bind(&payload.shoe_designer)
        .bind(&payload.publisher)
        .bind(payload.publication_year)
        .bind(&payload.sneaker_type)
        .bind(&payload.cover)
        .bind(&payload.description)
        .bind(payload.price)
        .bind(utc_now())
        .bind(updated_by)
        .bind(id)
        .execute(&mut *transaction)
        .await
        .map_err(|e| Error::on_unique_violation(e, || Error::DuplicateName(payload.name.clone())))?;

        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound("Sneaker".to_string()))
        } else {
            let record = get(id, &mut *transaction).await?;
            transaction.commit().await?;
            Ok(record)
        }
    }

    /// Marks record as deleted, row stays in the table
    pub async fn soft_delete(&self, id: i64, deleted_by: i64) -> Result<()> {
        let now = utc_now();
        let res = sqlx::query(
            "UPDATE sneakers SET deleted_at = ?, updated_at = ?, updated_by = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(deleted_by)
        .bind(id)
        .execute(&self.executor)
        .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Sneaker".to_string()))
        } else {
            debug!("Soft deleted sneaker {id}");
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Sneaker> {
        get(id, &self.executor).await
    }
}

async fn get<'c, E>(id: i64, executor: E) -> Result<Sneaker>
where
    E: sqlx::Executor<'c, Database = ChosenDB>,
{
    sqlx::query_as::<_, Sneaker>(&format!(
        "SELECT {COLUMNS} FROM {TABLE} WHERE id = ? AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| Error::RecordNotFound("Sneaker".to_string()))
}

impl CatalogStore for SneakerRepository {
    fn count(&self, filter: &SneakerFilter) -> impl Future<Output = Result<u64>> + Send {
        SneakerRepositoryImpl::count(self, filter)
    }

    fn fetch(
        &self,
        filter: &SneakerFilter,
        params: ListingParams,
    ) -> impl Future<Output = Result<Vec<Sneaker>>> + Send {
        self.list(filter, params)
    }
}
