pub mod error;
pub mod sneaker;
pub mod user;

use std::{fmt::Display, str::FromStr as _};

pub use error::Error;
pub use sqlx::Error as SqlxError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::error::Result;

pub type ChosenDB = sqlx::Sqlite;
pub type Pool = sqlx::Pool<ChosenDB>;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

/// Opens database (creating file if needed) and brings schema up to date
pub async fn new_pool(database_url: &str) -> Result<Pool, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(50)
        .connect_with(options)
        .await?;
    MIGRATOR.run(&pool).await?;
    debug!("Database {database_url} ready");
    Ok(pool)
}

pub(crate) fn utc_now() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Order {
    Asc(String),
    Desc(String),
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Asc(s) => write!(f, "{}", s),
            Order::Desc(s) => write!(f, "{} DESC", s),
        }
    }
}

impl AsRef<str> for Order {
    fn as_ref(&self) -> &str {
        match self {
            Order::Asc(s) => s.as_str(),
            Order::Desc(s) => s.as_str(),
        }
    }
}

/// Window into a listing, `limit` `None` means no limit at all
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingParams {
    pub offset: i64,
    pub limit: Option<i64>,
    pub order: Option<Vec<Order>>,
}

impl ListingParams {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit: Some(limit),
            order: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_order(mut self, order: Vec<Order>) -> Self {
        self.order = Some(order);
        self
    }

    pub fn ordering(&self, valid_fields: &[&str]) -> Result<String> {
        let ordering = self
            .order
            .as_ref()
            .map(|o| {
                o.iter()
                    .map(|o| {
                        if valid_fields.contains(&o.as_ref()) {
                            Ok(o.to_string())
                        } else {
                            Err(Error::InvalidOrderByField(o.as_ref().to_string()))
                        }
                    })
                    .collect::<Result<Vec<String>>>()
                    .map(|o| o.join(", "))
            })
            .transpose()?
            .unwrap_or_default();
        Ok(ordering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let params = ListingParams::new(0, 10).with_order(vec![
            Order::Desc("price".into()),
            Order::Asc("name".into()),
        ]);
        let ordering = params.ordering(&["name", "price"]).unwrap();
        assert_eq!(ordering, "price DESC, name");

        assert_eq!(ListingParams::unbounded().ordering(&["name"]).unwrap(), "");
    }

    #[test]
    fn test_invalid_ordering_field() {
        let params =
            ListingParams::unbounded().with_order(vec![Order::Asc("name; DROP TABLE x".into())]);
        let res = params.ordering(&["name"]);
        assert!(matches!(res, Err(Error::InvalidOrderByField(_))));
    }
}
