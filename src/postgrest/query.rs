//! Query builders for PostgrestClient

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;
use crate::fetch::{Fetch, FetchBuilder};
use crate::postgrest::filter::{escape_like, FilterOperator, QueryParams};

/// Endpoint and credentials shared by every builder of one relation
#[derive(Clone)]
pub(crate) struct Target {
    pub url: String,
    pub key: String,
    pub token: Option<String>,
    pub schema: String,
    pub client: Client,
}

impl Target {
    fn prepare<'a>(&self, fetch: FetchBuilder<'a>, params: &QueryParams) -> FetchBuilder<'a> {
        let fetch = fetch
            .header("apikey", &self.key)
            .header("Accept-Profile", &self.schema)
            .header("Content-Profile", &self.schema)
            .bearer_auth(self.token.as_deref().unwrap_or(&self.key));
        fetch.query(params.as_slice())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

macro_rules! filter_methods {
    () => {
        /// Filter rows where column equals a value
        pub fn eq<V: ToString>(mut self, column: &str, value: V) -> Self {
            self.params
                .filter(column, FilterOperator::Eq, &value.to_string());
            self
        }

        /// Filter rows where column matches a pattern (case insensitive)
        pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
            self.params.filter(column, FilterOperator::ILike, pattern);
            self
        }

        /// Filter rows where column equals `value` ignoring case. `%`, `_`
        /// and `\` are escaped, but the server still reads `*` as a
        /// wildcard, so callers must compare the returned values.
        pub fn eq_ignore_case(self, column: &str, value: &str) -> Self {
            let pattern = escape_like(value);
            self.ilike(column, &pattern)
        }
    };
}

/// Builder for SELECT queries
pub struct SelectBuilder {
    target: Target,
    params: QueryParams,
}

impl SelectBuilder {
    pub(crate) fn new(target: Target, columns: &str) -> Self {
        let mut params = QueryParams::new();
        params.set("select", columns);
        Self { target, params }
    }

    filter_methods!();

    /// Order the results by a column
    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.params
            .set("order", &format!("{}.{}", column, order.as_str()));
        self
    }

    /// Limit the number of rows returned
    pub fn limit(mut self, count: u32) -> Self {
        self.params.set("limit", &count.to_string());
        self
    }

    /// Execute the query and return the results
    pub async fn execute<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        let fetch = self
            .target
            .prepare(Fetch::get(&self.target.client, &self.target.url), &self.params);
        fetch.execute::<Vec<T>>().await
    }

    /// Execute the query and return the first row
    pub async fn execute_one<T: DeserializeOwned>(self) -> Result<Option<T>, Error> {
        let results = self.limit(1).execute::<T>().await?;
        Ok(results.into_iter().next())
    }
}

/// Builder for INSERT queries
pub struct InsertBuilder<T: Serialize> {
    target: Target,
    values: T,
}

impl<T: Serialize> InsertBuilder<T> {
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self { target, values }
    }

    /// Execute the insert and return the inserted rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        let fetch = self
            .target
            .prepare(
                Fetch::post(&self.target.client, &self.target.url),
                &QueryParams::new(),
            )
            .header("Prefer", "return=representation")
            .json(&self.values)?;
        fetch.execute::<Vec<R>>().await
    }

    /// Execute the insert without returning the inserted data
    pub async fn execute_no_return(&self) -> Result<(), Error> {
        let fetch = self
            .target
            .prepare(
                Fetch::post(&self.target.client, &self.target.url),
                &QueryParams::new(),
            )
            .header("Prefer", "return=minimal")
            .json(&self.values)?;
        fetch.execute_no_content().await
    }
}

/// Builder for UPDATE queries
pub struct UpdateBuilder<T: Serialize> {
    target: Target,
    values: T,
    params: QueryParams,
}

impl<T: Serialize> UpdateBuilder<T> {
    pub(crate) fn new(target: Target, values: T) -> Self {
        Self {
            target,
            values,
            params: QueryParams::new(),
        }
    }

    filter_methods!();

    /// Execute the update and return the updated rows
    pub async fn execute<R: DeserializeOwned>(&self) -> Result<Vec<R>, Error> {
        if !self.params.has_filters() {
            return Err(Error::database("refusing to update without a filter"));
        }
        let fetch = self
            .target
            .prepare(
                Fetch::patch(&self.target.client, &self.target.url),
                &self.params,
            )
            .header("Prefer", "return=representation")
            .json(&self.values)?;
        fetch.execute::<Vec<R>>().await
    }
}

/// Builder for DELETE queries
pub struct DeleteBuilder {
    target: Target,
    params: QueryParams,
}

impl DeleteBuilder {
    pub(crate) fn new(target: Target) -> Self {
        Self {
            target,
            params: QueryParams::new(),
        }
    }

    filter_methods!();

    /// Execute the delete without returning the deleted rows
    pub async fn execute(&self) -> Result<(), Error> {
        if !self.params.has_filters() {
            return Err(Error::database("refusing to delete without a filter"));
        }
        let fetch = self
            .target
            .prepare(
                Fetch::delete(&self.target.client, &self.target.url),
                &self.params,
            )
            .header("Prefer", "return=minimal");
        fetch.execute_no_content().await
    }
}
