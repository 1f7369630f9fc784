//! Database operations through the PostgREST API

mod filter;
mod query;

use reqwest::Client;
use serde::Serialize;

pub use filter::*;
pub use query::*;

/// Client for one table or view
#[derive(Clone)]
pub struct PostgrestClient {
    target: Target,
}

impl PostgrestClient {
    /// Create a new PostgrestClient for `table` under `{url}/rest/v1`
    pub fn new(url: &str, key: &str, table: &str, client: Client) -> Self {
        Self {
            target: Target {
                url: format!("{}/rest/v1/{}", url.trim_end_matches('/'), table),
                key: key.to_string(),
                token: None,
                schema: "public".to_string(),
                client,
            },
        }
    }

    /// Send requests with the user's access token instead of the API key
    pub fn with_auth(mut self, token: &str) -> Self {
        self.target.token = Some(token.to_string());
        self
    }

    /// Target a schema other than `public`
    pub fn with_schema(mut self, schema: &str) -> Self {
        self.target.schema = schema.to_string();
        self
    }

    /// Select specific columns from the table
    pub fn select(&self, columns: &str) -> SelectBuilder {
        SelectBuilder::new(self.target.clone(), columns)
    }

    /// Insert a row (or an array of rows) into the table
    pub fn insert<T: Serialize>(&self, values: T) -> InsertBuilder<T> {
        InsertBuilder::new(self.target.clone(), values)
    }

    /// Update rows matching the filters added to the builder
    pub fn update<T: Serialize>(&self, values: T) -> UpdateBuilder<T> {
        UpdateBuilder::new(self.target.clone(), values)
    }

    /// Delete rows matching the filters added to the builder
    pub fn delete(&self) -> DeleteBuilder {
        DeleteBuilder::new(self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, table: &str) -> PostgrestClient {
        PostgrestClient::new(&server.uri(), "fake-key", table, Client::new())
    }

    #[tokio::test]
    async fn select_with_filters_and_order() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/items"))
            .and(query_param("select", "*"))
            .and(query_param("owner", "eq.7"))
            .and(query_param("order", "name.asc"))
            .and(header("apikey", "fake-key"))
            .and(header("Authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Test Item 1" },
                { "id": 2, "name": "Test Item 2" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = client(&server, "items")
            .with_auth("user-token")
            .select("*")
            .eq("owner", 7)
            .order("name", SortOrder::Ascending)
            .execute::<Value>()
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "Test Item 1");
    }

    #[tokio::test]
    async fn eq_ignore_case_escapes_wildcards() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("email", "ilike.jo\\_e@example.com"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let row = client(&server, "profiles")
            .select("*")
            .eq_ignore_case("email", "jo_e@example.com")
            .execute_one::<Value>()
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn insert_returns_representation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/items"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(json!({ "name": "New" })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([{ "id": 3, "name": "New" }])),
            )
            .mount(&server)
            .await;

        let rows = client(&server, "items")
            .insert(json!({ "name": "New" }))
            .execute::<Value>()
            .await
            .unwrap();
        assert_eq!(rows[0]["id"], 3);
    }

    #[tokio::test]
    async fn api_error_is_parsed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/items"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint",
                "details": null,
                "hint": null
            })))
            .mount(&server)
            .await;

        let err = client(&server, "items")
            .insert(json!({ "name": "Dup" }))
            .execute_no_return()
            .await
            .unwrap_err();

        match err {
            crate::error::Error::Api { status, details } => {
                assert_eq!(status.as_u16(), 409);
                assert_eq!(details.code.as_deref(), Some("23505"));
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unfiltered_delete_is_refused_locally() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let result = client(&server, "items").delete().execute().await;
        assert!(matches!(result, Err(crate::error::Error::Database(_))));
    }

    #[tokio::test]
    async fn update_filters_by_id() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/rest/v1/items"))
            .and(query_param("id", "eq.5"))
            .and(body_json(json!({ "name": "Renamed" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "id": 5, "name": "Renamed" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let rows = client(&server, "items")
            .update(json!({ "name": "Renamed" }))
            .eq("id", 5)
            .execute::<Value>()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }
}
