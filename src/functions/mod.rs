//! Remote (edge) function invocation

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::fetch::Fetch;

/// Client for the project's serverless functions
#[derive(Clone)]
pub struct FunctionsClient {
    url: String,
    key: String,
    token: Option<String>,
    client: Client,
}

/// Response from a function call
#[derive(Debug, Clone)]
pub struct FunctionResponse {
    /// Parsed JSON body, `Value::Null` when the function returned nothing
    /// or plain text that is not JSON.
    pub data: Value,

    /// Raw response body
    pub text: String,

    /// Response status
    pub status: u16,
}

impl FunctionsClient {
    pub fn new(url: &str, key: &str, client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            token: None,
            client,
        }
    }

    /// Call functions as the signed-in user
    pub fn with_auth(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn get_url(&self, function_name: &str) -> String {
        format!("{}/functions/v1/{}", self.url, function_name)
    }

    /// Invoke `function_name` with a JSON body
    pub async fn invoke<T: Serialize>(
        &self,
        function_name: &str,
        body: &T,
    ) -> Result<FunctionResponse, Error> {
        let url = self.get_url(function_name);

        let fetch = Fetch::post(&self.client, &url)
            .header("apikey", &self.key)
            .bearer_auth(self.token.as_deref().unwrap_or(&self.key))
            .json(body)?;

        let response = fetch.execute_raw().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::function(format!(
                "{} failed with status {}: {}",
                function_name,
                status.as_u16(),
                text
            )));
        }

        let data = serde_json::from_str(&text).unwrap_or(Value::Null);
        Ok(FunctionResponse {
            data,
            text,
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn invoke_json_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/functions/v1/echo"))
            .and(header("apikey", "fake-api-key"))
            .and(header("Authorization", "Bearer user-jwt"))
            .and(body_json(json!({ "name": "test" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let client = FunctionsClient::new(&server.uri(), "fake-api-key", Client::new())
            .with_auth("user-jwt");
        let response = client.invoke("echo", &json!({ "name": "test" })).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.data, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn invoke_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/functions/v1/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let client = FunctionsClient::new(&server.uri(), "fake-api-key", Client::new());
        let err = client.invoke("broken", &json!({})).await.unwrap_err();

        match err {
            Error::Function(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("Internal Server Error"));
            }
            other => panic!("Expected Function error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn invoke_plain_text_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/functions/v1/text"))
            .respond_with(ResponseTemplate::new(200).set_body_string("queued"))
            .mount(&server)
            .await;

        let client = FunctionsClient::new(&server.uri(), "k", Client::new());
        let response = client.invoke("text", &json!({})).await.unwrap();
        assert_eq!(response.data, Value::Null);
        assert_eq!(response.text, "queued");
    }
}
