#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use roomshare::auth::{Session, User};
use roomshare::notify::MemoryNotifier;
use roomshare::Roomshare;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::{MockServer, Request};

pub const ACCESS_TOKEN: &str = "user-jwt";
pub const MY_EMAIL: &str = "me@example.com";

pub struct TestContext {
    pub server: MockServer,
    pub client: Roomshare,
    pub notifier: Arc<MemoryNotifier>,
    pub me: Uuid,
}

/// Client pointed at a fresh mock server, signed in as `me@example.com`
pub async fn signed_in() -> TestContext {
    let ctx = signed_out().await;
    let user = User {
        id: ctx.me,
        email: Some(MY_EMAIL.to_string()),
        phone: None,
        user_metadata: HashMap::from([("full_name".to_string(), json!("Alex Morgan"))]),
        created_at: None,
    };
    ctx.client
        .auth()
        .set_session(Session::new(ACCESS_TOKEN.into(), "refresh".into(), user, 3600));
    ctx
}

pub async fn signed_out() -> TestContext {
    let server = MockServer::start().await;
    let client = Roomshare::new(&server.uri(), "anon-key").unwrap();
    TestContext {
        server,
        client,
        notifier: Arc::new(MemoryNotifier::new()),
        me: Uuid::new_v4(),
    }
}

pub fn profile(id: Uuid, email: &str, full_name: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "name": null,
        "full_name": full_name,
        "payment_id": format!("@{}", full_name.to_lowercase().replace(' ', "-")),
        "phone": null
    })
}

pub fn roommate_row(id: Uuid, owner: Uuid, email: &str, name: &str, balance: f64) -> Value {
    json!({
        "id": id,
        "user_id": owner,
        "name": name,
        "payment_id": "",
        "email": email,
        "phone": null,
        "balance": balance
    })
}

pub async fn requests(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}

pub async fn requests_with_method(server: &MockServer, method: &str) -> Vec<Request> {
    requests(server)
        .await
        .into_iter()
        .filter(|r| r.method.to_string() == method)
        .collect()
}

pub fn query_pairs(request: &Request) -> Vec<(String, String)> {
    request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
