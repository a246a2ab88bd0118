use std::collections::HashMap;

use forgehand::Session;
use wiremock::{MockServer, Request};

/// A fresh session pointed at the mock server.
pub fn session_for(server: &MockServer) -> Session {
    Session::new()
        .expect("client should build")
        .with_base_url(server.uri())
        .expect("mock server URI should parse")
}

/// Decode an `application/x-www-form-urlencoded` request body.
pub fn form_body(request: &Request) -> HashMap<String, String> {
    url::form_urlencoded::parse(&request.body)
        .into_owned()
        .collect()
}

/// All requests the server saw with the given HTTP method.
pub async fn requests_with_method(server: &MockServer, method: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == method)
        .collect()
}
