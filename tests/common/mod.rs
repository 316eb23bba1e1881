#![allow(dead_code)]

use serde_json::{json, Value};
use supportbot::{secrets::ApiKey, MistralClient, MistralSettings};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_KEY: &str = "test-key";

/// Chat completion body in the shape Mistral returns.
pub fn completion(content: &str) -> Value {
    json!({
        "id": "cmpl-test",
        "object": "chat.completion",
        "model": "mistral-small-latest",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

pub fn client_for(server: &MockServer) -> MistralClient {
    MistralClient::new(MistralSettings {
        base_url: server.uri(),
        model: "mistral-small-latest".to_string(),
        api_key: ApiKey::new(TEST_KEY),
    })
}

pub fn keyless_client_for(server: &MockServer) -> MistralClient {
    MistralClient::new(MistralSettings {
        base_url: server.uri(),
        model: "mistral-small-latest".to_string(),
        api_key: None,
    })
}

/// Fails the test on drop if anything reaches the server.
pub async fn forbid_requests(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}
