mod common;

use common::{client_for, completion, forbid_requests, keyless_client_for, TEST_KEY};
use serde_json::json;
use supportbot::{
    knowledge::Intent,
    tools::{self, Tool, ToolOutcome},
    BotError,
};
use wiremock::{
    matchers::{body_partial_json, body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

#[test_log::test(tokio::test)]
async fn completion_text_is_returned_unmodified() {
    let server = MockServer::start().await;
    let reply = "  - point one\n- point two\n\n";
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", format!("Bearer {}", TEST_KEY).as_str()))
        .and(body_partial_json(json!({
            "model": "mistral-small-latest",
            "messages": [{ "role": "user", "content": "Summarize in 5-8 bullet points:\n\nnews" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let text = tools::summarize(&client_for(&server), "news").await.unwrap();
    assert_eq!(text, reply);
}

#[test_log::test(tokio::test)]
async fn missing_key_makes_no_network_call() {
    let server = MockServer::start().await;
    forbid_requests(&server).await;
    let client = keyless_client_for(&server);

    assert!(matches!(
        client.complete("anything").await,
        Err(BotError::MissingApiKey)
    ));
    assert!(matches!(
        client.complete_json("anything").await,
        Err(BotError::MissingApiKey)
    ));
    for tool in Tool::ALL {
        let outcome = tools::run_tool(&client, tool, "Does your card work in Germany?").await;
        assert!(matches!(outcome, ToolOutcome::Failed { .. }), "{} ran", tool);
    }

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[test_log::test(tokio::test)]
async fn api_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    match client_for(&server).complete("hi").await {
        Err(BotError::Api { status, body }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(body, "Unauthorized");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    assert!(matches!(
        client_for(&server).complete("hi").await,
        Err(BotError::EmptyResponse)
    ));
}

#[test_log::test(tokio::test)]
async fn json_mode_sends_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "response_format": { "type": "json_object" } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("```json\n{\"age\": 60, \"smoking\": true}\n```")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let extraction = tools::extract_json(&client_for(&server), "60 year old smoker")
        .await
        .unwrap();
    assert!(extraction.raw.starts_with("```json"));
    let pretty = extraction.pretty.expect("fenced JSON should parse");
    assert!(pretty.contains("\"age\": 60"));
}

#[test_log::test(tokio::test)]
async fn rejected_json_request_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid model: mistral-small-latest"))
        .expect(1)
        .mount(&server)
        .await;

    match tools::extract_json(&client_for(&server), "notes").await {
        Err(BotError::Api { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("Invalid model"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn invalid_json_reply_is_kept_raw() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("not json at all")))
        .expect(1)
        .mount(&server)
        .await;

    let extraction = tools::extract_json(&client_for(&server), "notes").await.unwrap();
    assert_eq!(extraction.raw, "not json at all");
    assert!(extraction.pretty.is_none());
}

#[test_log::test(tokio::test)]
async fn email_reply_uses_facts_and_returns_text_unmodified() {
    let server = MockServer::start().await;
    let reply = "Dear customer,\n\nOur 30-year APR is 6.484%.\n\nLender Customer Support\n";
    Mock::given(method("POST"))
        .and(body_string_contains("interest rate 6.403%, APR 6.484%"))
        .and(body_string_contains("interest rate 5.705%, APR 5.848%"))
        .and(body_string_contains("Sign as Lender Customer Support."))
        .and(body_string_contains("How does the 30-year APR compare?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .expect(1)
        .mount(&server)
        .await;

    let text = tools::reply_email(&client_for(&server), "How does the 30-year APR compare?")
        .await
        .unwrap();
    assert_eq!(text, reply);
}

#[test_log::test(tokio::test)]
async fn classification_parses_model_label() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("Inquiry: Does your card work in Germany?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Country Support\n")))
        .expect(1)
        .mount(&server)
        .await;

    let intent = tools::classify_intent(&client_for(&server), "Does your card work in Germany?").await;
    assert_eq!(intent, Intent::CountrySupport);
}

#[test_log::test(tokio::test)]
async fn classification_failure_defaults_to_customer_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let intent = tools::classify_intent(&client_for(&server), "I was charged twice by a merchant.").await;
    assert_eq!(intent, Intent::CustomerService);
}

#[test_log::test(tokio::test)]
async fn greetings_skip_the_model() {
    let server = MockServer::start().await;
    forbid_requests(&server).await;

    let intent = tools::classify_intent(&client_for(&server), "Good morning").await;
    assert_eq!(intent, Intent::CustomerService);
}
