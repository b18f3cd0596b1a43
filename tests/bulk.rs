//! Bulk fan-out operations: independent per-item outcomes

use std::sync::Arc;

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use banksim_console::{ApiClient, Args, Store};
use banksim_console::api::types::Account;
use clap::Parser;

fn test_args(server: &MockServer) -> Args {
    let host = server.uri().trim_start_matches("http://").to_string();
    Args::parse_from(["banksim-console", "--api-host", &host, "--retry-delay-ms", "10"])
}

fn account(card: &str) -> Account {
    Account {
        card_number: card.to_string(),
        balance: 0,
        transactions: Vec::new(),
        exists: true,
        tokens: Vec::new(),
        username: format!("user-{card}"),
    }
}

/// Scenario C: deleting three selected accounts where the middle one fails
/// yields three independent statuses, and the selection survives until the
/// operator acknowledges.
#[tokio::test]
async fn bulk_delete_collects_independent_outcomes() {
    let server = MockServer::start().await;

    // Card "2" fails server-side; every other delete succeeds.
    Mock::given(method("DELETE"))
        .and(path("/system/account"))
        .and(body_json(serde_json::json!({ "card_number": "2" })))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/system/account"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(5)
        .mount(&server)
        .await;

    let args = test_args(&server);
    let api = ApiClient::new(&args);
    let store = Arc::new(Store::new(args.log_capacity));

    store.set_accounts(vec![account("1"), account("2"), account("3")]).await;
    for card in ["1", "2", "3"] {
        assert!(store.select(card).await);
    }

    let cards = store.selection().await;
    let outcomes = api.delete_accounts(&cards).await;

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].is_ok());
    assert!(!outcomes[1].is_ok(), "item 2 must fail without blocking the others");
    assert!(outcomes[2].is_ok());
    assert_eq!(outcomes[1].card_number, "2");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3, "one request per item, none cancelled");

    // The selection is cleared by explicit acknowledgement, never as a side
    // effect of the bulk settlement.
    assert_eq!(store.selection().await.len(), 3);
    store.clear_selection().await;
    assert!(store.selection().await.is_empty());
}

#[tokio::test]
async fn bulk_credit_reports_per_item_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/system/credit"))
        .and(body_json(serde_json::json!({ "card_number": "9", "amount": 250 })))
        .respond_with(ResponseTemplate::new(400).set_body_string("account is frozen"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/system/credit"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(5)
        .mount(&server)
        .await;

    let args = test_args(&server);
    let api = ApiClient::new(&args);

    let cards = vec!["8".to_string(), "9".to_string()];
    let outcomes = api.open_credits(&cards, 250).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_ok());
    let err = outcomes[1].result.as_ref().expect_err("frozen account");
    assert_eq!(err.message(), "account is frozen");
}
