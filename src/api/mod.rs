//! Typed client for the banksim system API
//!
//! One method per endpoint, all under the configured base URL with the Basic
//! credential attached as a default header. Read endpoints (account list,
//! store counters, subscription token) go through the bounded retry loop;
//! mutating endpoints are not idempotent and run as single attempts.

pub mod types;

use futures_util::future;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::Args;
use crate::fetch::{self, FetchError, RequestSpec, Result, RetryPolicy};

pub use types::{Account, Interlocutor, Transaction};

use types::{AddAccountResponse, ListAccountsResponse};

/// HTTP client for the banksim system API.
pub struct ApiClient {
    http: Client,
    base: String,
    policy: RetryPolicy,
}

/// Outcome of one item of a bulk fan-out operation.
#[derive(Debug)]
pub struct BulkOutcome {
    pub card_number: String,
    pub result: Result<()>,
}

impl BulkOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

impl ApiClient {
    /// Create a new client from configuration.
    pub fn new(args: &Args) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&args.auth_header())
                .expect("Invalid basic auth credential"),
        );

        let http = Client::builder()
            .default_headers(headers)
            .timeout(args.request_timeout())
            .build()
            .expect("Failed to build HTTP client");

        Self { http, base: args.http_base(), policy: args.retry_policy() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/system/{}", self.base, path)
    }

    // ==================== Read endpoints (retried) ====================

    /// Full account list. Replaces the cached list wholesale on success.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let spec = RequestSpec::get(self.url("list_accounts"));
        let response = fetch::execute_with_retry(&self.http, &spec, self.policy).await?;
        let parsed: ListAccountsResponse = decode(&response.body)?;
        Ok(parsed.accounts)
    }

    /// Global transaction history.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let spec = RequestSpec::get(self.url("list_transactions"));
        let response = fetch::execute_with_retry(&self.http, &spec, self.policy).await?;
        decode(&response.body)
    }

    /// Card number of the store account (plain text payload).
    pub async fn store_card(&self) -> Result<String> {
        self.fetch_scalar("store_card").await
    }

    /// Store balance (plain text payload).
    pub async fn store_balance(&self) -> Result<String> {
        self.fetch_scalar("store_balance").await
    }

    /// Total emission (plain text payload).
    pub async fn emission(&self) -> Result<String> {
        self.fetch_scalar("emission").await
    }

    /// Short-lived token required to open a push channel.
    pub async fn ws_token(&self) -> Result<String> {
        self.fetch_scalar("ws_token").await
    }

    async fn fetch_scalar(&self, path: &str) -> Result<String> {
        let spec = RequestSpec::get(self.url(path));
        let response = fetch::execute_with_retry(&self.http, &spec, self.policy).await?;
        Ok(response.body)
    }

    // ==================== Mutations (single attempt) ====================

    /// Create an account; returns the new card number.
    pub async fn add_account(&self, username: &str, password: &str) -> Result<String> {
        let spec = RequestSpec::post(
            self.url("account"),
            json!({ "username": username, "password": password }),
        );
        let response = fetch::execute(&self.http, &spec).await?;
        let parsed: AddAccountResponse = decode(&response.body)?;
        Ok(parsed.card_number)
    }

    /// Soft-delete an account (marks it non-existent).
    pub async fn delete_account(&self, card_number: &str) -> Result<()> {
        let spec =
            RequestSpec::delete(self.url("account"), json!({ "card_number": card_number }));
        fetch::execute(&self.http, &spec).await?;
        Ok(())
    }

    /// Transfer funds between two accounts.
    pub async fn new_transaction(&self, from: &str, to: &str, amount: i64) -> Result<()> {
        let spec = RequestSpec::post(
            self.url("transaction"),
            json!({ "from": from, "to": to, "amount": amount }),
        );
        fetch::execute(&self.http, &spec).await?;
        Ok(())
    }

    /// Credit an account from the emission source.
    pub async fn open_credit(&self, card_number: &str, amount: i64) -> Result<()> {
        let spec = RequestSpec::post(
            self.url("credit"),
            json!({ "card_number": card_number, "amount": amount }),
        );
        fetch::execute(&self.http, &spec).await?;
        Ok(())
    }

    // ==================== Bulk fan-out ====================

    /// Delete every selected account, one request per card, all issued
    /// concurrently. A failure on one item never cancels the others.
    pub async fn delete_accounts(&self, card_numbers: &[String]) -> Vec<BulkOutcome> {
        let requests = card_numbers.iter().map(|card| async move {
            BulkOutcome {
                card_number: card.clone(),
                result: self.delete_account(card).await,
            }
        });
        future::join_all(requests).await
    }

    /// Open a credit of `amount` for every selected account, concurrently,
    /// with independent per-item outcomes.
    pub async fn open_credits(&self, card_numbers: &[String], amount: i64) -> Vec<BulkOutcome> {
        let requests = card_numbers.iter().map(|card| async move {
            BulkOutcome {
                card_number: card.clone(),
                result: self.open_credit(card, amount).await,
            }
        });
        future::join_all(requests).await
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))
}
