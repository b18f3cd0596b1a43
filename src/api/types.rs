//! Wire types for the banksim system API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bank account as reported by `GET /system/list_accounts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub card_number: String,
    /// Integer currency units
    pub balance: i64,
    pub transactions: Vec<Transaction>,
    /// Accounts are soft-deleted: a deleted account stays in the list with
    /// `exists == false`
    pub exists: bool,
    pub tokens: Vec<String>,
    pub username: String,
}

/// Append-only transfer record nested in an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub amount: i64,
    pub datetime: DateTime<Utc>,
    pub sender: Interlocutor,
    pub recipient: Interlocutor,
}

/// Sender or recipient descriptor on a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interlocutor {
    pub card_number: String,
    pub is_existing: bool,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAccountsResponse {
    pub accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
pub struct AddAccountResponse {
    pub card_number: String,
}
