use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A simulated value transfer carried inside a block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub timestamp: i64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: f64) -> Self {
        Transaction {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            timestamp: Utc::now().timestamp(),
        }
    }

    /// Compact `sender->receiver:amount` form used in payload summaries.
    pub fn summary(&self) -> String {
        format!("{}->{}:{}", self.sender, self.receiver, self.amount)
    }
}

/// Encode a transaction list into the opaque block payload string.
pub fn encode_payload(transactions: &[Transaction]) -> String {
    serde_json::to_string(transactions).unwrap_or_default()
}
