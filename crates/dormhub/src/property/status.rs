use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Payment status as shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub const fn ordered() -> [PaymentStatus; 3] {
        [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Overdue,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
        }
    }

    /// Storage has no overdue state, so it folds into pending.
    pub const fn to_storage(self) -> StoragePaymentStatus {
        match self {
            PaymentStatus::Paid => StoragePaymentStatus::Completed,
            PaymentStatus::Pending | PaymentStatus::Overdue => StoragePaymentStatus::Pending,
        }
    }

    pub const fn is_paid(self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "overdue" => Ok(PaymentStatus::Overdue),
            _ => Err(StatusParseError(raw.to_string())),
        }
    }
}

/// Payment status as persisted by the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoragePaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl StoragePaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            StoragePaymentStatus::Pending => "pending",
            StoragePaymentStatus::Completed => "completed",
            StoragePaymentStatus::Failed => "failed",
        }
    }

    pub const fn to_presentation(self) -> PaymentStatus {
        match self {
            StoragePaymentStatus::Pending => PaymentStatus::Pending,
            StoragePaymentStatus::Completed => PaymentStatus::Paid,
            StoragePaymentStatus::Failed => PaymentStatus::Overdue,
        }
    }
}

impl fmt::Display for StoragePaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StoragePaymentStatus {
    type Err = StatusParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(StoragePaymentStatus::Pending),
            "completed" => Ok(StoragePaymentStatus::Completed),
            "failed" => Ok(StoragePaymentStatus::Failed),
            _ => Err(StatusParseError(raw.to_string())),
        }
    }
}

pub fn to_presentation_status(status: StoragePaymentStatus) -> PaymentStatus {
    status.to_presentation()
}

pub fn to_storage_status(status: PaymentStatus) -> StoragePaymentStatus {
    status.to_storage()
}

/// Parses a comma separated status list such as `paid,overdue`.
pub fn parse_status_list(raw: &str) -> Result<Vec<PaymentStatus>, StatusParseError> {
    let mut statuses = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let status = part.parse::<PaymentStatus>()?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(statuses)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status `{0}`")]
pub struct StatusParseError(pub String);
