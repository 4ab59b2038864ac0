pub mod http;

pub use http::{Credentials, HttpApiClient};

use crate::domain::{CustomerId, DailyReadings, MonthKey, PayloadError};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("malformed payload from {endpoint}: {source}")]
    Malformed {
        endpoint: String,
        #[source]
        source: PayloadError,
    },
    #[error("login rejected with status {0}")]
    LoginRejected(u16),
}

/// Source of the customer list (`GET /api/customers`).
#[async_trait::async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn list_customers(&self) -> Result<Vec<CustomerId>, ApiError>;
}

/// Source of one customer-month of daily readings (`GET /api/daily-readings`).
#[async_trait::async_trait]
pub trait MonthReadingProvider: Send + Sync {
    async fn fetch_month(
        &self,
        customer: &CustomerId,
        month: MonthKey,
    ) -> Result<DailyReadings, ApiError>;
}
