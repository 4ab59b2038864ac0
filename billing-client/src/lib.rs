pub mod api;
pub mod domain;

pub use api::{ApiError, CustomerDirectory, HttpApiClient, MonthReadingProvider};
pub use domain::{CustomerId, DailyReadings, MonthKey};
