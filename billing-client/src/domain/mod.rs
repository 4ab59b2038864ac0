pub mod customer;
pub mod daily_readings;
pub mod month;

pub use customer::CustomerId;
pub use daily_readings::{iso_date, parse_iso_date, DailyReadings, PayloadError};
pub use month::MonthKey;
