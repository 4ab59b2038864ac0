pub mod billing;
pub mod calendar;
pub mod config;
pub mod customers;
pub mod dashboard;
pub mod fetcher;
pub mod metrics_server;
pub mod observability;
pub mod runtime;
pub mod session;
pub mod terminal;

pub use dashboard::{Command, Dashboard, Event};
pub use session::SessionState;
