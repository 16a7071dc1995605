pub mod args;
pub mod config;
pub mod fetch;
pub mod format;
pub mod mail;
pub mod report;
pub mod utils;

pub use args::{Args, DateRange};
pub use config::Config;
pub use format::{FormattedReport, Row};
pub use report::{generate_and_send, run, RunSummary};
