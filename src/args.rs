use clap::{Parser, ValueEnum};
use std::fmt;

#[derive(Parser, Debug)]
#[command(
    name = "ccreport-mailer",
    about = "Generate a Cloud Cruiser report and send it by email",
    version,
    long_about = None
)]
pub struct Args {
    /// Cloud Cruiser base URL, e.g. http://cloudcruiser.mysite.com:8080
    #[arg(long)]
    pub url: String,

    /// Cloud Cruiser username
    #[arg(long)]
    pub username: String,

    /// Cloud Cruiser password
    #[arg(long)]
    pub password: String,

    /// Group whose permissions control the data the report retrieves
    #[arg(long)]
    pub usergroup_name: String,

    /// Name of the report to run
    #[arg(long)]
    pub report_name: String,

    /// Date range to retrieve data for
    #[arg(long, value_enum, default_value_t = DateRange::PrevMon)]
    pub date_range: DateRange,

    /// Attachment file name (defaults to <report-name>.csv)
    #[arg(long)]
    pub csv_name: Option<String>,

    /// Comma-separated header row replacing the report's own header
    #[arg(long)]
    pub csv_headers: Option<String>,

    /// SMTP server, as host or host:port
    #[arg(long)]
    pub email_server: String,

    /// Connect to the SMTP server over TLS
    #[arg(long)]
    pub email_tls: bool,

    /// Sender address
    #[arg(long)]
    pub email_from: String,

    /// Recipient addresses, separated by commas
    #[arg(long)]
    pub email_to: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Report date ranges understood by the reports API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DateRange {
    #[value(name = "ALL")]
    All,
    #[value(name = "CURRPERIOD")]
    CurrPeriod,
    #[value(name = "PREVPERIOD")]
    PrevPeriod,
    #[value(name = "CURRMON")]
    CurrMon,
    #[value(name = "MONTHTODATE")]
    MonthToDate,
    #[value(name = "PREVMON")]
    PrevMon,
    #[value(name = "CURRYEAR")]
    CurrYear,
    #[value(name = "YEARTODATE")]
    YearToDate,
    #[value(name = "PREVYEAR")]
    PrevYear,
    #[value(name = "TODAY")]
    Today,
    #[value(name = "PREVTODAY")]
    PrevToday,
    #[value(name = "CURRWEEK")]
    CurrWeek,
    #[value(name = "WEEKTODATE")]
    WeekToDate,
    #[value(name = "PREVWEEK")]
    PrevWeek,
}

impl DateRange {
    pub fn as_str(self) -> &'static str {
        match self {
            DateRange::All => "ALL",
            DateRange::CurrPeriod => "CURRPERIOD",
            DateRange::PrevPeriod => "PREVPERIOD",
            DateRange::CurrMon => "CURRMON",
            DateRange::MonthToDate => "MONTHTODATE",
            DateRange::PrevMon => "PREVMON",
            DateRange::CurrYear => "CURRYEAR",
            DateRange::YearToDate => "YEARTODATE",
            DateRange::PrevYear => "PREVYEAR",
            DateRange::Today => "TODAY",
            DateRange::PrevToday => "PREVTODAY",
            DateRange::CurrWeek => "CURRWEEK",
            DateRange::WeekToDate => "WEEKTODATE",
            DateRange::PrevWeek => "PREVWEEK",
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
