use anyhow::{Context, Result};
use lettre::message::{Mailbox, Mailboxes};
use url::Url;

use crate::args::{Args, DateRange};

/// Everything a single run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub request: ReportRequest,
    pub output: OutputConfig,
    pub mail: MailConfig,
}

#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

// Keep the password out of debug logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The report to generate, as sent to the reports API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub report_name: String,
    pub usergroup_name: String,
    pub date_range: DateRange,
}

impl ReportRequest {
    /// The API is only ever asked for CSV output.
    pub const FORMAT: &'static str = "CSV";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub csv_name: String,
    pub header_override: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: SmtpServer,
    pub tls: bool,
    pub from: Mailbox,
    pub to: Mailboxes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpServer {
    pub host: String,
    pub port: Option<u16>,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        require_non_blank("--url", &args.url)?;
        require_non_blank("--username", &args.username)?;
        require_non_blank("--password", &args.password)?;
        require_non_blank("--usergroup-name", &args.usergroup_name)?;
        require_non_blank("--report-name", &args.report_name)?;
        require_non_blank("--email-server", &args.email_server)?;
        require_non_blank("--email-from", &args.email_from)?;
        require_non_blank("--email-to", &args.email_to)?;

        let parsed = Url::parse(&args.url).with_context(|| format!("Invalid --url '{}'", args.url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("--url must use http or https, got '{}'", parsed.scheme());
        }

        let from: Mailbox = args
            .email_from
            .parse()
            .with_context(|| format!("Invalid --email-from address '{}'", args.email_from))?;
        let to: Mailboxes = args
            .email_to
            .parse()
            .with_context(|| format!("Invalid --email-to address list '{}'", args.email_to))?;
        if to.iter().next().is_none() {
            anyhow::bail!("--email-to must name at least one recipient");
        }

        Ok(Config {
            api: ApiConfig {
                base_url: args.url.clone(),
                username: args.username.clone(),
                password: args.password.clone(),
            },
            request: ReportRequest {
                report_name: args.report_name.clone(),
                usergroup_name: args.usergroup_name.clone(),
                date_range: args.date_range,
            },
            output: OutputConfig {
                csv_name: normalize_csv_name(&args.report_name, args.csv_name.as_deref()),
                header_override: args.csv_headers.as_deref().map(parse_header_override),
            },
            mail: MailConfig {
                server: parse_smtp_server(&args.email_server)?,
                tls: args.email_tls,
                from,
                to,
            },
        })
    }
}

fn require_non_blank(flag: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{} must not be empty", flag);
    }
    Ok(())
}

/// Attachment name: the override if given, else `<report_name>`, with `.csv` ensured.
pub fn normalize_csv_name(report_name: &str, csv_name: Option<&str>) -> String {
    match csv_name {
        Some(name) if !name.is_empty() => {
            if name.ends_with(".csv") {
                name.to_string()
            } else {
                format!("{}.csv", name)
            }
        }
        _ => format!("{}.csv", report_name),
    }
}

/// Plain comma split; no quoting rules and no trimming.
pub fn parse_header_override(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

pub fn parse_smtp_server(raw: &str) -> Result<SmtpServer> {
    let raw = raw.trim();
    match raw.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !host.contains(':') => {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("Invalid port in --email-server '{}'", raw))?;
            Ok(SmtpServer {
                host: host.to_string(),
                port: Some(port),
            })
        }
        _ => Ok(SmtpServer {
            host: raw.to_string(),
            port: None,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec![
            "ccreport-mailer",
            "--url",
            "http://cc.example.com:8080/",
            "--username",
            "admin",
            "--password",
            "secret",
            "--usergroup-name",
            "finance",
            "--report-name",
            "Sales",
            "--email-server",
            "smtp.example.com",
            "--email-from",
            "reports@example.com",
            "--email-to",
            "a@example.com,b@example.com",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn csv_name_defaults_to_report_name() {
        assert_eq!(normalize_csv_name("Sales", None), "Sales.csv");
    }

    #[test]
    fn csv_name_override_gets_extension_once() {
        assert_eq!(normalize_csv_name("Sales", Some("myfile")), "myfile.csv");
        assert_eq!(normalize_csv_name("Sales", Some("myfile.csv")), "myfile.csv");
    }

    #[test]
    fn empty_csv_name_override_falls_back_to_report_name() {
        assert_eq!(normalize_csv_name("Sales", Some("")), "Sales.csv");
    }

    #[test]
    fn header_override_is_split_verbatim() {
        assert_eq!(parse_header_override("X,Y"), vec!["X", "Y"]);
        assert_eq!(parse_header_override(" X ,,Y"), vec![" X ", "", "Y"]);
    }

    #[test]
    fn smtp_server_with_and_without_port() {
        assert_eq!(
            parse_smtp_server("smtp.example.com").unwrap(),
            SmtpServer {
                host: "smtp.example.com".to_string(),
                port: None
            }
        );
        assert_eq!(
            parse_smtp_server("smtp.example.com:2525").unwrap(),
            SmtpServer {
                host: "smtp.example.com".to_string(),
                port: Some(2525)
            }
        );
        assert!(parse_smtp_server("smtp.example.com:smtp").is_err());
    }

    #[test]
    fn builds_config_from_args() {
        let config = Config::from_args(&args(&["--csv-headers", "X,Y", "--email-tls"])).unwrap();
        assert_eq!(config.api.base_url, "http://cc.example.com:8080/");
        assert_eq!(config.request.report_name, "Sales");
        assert_eq!(config.request.usergroup_name, "finance");
        assert_eq!(config.request.date_range, DateRange::PrevMon);
        assert_eq!(config.output.csv_name, "Sales.csv");
        assert_eq!(
            config.output.header_override,
            Some(vec!["X".to_string(), "Y".to_string()])
        );
        assert!(config.mail.tls);
        assert_eq!(config.mail.to.iter().count(), 2);
    }

    #[test]
    fn rejects_non_http_url() {
        let mut a = args(&[]);
        a.url = "ftp://cc.example.com".to_string();
        assert!(Config::from_args(&a).is_err());
        a.url = "not a url".to_string();
        assert!(Config::from_args(&a).is_err());
    }

    #[test]
    fn rejects_blank_required_values() {
        let mut a = args(&[]);
        a.report_name = "   ".to_string();
        assert!(Config::from_args(&a).is_err());
    }

    #[test]
    fn rejects_unparseable_addresses() {
        let mut a = args(&[]);
        a.email_from = "not an address".to_string();
        assert!(Config::from_args(&a).is_err());
    }

    #[test]
    fn debug_output_hides_password() {
        let config = Config::from_args(&args(&[])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
