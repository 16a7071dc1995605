use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::{ApiConfig, ReportRequest};
use crate::format::Row;

pub const API_PATH: &str = "/rest/v2/reports";
pub const XML_NAMESPACE: &str = "http://www.cloudcruiser.com/webservices/v2/Report";

/// Joins the base URL and API path with exactly one slash between them.
pub fn report_url(base_url: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        API_PATH.trim_start_matches('/')
    )
}

/// Serializes the request as a `reportInput` document (no XML declaration).
pub fn build_request_xml(request: &ReportRequest) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    let mut root = BytesStart::new("reportInput");
    root.push_attribute(("xmlns", XML_NAMESPACE));
    writer.write_event(Event::Start(root))?;

    let children = [
        ("reportName", request.report_name.as_str()),
        ("userGroupName", request.usergroup_name.as_str()),
        ("format", ReportRequest::FORMAT),
        ("dateRange", request.date_range.as_str()),
    ];
    for (name, text) in children {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(text)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }

    writer.write_event(Event::End(BytesEnd::new("reportInput")))?;

    String::from_utf8(writer.into_inner()).context("Request XML is not valid UTF-8")
}

/// Parses a response body into rows. Blank lines yield no rows and rows may
/// differ in length.
pub fn parse_report_rows(body: &str) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV at record {}", index + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

pub fn fetch_report(client: &Client, api: &ApiConfig, request: &ReportRequest) -> Result<Vec<Row>> {
    let start_time = Instant::now();
    let url = report_url(&api.base_url);
    info!(action = "start", component = "report_fetch", url = %url, report = %request.report_name, "Retrieving report from reports API");

    let body = build_request_xml(request)?;
    debug!(action = "build", component = "report_request", xml = %body, "Built report request");

    let response = client
        .post(&url)
        .header(CONTENT_TYPE, "application/xml")
        .basic_auth(&api.username, Some(&api.password))
        .body(body)
        .send()
        .with_context(|| format!("Failed to fetch report from {}", url))?
        .error_for_status()
        .with_context(|| format!("Reports API at {} rejected the request", url))?;

    let text = response
        .text()
        .context("Failed to read report response body")?;
    let rows = parse_report_rows(&text)?;

    info!(
        action = "complete",
        component = "report_fetch",
        row_count = rows.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Retrieved report from reports API"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::DateRange;

    fn request() -> ReportRequest {
        ReportRequest {
            report_name: "Sales".to_string(),
            usergroup_name: "admin".to_string(),
            date_range: DateRange::PrevMon,
        }
    }

    #[test]
    fn url_strips_trailing_slashes() {
        assert_eq!(
            report_url("http://cc.example.com:8080/"),
            "http://cc.example.com:8080/rest/v2/reports"
        );
        assert_eq!(
            report_url("http://cc.example.com:8080"),
            "http://cc.example.com:8080/rest/v2/reports"
        );
        assert_eq!(
            report_url("http://cc.example.com//"),
            "http://cc.example.com/rest/v2/reports"
        );
    }

    #[test]
    fn request_xml_has_fixed_shape() {
        let xml = build_request_xml(&request()).unwrap();
        assert_eq!(
            xml,
            "<reportInput xmlns=\"http://www.cloudcruiser.com/webservices/v2/Report\">\
             <reportName>Sales</reportName>\
             <userGroupName>admin</userGroupName>\
             <format>CSV</format>\
             <dateRange>PREVMON</dateRange>\
             </reportInput>"
        );
    }

    #[test]
    fn request_xml_escapes_text() {
        let mut req = request();
        req.report_name = "P&L <monthly>".to_string();
        let xml = build_request_xml(&req).unwrap();
        assert!(xml.contains("<reportName>P&amp;L &lt;monthly&gt;</reportName>"));
    }

    #[test]
    fn parses_rows_keeping_order_and_quotes() {
        let rows = parse_report_rows("A,B\r\n1,\"2,5\"\r\nA,B\r\n").unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["1".to_string(), "2,5".to_string()],
                vec!["A".to_string(), "B".to_string()],
            ]
        );
    }

    #[test]
    fn empty_body_has_no_rows() {
        assert!(parse_report_rows("").unwrap().is_empty());
    }

    #[test]
    fn ragged_rows_are_accepted() {
        let rows = parse_report_rows("A,B,C\n1,2\n").unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1].len(), 2);
    }
}
