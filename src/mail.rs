use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use lettre::message::header::{ContentDisposition, ContentTransferEncoding, ContentType};
use lettre::message::{MultiPart, SinglePart};
use lettre::{Message, SmtpTransport, Transport};
use quick_xml::escape::escape;
use std::time::Instant;
use tracing::info;

use crate::config::{MailConfig, ReportRequest};
use crate::utils::format_timestamp;

pub fn subject(report_name: &str, generated_at: &DateTime<Local>) -> String {
    format!(
        "Generated {} on {}",
        report_name,
        format_timestamp(generated_at)
    )
}

pub fn html_body(request: &ReportRequest, generated_at: &DateTime<Local>) -> String {
    // Short lines keep lettre on 7bit encoding for this part.
    format!(
        "<html>\n<body>\n\
         <b>Report name:</b> {}<br />\n\
         <b>Generated on:</b> {}<br />\n\
         <b>Date range:</b> {}<br />\n\
         </body>\n</html>\n",
        escape(request.report_name.as_str()),
        format_timestamp(generated_at),
        request.date_range
    )
}

/// Builds the report email: an HTML summary plus the CSV as a base64 attachment.
pub fn build_message(
    mail: &MailConfig,
    request: &ReportRequest,
    csv_name: &str,
    csv: &[u8],
    generated_at: &DateTime<Local>,
) -> Result<Message> {
    let mut builder = Message::builder()
        .from(mail.from.clone())
        .subject(subject(&request.report_name, generated_at));
    for recipient in mail.to.iter() {
        builder = builder.to(recipient.clone());
    }

    let attachment = SinglePart::builder()
        .header(ContentType::parse("application/octet-stream")?)
        .header(ContentDisposition::attachment(csv_name))
        .header(ContentTransferEncoding::Base64)
        .body(csv.to_vec());

    builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::html(html_body(request, generated_at)))
                .singlepart(attachment),
        )
        .context("Failed to build report email")
}

/// TLS-wrapped SMTP when `tls` is set, plain SMTP otherwise. No timeout.
pub fn smtp_transport(mail: &MailConfig) -> Result<SmtpTransport> {
    let builder = if mail.tls {
        SmtpTransport::relay(&mail.server.host)
            .with_context(|| format!("Failed to set up TLS for {}", mail.server.host))?
    } else {
        SmtpTransport::builder_dangerous(&mail.server.host)
    };
    let builder = match mail.server.port {
        Some(port) => builder.port(port),
        None => builder,
    };
    Ok(builder.timeout(None).build())
}

pub fn send_report<T>(transport: &T, message: &Message) -> Result<()>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let start_time = Instant::now();
    info!(action = "start", component = "report_email", "Sending report email");

    transport
        .send(message)
        .context("Failed to send report email")?;

    info!(
        action = "complete",
        component = "report_email",
        recipients = message.envelope().to().len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Report email sent"
    );
    Ok(())
}
