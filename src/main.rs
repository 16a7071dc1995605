use anyhow::Result;
use ccreport_mailer::{report, utils, Args, Config};
use clap::Parser;
use tracing::{error, info};

fn main() -> Result<()> {
    let args = Args::parse();
    utils::setup_logging(args.debug);

    match Config::from_args(&args).and_then(|config| report::run(&config)) {
        Ok(summary) => {
            info!(
                action = "summary",
                component = "main",
                fetched_rows = summary.fetched_rows,
                written_rows = summary.written_rows,
                attachment_bytes = summary.attachment_bytes,
                csv_name = %summary.csv_name,
                "Report emailed"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "Report run failed");
            std::process::exit(1);
        }
    }
}
