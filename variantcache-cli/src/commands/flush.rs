//! `variantcache flush`

use std::path::PathBuf;
use variantcache::pipeline::FlushReport;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Invalidate cached forms of `filename`.
pub async fn run(
    config: Option<PathBuf>,
    verbose: bool,
    variant: &str,
    filename: &str,
) -> Result<(), CliError> {
    let runner = CliRunner::new(config, verbose)?;
    runner.log_startup("flush");
    let service = runner.create_service()?;

    let report = service.flush(variant, filename).await;
    print!("{}", summarize(&report)?);
    Ok(())
}

/// Render the report. Delete failures are warnings only; a rejected
/// request is an error.
fn summarize(report: &FlushReport) -> Result<String, CliError> {
    if let Some(reason) = &report.rejected {
        return Err(CliError::FlushRejected(reason.clone()));
    }

    let mut out = String::new();
    for key in &report.removed {
        out.push_str(&format!("removed {}\n", key));
    }
    for key in &report.failed {
        out.push_str(&format!("warning: could not delete {}\n", key));
    }
    Ok(out)
}
