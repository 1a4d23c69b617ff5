//! `variantcache get`

use std::io::Write;
use std::path::PathBuf;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Fetch `filename` in `variant` and write it to `output` or stdout.
pub async fn run(
    config: Option<PathBuf>,
    verbose: bool,
    variant: &str,
    filename: &str,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let runner = CliRunner::new(config, verbose)?;
    runner.log_startup("get");
    let service = runner.create_service()?;

    let image = service.get(variant, filename).await?;

    match output {
        Some(path) => {
            runner.save_output(&path, &image.bytes)?;
            eprintln!(
                "Wrote {} bytes ({}) to {}",
                image.bytes.len(),
                image.content_type,
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&image.bytes)
                .and_then(|_| stdout.flush())
                .map_err(|e| CliError::OutputWrite {
                    path: "<stdout>".to_string(),
                    error: e,
                })?;
        }
    }

    Ok(())
}
