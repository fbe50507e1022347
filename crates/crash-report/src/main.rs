mod bootstrap;
mod export;

use anyhow::{Context, Result};
use crash_core::settings::Settings;
use crash_data::{analyze, PipelineOptions};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("crash-report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Archive: {}, precedence: {}, output: {}",
        settings.archive.display(),
        settings.precedence,
        settings.output_dir.display()
    );

    let options = PipelineOptions {
        archive_path: settings.archive.clone(),
        accidents_token: settings.accidents_token.clone(),
        consequences_token: settings.consequences_token.clone(),
        precedence: settings.dedup_precedence()?,
        verbose: settings.verbose,
    };

    let result = analyze(&options)
        .with_context(|| format!("analysis of {} failed", settings.archive.display()))?;

    let written = export::write_reports(&settings.output_dir, &result)?;
    for path in &written {
        tracing::info!("Wrote {}", path.display());
    }

    if settings.summary {
        for line in export::summary_lines(&result) {
            println!("{line}");
        }
    }

    Ok(())
}
