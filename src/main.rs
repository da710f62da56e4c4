use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use indicatif::{HumanBytes, ProgressBar, ProgressFinish, ProgressStyle};
use tokio::runtime::Runtime;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use booru_fetch::cli::{Cli, CommandFactory, Parser};
use booru_fetch::config::Config;
use booru_fetch::download::Downloader;
use booru_fetch::session::SessionClient;
use booru_fetch::transport::Transport;

const SPINNER_FINISH_MODE: ProgressFinish = ProgressFinish::AndClear;
const SPINNER_TICK_SECS: f32 = 0.1;

#[inline]
fn build_spinner() -> ProgressBar {
    ProgressBar::new_spinner()
        .with_finish(SPINNER_FINISH_MODE)
        .with_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap()
                // NOTE: use `ascii` only, because cmd/powershell maybe not support unicode.
                .tick_strings(&[".  ", ".. ", "...", " ..", "  .", "   "]),
        )
}

#[inline]
fn build_download_bar() -> ProgressBar {
    const TEMPLATE: &str =
        "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})";

    ProgressBar::new(0).with_style(
        ProgressStyle::with_template(TEMPLATE)
            .unwrap()
            .progress_chars("#>-"),
    )
}

#[inline]
async fn async_main(config: Config) -> anyhow::Result<()> {
    let transport = Transport::new().context("failed to build HTTP client")?;
    let session = SessionClient::new(transport.clone());

    let spinner = build_spinner();
    spinner.set_message("Searching for an image...");
    spinner.enable_steady_tick(Duration::from_secs_f32(SPINNER_TICK_SECS));
    let record = session.fetch_one(&config.tag_sets(), &config.criteria()).await;
    spinner.finish();

    let Some(record) = record else {
        println!("No image found with any of the configured tag sets.");
        return Ok(());
    };
    println!(
        "Selected post {} ({}x{}, rating {})",
        record.id, record.width, record.height, record.rating
    );

    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .context("unable to ensure the existence of the download directory")?;
    let dest = config.download_dir.join(&record.suggested_filename);

    let bar = build_download_bar();
    let outcome = Downloader::new(transport)
        .download_with_progress(&record.source_url, &dest, |bytes_done, bytes_total| {
            if let Some(bytes_total) = bytes_total {
                bar.set_length(bytes_total);
            }
            bar.set_position(bytes_done);
        })
        .await
        .with_context(|| format!("failed to download {}", record.source_url))?;
    bar.finish();

    println!(
        "Saved {} ({})",
        outcome.path.display(),
        HumanBytes(outcome.bytes_written)
    );
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.resolve_config(&mut Cli::command()) {
        Ok(config) => config,
        Err(err) => {
            let _ = err.print();
            return Ok(ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(2)));
        }
    };

    let runtime = Runtime::new().context("failed to build tokio runtime")?;
    runtime.block_on(async {
        tokio::select! {
            result = async_main(config) => {result},
            result = signal::ctrl_c() => {
                result.expect("failed to listen for ctrl-c signal");
                println!("Ctrl-C received, exiting...");
                Ok(())
            },
        }
    })?;

    Ok(ExitCode::SUCCESS)
}
