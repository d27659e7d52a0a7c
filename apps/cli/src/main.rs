use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use console::style;
use tubebatch_core::{
    ExtractorSettings, PauseController, RunController, RunOptions, YtDlp, run_negotiator,
};

use crate::{
    input::{HeldConsole, PAUSE_KEY, TerminalConsole},
    ui::ConsoleUi,
};

mod input;
mod logging;
mod ui;

#[derive(Parser)]
#[command(name = "tubebatch", version)]
#[command(about = "Batch-download a YouTube playlist or video, with optional PDF/DOCX transcripts")]
struct Cli {
    /// Playlist or video URL. Asked for interactively when omitted.
    url: Option<String>,

    /// Destination folder. Asked for interactively when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// yt-dlp executable to run
    #[arg(long, default_value = "yt-dlp")]
    yt_dlp: PathBuf,

    /// Retries yt-dlp performs per request
    #[arg(long, default_value_t = 10)]
    retries: u32,

    /// Socket timeout in seconds
    #[arg(long, default_value_t = 30)]
    socket_timeout: u64,

    /// Fragments fetched in parallel within one video
    #[arg(long, default_value_t = 5)]
    concurrent_fragments: u32,

    /// HTTP chunk size, e.g. "10M"
    #[arg(long, default_value = "10M")]
    chunk_size: String,

    /// Debug-level logging in the log file
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn extractor_settings(&self) -> ExtractorSettings {
        ExtractorSettings {
            program: self.yt_dlp.clone(),
            retries: self.retries,
            socket_timeout_secs: self.socket_timeout,
            concurrent_fragments: self.concurrent_fragments,
            chunk_size: self.chunk_size.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_guard = logging::init(cli.verbose);

    println!(
        "\n{}  {}\n",
        style("tubebatch").cyan().bold(),
        style("Batch YouTube Downloader").dim()
    );

    let pause = Arc::new(PauseController::new());
    let lines = input::spawn_line_reader();

    let hotkey = {
        let pause = Arc::clone(&pause);
        tokio::spawn(async move {
            if let Err(e) = input::listen_for_pause(pause).await {
                tracing::warn!(error = %e, "pause hotkey unavailable");
            }
        })
    };
    let negotiator = {
        let pause = Arc::clone(&pause);
        let lines = Arc::clone(&lines);
        tokio::spawn(async move {
            run_negotiator(&pause, || HeldConsole::acquire(Arc::clone(&lines))).await;
        })
    };
    println!(
        "{}",
        style(format!("Press {} during a download to pause progress output.", PAUSE_KEY)).dim()
    );

    let extractor = YtDlp::new(cli.extractor_settings());
    let mut console = TerminalConsole::new(lines);
    let mut ui = ConsoleUi::new();
    let options = RunOptions::new(cli.url.clone(), cli.output.clone());

    // yt-dlp runs in its own process group, so Ctrl+C only reaches us.
    // Dropping the session drops the child, which kills it.
    let mut controller = RunController::new(&extractor, &mut console, &mut ui, Arc::clone(&pause));
    let result = tokio::select! {
        result = controller.run(options) => result,
        _ = tokio::signal::ctrl_c() => {
            hotkey.abort();
            negotiator.abort();
            tracing::info!("interrupted");
            eprintln!("\n{}", style("Interrupted.").red());
            drop(log_guard);
            std::process::exit(130);
        }
    };

    hotkey.abort();
    negotiator.abort();

    if let Err(e) = result {
        tracing::error!(error = %e, "session aborted");
        eprintln!("{} {}", style("Error:").red().bold(), e);
        drop(log_guard);
        std::process::exit(1);
    }

    println!(
        "{} {}",
        style("Log:").dim(),
        style(logging::log_path().display()).dim()
    );

    Ok(())
}
