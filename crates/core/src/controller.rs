//! Interactive session driver.
//!
//! One session walks `Selecting -> Confirming -> Configuring -> Running ->
//! Reporting`, with at most one extra `Running` pass for failed items.
//! Rejecting the confirmation loops back to `Selecting` instead of
//! restarting the whole flow.

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    error::{Result, TubeBatchError},
    events::RunObserver,
    extractor::Extractor,
    format::format_time,
    orchestrator::DownloadOrchestrator,
    pause::{OperatorConsole, PauseController},
    selection::{SelectionMode, resolve_selection},
    types::{Candidate, OutputNaming, TranscriptConfig, TranscriptFormat, WorkItem},
    urls::{is_playlist_url, normalize_playlist_url},
};

/// What the operator passed up front. Anything missing is prompted for.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub url: Option<String>,
    pub destination: Option<PathBuf>,
    /// Offered when prompting for a destination.
    pub default_destination: Option<PathBuf>,
}

impl RunOptions {
    pub fn new(url: Option<String>, destination: Option<PathBuf>) -> Self {
        Self {
            url,
            destination,
            default_destination: dirs::download_dir()
                .or_else(|| std::env::current_dir().ok()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Items in the confirmed batch; zero when the operator declined.
    pub attempted: usize,
    /// Items still failing after the optional retry pass.
    pub failed: Vec<WorkItem>,
    pub retried: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    fn declined() -> Self {
        Self {
            attempted: 0,
            failed: Vec::new(),
            retried: false,
            elapsed: Duration::ZERO,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed.len()
    }
}

/// Settings fixed once `Configuring` is done; shared by both passes.
#[derive(Debug, Clone)]
struct Batch {
    items: Vec<WorkItem>,
    transcripts: TranscriptConfig,
    destination: PathBuf,
    started: Instant,
}

#[derive(Debug)]
enum Stage {
    Selecting,
    Confirming(Vec<WorkItem>),
    Configuring(Vec<WorkItem>),
    Running {
        batch: Batch,
        pass: Vec<WorkItem>,
        retry: bool,
    },
    Reporting {
        batch: Batch,
        failures: Vec<WorkItem>,
        retried: bool,
    },
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Selecting => "selecting",
            Stage::Confirming(_) => "confirming",
            Stage::Configuring(_) => "configuring",
            Stage::Running { .. } => "running",
            Stage::Reporting { .. } => "reporting",
        }
    }
}

pub struct RunController<'a, E: Extractor, C: OperatorConsole, O: RunObserver> {
    extractor: &'a E,
    console: &'a mut C,
    observer: &'a mut O,
    pause: Arc<PauseController>,
}

impl<'a, E, C, O> RunController<'a, E, C, O>
where
    E: Extractor,
    C: OperatorConsole,
    O: RunObserver,
{
    pub fn new(
        extractor: &'a E,
        console: &'a mut C,
        observer: &'a mut O,
        pause: Arc<PauseController>,
    ) -> Self {
        Self {
            extractor,
            console,
            observer,
            pause,
        }
    }

    /// Drive one full session. Errors returned here are fatal input errors;
    /// per-item problems only show up in the summary.
    pub async fn run(&mut self, options: RunOptions) -> Result<RunSummary> {
        let url = match options.url.clone() {
            Some(url) => url,
            None => self
                .ask("Enter the YouTube playlist or video URL: ")
                .await?,
        };
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(TubeBatchError::EmptyUrl);
        }

        let playlist = is_playlist_url(&url);
        let url = if playlist {
            normalize_playlist_url(&url)
        } else {
            url
        };
        let naming = if playlist {
            OutputNaming::Serial
        } else {
            OutputNaming::Bare
        };
        tracing::info!(%url, playlist, "session started");

        self.console.say("Fetching video list...");
        let candidates = self.extractor.list_candidates(&url).await?;
        if candidates.is_empty() {
            return Err(TubeBatchError::NoVideosFound { url });
        }
        self.console
            .say(&format!("Found {} video(s).", candidates.len()));

        let mut stage = if playlist {
            Stage::Selecting
        } else {
            Stage::Confirming(vec![WorkItem::new(1, &candidates[0])])
        };

        loop {
            tracing::debug!(stage = stage.name(), "stage");
            stage = match stage {
                Stage::Selecting => self.select(&candidates).await?,

                Stage::Confirming(items) => {
                    self.console.say("");
                    self.console.say("You selected:");
                    for item in &items {
                        self.console
                            .say(&format!("  {}. {}", item.serial, item.title));
                    }
                    if self.ask_yes_no("Proceed with download? (y/n): ").await? {
                        Stage::Configuring(items)
                    } else if playlist {
                        Stage::Selecting
                    } else {
                        self.console.say("Download cancelled.");
                        return Ok(RunSummary::declined());
                    }
                }

                Stage::Configuring(items) => {
                    let transcripts = self.configure_transcripts().await?;
                    let destination = self.resolve_destination(&options).await?;
                    tokio::fs::create_dir_all(&destination).await?;
                    tracing::info!(destination = %destination.display(), ?transcripts, "configured");

                    Stage::Running {
                        pass: items.clone(),
                        batch: Batch {
                            items,
                            transcripts,
                            destination,
                            started: Instant::now(),
                        },
                        retry: false,
                    }
                }

                Stage::Running { batch, pass, retry } => {
                    if retry {
                        self.console.say("");
                        self.console.say("Retrying failed downloads...");
                    }
                    let failures = DownloadOrchestrator::new(
                        self.extractor,
                        &mut *self.observer,
                        Arc::clone(&self.pause),
                        naming,
                    )
                    .run(&pass, batch.transcripts, &batch.destination)
                    .await;

                    Stage::Reporting {
                        batch,
                        failures,
                        retried: retry,
                    }
                }

                Stage::Reporting {
                    batch,
                    failures,
                    retried,
                } => {
                    if !failures.is_empty() {
                        self.console.say("");
                        self.console.say(if retried {
                            "These videos still failed:"
                        } else {
                            "The following videos failed to download:"
                        });
                        for item in &failures {
                            self.console.say(&format!("  - {}", item.title));
                        }

                        if !retried
                            && self
                                .ask_yes_no("Retry failed downloads? (y/n): ")
                                .await?
                        {
                            stage = Stage::Running {
                                batch,
                                pass: failures,
                                retry: true,
                            };
                            continue;
                        }
                    }

                    let summary = RunSummary {
                        attempted: batch.items.len(),
                        failed: failures,
                        retried,
                        elapsed: batch.started.elapsed(),
                    };
                    self.console.say("");
                    self.console.say(&format!(
                        "All done. {} succeeded, {} failed. Total time: {}",
                        summary.succeeded(),
                        summary.failed.len(),
                        format_time(summary.elapsed.as_secs_f64())
                    ));
                    tracing::info!(
                        succeeded = summary.succeeded(),
                        failed = summary.failed.len(),
                        "session finished"
                    );
                    return Ok(summary);
                }
            };
        }
    }

    async fn select(&mut self, candidates: &[Candidate]) -> Result<Stage> {
        self.console.say("");
        for (index, candidate) in candidates.iter().enumerate() {
            self.console
                .say(&format!("  {}. {}", index + 1, candidate.title));
        }

        let answer = self
            .ask("Download ALL videos or specific ones? (type 'all' or e.g. 1,3,5): ")
            .await?;
        let items = resolve_selection(candidates, &SelectionMode::parse(&answer));

        if items.is_empty() {
            self.console.say("No valid videos selected. Try again.");
            return Ok(Stage::Selecting);
        }
        Ok(Stage::Confirming(items))
    }

    async fn configure_transcripts(&mut self) -> Result<TranscriptConfig> {
        if !self.ask_yes_no("Generate transcripts? (y/n): ").await? {
            return Ok(None);
        }
        loop {
            let answer = self
                .ask("Transcript format - A) PDF  B) DOCX  C) Both: ")
                .await?;
            if let Some(format) = TranscriptFormat::from_choice(&answer) {
                return Ok(Some(format));
            }
            self.console.say("Please answer A, B or C.");
        }
    }

    async fn resolve_destination(&mut self, options: &RunOptions) -> Result<PathBuf> {
        if let Some(dest) = &options.destination {
            return Ok(dest.clone());
        }

        let question = match &options.default_destination {
            Some(default) => format!("Destination folder [{}]: ", default.display()),
            None => "Destination folder: ".to_string(),
        };
        let answer = self.ask(&question).await?;
        let answer = answer.trim();

        if !answer.is_empty() {
            return Ok(PathBuf::from(answer));
        }
        options
            .default_destination
            .clone()
            .ok_or(TubeBatchError::NoDestination)
    }

    async fn ask(&mut self, question: &str) -> Result<String> {
        self.console
            .ask(question)
            .await
            .ok_or(TubeBatchError::InputClosed)
    }

    async fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.ask(question).await?;
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.console.say("Please answer y or n."),
            }
        }
    }
}
