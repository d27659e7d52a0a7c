//! Sequential download loop: one item at a time, failures isolated per item.

use std::{path::Path, sync::Arc, time::Instant};

use tracing::Instrument;

use crate::{
    events::{RunEvent, RunObserver},
    extractor::{DownloadRequest, Extractor},
    format::escape_template,
    pause::PauseController,
    progress::ProgressReporter,
    transcript::DocumentKind,
    types::{OutputNaming, RunState, TranscriptConfig, TranscriptJob, VideoDetails, WorkItem},
};

pub struct DownloadOrchestrator<'a, E: Extractor, O: RunObserver> {
    extractor: &'a E,
    observer: &'a mut O,
    pause: Arc<PauseController>,
    naming: OutputNaming,
}

impl<'a, E: Extractor, O: RunObserver> DownloadOrchestrator<'a, E, O> {
    pub fn new(
        extractor: &'a E,
        observer: &'a mut O,
        pause: Arc<PauseController>,
        naming: OutputNaming,
    ) -> Self {
        Self {
            extractor,
            observer,
            pause,
            naming,
        }
    }

    /// Process `items` in order and return the ones whose transfer failed,
    /// in encounter order. Feeding that list back in is the retry pass.
    pub async fn run(
        &mut self,
        items: &[WorkItem],
        transcripts: TranscriptConfig,
        destination: &Path,
    ) -> Vec<WorkItem> {
        let mut state = RunState::new();
        let span = tracing::info_span!("run", run_id = %state.run_id, items = items.len());

        async {
            for (index, item) in items.iter().enumerate() {
                let position = index + 1;
                self.process_item(&mut state, item, position, items.len(), transcripts, destination)
                    .await;
            }
            tracing::info!(
                processed = state.processed_count,
                failed = state.failures.len(),
                "pass finished"
            );
        }
        .instrument(span)
        .await;

        state.failures
    }

    async fn process_item(
        &mut self,
        state: &mut RunState,
        item: &WorkItem,
        position: usize,
        total: usize,
        transcripts: TranscriptConfig,
        destination: &Path,
    ) {
        let started = Instant::now();
        let url = item.watch_url();

        self.observer.on_event(RunEvent::ItemStarted {
            item: item.clone(),
            position,
            total,
        });

        self.describe(item, &url).await;

        let base_name = self.naming.base_name(item);
        let request = DownloadRequest {
            url: url.clone(),
            output_template: destination
                .join(format!("{}.%(ext)s", escape_template(&base_name)))
                .to_string_lossy()
                .into_owned(),
            subtitles: transcripts.is_some(),
        };

        let outcome = {
            let mut reporter = ProgressReporter::new(Arc::clone(&self.pause), &mut *self.observer);
            self.extractor.download(&request, &mut reporter).await
        };

        match outcome {
            Ok(()) => {
                tracing::info!(serial = item.serial, title = %item.title, "downloaded");
                self.observer
                    .on_event(RunEvent::ItemDownloaded { item: item.clone() });

                if let Some(format) = transcripts {
                    let job = TranscriptJob::new(destination, &base_name, format);
                    self.convert(item, &job).await;
                }
            }
            Err(e) => {
                tracing::warn!(serial = item.serial, title = %item.title, error = %e, "download failed");
                state.failures.push(item.clone());
                self.observer.on_event(RunEvent::ItemFailed {
                    item: item.clone(),
                    reason: e.to_string(),
                });
            }
        }

        state.processed_count += 1;
        self.observer.on_event(RunEvent::ItemTimed {
            item: item.clone(),
            elapsed: started.elapsed(),
            overall: state.overall(),
        });
    }

    /// Best-effort metadata lookup, never fatal for the item.
    async fn describe(&mut self, item: &WorkItem, url: &str) {
        match self.extractor.video_details(url).await {
            Ok(details) => self.observer.on_event(RunEvent::DetailsResolved {
                item: item.clone(),
                details,
            }),
            Err(e) => {
                tracing::warn!(serial = item.serial, error = %e, "details lookup failed");
                self.observer.on_event(RunEvent::DetailsUnavailable {
                    item: item.clone(),
                    details: VideoDetails::default(),
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn convert(&mut self, item: &WorkItem, job: &TranscriptJob) {
        if !job.subtitle_path.exists() {
            tracing::info!(path = %job.subtitle_path.display(), "no subtitles, skipping transcript");
            self.observer.on_event(RunEvent::SubtitleMissing {
                item: item.clone(),
                path: job.subtitle_path.clone(),
            });
            return;
        }

        for (kind, output) in job.documents() {
            match write_document(kind, job.subtitle_path.clone(), output.clone()).await {
                Ok(()) => self.observer.on_event(RunEvent::TranscriptWritten {
                    item: item.clone(),
                    path: output,
                }),
                Err(reason) => {
                    tracing::warn!(path = %output.display(), %reason, "transcript conversion failed");
                    self.observer.on_event(RunEvent::TranscriptFailed {
                        item: item.clone(),
                        path: output,
                        reason,
                    });
                }
            }
        }
    }
}

async fn write_document(
    kind: DocumentKind,
    subtitle: std::path::PathBuf,
    output: std::path::PathBuf,
) -> Result<(), String> {
    tokio::task::spawn_blocking(move || kind.write(&subtitle, &output))
        .await
        .map_err(|e| e.to_string())?
        .map_err(|e| e.to_string())
}
