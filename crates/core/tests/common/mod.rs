#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use tubebatch_core::{
    Candidate, DownloadRequest, Extractor, OperatorConsole, ProgressReporter, ProgressStatus,
    ProgressUpdate, Result, RunObserver, TubeBatchError, VideoDetails, WorkItem,
};

pub fn candidates(titles: &[&str]) -> Vec<Candidate> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| Candidate {
            source_id: format!("id{}", i + 1),
            title: title.to_string(),
        })
        .collect()
}

pub fn items(titles: &[&str]) -> Vec<WorkItem> {
    candidates(titles)
        .iter()
        .enumerate()
        .map(|(i, c)| WorkItem::new(i + 1, c))
        .collect()
}

fn source_id(url: &str) -> String {
    url.rsplit("v=").next().unwrap_or(url).to_string()
}

/// In-memory extractor. Records every call, fails on demand and can drop
/// a subtitle file next to the (fake) media like yt-dlp would.
#[derive(Default)]
pub struct FakeExtractor {
    pub candidates: Vec<Candidate>,
    /// Remaining forced download failures per source id.
    pub failures: Mutex<HashMap<String, usize>>,
    pub details_fail: HashSet<String>,
    /// Source ids that have English subtitles.
    pub subtitles: HashSet<String>,
    pub progress: Vec<ProgressUpdate>,
    pub calls: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<DownloadRequest>>,
    pub listed: Mutex<Vec<String>>,
}

impl FakeExtractor {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            ..Default::default()
        }
    }

    pub fn fail(self, id: &str, times: usize) -> Self {
        self.failures.lock().unwrap().insert(id.to_string(), times);
        self
    }

    pub fn with_subtitles(mut self, id: &str) -> Self {
        self.subtitles.insert(id.to_string());
        self
    }

    pub fn with_progress(mut self) -> Self {
        self.progress = vec![
            ProgressUpdate {
                downloaded_bytes: Some(512),
                total_bytes: Some(1024),
                speed: Some(1024.0),
                eta: Some(1.0),
                elapsed: Some(1.0),
                ..ProgressUpdate::new(ProgressStatus::Downloading)
            },
            ProgressUpdate::new(ProgressStatus::Downloading),
            ProgressUpdate::new(ProgressStatus::Finished),
        ];
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn should_fail(&self, id: &str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl Extractor for FakeExtractor {
    async fn list_candidates(&self, url: &str) -> Result<Vec<Candidate>> {
        self.listed.lock().unwrap().push(url.to_string());
        Ok(self.candidates.clone())
    }

    async fn video_details(&self, url: &str) -> Result<VideoDetails> {
        let id = source_id(url);
        self.record(format!("details:{id}"));
        if self.details_fail.contains(&id) {
            return Err(TubeBatchError::ExtractorFailed {
                url: url.to_string(),
                reason: "lookup refused".to_string(),
            });
        }
        Ok(VideoDetails {
            title: id,
            format: "1080p (mp4)".to_string(),
            size: "1.00 MB".to_string(),
        })
    }

    async fn download<O: RunObserver>(
        &self,
        request: &DownloadRequest,
        reporter: &mut ProgressReporter<'_, O>,
    ) -> Result<()> {
        let id = source_id(&request.url);
        self.record(format!("download:{id}"));
        self.requests.lock().unwrap().push(request.clone());

        if self.should_fail(&id) {
            return Err(TubeBatchError::ExtractorFailed {
                url: request.url.clone(),
                reason: "HTTP Error 403".to_string(),
            });
        }

        for update in &self.progress {
            reporter.report(update.clone()).await;
        }

        let media = request.output_template.replace("%(ext)s", "mp4");
        std::fs::write(&media, b"media")?;
        if request.subtitles && self.subtitles.contains(&id) {
            let vtt = request.output_template.replace("%(ext)s", "en.vtt");
            std::fs::write(
                vtt,
                "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nHello there, café ☕\n",
            )?;
        }
        Ok(())
    }
}

/// Console that replays canned answers and keeps a transcript of the
/// conversation. Clones share both.
#[derive(Clone, Default)]
pub struct ScriptedConsole {
    answers: Arc<Mutex<VecDeque<String>>>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConsole {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Arc::new(Mutex::new(
                answers.iter().map(|a| a.to_string()).collect(),
            )),
            lines: Arc::default(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

impl OperatorConsole for ScriptedConsole {
    fn say(&mut self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    async fn ask(&mut self, question: &str) -> Option<String> {
        self.lines.lock().unwrap().push(question.to_string());
        self.answers.lock().unwrap().pop_front()
    }
}

pub fn temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

pub fn read_prefix(path: &PathBuf, len: usize) -> Vec<u8> {
    let bytes = std::fs::read(path).unwrap();
    bytes.into_iter().take(len).collect()
}
