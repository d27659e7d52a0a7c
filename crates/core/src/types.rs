use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::format::{output_base_name, sanitize_title};

/// Lightweight playlist entry returned by a flat extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source_id: String,
    pub title: String,
}

/// One confirmed unit of work. Serial is the 1-based position in the
/// confirmed batch and survives retry passes unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub serial: usize,
    pub source_id: String,
    pub title: String,
}

impl WorkItem {
    pub fn new(serial: usize, candidate: &Candidate) -> Self {
        Self {
            serial,
            source_id: candidate.source_id.clone(),
            title: sanitize_title(&candidate.title),
        }
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.source_id)
    }
}

/// How output files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputNaming {
    /// `"<serial> - <title>"`, used for playlists.
    Serial,
    /// Bare `"<title>"`, used for a single video.
    Bare,
}

impl OutputNaming {
    pub fn base_name(self, item: &WorkItem) -> String {
        match self {
            OutputNaming::Serial => output_base_name(Some(item.serial), &item.title),
            OutputNaming::Bare => output_base_name(None, &item.title),
        }
    }
}

/// Display-only metadata; every field falls back to a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub title: String,
    pub format: String,
    pub size: String,
}

impl Default for VideoDetails {
    fn default() -> Self {
        Self {
            title: "Unknown".to_string(),
            format: "N/A".to_string(),
            size: "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    Pdf,
    Docx,
    Both,
}

impl TranscriptFormat {
    /// Maps the operator's A/B/C answer.
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim().to_ascii_uppercase().as_str() {
            "A" => Some(TranscriptFormat::Pdf),
            "B" => Some(TranscriptFormat::Docx),
            "C" => Some(TranscriptFormat::Both),
            _ => None,
        }
    }

    pub fn wants_pdf(self) -> bool {
        matches!(self, TranscriptFormat::Pdf | TranscriptFormat::Both)
    }

    pub fn wants_docx(self) -> bool {
        matches!(self, TranscriptFormat::Docx | TranscriptFormat::Both)
    }
}

/// `None` means transcripts are disabled for the run.
pub type TranscriptConfig = Option<TranscriptFormat>;

/// Post-download conversion unit for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptJob {
    pub subtitle_path: PathBuf,
    pub format: TranscriptFormat,
    pub output_base: PathBuf,
}

impl TranscriptJob {
    pub fn new(destination: &Path, base_name: &str, format: TranscriptFormat) -> Self {
        Self {
            subtitle_path: destination.join(format!("{base_name}.en.vtt")),
            format,
            output_base: destination.join(base_name),
        }
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.with_suffix(" Transcript.pdf")
    }

    pub fn docx_path(&self) -> PathBuf {
        self.with_suffix(" Transcript.docx")
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name = self.output_base.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }
}

/// Mutable bookkeeping for one orchestration pass.
#[derive(Debug)]
pub struct RunState {
    pub run_id: Uuid,
    pub start_time: Instant,
    pub processed_count: usize,
    pub failures: Vec<WorkItem>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            start_time: Instant::now(),
            processed_count: 0,
            failures: Vec::new(),
        }
    }

    pub fn overall(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
