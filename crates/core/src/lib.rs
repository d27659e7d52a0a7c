//! Core of tubebatch: pick videos from a YouTube playlist (or a single
//! video), download them one at a time through yt-dlp, and optionally turn
//! their English subtitles into PDF/DOCX transcripts.
//!
//! The crate never touches the terminal. Operator I/O goes through
//! [`OperatorConsole`] and [`RunObserver`], which the binary implements.

pub mod controller;
pub mod error;
pub mod events;
pub mod extractor;
pub mod format;
pub mod orchestrator;
pub mod pause;
pub mod progress;
pub mod selection;
pub mod transcript;
pub mod types;
pub mod urls;
pub mod ytdlp;

pub use controller::{RunController, RunOptions, RunSummary};
pub use error::{Result, TubeBatchError};
pub use events::{RecordingObserver, RunEvent, RunObserver};
pub use extractor::{DownloadRequest, Extractor, ExtractorSettings};
pub use format::{format_size, format_time};
pub use orchestrator::DownloadOrchestrator;
pub use pause::{HandshakeOutcome, OperatorConsole, PauseController, run_negotiator};
pub use progress::{ProgressLine, ProgressReporter, ProgressStatus, ProgressUpdate};
pub use selection::{SelectionMode, resolve_selection};
pub use types::{
    Candidate, OutputNaming, TranscriptConfig, TranscriptFormat, TranscriptJob, VideoDetails,
    WorkItem,
};
pub use urls::{is_playlist_url, normalize_playlist_url};
pub use ytdlp::YtDlp;
