use std::{future::Future, path::PathBuf};

use crate::{
    error::Result,
    events::RunObserver,
    progress::ProgressReporter,
    types::{Candidate, VideoDetails},
};

/// Best stream no taller than 1080p. Fixed policy, not a run option.
pub const FORMAT_UP_TO_1080P: &str = "bestvideo[height<=1080]+bestaudio/best[height<=1080]";

/// Subtitle language and container requested alongside the media.
pub const SUBTITLE_LANG: &str = "en";
pub const SUBTITLE_FORMAT: &str = "vtt";

/// Knobs forwarded to the extractor. The core only configures these;
/// retrying and timing out is the extractor's job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorSettings {
    pub program: PathBuf,
    pub retries: u32,
    pub socket_timeout_secs: u64,
    pub concurrent_fragments: u32,
    pub chunk_size: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
            retries: 10,
            socket_timeout_secs: 30,
            concurrent_fragments: 5,
            chunk_size: "10M".to_string(),
        }
    }
}

/// Everything needed to transfer one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// Output path template, e.g. `/dl/1 - Intro.%(ext)s`.
    pub output_template: String,
    /// Also fetch human or auto-generated English subtitles.
    pub subtitles: bool,
}

/// The external extraction/download capability.
pub trait Extractor: Send + Sync {
    /// Flat (metadata-only) listing of a playlist, or the single video behind a URL.
    fn list_candidates(&self, url: &str) -> impl Future<Output = Result<Vec<Candidate>>> + Send;

    /// Descriptive metadata for display. No transfer happens.
    fn video_details(&self, url: &str) -> impl Future<Output = Result<VideoDetails>> + Send;

    /// Transfer one item, feeding progress through `reporter`.
    fn download<O: RunObserver>(
        &self,
        request: &DownloadRequest,
        reporter: &mut ProgressReporter<'_, O>,
    ) -> impl Future<Output = Result<()>> + Send;
}
