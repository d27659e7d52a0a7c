use std::{path::PathBuf, time::Duration};

use crate::types::{VideoDetails, WorkItem};

/// Something the orchestrator did with an item, in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    ItemStarted {
        item: WorkItem,
        position: usize,
        total: usize,
    },
    DetailsResolved {
        item: WorkItem,
        details: VideoDetails,
    },
    /// Best-effort lookup failed; the download proceeds with placeholders.
    DetailsUnavailable {
        item: WorkItem,
        details: VideoDetails,
        reason: String,
    },
    ItemDownloaded {
        item: WorkItem,
    },
    ItemFailed {
        item: WorkItem,
        reason: String,
    },
    SubtitleMissing {
        item: WorkItem,
        path: PathBuf,
    },
    TranscriptWritten {
        item: WorkItem,
        path: PathBuf,
    },
    TranscriptFailed {
        item: WorkItem,
        path: PathBuf,
        reason: String,
    },
    ItemTimed {
        item: WorkItem,
        elapsed: Duration,
        overall: Duration,
    },
}

impl RunEvent {
    pub fn item(&self) -> &WorkItem {
        match self {
            RunEvent::ItemStarted { item, .. }
            | RunEvent::DetailsResolved { item, .. }
            | RunEvent::DetailsUnavailable { item, .. }
            | RunEvent::ItemDownloaded { item }
            | RunEvent::ItemFailed { item, .. }
            | RunEvent::SubtitleMissing { item, .. }
            | RunEvent::TranscriptWritten { item, .. }
            | RunEvent::TranscriptFailed { item, .. }
            | RunEvent::ItemTimed { item, .. } => item,
        }
    }
}
