use crate::{events::RunEvent, progress::ProgressLine};

/// Receives everything a run wants to show the operator.
pub trait RunObserver: Send {
    fn on_event(&mut self, event: RunEvent);

    fn on_progress(&mut self, line: ProgressLine);
}

/// Keeps everything in memory. Handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<RunEvent>,
    pub progress: Vec<ProgressLine>,
}

impl RunObserver for RecordingObserver {
    fn on_event(&mut self, event: RunEvent) {
        self.events.push(event);
    }

    fn on_progress(&mut self, line: ProgressLine) {
        self.progress.push(line);
    }
}
