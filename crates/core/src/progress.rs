use std::sync::Arc;

use crate::{events::RunObserver, format::format_time, pause::PauseController};

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    /// Any other status the extractor reports; never rendered.
    Other(String),
}

impl ProgressStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "downloading" => ProgressStatus::Downloading,
            "finished" => ProgressStatus::Finished,
            other => ProgressStatus::Other(other.to_string()),
        }
    }
}

/// One progress callback from the extractor. Absent fields stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub status: ProgressStatus,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<u64>,
    /// Bytes per second.
    pub speed: Option<f64>,
    pub eta: Option<f64>,
    pub elapsed: Option<f64>,
}

impl ProgressUpdate {
    pub fn new(status: ProgressStatus) -> Self {
        Self {
            status,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
            speed: None,
            eta: None,
            elapsed: None,
        }
    }

    fn known_total(&self) -> Option<u64> {
        self.total_bytes
            .or(self.total_bytes_estimate)
            .filter(|total| *total > 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressLine {
    /// Replace the current progress line in place.
    Redraw(String),
    /// Terminate the progress line with this text.
    Done(String),
}

/// Render one update. Unknown totals and foreign statuses render nothing.
pub fn render(update: &ProgressUpdate) -> Option<ProgressLine> {
    match update.status {
        ProgressStatus::Downloading => {
            let total = update.known_total()?;
            let downloaded = update.downloaded_bytes.unwrap_or(0);
            let percent = downloaded as f64 / total as f64 * 100.0;
            let speed_kb = update.speed.filter(|s| *s > 0.0).unwrap_or(0.0) / 1024.0;
            let eta = format_time(update.eta.unwrap_or(0.0));
            let elapsed = format_time(update.elapsed.unwrap_or(0.0));

            Some(ProgressLine::Redraw(format!(
                "Downloading: {:.1}% | Speed: {:.2} KB/s | ETA: {} | Elapsed: {}",
                percent, speed_kb, eta, elapsed
            )))
        }
        ProgressStatus::Finished => Some(ProgressLine::Done("Download finished.".to_string())),
        ProgressStatus::Other(_) => None,
    }
}

/// Progress callback handed to the extractor for one item's transfer.
///
/// Every report first waits out an active pause, so nothing is drawn
/// while the operator owns the console and the caller stops pulling
/// progress from the transfer.
pub struct ProgressReporter<'a, O: RunObserver> {
    pause: Arc<PauseController>,
    observer: &'a mut O,
}

impl<'a, O: RunObserver> ProgressReporter<'a, O> {
    pub fn new(pause: Arc<PauseController>, observer: &'a mut O) -> Self {
        Self { pause, observer }
    }

    pub async fn report(&mut self, update: ProgressUpdate) {
        self.pause.wait_while_paused().await;
        if let Some(line) = render(&update) {
            self.observer.on_progress(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn downloading(downloaded: u64, total: Option<u64>) -> ProgressUpdate {
        ProgressUpdate {
            downloaded_bytes: Some(downloaded),
            total_bytes: total,
            speed: Some(2048.0),
            eta: Some(125.0),
            elapsed: Some(45.0),
            ..ProgressUpdate::new(ProgressStatus::Downloading)
        }
    }

    #[test]
    fn renders_known_total() {
        let line = render(&downloading(50, Some(200))).unwrap();
        assert_eq!(
            line,
            ProgressLine::Redraw(
                "Downloading: 25.0% | Speed: 2.00 KB/s | ETA: 2:05 | Elapsed: 45 sec".into()
            )
        );
    }

    #[test]
    fn falls_back_to_estimate() {
        let mut update = downloading(100, None);
        update.total_bytes_estimate = Some(400);
        let Some(ProgressLine::Redraw(text)) = render(&update) else {
            panic!("expected redraw");
        };
        assert!(text.starts_with("Downloading: 25.0%"));
    }

    #[test]
    fn unknown_total_renders_nothing() {
        assert_eq!(render(&downloading(100, None)), None);
        assert_eq!(render(&downloading(100, Some(0))), None);
    }

    #[test]
    fn missing_and_negative_speed_is_zero() {
        let mut update = downloading(1, Some(2));
        update.speed = Some(-5.0);
        update.eta = None;
        update.elapsed = None;
        assert_eq!(
            render(&update),
            Some(ProgressLine::Redraw(
                "Downloading: 50.0% | Speed: 0.00 KB/s | ETA: 0 sec | Elapsed: 0 sec".into()
            ))
        );
    }

    #[test]
    fn finished_and_other_statuses() {
        assert_eq!(
            render(&ProgressUpdate::new(ProgressStatus::Finished)),
            Some(ProgressLine::Done("Download finished.".into()))
        );
        assert_eq!(
            render(&ProgressUpdate::new(ProgressStatus::parse("error"))),
            None
        );
    }
}
