use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tubebatch_core::{ProgressLine, RunEvent, RunObserver, format_time};

/// Renders run events as styled lines and progress as a single
/// in-place line.
#[derive(Default)]
pub struct ConsoleUi {
    bar: Option<ProgressBar>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// No steady tick: the line only changes when a report comes in, so a
    /// paused run leaves the terminal alone.
    fn create_bar() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
        {
            pb.set_style(template);
        }
        pb
    }

    fn clear_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl RunObserver for ConsoleUi {
    fn on_event(&mut self, event: RunEvent) {
        self.clear_bar();

        match event {
            RunEvent::ItemStarted {
                item,
                position,
                total,
            } => {
                println!(
                    "\n{} {}",
                    style(format!("[{}/{}]", position, total)).cyan().bold(),
                    style(&item.title).bold()
                );
            }
            RunEvent::DetailsResolved { details, .. } => {
                println!(
                    "  {} {}  {} {}  {} {}",
                    style("Title:").dim(),
                    details.title,
                    style("Format:").dim(),
                    details.format,
                    style("Size:").dim(),
                    details.size
                );
            }
            RunEvent::DetailsUnavailable {
                details, reason, ..
            } => {
                println!(
                    "  {} could not fetch video details: {}",
                    style("!").yellow().bold(),
                    style(reason).dim()
                );
                println!(
                    "  {} {}  {} {}  {} {}",
                    style("Title:").dim(),
                    details.title,
                    style("Format:").dim(),
                    details.format,
                    style("Size:").dim(),
                    details.size
                );
            }
            RunEvent::ItemDownloaded { item } => {
                println!("{} Downloaded: {}", style("✓").green().bold(), item.title);
            }
            RunEvent::ItemFailed { item, reason } => {
                println!(
                    "{} Failed: {} {}",
                    style("✗").red().bold(),
                    item.title,
                    style(format!("({})", reason)).dim()
                );
            }
            RunEvent::SubtitleMissing { item, .. } => {
                println!(
                    "{} No English subtitles for {}, skipping transcript",
                    style("!").yellow().bold(),
                    item.title
                );
            }
            RunEvent::TranscriptWritten { path, .. } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                println!("{} Transcript saved: {}", style("✓").green().bold(), name);
            }
            RunEvent::TranscriptFailed { path, reason, .. } => {
                println!(
                    "{} Transcript not written: {} {}",
                    style("✗").red().bold(),
                    path.display(),
                    style(format!("({})", reason)).dim()
                );
            }
            RunEvent::ItemTimed {
                elapsed, overall, ..
            } => {
                println!(
                    "  {}",
                    style(format!(
                        "[time: {} | total: {}]",
                        format_time(elapsed.as_secs_f64()),
                        format_time(overall.as_secs_f64())
                    ))
                    .dim()
                );
            }
        }
    }

    fn on_progress(&mut self, line: ProgressLine) {
        match line {
            ProgressLine::Redraw(text) => {
                let bar = self.bar.get_or_insert_with(Self::create_bar);
                bar.set_message(text);
                bar.tick();
            }
            ProgressLine::Done(text) => {
                self.clear_bar();
                println!("{} {}", style("✓").green().bold(), text);
            }
        }
    }
}
