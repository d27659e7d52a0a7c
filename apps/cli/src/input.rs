//! Operator input: one stdin reader for the whole process, the pause
//! hotkey, and the two console handles built on top of them.

use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use console::{Term, style};
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tubebatch_core::{OperatorConsole, PauseController};

type LineReceiver = mpsc::UnboundedReceiver<String>;

/// Shared end of the stdin reader. Whoever holds the lock owns the
/// operator's next line.
pub type Lines = Arc<Mutex<LineReceiver>>;

#[cfg(unix)]
pub const PAUSE_KEY: &str = "Ctrl+\\";
#[cfg(windows)]
pub const PAUSE_KEY: &str = "Ctrl+Break";

/// Start the stdin reader on a plain thread. A blocking read cannot be
/// cancelled, so it must not live on the runtime.
pub fn spawn_line_reader() -> Lines {
    let (tx, rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stdin read failed");
                    return;
                }
            }
        }
        tracing::debug!("stdin closed");
    });

    Arc::new(Mutex::new(rx))
}

/// Flip the pause flag every time the pause key is hit.
#[cfg(unix)]
pub async fn listen_for_pause(pause: Arc<PauseController>) -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut quit = signal(SignalKind::quit())?;
    while quit.recv().await.is_some() {
        if !pause.request_pause() {
            tracing::debug!("already paused");
        }
    }
    Ok(())
}

#[cfg(windows)]
pub async fn listen_for_pause(pause: Arc<PauseController>) -> std::io::Result<()> {
    let mut ctrl_break = tokio::signal::windows::ctrl_break()?;
    while ctrl_break.recv().await.is_some() {
        if !pause.request_pause() {
            tracing::debug!("already paused");
        }
    }
    Ok(())
}

fn write_question(mut out: impl Write, question: &str) -> io::Result<()> {
    write!(out, "{} ", style(question.trim_end()).bold())?;
    out.flush()
}

fn write_line(mut out: impl Write, line: &str) -> io::Result<()> {
    writeln!(out, "{line}")
}

/// Console output is best effort; a broken terminal must not end the run.
fn log_write_error(result: io::Result<()>) {
    if let Err(e) = result {
        tracing::debug!(error = %e, "console write failed");
    }
}

/// Console used for the session prompts. Takes the input lock per question.
pub struct TerminalConsole {
    term: Term,
    lines: Lines,
}

impl TerminalConsole {
    pub fn new(lines: Lines) -> Self {
        Self {
            term: Term::stdout(),
            lines,
        }
    }
}

impl OperatorConsole for TerminalConsole {
    fn say(&mut self, line: &str) {
        log_write_error(write_line(&self.term, line));
    }

    async fn ask(&mut self, question: &str) -> Option<String> {
        let mut lines = self.lines.lock().await;
        log_write_error(write_question(&self.term, question));
        lines.recv().await
    }
}

/// Console held by the resume negotiator for one whole handshake.
pub struct HeldConsole {
    term: Term,
    lines: OwnedMutexGuard<LineReceiver>,
}

impl HeldConsole {
    pub async fn acquire(lines: Lines) -> Self {
        Self {
            term: Term::stdout(),
            lines: lines.lock_owned().await,
        }
    }
}

impl OperatorConsole for HeldConsole {
    fn say(&mut self, line: &str) {
        log_write_error(write_line(&self.term, &style(line).yellow().to_string()));
    }

    async fn ask(&mut self, question: &str) -> Option<String> {
        log_write_error(write_question(&self.term, question));
        self.lines.recv().await
    }
}
