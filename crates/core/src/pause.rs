//! Cooperative pause/resume shared between the hotkey source, the
//! progress path and the resume negotiator.
//!
//! The hotkey side only flips a flag. The interactive resume prompt runs
//! in [`run_negotiator`] on its own task, never in the signal context.

use std::{
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct PauseController {
    paused: AtomicBool,
    requested: Notify,
    resumed: Notify,
}

impl PauseController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip to paused. Returns `false` (and does nothing) if already paused.
    pub fn request_pause(&self) -> bool {
        let transitioned = self
            .paused
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if transitioned {
            tracing::info!("pause requested");
            self.requested.notify_one();
        }
        transitioned
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Clear the flag and wake everything blocked in [`Self::wait_while_paused`].
    pub fn resume(&self) {
        if self.paused.swap(false, Ordering::SeqCst) {
            tracing::info!("resumed");
        }
        self.resumed.notify_waiters();
    }

    /// Returns immediately when not paused, otherwise once resumed.
    pub async fn wait_while_paused(&self) {
        loop {
            let notified = self.resumed.notified();
            tokio::pin!(notified);
            // Register before re-checking so a resume in between is not lost.
            notified.as_mut().enable();
            if !self.is_paused() {
                return;
            }
            notified.await;
        }
    }

    /// Wait until a pause has been requested.
    pub async fn pause_requested(&self) {
        loop {
            let notified = self.requested.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_paused() {
                return;
            }
            notified.await;
        }
    }
}

/// Line-oriented operator console.
pub trait OperatorConsole: Send {
    /// Print one full line.
    fn say(&mut self, line: &str);

    /// Print `question` and read one line. `None` on end of input.
    fn ask(&mut self, question: &str) -> impl Future<Output = Option<String>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Operator typed `resume`.
    Resumed,
    /// Input closed; resumed without acknowledgment.
    InputClosed,
}

/// Hold the console until the operator explicitly types `resume`.
pub async fn resume_handshake<C: OperatorConsole>(
    pause: &PauseController,
    console: &mut C,
) -> HandshakeOutcome {
    console.say("");
    console.say("Paused. Progress output is on hold.");

    loop {
        match console.ask("Type 'resume' to continue: ").await {
            Some(answer) if answer.trim().eq_ignore_ascii_case("resume") => {
                pause.resume();
                console.say("Resuming...");
                return HandshakeOutcome::Resumed;
            }
            Some(_) => continue,
            None => {
                tracing::warn!("operator input closed while paused, resuming");
                pause.resume();
                return HandshakeOutcome::InputClosed;
            }
        }
    }
}

/// Foreground loop that owns the resume prompt for the process lifetime.
///
/// `acquire` hands out the console for the duration of one handshake so
/// nothing else can read operator input while paused.
pub async fn run_negotiator<C, F, Fut>(pause: &PauseController, mut acquire: F)
where
    C: OperatorConsole,
    F: FnMut() -> Fut,
    Fut: Future<Output = C>,
{
    loop {
        pause.pause_requested().await;
        let mut console = acquire().await;
        if resume_handshake(pause, &mut console).await == HandshakeOutcome::InputClosed {
            return;
        }
    }
}
