//! Periodic poll timer.
//!
//! Pull-style backends re-acquire data on an interval: the timer injects a
//! designated command into the loop's message channel so the plugin's fetch
//! handler runs like any other dispatched procedure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use alerthub_agentlib::callback::{CommandCall, CommandCode};

use crate::source::InboundMessage;

/// Periodic injector of a poll command.
///
/// The first tick fires immediately so a freshly started plugin acquires
/// data without waiting a full interval. The timer stops on [`cancel`]
/// (Self::cancel) or when the loop side of the channel is gone.
pub struct PollTimer {
    code: CommandCode,
    handle: JoinHandle<()>,
    active: Arc<AtomicBool>,
}

impl PollTimer {
    /// Start polling: send `code` into `tx` every `interval`.
    pub fn start(tx: mpsc::Sender<InboundMessage>, code: CommandCode, interval: Duration) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let task_active = active.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                debug!(code = %code, "Poll tick");
                let message = InboundMessage::new(code, CommandCall::new());
                if tx.send(message).await.is_err() {
                    info!(code = %code, "Message channel closed, poll timer stopping");
                    break;
                }
            }
            task_active.store(false, Ordering::SeqCst);
        });

        info!(code = %code, ?interval, "Poll timer started");
        Self {
            code,
            handle,
            active,
        }
    }

    /// The command this timer injects.
    pub fn code(&self) -> CommandCode {
        self.code
    }

    /// Whether the timer task is still running.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop the timer.
    pub fn cancel(self) {
        self.handle.abort();
        self.active.store(false, Ordering::SeqCst);
        info!(code = %self.code, "Poll timer cancelled");
    }
}
