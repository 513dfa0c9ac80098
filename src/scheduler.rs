//! Tick scheduling capability handed to the timer core

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::watch;

/// Switches the periodic tick on and off.
///
/// The session decides *when* ticking should happen; the scheduler owns
/// *how*. Implementations must not call back into the session from these
/// methods, since the session is usually locked while it calls them.
pub trait TickScheduler: Send {
    fn start_ticking(&mut self);
    fn stop_ticking(&mut self);
    fn is_ticking(&self) -> bool;
}

/// Publishes the ticking flag on a watch channel followed by
/// [`crate::tasks::ticker_task`].
#[derive(Debug)]
pub struct WatchScheduler {
    tx: watch::Sender<bool>,
}

impl WatchScheduler {
    /// Create the scheduler together with the receiver the tick task listens on
    pub fn channel() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }
}

impl TickScheduler for WatchScheduler {
    fn start_ticking(&mut self) {
        self.tx.send_replace(true);
    }

    fn stop_ticking(&mut self) {
        self.tx.send_replace(false);
    }

    fn is_ticking(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Records the ticking flag only; the test drives ticks by hand.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    ticking: Arc<AtomicBool>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickScheduler for ManualScheduler {
    fn start_ticking(&mut self) {
        self.ticking.store(true, Ordering::SeqCst);
    }

    fn stop_ticking(&mut self) {
        self.ticking.store(false, Ordering::SeqCst);
    }

    fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::SeqCst)
    }
}
