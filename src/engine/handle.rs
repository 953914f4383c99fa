use super::cancel::CancelToken;
use super::types::{Progress, RunEvent, RunSummary};
use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::error;

/// Receives run notifications on the thread that drives a [`RunHandle`].
///
/// Implementations need not be `Send` or `Sync`; workers never call them
/// directly.
pub trait RunObserver {
    fn on_progress(&mut self, progress: &Progress);
    fn on_complete(&mut self, summary: &RunSummary);
}

impl RunObserver for () {
    fn on_progress(&mut self, _progress: &Progress) {}
    fn on_complete(&mut self, _summary: &RunSummary) {}
}

pub struct Callbacks<P, C> {
    on_progress: P,
    on_complete: C,
}

/// Adapts a pair of closures into a [`RunObserver`].
pub fn callbacks<P, C>(on_progress: P, on_complete: C) -> Callbacks<P, C>
where
    P: FnMut(&Progress),
    C: FnMut(&RunSummary),
{
    Callbacks {
        on_progress,
        on_complete,
    }
}

impl<P, C> RunObserver for Callbacks<P, C>
where
    P: FnMut(&Progress),
    C: FnMut(&RunSummary),
{
    fn on_progress(&mut self, progress: &Progress) {
        (self.on_progress)(progress)
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        (self.on_complete)(summary)
    }
}

/// A run in flight. Dropping it detaches the run; it still finishes.
pub struct RunHandle {
    events: Receiver<RunEvent>,
    worker: Option<JoinHandle<()>>,
    current: Arc<AtomicUsize>,
    total: usize,
    cancel: CancelToken,
    finished: bool,
}

impl RunHandle {
    pub(crate) fn new(
        events: Receiver<RunEvent>,
        worker: JoinHandle<()>,
        current: Arc<AtomicUsize>,
        total: usize,
        cancel: CancelToken,
    ) -> Self {
        Self {
            events,
            worker: Some(worker),
            current,
            total,
            cancel,
            finished: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Candidates visited so far, read without draining events.
    pub fn progress(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Blocks until the run completes, dispatching every event to `observer`.
    pub fn wait(mut self, observer: &mut impl RunObserver) -> RunSummary {
        while let Ok(event) = self.events.recv() {
            if let Some(summary) = self.dispatch(event, observer) {
                return summary;
            }
        }

        self.join();
        error!("run coordinator exited without a completion event");
        RunSummary::new(self.total)
    }

    /// Dispatches whatever events are queued without blocking.
    ///
    /// Returns the summary once, on the call that delivers completion.
    pub fn poll(&mut self, observer: &mut impl RunObserver) -> Option<RunSummary> {
        if self.finished {
            return None;
        }

        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if let Some(summary) = self.dispatch(event, observer) {
                        return Some(summary);
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.join();
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    fn dispatch(&mut self, event: RunEvent, observer: &mut impl RunObserver) -> Option<RunSummary> {
        match event {
            RunEvent::Progress(progress) => {
                observer.on_progress(&progress);
                None
            }
            RunEvent::Complete(summary) => {
                observer.on_complete(&summary);
                self.join();
                self.finished = true;
                Some(summary)
            }
        }
    }

    fn join(&mut self) {
        if let Some(worker) = self.worker.take() {
            if let Err(payload) = worker.join() {
                panic::resume_unwind(payload);
            }
        }
    }
}
