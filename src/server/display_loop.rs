//! Display main loop
//!
//! All head and output mutation happens on the thread that owns the
//! [`DisplayLoop`]. Other threads hand layout messages over through a
//! [`LayoutSubmitter`]; tasks are processed one full transaction at a time
//! in submission order.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::compositor::OutputControl;
use crate::multimon::manager::{LayoutAck, LayoutError, MonitorManager};
use crate::multimon::types::MonitorLayoutMessage;

/// Outcome of one queued layout
pub type LayoutResult = Result<LayoutAck, LayoutError>;

/// Deferred-task queue errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The display loop is gone
    #[error("Display loop is not running")]
    Closed,

    /// The task was dropped without an answer
    #[error("Layout task dropped before completion")]
    NoReply,
}

impl From<QueueError> for LayoutError {
    fn from(e: QueueError) -> Self {
        LayoutError::Unavailable(e.to_string())
    }
}

/// Layout work queued for the main loop
#[derive(Debug)]
pub struct LayoutTask {
    message: MonitorLayoutMessage,
    reply: Option<oneshot::Sender<LayoutResult>>,
}

/// Pending answer to a submitted layout
#[derive(Debug)]
pub struct LayoutReply {
    rx: oneshot::Receiver<LayoutResult>,
}

impl LayoutReply {
    /// Wait for the main loop to process the layout
    pub async fn wait(self) -> Result<LayoutResult, QueueError> {
        self.rx.await.map_err(|_| QueueError::NoReply)
    }

    /// Blocking variant of [`wait`](Self::wait) for non-async callers
    ///
    /// Must not be called from within a tokio runtime.
    pub fn wait_blocking(self) -> Result<LayoutResult, QueueError> {
        self.rx.blocking_recv().map_err(|_| QueueError::NoReply)
    }
}

/// Cloneable handle used by I/O threads to queue layouts
#[derive(Debug, Clone)]
pub struct LayoutSubmitter {
    tx: Sender<LayoutTask>,
}

impl LayoutSubmitter {
    /// Queue a layout and get a handle to its result
    pub fn submit(&self, message: MonitorLayoutMessage) -> Result<LayoutReply, QueueError> {
        let (reply_tx, rx) = oneshot::channel();
        self.tx
            .send(LayoutTask {
                message,
                reply: Some(reply_tx),
            })
            .map_err(|_| QueueError::Closed)?;
        Ok(LayoutReply { rx })
    }

    /// Queue a layout without waiting for its result
    pub fn post(&self, message: MonitorLayoutMessage) -> Result<(), QueueError> {
        self.tx
            .send(LayoutTask {
                message,
                reply: None,
            })
            .map_err(|_| QueueError::Closed)
    }
}

/// Main-loop owner of the monitor manager and the compositor outputs
pub struct DisplayLoop<O: OutputControl> {
    manager: MonitorManager,
    outputs: O,
    tasks: Receiver<LayoutTask>,
}

impl<O: OutputControl> DisplayLoop<O> {
    /// Create a loop and the submitter feeding it
    pub fn new(manager: MonitorManager, outputs: O) -> (Self, LayoutSubmitter) {
        let (tx, tasks) = unbounded();
        let display_loop = Self {
            manager,
            outputs,
            tasks,
        };
        (display_loop, LayoutSubmitter { tx })
    }

    /// Process every queued layout, in order, without blocking
    ///
    /// Returns the number of tasks processed.
    ///
    /// # Errors
    ///
    /// Stops at the first internal invariant violation and returns it;
    /// remaining tasks stay queued.
    pub fn dispatch_pending(&mut self) -> Result<usize, LayoutError> {
        let mut processed = 0;
        loop {
            match self.tasks.try_recv() {
                Ok(task) => {
                    self.process(task)?;
                    processed += 1;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        Ok(processed)
    }

    /// Process layouts until every submitter is dropped
    ///
    /// # Errors
    ///
    /// Returns the first internal invariant violation.
    pub fn run(&mut self) -> Result<(), LayoutError> {
        info!("Display loop started");
        while let Ok(task) = self.tasks.recv() {
            self.process(task)?;
        }
        info!("Display loop finished: all submitters closed");
        Ok(())
    }

    fn process(&mut self, task: LayoutTask) -> Result<(), LayoutError> {
        let result = self.manager.apply_layout(&task.message, &mut self.outputs);

        let fatal = match &result {
            Err(e) if e.is_fatal_internal() => {
                error!("Fatal layout error, stopping display loop: {}", e);
                Some(e.clone())
            }
            _ => None,
        };

        if let Some(reply) = task.reply {
            if reply.send(result).is_err() {
                debug!("Layout requester went away before the reply");
            }
        } else if let Err(e) = result {
            warn!("Posted layout failed: {}", e);
        }

        match fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Monitor manager (main loop thread only)
    pub fn manager(&self) -> &MonitorManager {
        &self.manager
    }

    /// Compositor outputs
    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    /// Destroy all heads and hand back the parts
    pub fn shutdown(mut self) -> (MonitorManager, O) {
        self.manager.shutdown(&mut self.outputs);
        (self.manager, self.outputs)
    }
}
