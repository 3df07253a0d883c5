//! Dispatcher for re-entering the session queue
//!
//! Background tasks (tool invocations, timers, the filesystem watcher) never
//! touch session state. They report back by dispatching an action, which is
//! queued behind everything already waiting and reduced on the session task.

use crate::actions::SessionAction;
use tokio::sync::mpsc::UnboundedSender;

/// Dispatcher for sending actions to the session task
#[derive(Debug, Clone)]
pub struct Dispatcher {
    action_tx: UnboundedSender<SessionAction>,
}

impl Dispatcher {
    pub fn new(action_tx: UnboundedSender<SessionAction>) -> Self {
        Self { action_tx }
    }

    /// Queue an action for the session task
    ///
    /// After shutdown the queue is closed; late results are dropped here.
    pub fn dispatch(&self, action: SessionAction) {
        if let Err(e) = self.action_tx.send(action) {
            log::debug!("Dispatcher: session closed, dropping {:?}", e.0.name());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.action_tx.is_closed()
    }
}
