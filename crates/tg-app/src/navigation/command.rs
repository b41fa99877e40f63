//! Deferred engine commands.
//!
//! Listeners must not re-enter the engine while it is notifying. They send a
//! [`TourCommand`] instead; the engine applies queued commands in FIFO order
//! once the current notification has completed.

use std::sync::mpsc;

use tg_core::{StepId, UserLevel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TourCommand {
    Start(Option<StepId>),
    Next,
    Previous,
    Skip,
    Finish,
    Reset,
    GoToStep(StepId),
    SetUserLevel(UserLevel),
}

/// Cloneable handle for queueing commands from listeners or host code.
#[derive(Debug, Clone)]
pub struct TourCommandSender {
    tx: mpsc::Sender<TourCommand>,
}

impl TourCommandSender {
    /// Queue `command`. Returns false once the engine has been dropped.
    pub fn send(&self, command: TourCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

pub(crate) struct CommandQueue {
    tx: mpsc::Sender<TourCommand>,
    rx: mpsc::Receiver<TourCommand>,
}

impl CommandQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> TourCommandSender {
        TourCommandSender {
            tx: self.tx.clone(),
        }
    }

    pub(crate) fn pop(&self) -> Option<TourCommand> {
        self.rx.try_recv().ok()
    }

    /// Discard everything queued so far.
    pub(crate) fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_fifo() {
        let queue = CommandQueue::new();
        let sender = queue.sender();

        assert!(sender.send(TourCommand::Next));
        assert!(sender.send(TourCommand::GoToStep("b".into())));

        assert_eq!(queue.pop(), Some(TourCommand::Next));
        assert_eq!(queue.pop(), Some(TourCommand::GoToStep("b".into())));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn clear_drops_pending_commands() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        sender.send(TourCommand::Reset);
        sender.send(TourCommand::Finish);

        assert_eq!(queue.clear(), 2);
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn sender_reports_dropped_engine() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        drop(queue);

        assert!(!sender.send(TourCommand::Next));
    }
}
