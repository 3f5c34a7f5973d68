//! Redraw notification.

use std::sync::mpsc::{Receiver, Sender, channel};

/// Payload-free "the document changed, repaint" event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawEvent;

/// Fan-out of redraw events to any number of listeners.
#[derive(Debug, Default)]
pub struct RedrawSignal {
    listeners: Vec<Sender<RedrawEvent>>,
}

impl RedrawSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<RedrawEvent> {
        let (tx, rx) = channel();
        self.listeners.push(tx);
        rx
    }

    /// Notify every listener, pruning disconnected ones.
    pub fn notify(&mut self) {
        self.listeners.retain(|tx| tx.send(RedrawEvent).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

/// Drain pending events without blocking. Returns how many were queued.
pub fn drain(rx: &Receiver<RedrawEvent>) -> usize {
    rx.try_iter().count()
}
