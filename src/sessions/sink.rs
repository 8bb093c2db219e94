//! Delivery sinks bound to a transport connection.

use crate::error::{FeedError, Result};
use crossbeam_channel::{Sender, TrySendError};

/// Where a session pushes delivered values.
///
/// Implemented by the transport for each connection. An error from
/// `deliver` ends that session only.
pub trait EventSink<T>: Send + 'static {
    /// Push one value to the connection.
    fn deliver(&mut self, event: &T) -> Result<()>;

    /// Called once when the session ends, whatever the reason.
    fn close(&mut self) {}
}

impl<T, F> EventSink<T> for F
where
    F: FnMut(&T) -> Result<()> + Send + 'static,
{
    fn deliver(&mut self, event: &T) -> Result<()> {
        self(event)
    }
}

/// Sink that forwards clones into a bounded channel.
///
/// A full or closed channel is a delivery failure; the sink never blocks.
pub struct ChannelSink<T> {
    sender: Sender<T>,
}

impl<T> ChannelSink<T> {
    pub fn new(sender: Sender<T>) -> Self {
        Self { sender }
    }
}

impl<T: Clone + Send + 'static> EventSink<T> for ChannelSink<T> {
    fn deliver(&mut self, event: &T) -> Result<()> {
        match self.sender.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(FeedError::Delivery("sink buffer full".into())),
            Err(TrySendError::Disconnected(_)) => {
                Err(FeedError::Delivery("connection closed".into()))
            }
        }
    }
}
