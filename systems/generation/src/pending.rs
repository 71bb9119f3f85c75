use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
    time::Duration,
};

use crate::error::GenerationError;

/// Result of a generation job that may still be running on the pool.
///
/// Dropping the handle abandons the result; the worker finishes the job and
/// discards its output.
#[derive(Debug)]
pub struct Pending<T> {
    receiver: Receiver<T>,
}

impl<T> Pending<T> {
    pub(crate) fn channel() -> (Sender<T>, Self) {
        let (sender, receiver) = mpsc::channel();
        (sender, Self { receiver })
    }

    /// Blocks until the job produces its result.
    pub fn wait(self) -> Result<T, GenerationError> {
        self.receiver
            .recv()
            .map_err(|_| GenerationError::Disconnected)
    }

    /// Blocks for at most `timeout` waiting for the result.
    ///
    /// A timed out handle stays usable and can be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, GenerationError> {
        self.receiver
            .recv_timeout(timeout)
            .map_err(|error| match error {
                RecvTimeoutError::Timeout => GenerationError::Timeout,
                RecvTimeoutError::Disconnected => GenerationError::Disconnected,
            })
    }

    /// Returns the result if it is ready without blocking.
    pub fn try_take(&self) -> Result<Option<T>, GenerationError> {
        match self.receiver.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(GenerationError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_sent_value() {
        let (sender, pending) = Pending::channel();
        sender.send(5).expect("receiver alive");
        assert_eq!(pending.wait().expect("value ready"), 5);
    }

    #[test]
    fn reports_timeout_then_value() {
        let (sender, pending) = Pending::channel();
        assert!(matches!(
            pending.wait_timeout(Duration::from_millis(5)),
            Err(GenerationError::Timeout)
        ));
        assert!(matches!(pending.try_take(), Ok(None)));
        sender.send("ready").expect("receiver alive");
        assert!(matches!(pending.try_take(), Ok(Some("ready"))));
    }

    #[test]
    fn dropped_sender_reports_disconnect() {
        let (sender, pending) = Pending::<u8>::channel();
        drop(sender);
        assert!(matches!(
            pending.wait_timeout(Duration::from_millis(5)),
            Err(GenerationError::Disconnected)
        ));
        assert!(matches!(pending.wait(), Err(GenerationError::Disconnected)));
    }
}
