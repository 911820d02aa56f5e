use crossbeam_channel::{Receiver, TryRecvError};

use crate::{dispatch, ControllerEvents, Notification};

const WORKER_STOPPED: &str = "controller link worker stopped";

/// Receiving end shared by every link flavour. Fuses after the first close.
pub(crate) struct NotificationQueue {
    receiver: Receiver<Notification>,
    closed: bool,
}

impl NotificationQueue {
    pub(crate) fn new(receiver: Receiver<Notification>) -> Self {
        Self {
            receiver,
            closed: false,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn pump(&mut self, events: &mut dyn ControllerEvents) -> usize {
        let mut delivered = 0;
        while !self.closed {
            match self.receiver.try_recv() {
                Ok(notification) => {
                    if matches!(notification, Notification::ConnectionClosed(_)) {
                        self.closed = true;
                    }
                    dispatch(events, notification);
                    delivered += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    tracing::warn!("notification source vanished without a close notification");
                    dispatch(
                        events,
                        Notification::ConnectionClosed(Some(WORKER_STOPPED.to_string())),
                    );
                    delivered += 1;
                }
            }
        }
        delivered
    }
}
