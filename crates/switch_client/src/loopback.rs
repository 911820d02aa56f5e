//! In-process link: notifications are fed by hand instead of read from a socket.

use crossbeam_channel::{unbounded, Receiver, Sender};
use shared::{domain::ClientRole, protocol::ClientRequest};

use crate::{queue::NotificationQueue, ControllerEvents, ControllerLink, LinkClosed, Notification};

pub struct LocalLink {
    role: ClientRole,
    queue: NotificationQueue,
    requests: Sender<ClientRequest>,
}

/// The controller end of a [`LocalLink`].
#[derive(Clone)]
pub struct LocalFeed {
    sender: Sender<Notification>,
    requests: Receiver<ClientRequest>,
}

pub fn local_link(role: ClientRole) -> (LocalLink, LocalFeed) {
    let (sender, receiver) = unbounded();
    let (request_tx, request_rx) = unbounded();
    (
        LocalLink {
            role,
            queue: NotificationQueue::new(receiver),
            requests: request_tx,
        },
        LocalFeed {
            sender,
            requests: request_rx,
        },
    )
}

impl LocalFeed {
    /// Returns `false` once the link side has been dropped.
    pub fn send(&self, notification: Notification) -> bool {
        self.sender.send(notification).is_ok()
    }

    pub fn close(&self, reason: Option<String>) -> bool {
        self.send(Notification::ConnectionClosed(reason))
    }

    /// Requests the link has queued so far, oldest first.
    pub fn take_requests(&self) -> Vec<ClientRequest> {
        self.requests.try_iter().collect()
    }
}

impl ControllerLink for LocalLink {
    fn role(&self) -> ClientRole {
        self.role
    }

    fn pump(&mut self, events: &mut dyn ControllerEvents) -> usize {
        self.queue.pump(events)
    }

    fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    fn request(&mut self, request: ClientRequest) -> Result<(), LinkClosed> {
        if self.queue.is_closed() {
            return Err(LinkClosed);
        }
        self.requests.send(request).map_err(|_| LinkClosed)
    }

    fn disconnect(&mut self) {
        self.queue.close();
    }
}
