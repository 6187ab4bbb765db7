//! In-process observer hub backed by one bounded tokio [`mpsc`] queue per
//! observer.
//!
//! The hub is the single source of truth for which observers are connected.
//! A frame published while an observer is registered is queued for it, in
//! publish order; a frame published before registration or after removal is
//! never delivered to it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use iopanel_domain::feedback::FeedbackMessage;
use iopanel_domain::id::ObserverId;

use crate::ports::FeedbackPublisher;

/// Shared flag the transport clears once its connection is gone.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the observer as closed; the next sweep removes it.
    pub fn mark_closed(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Receiving end handed to the transport when an observer registers.
#[derive(Debug)]
pub struct ObserverSession {
    pub id: ObserverId,
    pub receiver: mpsc::Receiver<Arc<str>>,
    pub liveness: Liveness,
}

struct ObserverSlot {
    sender: mpsc::Sender<Arc<str>>,
    liveness: Liveness,
}

impl ObserverSlot {
    fn is_dead(&self) -> bool {
        !self.liveness.is_alive() || self.sender.is_closed()
    }
}

/// Fan-out point for feedback frames.
pub struct ObserverHub {
    capacity: usize,
    observers: Mutex<HashMap<ObserverId, ObserverSlot>>,
}

impl ObserverHub {
    /// Create a hub whose per-observer queues hold `capacity` frames.
    ///
    /// A zero capacity is raised to one, the minimum a tokio channel accepts.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            observers: Mutex::new(HashMap::new()),
        }
    }

    fn observers(&self) -> MutexGuard<'_, HashMap<ObserverId, ObserverSlot>> {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a new observer and return its receiving end.
    #[must_use]
    pub fn register(&self) -> ObserverSession {
        let id = ObserverId::new();
        let (sender, receiver) = mpsc::channel(self.capacity);
        let liveness = Liveness::new();
        self.observers().insert(
            id,
            ObserverSlot {
                sender,
                liveness: liveness.clone(),
            },
        );
        ObserverSession {
            id,
            receiver,
            liveness,
        }
    }

    /// Remove an observer. Returns `false` if it was already gone.
    pub fn deregister(&self, id: ObserverId) -> bool {
        self.observers().remove(&id).is_some()
    }

    /// Remove every observer whose transport has closed.
    ///
    /// Returns the ids that were removed.
    pub fn sweep(&self) -> Vec<ObserverId> {
        let mut observers = self.observers();
        let dead: Vec<ObserverId> = observers
            .iter()
            .filter(|(_, slot)| slot.is_dead())
            .map(|(id, _)| *id)
            .collect();
        for id in &dead {
            observers.remove(id);
        }
        dead
    }

    #[must_use]
    pub fn contains(&self, id: ObserverId) -> bool {
        self.observers().contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FeedbackPublisher for ObserverHub {
    fn publish(&self, frame: &FeedbackMessage) -> usize {
        let text: Arc<str> = Arc::from(frame.to_wire());
        let mut observers = self.observers();
        let mut delivered = 0;
        observers.retain(|id, slot| {
            if !slot.liveness.is_alive() {
                return false;
            }
            match slot.sender.try_send(Arc::clone(&text)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(observer = %id, "observer queue full, dropping observer");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(observer = %id, "observer gone, removing");
                    false
                }
            }
        });
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> FeedbackMessage {
        FeedbackMessage::Token(text.to_string())
    }

    #[tokio::test]
    async fn should_deliver_frame_to_every_observer() {
        let hub = ObserverHub::new(8);
        let mut first = hub.register();
        let mut second = hub.register();

        assert_eq!(hub.publish(&token("ON")), 2);

        assert_eq!(&*first.receiver.recv().await.unwrap(), "ON");
        assert_eq!(&*second.receiver.recv().await.unwrap(), "ON");
    }

    #[tokio::test]
    async fn should_preserve_publish_order() {
        let hub = ObserverHub::new(8);
        let mut session = hub.register();
        for text in ["a", "b", "c"] {
            hub.publish(&token(text));
        }
        for expected in ["a", "b", "c"] {
            assert_eq!(&*session.receiver.recv().await.unwrap(), expected);
        }
    }

    #[test]
    fn should_succeed_when_no_observers() {
        let hub = ObserverHub::new(8);
        assert_eq!(hub.publish(&token("ON")), 0);
    }

    #[test]
    fn should_not_deliver_frames_published_before_registration() {
        let hub = ObserverHub::new(8);
        hub.publish(&token("early"));
        let mut session = hub.register();
        assert!(session.receiver.try_recv().is_err());
    }

    #[test]
    fn should_stop_delivering_after_deregistration() {
        let hub = ObserverHub::new(8);
        let first = hub.register();
        let mut second = hub.register();

        assert!(hub.deregister(first.id));
        assert!(!hub.deregister(first.id));
        assert_eq!(hub.publish(&token("OFF")), 1);
        assert_eq!(&*second.receiver.try_recv().unwrap(), "OFF");
    }

    #[test]
    fn should_drop_observer_whose_queue_is_full() {
        let hub = ObserverHub::new(1);
        let slow = hub.register();
        let mut fast = hub.register();

        hub.publish(&token("1"));
        fast.receiver.try_recv().unwrap();
        hub.publish(&token("2"));

        assert!(!hub.contains(slow.id));
        assert!(hub.contains(fast.id));
        assert_eq!(&*fast.receiver.try_recv().unwrap(), "2");
    }

    #[test]
    fn should_remove_observer_whose_receiver_was_dropped() {
        let hub = ObserverHub::new(8);
        let session = hub.register();
        let id = session.id;
        drop(session);

        assert_eq!(hub.publish(&token("ON")), 0);
        assert!(!hub.contains(id));
    }

    #[test]
    fn should_sweep_closed_observers_only() {
        let hub = ObserverHub::new(8);
        let closed = hub.register();
        let open = hub.register();
        closed.liveness.mark_closed();

        assert_eq!(hub.sweep(), vec![closed.id]);
        assert!(hub.contains(open.id));
        assert_eq!(hub.len(), 1);
        assert!(hub.sweep().is_empty());
    }

    #[test]
    fn should_skip_closed_observer_on_publish() {
        let hub = ObserverHub::new(8);
        let mut session = hub.register();
        session.liveness.mark_closed();

        assert_eq!(hub.publish(&token("ON")), 0);
        assert!(session.receiver.try_recv().is_err());
        assert!(hub.is_empty());
    }
}
