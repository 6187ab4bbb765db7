//! Feedback port: fan-out of feedback frames to every connected observer.

use iopanel_domain::feedback::FeedbackMessage;

/// Delivers feedback frames to all currently live observers.
///
/// Delivery is best-effort and must never block: an observer that cannot
/// accept the frame right away is skipped (and may be dropped), it never
/// stalls the caller.
pub trait FeedbackPublisher: Send + Sync {
    /// Deliver `frame` to every live observer.
    ///
    /// Returns the number of observers the frame was handed to.
    fn publish(&self, frame: &FeedbackMessage) -> usize;
}

impl<T: FeedbackPublisher + ?Sized> FeedbackPublisher for std::sync::Arc<T> {
    fn publish(&self, frame: &FeedbackMessage) -> usize {
        (**self).publish(frame)
    }
}
