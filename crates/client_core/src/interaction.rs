use tracing::warn;

/// Blocking yes/no gate and notification sink supplied by the front-end.
pub trait Interaction: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
    fn notify(&self, message: &str);
}

/// Declines every confirmation and routes notifications to the log.
pub struct HeadlessInteraction;

impl Interaction for HeadlessInteraction {
    fn confirm(&self, message: &str) -> bool {
        warn!(prompt = message, "confirmation declined: no interactive front-end");
        false
    }

    fn notify(&self, message: &str) {
        warn!(notification = message, "user notification");
    }
}
