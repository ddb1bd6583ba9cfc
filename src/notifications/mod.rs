pub mod history;
pub mod queue;
pub mod request;
pub mod slot;
pub mod toast;

pub use history::{NotificationHistory, NotificationRecord, NotificationStatus};
pub use queue::{
    ActiveNotification, HostState, NotificationHost, NotificationQueueConfig, NotificationWorker,
    PendingNotification,
};
pub use request::{NotificationDuration, NotificationId, NotificationRequest, NotificationResult};
pub use slot::AutoClearSlot;
pub use toast::{ToastConfig, ToastHost, ToastLength};
