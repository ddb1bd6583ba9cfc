use std::time::Duration;

use crate::notifications::queue::{
    HostState, NotificationHost, NotificationQueueConfig, NotificationWorker,
};
use crate::notifications::request::{NotificationDuration, NotificationId, NotificationRequest};

pub const MAX_TOAST_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastLength {
    #[default]
    Short,
    Long,
}

#[derive(Debug, Clone)]
pub struct ToastConfig {
    pub short_duration: Duration,
    pub long_duration: Duration,
    pub max_records: usize,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            short_duration: Duration::from_millis(2000),
            long_duration: Duration::from_millis(3500),
            max_records: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToastHost {
    host: NotificationHost,
}

impl ToastHost {
    pub fn new(config: ToastConfig) -> (Self, NotificationWorker) {
        let (host, worker) = NotificationHost::new(NotificationQueueConfig {
            short_duration: config.short_duration,
            long_duration: config.long_duration,
            max_records: config.max_records,
        });
        (Self { host }, worker)
    }

    pub fn spawn(config: ToastConfig) -> Self {
        let (toasts, worker) = Self::new(config);
        tokio::spawn(worker.run());
        toasts
    }

    pub fn show(&self, message: &str, length: ToastLength) -> NotificationId {
        let duration = match length {
            ToastLength::Short => NotificationDuration::Short,
            ToastLength::Long => NotificationDuration::Long,
        };
        let request = NotificationRequest::new(clamp_lines(message, MAX_TOAST_LINES))
            .with_duration(duration);
        self.host.enqueue_detached(request)
    }

    pub fn state(&self) -> HostState {
        self.host.state()
    }

    pub fn host(&self) -> &NotificationHost {
        &self.host
    }

    pub fn into_host(self) -> NotificationHost {
        self.host
    }
}

fn clamp_lines(message: &str, max_lines: usize) -> String {
    message.lines().take(max_lines).collect::<Vec<_>>().join("\n")
}
