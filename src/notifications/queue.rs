use std::collections::VecDeque;
use std::future::IntoFuture;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::notifications::history::{NotificationHistory, NotificationStatus};
use crate::notifications::request::{
    NotificationDuration, NotificationId, NotificationRequest, NotificationResult,
};

#[derive(Debug, Clone)]
pub struct NotificationQueueConfig {
    pub short_duration: Duration,
    pub long_duration: Duration,
    pub max_records: usize,
}

impl Default for NotificationQueueConfig {
    fn default() -> Self {
        Self {
            short_duration: Duration::from_millis(4000),
            long_duration: Duration::from_millis(10000),
            max_records: 1000,
        }
    }
}

impl NotificationQueueConfig {
    pub fn timeout_for(&self, duration: NotificationDuration) -> Option<Duration> {
        match duration {
            NotificationDuration::Short => Some(self.short_duration),
            NotificationDuration::Long => Some(self.long_duration),
            NotificationDuration::Indefinite => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveNotification {
    pub id: NotificationId,
    pub request: NotificationRequest,
    pub shown_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostState {
    pub active: Option<ActiveNotification>,
    pub pending: usize,
}

#[derive(Debug)]
enum Command {
    Enqueue(QueueItem),
    Dismiss(NotificationId),
    InvokeAction(NotificationId),
    Cancel(NotificationId),
}

#[derive(Debug)]
struct QueueItem {
    id: NotificationId,
    request: NotificationRequest,
    reply: Option<oneshot::Sender<NotificationResult>>,
    cancel: CancellationToken,
    done: CancellationToken,
}

impl QueueItem {
    fn is_abandoned(&self) -> bool {
        self.cancel.is_cancelled() || self.reply.as_ref().is_some_and(|reply| reply.is_closed())
    }
}

enum Event {
    CallerGone,
    TimerElapsed,
    Command(Option<Command>),
}

/// Cheap to clone. When the last handle is dropped the worker cancels
/// everything it still holds and exits.
#[derive(Debug, Clone)]
pub struct NotificationHost {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<HostState>,
    history: NotificationHistory,
}

#[derive(Debug)]
pub struct NotificationWorker {
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<HostState>,
    history: NotificationHistory,
    config: NotificationQueueConfig,
    pending: VecDeque<QueueItem>,
}

/// Dropping it before resolution cancels the notification.
#[derive(Debug)]
pub struct PendingNotification {
    id: NotificationId,
    receiver: oneshot::Receiver<NotificationResult>,
    cancel: CancellationToken,
    guard: DropGuard,
}

impl PendingNotification {
    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub async fn result(self) -> NotificationResult {
        let Self {
            receiver,
            cancel,
            guard: _guard,
            ..
        } = self;
        tokio::select! {
            biased;
            result = receiver => result.unwrap_or(NotificationResult::Cancelled),
            _ = cancel.cancelled() => NotificationResult::Cancelled,
        }
    }
}

impl IntoFuture for PendingNotification {
    type Output = NotificationResult;
    type IntoFuture = BoxFuture<'static, NotificationResult>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.result())
    }
}

impl NotificationHost {
    pub fn new(config: NotificationQueueConfig) -> (Self, NotificationWorker) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(HostState::default());
        let history = NotificationHistory::new(config.max_records);
        let host = Self {
            commands: command_tx,
            state: state_rx,
            history: history.clone(),
        };
        let worker = NotificationWorker {
            commands: command_rx,
            state: state_tx,
            history,
            config,
            pending: VecDeque::new(),
        };
        (host, worker)
    }

    pub fn spawn(config: NotificationQueueConfig) -> Self {
        let (host, worker) = Self::new(config);
        tokio::spawn(worker.run());
        host
    }

    pub fn enqueue(&self, request: NotificationRequest) -> PendingNotification {
        self.enqueue_with_cancel(request, CancellationToken::new())
    }

    /// Cancelling `cancel` resolves the caller with `Cancelled` and removes the
    /// notification from the surface or the backlog.
    pub fn enqueue_with_cancel(
        &self,
        request: NotificationRequest,
        cancel: CancellationToken,
    ) -> PendingNotification {
        let (reply_tx, reply_rx) = oneshot::channel();
        // Child token: dropping the pending future cancels only this request.
        let cancel = cancel.child_token();
        let done = CancellationToken::new();
        let id = self.submit(request, Some(reply_tx), cancel.clone(), done.clone());
        self.watch_cancellation(id, cancel.clone(), done);
        PendingNotification {
            id,
            receiver: reply_rx,
            guard: cancel.clone().drop_guard(),
            cancel,
        }
    }

    pub fn enqueue_detached(&self, request: NotificationRequest) -> NotificationId {
        self.submit(
            request,
            None,
            CancellationToken::new(),
            CancellationToken::new(),
        )
    }

    pub async fn show(
        &self,
        message: impl Into<String>,
        action_label: Option<String>,
        duration: NotificationDuration,
    ) -> NotificationResult {
        let request = NotificationRequest {
            message: message.into(),
            action_label,
            duration,
        };
        self.enqueue(request).await
    }

    /// Dismisses the notification visible right now. If it resolves before the
    /// worker sees the request, nothing else is dismissed.
    pub fn dismiss(&self) {
        if let Some(id) = self.active_id() {
            self.dismiss_notification(id);
        }
    }

    pub fn dismiss_notification(&self, id: NotificationId) {
        let _ = self.commands.send(Command::Dismiss(id));
    }

    pub fn invoke_action(&self) {
        if let Some(id) = self.active_id() {
            self.invoke_action_on(id);
        }
    }

    pub fn invoke_action_on(&self, id: NotificationId) {
        let _ = self.commands.send(Command::InvokeAction(id));
    }

    pub fn state(&self) -> HostState {
        self.state.borrow().clone()
    }

    pub fn active(&self) -> Option<ActiveNotification> {
        self.state.borrow().active.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HostState> {
        self.state.clone()
    }

    pub fn history(&self) -> &NotificationHistory {
        &self.history
    }

    fn active_id(&self) -> Option<NotificationId> {
        self.state.borrow().active.as_ref().map(|active| active.id)
    }

    fn submit(
        &self,
        request: NotificationRequest,
        reply: Option<oneshot::Sender<NotificationResult>>,
        cancel: CancellationToken,
        done: CancellationToken,
    ) -> NotificationId {
        let id = NotificationId::new();
        self.history.insert(id, &request);
        let item = QueueItem {
            id,
            request,
            reply,
            cancel,
            done,
        };
        if self.commands.send(Command::Enqueue(item)).is_err() {
            // Worker is gone; dropping the reply resolves the caller.
            self.history.record_status(id, NotificationStatus::Cancelled);
            tracing::warn!(
                event = "notification_dropped",
                notification_id = %id,
                "notification worker not running"
            );
        }
        id
    }

    /// Tells the worker when a caller gives up so a queued request leaves the
    /// backlog right away. Holds only a weak sender so it never keeps the
    /// worker alive.
    fn watch_cancellation(
        &self,
        id: NotificationId,
        cancel: CancellationToken,
        done: CancellationToken,
    ) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let commands = self.commands.downgrade();
        runtime.spawn(async move {
            tokio::select! {
                _ = done.cancelled() => {}
                _ = cancel.cancelled() => {
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands.send(Command::Cancel(id));
                    }
                }
            }
        });
    }
}

impl NotificationWorker {
    pub async fn run(mut self) {
        tracing::debug!(event = "notification_worker_started", "notification worker started");
        loop {
            let Some(item) = self.pending.pop_front() else {
                match self.commands.recv().await {
                    Some(command) => {
                        self.handle_idle(command);
                        continue;
                    }
                    None => break,
                }
            };
            if item.is_abandoned() {
                self.publish(None);
                self.finish(item, NotificationResult::Cancelled);
                continue;
            }
            let host_closed = self.present(item).await;
            if host_closed {
                break;
            }
        }
        self.shutdown();
    }

    fn handle_idle(&mut self, command: Command) {
        match command {
            Command::Enqueue(item) => self.pending.push_back(item),
            Command::Cancel(_) => self.drop_abandoned(),
            Command::Dismiss(_) | Command::InvokeAction(_) => {
                tracing::debug!(
                    event = "notification_noop",
                    "no active notification to resolve"
                );
            }
        }
    }

    /// Returns `true` once every host handle has been dropped.
    async fn present(&mut self, mut item: QueueItem) -> bool {
        let timeout = self.config.timeout_for(item.request.duration);
        self.history.record_status(item.id, NotificationStatus::Active);
        self.publish(Some(ActiveNotification {
            id: item.id,
            request: item.request.clone(),
            shown_at: chrono::Utc::now(),
        }));
        tracing::debug!(
            event = "notification_status",
            notification_id = %item.id,
            duration = ?item.request.duration,
            pending = self.pending.len(),
            "notification active"
        );

        let timer = tokio::time::sleep(timeout.unwrap_or_default());
        tokio::pin!(timer);
        let mut host_closed = false;

        let result = loop {
            let event = tokio::select! {
                biased;
                _ = item.cancel.cancelled() => Event::CallerGone,
                _ = caller_gone(&mut item.reply) => Event::CallerGone,
                _ = &mut timer, if timeout.is_some() => Event::TimerElapsed,
                command = self.commands.recv() => Event::Command(command),
            };
            match event {
                Event::CallerGone => break NotificationResult::Cancelled,
                Event::TimerElapsed => break NotificationResult::TimedOut,
                Event::Command(None) => {
                    host_closed = true;
                    break NotificationResult::Cancelled;
                }
                Event::Command(Some(Command::Enqueue(next))) => {
                    self.pending.push_back(next);
                    self.state.send_modify(|state| state.pending = self.pending.len());
                }
                Event::Command(Some(Command::Cancel(id))) => {
                    if id == item.id {
                        break NotificationResult::Cancelled;
                    }
                    self.drop_abandoned();
                }
                Event::Command(Some(Command::Dismiss(id))) => {
                    if id == item.id {
                        break NotificationResult::Dismissed;
                    }
                    tracing::debug!(
                        event = "notification_noop",
                        notification_id = %id,
                        "dismiss targeted an inactive notification"
                    );
                }
                Event::Command(Some(Command::InvokeAction(id))) => {
                    if id == item.id && item.request.has_action() {
                        break NotificationResult::ActionInvoked;
                    }
                    tracing::debug!(
                        event = "notification_noop",
                        notification_id = %id,
                        "action ignored"
                    );
                }
            }
        };

        self.finish(item, result);
        self.publish(None);
        host_closed
    }

    fn drop_abandoned(&mut self) {
        let (abandoned, kept): (VecDeque<_>, VecDeque<_>) = self
            .pending
            .drain(..)
            .partition(|item| item.is_abandoned());
        self.pending = kept;
        if abandoned.is_empty() {
            return;
        }
        for item in abandoned {
            self.finish(item, NotificationResult::Cancelled);
        }
        self.state.send_modify(|state| state.pending = self.pending.len());
    }

    fn finish(&self, item: QueueItem, result: NotificationResult) {
        if let Some(record) = self.history.record_status(item.id, result.into()) {
            tracing::debug!(
                event = "notification_status",
                notification_id = %record.id,
                status = ?record.status,
                "notification resolved"
            );
        }
        item.done.cancel();
        if let Some(reply) = item.reply {
            let _ = reply.send(result);
        }
    }

    fn publish(&self, active: Option<ActiveNotification>) {
        self.state.send_replace(HostState {
            active,
            pending: self.pending.len(),
        });
    }

    fn shutdown(&mut self) {
        let abandoned: Vec<QueueItem> = self.pending.drain(..).collect();
        if !abandoned.is_empty() {
            tracing::warn!(
                event = "notification_worker_stopped",
                cancelled = abandoned.len(),
                "host dropped with notifications still queued"
            );
        }
        for item in abandoned {
            self.finish(item, NotificationResult::Cancelled);
        }
        self.publish(None);
    }
}

async fn caller_gone(reply: &mut Option<oneshot::Sender<NotificationResult>>) {
    match reply {
        Some(reply) => reply.closed().await,
        None => std::future::pending().await,
    }
}
