use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::notifications::HostState;

pub trait Presenter: Send + Sync + 'static {
    fn render(&self, state: &HostState);
}

#[derive(Debug, Clone)]
pub struct LogPresenter {
    surface: &'static str,
}

impl LogPresenter {
    pub fn new(surface: &'static str) -> Self {
        Self { surface }
    }
}

impl Presenter for LogPresenter {
    fn render(&self, state: &HostState) {
        match &state.active {
            Some(active) => tracing::info!(
                surface = self.surface,
                notification_id = %active.id,
                action = active.request.action_label.as_deref().unwrap_or("-"),
                pending = state.pending,
                "showing \"{}\"",
                active.request.message
            ),
            None => tracing::info!(surface = self.surface, pending = state.pending, "surface empty"),
        }
    }
}

/// Renders each state change until the host's worker stops.
pub fn attach(
    mut state: watch::Receiver<HostState>,
    presenter: impl Presenter,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_active = None;
        while state.changed().await.is_ok() {
            let current = state.borrow_and_update().clone();
            let active_id = current.active.as_ref().map(|active| active.id);
            if active_id != last_active {
                presenter.render(&current);
                last_active = active_id;
            }
        }
    })
}
