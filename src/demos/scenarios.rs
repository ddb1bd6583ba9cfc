use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::demos::presenter::{LogPresenter, attach};
use crate::notifications::{
    AutoClearSlot, HostState, NotificationDuration, NotificationHost, NotificationId,
    NotificationRequest, ToastHost, ToastLength,
};

pub async fn toast(config: &Config) -> anyhow::Result<()> {
    let toasts = ToastHost::spawn(config.toast_config());
    let presenter = attach(toasts.host().subscribe(), LogPresenter::new("toast"));

    let id = toasts.show("Toast message", ToastLength::Short);
    wait_resolved(toasts.host().subscribe(), id).await;

    close(toasts.into_host(), presenter).await
}

pub async fn persistent(config: &Config) -> anyhow::Result<()> {
    let host = NotificationHost::spawn(config.queue_config());
    let presenter = attach(host.subscribe(), LogPresenter::new("snackbar"));

    let pending = host.enqueue(
        NotificationRequest::new("Snackbar message").with_duration(NotificationDuration::Indefinite),
    );
    tokio::time::sleep(config.slot_ttl()).await;
    tracing::info!(event = "demo_input", "hide pressed");
    host.dismiss();
    let result = pending.await;
    tracing::info!(event = "demo_result", result = ?result, "persistent snackbar resolved");

    close(host, presenter).await
}

pub async fn auto_clear(config: &Config) -> anyhow::Result<()> {
    let slot = AutoClearSlot::<String>::new(config.slot_ttl());
    let started = tokio::time::Instant::now();

    slot.set("Snackbar message 1".to_string());
    tracing::info!(event = "demo_input", value = ?slot.get(), "slot set");
    tokio::time::sleep(slot.ttl() / 2).await;
    slot.set("Text message 2".to_string());
    tracing::info!(event = "demo_input", value = ?slot.get(), "slot replaced, timer restarted");

    let mut values = slot.subscribe();
    values
        .wait_for(Option::is_none)
        .await
        .context("auto-clear slot closed")?;
    tracing::info!(
        event = "demo_result",
        elapsed_ms = started.elapsed().as_millis() as u64,
        "slot cleared"
    );
    Ok(())
}

pub async fn host(config: &Config) -> anyhow::Result<()> {
    let host = NotificationHost::spawn(config.queue_config());
    let presenter = attach(host.subscribe(), LogPresenter::new("snackbar"));

    let timed = host.enqueue(NotificationRequest::new("Timed snackbar"));
    let feedback = host.enqueue(
        NotificationRequest::new("Snackbar with feedback")
            .with_action("Accept")
            .with_duration(NotificationDuration::Indefinite),
    );

    let clicker = {
        let host = host.clone();
        let id = feedback.id();
        let delay = config.slot_ttl();
        tokio::spawn(async move {
            wait_active(host.subscribe(), id).await;
            tokio::time::sleep(delay).await;
            tracing::info!(event = "demo_input", "action pressed");
            host.invoke_action_on(id);
        })
    };

    let (timed, feedback) = tokio::join!(timed.result(), feedback.result());
    clicker.await?;
    tracing::info!(
        event = "demo_result",
        timed = ?timed,
        feedback = ?feedback,
        "queued snackbars resolved"
    );

    close(host, presenter).await
}

pub async fn scaffold(config: &Config) -> anyhow::Result<()> {
    let host = NotificationHost::spawn(config.queue_config());
    let presenter = attach(host.subscribe(), LogPresenter::new("scaffold"));

    let event = host.enqueue(NotificationRequest::new("Snackbar from event"));

    // Each change of the counter relaunches the effect and cancels the
    // previous one, like a keyed effect in a declarative UI.
    let (clicks_tx, mut clicks_rx) = watch::channel(0u32);
    let effects = {
        let host = host.clone();
        tokio::spawn(async move {
            let mut current: Option<CancellationToken> = None;
            let mut launched: Vec<JoinHandle<()>> = Vec::new();
            while clicks_rx.changed().await.is_ok() {
                let clicks = *clicks_rx.borrow_and_update();
                if let Some(previous) = current.take() {
                    previous.cancel();
                }
                let token = CancellationToken::new();
                current = Some(token.clone());
                let pending = host.enqueue_with_cancel(
                    NotificationRequest::new(format!("Snackbar from state change #{clicks}")),
                    token,
                );
                launched.push(tokio::spawn(async move {
                    let result = pending.await;
                    tracing::info!(event = "demo_result", clicks, result = ?result, "effect finished");
                }));
            }
            for effect in launched {
                let _ = effect.await;
            }
        })
    };

    clicks_tx.send_modify(|clicks| *clicks += 1);
    tokio::time::sleep(Duration::from_millis(50)).await;
    clicks_tx.send_modify(|clicks| *clicks += 1);
    drop(clicks_tx);

    let result = event.await;
    tracing::info!(event = "demo_result", result = ?result, "event snackbar resolved");
    effects.await?;

    close(host, presenter).await
}

async fn wait_active(mut state: watch::Receiver<HostState>, id: NotificationId) {
    let _ = state
        .wait_for(|state| state.active.as_ref().is_some_and(|active| active.id == id))
        .await;
}

async fn wait_resolved(mut state: watch::Receiver<HostState>, id: NotificationId) {
    let _ = state
        .wait_for(|state| state.active.as_ref().is_some_and(|active| active.id == id))
        .await;
    let _ = state
        .wait_for(|state| state.active.as_ref().is_none_or(|active| active.id != id))
        .await;
}

async fn close(host: NotificationHost, presenter: JoinHandle<()>) -> anyhow::Result<()> {
    let history = host.history().clone();
    drop(host);
    presenter.await?;
    let records = serde_json::to_string_pretty(&history.snapshot())?;
    tracing::debug!(event = "demo_history", "{records}");
    Ok(())
}
