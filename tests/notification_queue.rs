use std::sync::{Arc, Mutex};
use std::time::Duration;

use snackbar::notifications::{
    HostState, NotificationDuration, NotificationHost, NotificationId, NotificationQueueConfig,
    NotificationRequest, NotificationResult, NotificationStatus,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const SHORT: Duration = Duration::from_millis(100);
const LONG: Duration = Duration::from_millis(300);

fn test_host() -> NotificationHost {
    NotificationHost::spawn(NotificationQueueConfig {
        short_duration: SHORT,
        long_duration: LONG,
        max_records: 100,
    })
}

/// Collects the id of every notification that becomes active, in order.
fn record_activations(host: &NotificationHost) -> (Arc<Mutex<Vec<NotificationId>>>, JoinHandle<()>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut state = host.subscribe();
    let sink = Arc::clone(&seen);
    let task = tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let active = state.borrow_and_update().active.as_ref().map(|active| active.id);
            if let Some(id) = active {
                let mut seen = sink.lock().unwrap();
                if seen.last() != Some(&id) {
                    seen.push(id);
                }
            }
        }
    });
    (seen, task)
}

async fn wait_active(mut state: watch::Receiver<HostState>, id: NotificationId) {
    state
        .wait_for(|state| state.active.as_ref().is_some_and(|active| active.id == id))
        .await
        .expect("host state");
}

#[tokio::test(start_paused = true)]
async fn short_notifications_time_out_in_enqueue_order() {
    let host = test_host();
    let (seen, _recorder) = record_activations(&host);
    let started = Instant::now();

    let a = host.enqueue(NotificationRequest::new("A"));
    let b = host.enqueue(NotificationRequest::new("B"));
    let ids = vec![a.id(), b.id()];

    let (a, b) = tokio::join!(a.result(), b.result());
    assert_eq!(a, NotificationResult::TimedOut);
    assert_eq!(b, NotificationResult::TimedOut);
    assert!(started.elapsed() >= SHORT * 2);
    assert_eq!(*seen.lock().unwrap(), ids);
}

#[tokio::test(start_paused = true)]
async fn presentation_order_matches_enqueue_order() {
    let host = test_host();
    let (seen, _recorder) = record_activations(&host);

    let pending: Vec<_> = (0..5)
        .map(|index| {
            let duration = if index % 2 == 0 {
                NotificationDuration::Short
            } else {
                NotificationDuration::Long
            };
            host.enqueue(NotificationRequest::new(format!("message {index}")).with_duration(duration))
        })
        .collect();
    let ids: Vec<_> = pending.iter().map(|pending| pending.id()).collect();

    for pending in pending {
        assert_eq!(pending.await, NotificationResult::TimedOut);
    }
    assert_eq!(*seen.lock().unwrap(), ids);
}

#[tokio::test(start_paused = true)]
async fn long_notification_outlasts_short_timeout() {
    let host = test_host();
    let pending = host.enqueue(NotificationRequest::new("slow").with_duration(NotificationDuration::Long));
    let id = pending.id();
    wait_active(host.subscribe(), id).await;

    tokio::time::sleep(SHORT * 2).await;
    assert_eq!(host.active().map(|active| active.id), Some(id));
    assert_eq!(pending.await, NotificationResult::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn first_request_activates_immediately() {
    let host = test_host();
    let started = Instant::now();
    let pending = host.enqueue(NotificationRequest::new("now"));

    wait_active(host.subscribe(), pending.id()).await;
    assert!(started.elapsed() < SHORT);
    assert_eq!(host.state().pending, 0);
}

#[tokio::test(start_paused = true)]
async fn backlog_size_is_published() {
    let host = test_host();
    let first = host.enqueue(NotificationRequest::new("first"));
    wait_active(host.subscribe(), first.id()).await;
    let _second = host.enqueue(NotificationRequest::new("second"));
    let _third = host.enqueue(NotificationRequest::new("third"));

    let mut state = host.subscribe();
    let state = state
        .wait_for(|state| state.pending == 2)
        .await
        .expect("host state")
        .clone();
    assert_eq!(state.active.map(|active| active.id), Some(first.id()));
}

#[tokio::test(start_paused = true)]
async fn indefinite_notification_resolves_only_through_its_action() {
    let host = test_host();
    let pending = host.enqueue(
        NotificationRequest::new("A")
            .with_action("OK")
            .with_duration(NotificationDuration::Indefinite),
    );
    let id = pending.id();
    wait_active(host.subscribe(), id).await;

    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(host.active().map(|active| active.id), Some(id));

    host.invoke_action();
    assert_eq!(pending.await, NotificationResult::ActionInvoked);
    assert_eq!(
        host.history().get(&id).map(|record| record.status),
        Some(NotificationStatus::ActionInvoked)
    );
}

#[tokio::test(start_paused = true)]
async fn action_without_label_is_ignored() {
    let host = test_host();
    let pending =
        host.enqueue(NotificationRequest::new("plain").with_duration(NotificationDuration::Indefinite));
    let id = pending.id();
    wait_active(host.subscribe(), id).await;

    host.invoke_action();
    tokio::time::sleep(LONG * 10).await;
    assert_eq!(host.active().map(|active| active.id), Some(id));

    host.dismiss();
    assert_eq!(pending.await, NotificationResult::Dismissed);
}

#[tokio::test(start_paused = true)]
async fn dismissing_an_inactive_notification_is_a_noop() {
    let host = test_host();
    let a = host.enqueue(NotificationRequest::new("A").with_duration(NotificationDuration::Indefinite));
    let b = host.enqueue(NotificationRequest::new("B"));
    let (a_id, b_id) = (a.id(), b.id());
    wait_active(host.subscribe(), a_id).await;

    host.dismiss_notification(b_id);
    host.invoke_action_on(b_id);
    tokio::time::sleep(LONG).await;
    assert_eq!(host.active().map(|active| active.id), Some(a_id));

    host.dismiss_notification(a_id);
    assert_eq!(a.await, NotificationResult::Dismissed);
    wait_active(host.subscribe(), b_id).await;
    host.dismiss_notification(a_id);
    assert_eq!(b.await, NotificationResult::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn dismiss_with_nothing_active_does_not_leak_into_next_request() {
    let host = test_host();
    host.dismiss();
    host.invoke_action();

    let result = host
        .show("later", Some("Undo".to_string()), NotificationDuration::Short)
        .await;
    assert_eq!(result, NotificationResult::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn request_from_torn_down_caller_is_cancelled_and_skipped() {
    let host = test_host();
    let (seen, _recorder) = record_activations(&host);
    let token = CancellationToken::new();
    token.cancel();

    let a = host.enqueue_with_cancel(NotificationRequest::new("A"), token);
    let b = host.enqueue(NotificationRequest::new("B"));
    let (a_id, b_id) = (a.id(), b.id());

    assert_eq!(a.await, NotificationResult::Cancelled);
    assert_eq!(b.await, NotificationResult::TimedOut);
    assert_eq!(*seen.lock().unwrap(), vec![b_id]);
    assert_eq!(
        host.history().get(&a_id).map(|record| record.status),
        Some(NotificationStatus::Cancelled)
    );
}

#[tokio::test(start_paused = true)]
async fn cancelling_the_active_caller_advances_the_queue() {
    let host = test_host();
    let token = CancellationToken::new();
    let a = host.enqueue_with_cancel(
        NotificationRequest::new("A").with_duration(NotificationDuration::Indefinite),
        token.clone(),
    );
    let b = host.enqueue(NotificationRequest::new("B"));
    wait_active(host.subscribe(), a.id()).await;

    token.cancel();
    assert_eq!(a.await, NotificationResult::Cancelled);
    assert_eq!(b.await, NotificationResult::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_queued_caller_resolves_it_without_waiting() {
    let host = test_host();
    let first = host.enqueue(NotificationRequest::new("first").with_duration(NotificationDuration::Indefinite));
    let token = CancellationToken::new();
    let queued = host.enqueue_with_cancel(NotificationRequest::new("queued"), token.clone());
    wait_active(host.subscribe(), first.id()).await;

    token.cancel();
    assert_eq!(queued.await, NotificationResult::Cancelled);
    assert_eq!(host.active().map(|active| active.id), Some(first.id()));

    host.dismiss();
    assert_eq!(first.await, NotificationResult::Dismissed);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_pending_future_frees_the_surface() {
    let host = test_host();
    let a = host.enqueue(NotificationRequest::new("A").with_duration(NotificationDuration::Indefinite));
    let a_id = a.id();
    let b = host.enqueue(NotificationRequest::new("B"));
    wait_active(host.subscribe(), a_id).await;

    drop(a);
    assert_eq!(b.await, NotificationResult::TimedOut);
    assert_eq!(
        host.history().get(&a_id).map(|record| record.status),
        Some(NotificationStatus::Cancelled)
    );
}

#[tokio::test(start_paused = true)]
async fn detached_requests_still_run_to_their_timeout() {
    let host = test_host();
    let id = host.enqueue_detached(NotificationRequest::new("fire and forget"));
    let after = host.enqueue(NotificationRequest::new("after"));

    assert_eq!(after.await, NotificationResult::TimedOut);
    assert_eq!(
        host.history().get(&id).map(|record| record.status),
        Some(NotificationStatus::TimedOut)
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_every_host_handle_cancels_outstanding_requests() {
    let host = test_host();
    let a = host.enqueue(NotificationRequest::new("A").with_duration(NotificationDuration::Indefinite));
    let b = host.enqueue(NotificationRequest::new("B"));
    wait_active(host.subscribe(), a.id()).await;

    drop(host);
    assert_eq!(a.await, NotificationResult::Cancelled);
    assert_eq!(b.await, NotificationResult::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_never_share_the_surface() {
    let host = test_host();
    let mut state = host.subscribe();
    let watcher = tokio::spawn(async move {
        let mut activations = 0usize;
        let mut last = None;
        while state.changed().await.is_ok() {
            let active = state.borrow_and_update().active.as_ref().map(|active| active.id);
            if active.is_some() && active != last {
                activations += 1;
            }
            last = active;
        }
        activations
    });

    let callers: Vec<_> = (0..8)
        .map(|index| {
            let host = host.clone();
            tokio::spawn(async move {
                host.show(format!("caller {index}"), None, NotificationDuration::Short)
                    .await
            })
        })
        .collect();
    let started = Instant::now();
    for caller in callers {
        assert_eq!(caller.await.unwrap(), NotificationResult::TimedOut);
    }
    // Serialized presentation means eight full short intervals.
    assert!(started.elapsed() >= SHORT * 8);

    drop(host);
    assert_eq!(watcher.await.unwrap(), 8);
}

#[tokio::test(start_paused = true)]
async fn dismiss_pressed_on_a_resolving_notification_spares_the_next_one() {
    let host = test_host();
    let a = host.enqueue(NotificationRequest::new("A").with_action("OK"));
    let b = host.enqueue(NotificationRequest::new("B").with_duration(NotificationDuration::Indefinite));
    let (a_id, b_id) = (a.id(), b.id());
    wait_active(host.subscribe(), a_id).await;

    // Both presses target A; the first resolves it, so the second must not
    // reach B.
    host.invoke_action();
    host.dismiss();
    assert_eq!(a.await, NotificationResult::ActionInvoked);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(host.active().map(|active| active.id), Some(b_id));
    assert_eq!(
        host.history().get(&b_id).map(|record| record.status),
        Some(NotificationStatus::Active)
    );

    host.dismiss();
    assert_eq!(b.await, NotificationResult::Dismissed);
}

#[tokio::test(start_paused = true)]
async fn abandoned_requests_leave_the_backlog_immediately() {
    let host = test_host();
    let first = host.enqueue(NotificationRequest::new("first").with_duration(NotificationDuration::Indefinite));
    wait_active(host.subscribe(), first.id()).await;

    let mut abandoned = Vec::new();
    for index in 0..100 {
        let request = NotificationRequest::new(format!("queued {index}"));
        if index % 2 == 0 {
            let token = CancellationToken::new();
            let pending = host.enqueue_with_cancel(request, token.clone());
            abandoned.push(pending.id());
            token.cancel();
            assert_eq!(pending.await, NotificationResult::Cancelled);
        } else {
            let pending = host.enqueue(request);
            abandoned.push(pending.id());
            drop(pending);
        }
    }

    tokio::time::sleep(Duration::from_secs(3600)).await;
    let state = host.state();
    assert_eq!(state.pending, 0);
    assert_eq!(state.active.map(|active| active.id), Some(first.id()));
    for id in &abandoned {
        assert_eq!(
            host.history().get(id).map(|record| record.status),
            Some(NotificationStatus::Cancelled)
        );
    }

    let kept = host.enqueue(NotificationRequest::new("kept"));
    host.dismiss();
    assert_eq!(first.await, NotificationResult::Dismissed);
    assert_eq!(kept.await, NotificationResult::TimedOut);
}
