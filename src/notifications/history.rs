use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::notifications::request::{
    NotificationDuration, NotificationId, NotificationRequest, NotificationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Active,
    TimedOut,
    ActionInvoked,
    Dismissed,
    Cancelled,
}

impl NotificationStatus {
    pub fn is_resolved(self) -> bool {
        !matches!(self, NotificationStatus::Pending | NotificationStatus::Active)
    }
}

impl From<NotificationResult> for NotificationStatus {
    fn from(result: NotificationResult) -> Self {
        match result {
            NotificationResult::TimedOut => NotificationStatus::TimedOut,
            NotificationResult::ActionInvoked => NotificationStatus::ActionInvoked,
            NotificationResult::Dismissed => NotificationStatus::Dismissed,
            NotificationResult::Cancelled => NotificationStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub message: String,
    pub action_label: Option<String>,
    pub duration: NotificationDuration,
    pub status: NotificationStatus,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NotificationHistory {
    records: Arc<Mutex<Vec<NotificationRecord>>>,
    max_records: usize,
}

impl NotificationHistory {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            max_records,
        }
    }

    pub(crate) fn insert(&self, id: NotificationId, request: &NotificationRequest) {
        let now = chrono::Utc::now();
        let record = NotificationRecord {
            id,
            message: request.message.clone(),
            action_label: request.action_label.clone(),
            duration: request.duration,
            status: NotificationStatus::Pending,
            enqueued_at: now,
            updated_at: now,
        };
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
            prune_records(&mut records, self.max_records);
        }
    }

    pub(crate) fn record_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> Option<NotificationRecord> {
        let mut records = self.records.lock().ok()?;
        let record = records.iter_mut().find(|record| record.id == id)?;
        record.status = status;
        record.updated_at = chrono::Utc::now();
        Some(record.clone())
    }

    pub fn get(&self, id: &NotificationId) -> Option<NotificationRecord> {
        self.records
            .lock()
            .ok()?
            .iter()
            .find(|record| &record.id == id)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<NotificationRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

fn prune_records(records: &mut Vec<NotificationRecord>, max_records: usize) {
    if max_records == 0 {
        records.clear();
        return;
    }
    if records.len() <= max_records {
        return;
    }
    let mut excess = records.len() - max_records;
    records.retain(|record| {
        if excess > 0 && record.status.is_resolved() {
            excess -= 1;
            false
        } else {
            true
        }
    });
    if records.len() > max_records {
        let drop_count = records.len() - max_records;
        records.drain(0..drop_count);
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationHistory, NotificationStatus};
    use crate::notifications::request::{NotificationId, NotificationRequest};

    #[test]
    fn pruning_drops_resolved_records_first() {
        let history = NotificationHistory::new(2);
        let first = NotificationId::new();
        let second = NotificationId::new();
        let third = NotificationId::new();

        history.insert(first, &NotificationRequest::new("first"));
        history.insert(second, &NotificationRequest::new("second"));
        history.record_status(second, NotificationStatus::Dismissed);
        history.insert(third, &NotificationRequest::new("third"));

        let ids: Vec<_> = history.snapshot().iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![first, third]);
    }

    #[test]
    fn pruning_falls_back_to_oldest_when_nothing_resolved() {
        let history = NotificationHistory::new(1);
        let first = NotificationId::new();
        let second = NotificationId::new();
        history.insert(first, &NotificationRequest::new("first"));
        history.insert(second, &NotificationRequest::new("second"));

        assert!(history.get(&first).is_none());
        assert_eq!(
            history.get(&second).map(|record| record.status),
            Some(NotificationStatus::Pending)
        );
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let history = NotificationHistory::new(0);
        history.insert(NotificationId::new(), &NotificationRequest::new("gone"));
        assert!(history.snapshot().is_empty());
    }
}
