//! In-process store
//!
//! Selected with a `mem://` URL. Records live for the lifetime of the
//! process. Used for local runs and the HTTP tests.

use tokio::sync::RwLock;

use super::ShoutoutStore;
use crate::error::Result;
use crate::model::{RecipientCount, Shoutout, ShoutoutId};
use crate::query::ShoutoutFilter;

/// Shoutouts kept in insertion order behind an async lock
#[derive(Debug, Default)]
pub struct MemoryShoutoutStore {
    records: RwLock<Vec<Shoutout>>,
}

impl MemoryShoutoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShoutoutStore for MemoryShoutoutStore {
    async fn find(&self, filter: &ShoutoutFilter) -> Result<Vec<Shoutout>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: &ShoutoutId) -> Result<Option<Shoutout>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|s| s.id.as_ref() == Some(id)).cloned())
    }

    async fn top_recipients(&self, limit: i64) -> Result<Vec<RecipientCount>> {
        let records = self.records.read().await;

        // Groups in first-seen order so ties keep a stable order
        let mut counts: Vec<RecipientCount> = Vec::new();
        for record in records.iter() {
            match counts.iter_mut().find(|c| c.recipient == record.to) {
                Some(entry) => entry.count += 1,
                None => counts.push(RecipientCount {
                    recipient: record.to.clone(),
                    count: 1,
                }),
            }
        }

        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(counts)
    }

    async fn insert(&self, shoutout: &Shoutout) -> Result<ShoutoutId> {
        let id = ShoutoutId::new();
        let record = shoutout.clone().with_id(id);
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn delete(&self, id: &ShoutoutId) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.iter().position(|s| s.id.as_ref() == Some(id)) {
            Some(index) => {
                records.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace(&self, id: &ShoutoutId, shoutout: &Shoutout) -> Result<bool> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|s| s.id.as_ref() == Some(id)) {
            Some(slot) => {
                *slot = shoutout.clone().with_id(*id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TOP_RECIPIENTS_LIMIT;

    async fn seeded(pairs: &[(&str, &str)]) -> MemoryShoutoutStore {
        let store = MemoryShoutoutStore::new();
        for (to, from) in pairs {
            store.insert(&Shoutout::new(*to, *from)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_assigns_fresh_id_and_ignores_given_one() {
        let store = MemoryShoutoutStore::new();
        let given = ShoutoutId::new();
        let id = store
            .insert(&Shoutout::new("Alice", "Bob").with_id(given))
            .await
            .unwrap();

        assert_ne!(id, given);
        let stored = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.id, Some(id));
        assert!(store.find_by_id(&given).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_keeps_insertion_order() {
        let store = seeded(&[("Alice", "Bob"), ("Carol", "Alice"), ("Dave", "Erin")]).await;

        let all = store.find(&ShoutoutFilter::All).await.unwrap();
        let recipients: Vec<_> = all.iter().filter_map(|s| s.to.as_deref()).collect();
        assert_eq!(recipients, ["Alice", "Carol", "Dave"]);

        let alice = store
            .find(&ShoutoutFilter::Participant("Alice".to_string()))
            .await
            .unwrap();
        assert_eq!(alice.len(), 2);
    }

    #[tokio::test]
    async fn test_top_recipients_ranks_and_limits() {
        let store = seeded(&[
            ("A", "x"),
            ("B", "x"),
            ("A", "x"),
            ("C", "x"),
            ("A", "x"),
            ("B", "x"),
            ("D", "x"),
            ("E", "x"),
            ("F", "x"),
        ])
        .await;

        let top = store.top_recipients(TOP_RECIPIENTS_LIMIT).await.unwrap();
        assert_eq!(top.len(), 5);
        assert_eq!(top[0], RecipientCount::new("A", 3));
        assert_eq!(top[1], RecipientCount::new("B", 2));
        assert!(top[2..].iter().all(|c| c.count == 1));
    }

    #[tokio::test]
    async fn test_top_recipients_groups_missing_recipient_as_null() {
        let store = MemoryShoutoutStore::new();
        store
            .insert(&Shoutout::default().with_field("text", "anon"))
            .await
            .unwrap();

        let top = store.top_recipients(TOP_RECIPIENTS_LIMIT).await.unwrap();
        assert_eq!(top, vec![RecipientCount { recipient: None, count: 1 }]);
    }

    #[tokio::test]
    async fn test_delete_and_replace_report_existence() {
        let store = seeded(&[("Alice", "Bob")]).await;
        let id = store.find(&ShoutoutFilter::All).await.unwrap()[0]
            .id
            .unwrap();

        let replaced = store
            .replace(&id, &Shoutout::new("Zed", "Bob"))
            .await
            .unwrap();
        assert!(replaced);
        let stored = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.to.as_deref(), Some("Zed"));
        assert_eq!(stored.id, Some(id));

        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert!(!store.replace(&id, &Shoutout::default()).await.unwrap());
        assert!(store.find(&ShoutoutFilter::All).await.unwrap().is_empty());
    }
}
