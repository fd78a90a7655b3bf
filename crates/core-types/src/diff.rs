//! Diffing of admin-edited lists against what is stored.
//!
//! The admin forms submit a whole list at once (sponsors, citizens of a
//! year, plans, event days, About items). Items that carry an id the store
//! knows are updated, everything else is inserted, and stored rows missing
//! from the submission are deleted.

use std::collections::HashSet;
use uuid::Uuid;

/// An incoming list item, optionally identifying a stored row.
pub trait Keyed {
    fn key(&self) -> Option<Uuid>;

    /// The storage-hosted image this item references, if any.
    fn image_url(&self) -> Option<&str> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncItem<'a, T> {
    pub id: Uuid,
    /// Index in the submitted list; lists are stored in submission order.
    pub position: i32,
    pub is_new: bool,
    pub item: &'a T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan<'a, T> {
    pub upserts: Vec<SyncItem<'a, T>>,
    pub deletes: Vec<Uuid>,
}

impl<'a, T> SyncPlan<'a, T> {
    pub fn inserts(&self) -> impl Iterator<Item = &SyncItem<'a, T>> {
        self.upserts.iter().filter(|i| i.is_new)
    }

    pub fn updates(&self) -> impl Iterator<Item = &SyncItem<'a, T>> {
        self.upserts.iter().filter(|i| !i.is_new)
    }
}

/// Splits `incoming` into inserts and updates and finds the stored ids to delete.
///
/// An id unknown to the store is kept as the new row's id, so a client may
/// pre-assign ids.
pub fn plan_sync<'a, T: Keyed>(existing_ids: &[Uuid], incoming: &'a [T]) -> SyncPlan<'a, T> {
    let existing: HashSet<Uuid> = existing_ids.iter().copied().collect();

    let upserts: Vec<SyncItem<'a, T>> = incoming
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let (id, is_new) = match item.key() {
                Some(id) => (id, !existing.contains(&id)),
                None => (Uuid::new_v4(), true),
            };
            SyncItem { id, position: index as i32, is_new, item }
        })
        .collect();

    let kept: HashSet<Uuid> = upserts.iter().map(|i| i.id).collect();
    let deletes = existing_ids
        .iter()
        .filter(|id| !kept.contains(*id))
        .copied()
        .collect();

    SyncPlan { upserts, deletes }
}

/// Image URLs referenced by stored rows that no incoming item references
/// any more. These are the storage objects to clean up after a sync.
pub fn orphaned_urls<'a, T: Keyed>(
    existing: impl IntoIterator<Item = Option<&'a str>>,
    incoming: &[T],
) -> Vec<String> {
    let still_used: HashSet<&str> = incoming.iter().filter_map(Keyed::image_url).collect();
    let mut orphans: Vec<String> = Vec::new();
    for url in existing.into_iter().flatten() {
        if !still_used.contains(url) && !orphans.iter().any(|o| o == url) {
            orphans.push(url.to_string());
        }
    }
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        id: Option<Uuid>,
        image: Option<&'static str>,
    }

    impl Keyed for Item {
        fn key(&self) -> Option<Uuid> {
            self.id
        }
        fn image_url(&self) -> Option<&str> {
            self.image
        }
    }

    #[test]
    fn splits_inserts_updates_and_deletes() {
        let kept = Uuid::new_v4();
        let removed = Uuid::new_v4();
        let preassigned = Uuid::new_v4();
        let incoming = vec![
            Item { id: None, image: None },
            Item { id: Some(kept), image: None },
            Item { id: Some(preassigned), image: None },
        ];

        let plan = plan_sync(&[kept, removed], &incoming);

        assert_eq!(plan.deletes, vec![removed]);
        let updates: Vec<Uuid> = plan.updates().map(|i| i.id).collect();
        assert_eq!(updates, vec![kept]);
        let inserts: Vec<_> = plan.inserts().collect();
        assert_eq!(inserts.len(), 2);
        assert_eq!(inserts[0].position, 0);
        assert_eq!(inserts[1].id, preassigned);
        assert_eq!(inserts[1].position, 2);
    }

    #[test]
    fn empty_submission_deletes_everything() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let incoming: Vec<Item> = vec![];
        let plan = plan_sync(&[a, b], &incoming);
        assert!(plan.upserts.is_empty());
        assert_eq!(plan.deletes, vec![a, b]);
    }

    #[test]
    fn finds_images_no_longer_referenced() {
        let incoming = vec![
            Item { id: None, image: Some("https://cdn/a.png") },
            Item { id: None, image: None },
        ];
        let existing = vec![
            Some("https://cdn/a.png"),
            Some("https://cdn/b.png"),
            None,
            Some("https://cdn/b.png"),
        ];
        let orphans = orphaned_urls(existing, &incoming);
        assert_eq!(orphans, vec!["https://cdn/b.png".to_string()]);
    }
}
