//! # In-memory Content Store
//!
//! Items keyed by id plus a slug index over live items. Lock order is
//! always items before slugs.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use domains::{
    listing_order, ConflictKind, ContentFilter, ContentItem, ContentRepository, ContentStatus,
    DomainError, Page, Result,
};
use uuid::Uuid;

use crate::stale;

#[derive(Default)]
pub struct InMemoryContentRepository {
    items: DashMap<Uuid, ContentItem>,
    slugs: DashMap<String, Uuid>,
}

impl InMemoryContentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points `slug` at `id` unless a different live item holds it.
    fn reserve_slug(&self, slug: &str, id: Uuid) -> Result<()> {
        match self.slugs.entry(slug.to_string()) {
            Entry::Occupied(held) if *held.get() != id => {
                Err(DomainError::Conflict(ConflictKind::SlugTaken {
                    slug: slug.to_string(),
                }))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(free) => {
                free.insert(id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ContentRepository for InMemoryContentRepository {
    async fn insert(&self, item: &ContentItem) -> Result<ContentItem> {
        self.reserve_slug(&item.slug, item.id)?;

        let mut stored = item.clone();
        stored.version = 1;
        match self.items.entry(item.id) {
            Entry::Occupied(_) => {
                self.slugs.remove(&item.slug);
                Err(DomainError::Internal(format!(
                    "content id {} already exists",
                    item.id
                )))
            }
            Entry::Vacant(free) => {
                free.insert(stored.clone());
                tracing::debug!(content_id = %stored.id, slug = %stored.slug, "content inserted");
                Ok(stored)
            }
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ContentItem>> {
        Ok(self
            .items
            .get(&id)
            .filter(|item| !item.deleted)
            .map(|item| item.clone()))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ContentItem>> {
        let Some(id) = self.slugs.get(slug).map(|id| *id) else {
            return Ok(None);
        };
        self.get_by_id(id).await
    }

    async fn update(&self, item: &ContentItem) -> Result<ContentItem> {
        let mut current = self
            .items
            .get_mut(&item.id)
            .filter(|current| !current.deleted)
            .ok_or_else(|| DomainError::not_found("content", item.id))?;
        if current.version != item.version {
            return Err(stale("content", item.id));
        }

        if current.slug != item.slug {
            self.reserve_slug(&item.slug, item.id)?;
            self.slugs.remove(&current.slug);
        }
        if item.deleted {
            self.slugs.remove(&item.slug);
        }

        let mut stored = item.clone();
        stored.version = current.version + 1;
        // views move independently of the versioned fields
        stored.views = current.views;
        *current = stored.clone();
        Ok(stored)
    }

    async fn list(&self, filter: &ContentFilter) -> Result<Page<ContentItem>> {
        let mut matching: Vec<ContentItem> = self
            .items
            .iter()
            .filter(|item| filter.matches(item))
            .map(|item| item.clone())
            .collect();
        matching.sort_by(listing_order);
        Ok(Page::paginate(matching, filter.limit, filter.offset))
    }

    async fn count_by_status(&self, status: ContentStatus) -> Result<usize> {
        Ok(self
            .items
            .iter()
            .filter(|item| !item.deleted && item.status == status)
            .count())
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        match self.items.get_mut(&id) {
            Some(mut item) if !item.deleted => {
                item.views += 1;
                Ok(())
            }
            _ => Err(DomainError::not_found("content", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{Bilingual, ContentFields, Principal, Role};
    use tokio_test::{assert_err, assert_ok};

    fn draft(title: &str) -> ContentItem {
        let fields = ContentFields {
            title: Bilingual::en(title),
            summary: Bilingual::en("summary"),
            body: Bilingual::en("body"),
            ..Default::default()
        };
        let author = Principal::new("teacher-1", "Meena", Role::Teacher);
        ContentItem::new_draft(fields, &author, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn update_requires_current_version() {
        let repo = InMemoryContentRepository::new();
        let stored = assert_ok!(repo.insert(&draft("Sports day")).await);
        assert_eq!(stored.version, 1);

        let mut first = stored.clone();
        first.status = ContentStatus::PendingReview;
        let written = assert_ok!(repo.update(&first).await);
        assert_eq!(written.version, 2);

        let mut second = stored;
        second.status = ContentStatus::Approved;
        let err = assert_err!(repo.update(&second).await);
        assert!(matches!(err, DomainError::Conflict(ConflictKind::StaleWrite { .. })));

        let current = repo.get_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(current.status, ContentStatus::PendingReview);
    }

    #[tokio::test]
    async fn duplicate_slug_is_refused() {
        let repo = InMemoryContentRepository::new();
        let first = assert_ok!(repo.insert(&draft("Sports day")).await);

        let mut clash = draft("Other");
        clash.slug = first.slug.clone();
        let err = assert_err!(repo.insert(&clash).await);
        assert!(matches!(err, DomainError::Conflict(ConflictKind::SlugTaken { .. })));
    }

    #[tokio::test]
    async fn slug_change_moves_index() {
        let repo = InMemoryContentRepository::new();
        let mut item = assert_ok!(repo.insert(&draft("Sports day")).await);
        let old_slug = item.slug.clone();
        item.slug = "sports-week".into();
        assert_ok!(repo.update(&item).await);

        assert!(repo.get_by_slug(&old_slug).await.unwrap().is_none());
        assert!(repo.get_by_slug("sports-week").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleted_items_disappear() {
        let repo = InMemoryContentRepository::new();
        let mut item = assert_ok!(repo.insert(&draft("Sports day")).await);
        item.deleted = true;
        assert_ok!(repo.update(&item).await);

        assert!(repo.get_by_id(item.id).await.unwrap().is_none());
        assert!(repo.get_by_slug(&item.slug).await.unwrap().is_none());
        assert_eq!(repo.list(&ContentFilter::default()).await.unwrap().total, 0);
        assert_eq!(repo.count_by_status(ContentStatus::Draft).await.unwrap(), 0);
        assert_err!(repo.increment_views(item.id).await);
    }

    #[tokio::test]
    async fn views_survive_versioned_writes() {
        let repo = InMemoryContentRepository::new();
        let item = assert_ok!(repo.insert(&draft("Sports day")).await);
        assert_ok!(repo.increment_views(item.id).await);
        assert_ok!(repo.increment_views(item.id).await);

        let written = assert_ok!(repo.update(&item).await);
        assert_eq!(written.views, 2);
    }

    #[tokio::test]
    async fn listing_puts_pinned_then_priority_first() {
        let repo = InMemoryContentRepository::new();
        let mut low = draft("Low");
        low.fields.priority = 10;
        let mut high = draft("High");
        high.fields.priority = 90;
        let mut pinned = draft("Pinned");
        pinned.fields.priority = 1;
        pinned.fields.is_pinned = true;
        for item in [&low, &high, &pinned] {
            assert_ok!(repo.insert(item).await);
        }

        let page = assert_ok!(repo.list(&ContentFilter::default()).await);
        let titles: Vec<_> = page.items.iter().map(|i| i.fields.title.en.as_str()).collect();
        assert_eq!(titles, ["Pinned", "High", "Low"]);
    }
}
