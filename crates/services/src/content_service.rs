//! # Content Service
//!
//! Authoring, moderation and public reading of news posts. Every mutation
//! re-reads the item, runs the pure workflow/validation rules against that
//! snapshot, and writes once with the observed version.

use std::sync::Arc;

use chrono::Utc;
use domains::validation::{validate_content, validate_display_controls, ContentLimits};
use domains::workflow::{self, ContentAction};
use domains::{
    Category, ContentFields, ContentFilter, ContentItem, ContentKey, ContentPatch,
    ContentRepository, ContentStatus, DisplayControls, DomainError, IdentityProvider, Page, Principal,
    PublishedContent, Result, ValidationErrors, DEFAULT_PRIORITY,
};
use uuid::Uuid;

pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    identity: Arc<dyn IdentityProvider>,
    limits: ContentLimits,
}

impl ContentService {
    pub fn new(repo: Arc<dyn ContentRepository>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            repo,
            identity,
            limits: ContentLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ContentLimits) -> Self {
        self.limits = limits;
        self
    }

    async fn principal(&self) -> Result<Principal> {
        self.identity.resolve_acting_principal().await
    }

    async fn moderator(&self) -> Result<Principal> {
        let principal = self.principal().await?;
        if !principal.is_moderator() {
            return Err(DomainError::unauthorized(format!(
                "moderator role required (caller role: {})",
                principal.role
            )));
        }
        Ok(principal)
    }

    async fn load(&self, id: Uuid) -> Result<ContentItem> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("content", id))
    }

    /// Creates a draft owned by the caller.
    pub async fn create_content(&self, fields: ContentFields) -> Result<ContentItem> {
        let author = self.principal().await?;
        if !author.role.can_author() {
            return Err(DomainError::unauthorized(format!(
                "role {} cannot author content",
                author.role
            )));
        }
        check_display_controls_on_create(&author, &fields)?;
        validate_content(&fields, &self.limits)?;

        let item = ContentItem::new_draft(fields, &author, Utc::now())
            .ok_or_else(|| DomainError::unauthorized("caller cannot author content"))?;
        let stored = self.repo.insert(&item).await?;

        tracing::info!(
            content_id = %stored.id,
            slug = %stored.slug,
            author_id = %author.id,
            author_role = %author.role,
            "content draft created"
        );
        Ok(stored)
    }

    /// Looks an item up by id or slug. Visible to its author and moderators.
    pub async fn get_content(&self, id_or_slug: &str) -> Result<ContentItem> {
        let principal = self.principal().await?;
        let key = ContentKey::parse(id_or_slug);
        let found = match &key {
            ContentKey::Id(id) => self.repo.get_by_id(*id).await?,
            ContentKey::Slug(slug) => self.repo.get_by_slug(slug).await?,
        };
        let item = found.ok_or_else(|| DomainError::not_found("content", &key))?;

        if !principal.is_moderator() && !item.is_authored_by(&principal) {
            return Err(DomainError::unauthorized(
                "only the author or a moderator may view this item",
            ));
        }
        Ok(item)
    }

    /// Edits content fields of a draft or rejected item.
    pub async fn update_content(&self, id: Uuid, patch: ContentPatch) -> Result<ContentItem> {
        let principal = self.principal().await?;
        let mut item = self.load(id).await?;
        workflow::authorize_edit(&item, &principal)?;

        if patch.is_empty() {
            return Ok(item);
        }
        if !principal.is_moderator() && patch.touches_display_controls() {
            return Err(DomainError::Validation(display_control_errors(
                patch.priority.is_some(),
                patch.is_pinned.is_some(),
                patch.start_date.is_some(),
                patch.end_date.is_some(),
            )));
        }

        let title_changed = patch
            .title
            .as_ref()
            .is_some_and(|t| t.en != item.fields.title.en);
        let mut fields = item.fields.clone();
        patch.apply_to(&mut fields);
        fields.normalize_images();
        validate_content(&fields, &self.limits)?;

        item.fields = fields;
        if title_changed {
            item.slug = domains::generate_slug(&item.fields.title.en, item.id);
        }
        item.updated_at = Utc::now();
        let stored = self.repo.update(&item).await?;

        tracing::info!(content_id = %id, editor_id = %principal.id, "content fields updated");
        Ok(stored)
    }

    /// Soft delete: authors while draft, moderators at any time.
    pub async fn delete_content(&self, id: Uuid) -> Result<()> {
        let principal = self.principal().await?;
        let mut item = self.load(id).await?;
        workflow::authorize_delete(&item, &principal)?;

        item.deleted = true;
        item.updated_at = Utc::now();
        self.repo.update(&item).await?;

        tracing::info!(
            content_id = %id,
            status = %item.status,
            actor_id = %principal.id,
            "content deleted"
        );
        Ok(())
    }

    /// Pinning, priority and visibility window, set by a moderator in any
    /// status. Content fields and workflow state are left alone.
    pub async fn set_display_controls(
        &self,
        id: Uuid,
        controls: DisplayControls,
    ) -> Result<ContentItem> {
        let principal = self.moderator().await?;
        let mut item = self.load(id).await?;
        if controls.is_empty() {
            return Ok(item);
        }

        let mut fields = item.fields.clone();
        controls.apply_to(&mut fields);
        validate_display_controls(&fields, &self.limits)?;

        item.fields = fields;
        item.updated_at = Utc::now();
        let stored = self.repo.update(&item).await?;

        tracing::info!(
            content_id = %id,
            status = %stored.status,
            priority = stored.fields.priority,
            pinned = stored.fields.is_pinned,
            moderator_id = %principal.id,
            "content display controls updated"
        );
        Ok(stored)
    }

    pub async fn submit(&self, id: Uuid) -> Result<ContentItem> {
        self.apply_action(id, ContentAction::Submit, None).await
    }

    pub async fn approve(&self, id: Uuid) -> Result<ContentItem> {
        self.apply_action(id, ContentAction::Approve, None).await
    }

    pub async fn reject(&self, id: Uuid, reason: &str) -> Result<ContentItem> {
        self.apply_action(id, ContentAction::Reject, Some(reason)).await
    }

    pub async fn publish(&self, id: Uuid) -> Result<ContentItem> {
        self.apply_action(id, ContentAction::Publish, None).await
    }

    pub async fn unpublish(&self, id: Uuid) -> Result<ContentItem> {
        self.apply_action(id, ContentAction::Unpublish, None).await
    }

    /// Runs one workflow edge against a fresh snapshot of the item.
    pub async fn apply_action(
        &self,
        id: Uuid,
        action: ContentAction,
        reason: Option<&str>,
    ) -> Result<ContentItem> {
        let principal = self.principal().await?;
        let mut item = self.load(id).await?;
        let from = item.status;

        let edge = match workflow::transition(&mut item, action, &principal, reason, Utc::now()) {
            Ok(edge) => edge,
            Err(err) => {
                tracing::warn!(
                    content_id = %id,
                    %action,
                    status = %from,
                    actor_id = %principal.id,
                    actor_role = %principal.role,
                    error = %err,
                    "content transition refused"
                );
                return Err(err);
            }
        };
        let stored = self.repo.update(&item).await?;

        tracing::info!(
            content_id = %id,
            %action,
            from = %from,
            to = %edge.to,
            actor_id = %principal.id,
            "content transition applied"
        );
        Ok(stored)
    }

    /// Workflow actions the caller may take on the item right now.
    pub async fn available_actions(&self, id: Uuid) -> Result<Vec<ContentAction>> {
        let principal = self.principal().await?;
        let item = self.load(id).await?;
        Ok(workflow::available_actions(&item, &principal))
    }

    /// Moderator listing over every author.
    pub async fn list_content(&self, filter: &ContentFilter) -> Result<Page<ContentItem>> {
        self.moderator().await?;
        self.repo.list(filter).await
    }

    /// The caller's own items, any status.
    pub async fn list_own_content(&self, filter: &ContentFilter) -> Result<Page<ContentItem>> {
        let principal = self.principal().await?;
        let filter = ContentFilter {
            author_id: Some(principal.id),
            ..filter.clone()
        };
        self.repo.list(&filter).await
    }

    /// Number of items waiting for a moderator.
    pub async fn pending_review_count(&self) -> Result<usize> {
        self.moderator().await?;
        self.repo.count_by_status(ContentStatus::PendingReview).await
    }

    /// Public listing: published items inside their visibility window.
    /// Does not consult the identity provider.
    pub async fn list_published(
        &self,
        category: Option<Category>,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Page<PublishedContent>> {
        let filter = ContentFilter {
            status: Some(ContentStatus::Published),
            category,
            ..Default::default()
        };
        let now = Utc::now();
        let mut visible: Vec<_> = self
            .repo
            .list(&filter)
            .await?
            .items
            .into_iter()
            .filter(|item| item.is_publicly_visible_at(now))
            .collect();
        visible.sort_by(domains::public_order);

        Ok(Page::paginate(visible, limit, offset).map(PublishedContent::from))
    }

    /// Public lookup by slug.
    pub async fn get_published(&self, slug: &str) -> Result<PublishedContent> {
        match self.repo.get_by_slug(slug).await? {
            Some(item) if item.is_publicly_visible_at(Utc::now()) => Ok(item.into()),
            _ => Err(DomainError::not_found("content", slug)),
        }
    }

    /// Best-effort view counter. Never fails the reader.
    pub async fn record_view(&self, slug: &str) {
        if let Err(err) = self.try_record_view(slug).await {
            tracing::debug!(slug, error = %err, "view not recorded");
        }
    }

    async fn try_record_view(&self, slug: &str) -> Result<()> {
        match self.repo.get_by_slug(slug).await? {
            Some(item) if item.is_publicly_visible_at(Utc::now()) => {
                self.repo.increment_views(item.id).await
            }
            _ => Ok(()),
        }
    }
}

fn check_display_controls_on_create(author: &Principal, fields: &ContentFields) -> Result<()> {
    if author.is_moderator() {
        return Ok(());
    }
    let errors = display_control_errors(
        fields.priority != DEFAULT_PRIORITY,
        fields.is_pinned,
        fields.start_date.is_some(),
        fields.end_date.is_some(),
    );
    errors.into_result()
}

fn display_control_errors(
    priority: bool,
    pinned: bool,
    start: bool,
    end: bool,
) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    for (touched, field) in [
        (priority, "priority"),
        (pinned, "isPinned"),
        (start, "startDate"),
        (end, "endDate"),
    ] {
        if touched {
            errors.add(field, "Only moderators may set this field");
        }
    }
    errors
}
