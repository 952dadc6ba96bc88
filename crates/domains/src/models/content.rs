//! # Content Models
//!
//! News posts and announcements: bilingual, moderated, soft-deletable.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bilingual::Bilingual;
use super::principal::{Principal, Role};

pub const DEFAULT_PRIORITY: i32 = 50;

/// Workflow position of a content item. See [`crate::workflow`] for edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    PendingReview,
    Approved,
    Rejected,
    Published,
    Unpublished,
}

impl ContentStatus {
    pub const ALL: [ContentStatus; 6] = [
        ContentStatus::Draft,
        ContentStatus::PendingReview,
        ContentStatus::Approved,
        ContentStatus::Rejected,
        ContentStatus::Published,
        ContentStatus::Unpublished,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::PendingReview => "pending_review",
            ContentStatus::Approved => "approved",
            ContentStatus::Rejected => "rejected",
            ContentStatus::Published => "published",
            ContentStatus::Unpublished => "unpublished",
        }
    }

    /// Content fields may only change in these states.
    pub fn is_editable(self) -> bool {
        matches!(self, ContentStatus::Draft | ContentStatus::Rejected)
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    SchoolNews,
    Events,
    Announcements,
    Academic,
}

impl Category {
    pub fn label(self) -> Bilingual {
        match self {
            Category::SchoolNews => Bilingual::new("School News", "பள்ளி செய்திகள்"),
            Category::Events => Bilingual::new("Events", "நிகழ்வுகள்"),
            Category::Announcements => Bilingual::new("Announcements", "அறிவிப்புகள்"),
            Category::Academic => Bilingual::new("Academic", "கல்வி"),
        }
    }
}

/// Role snapshot taken when the item is created. Drives the
/// admin-may-publish-own-draft edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    Teacher,
    Admin,
}

impl AuthorRole {
    /// `None` for roles that may not author content.
    pub fn from_role(role: Role) -> Option<Self> {
        match role {
            Role::Admin | Role::SuperAdmin => Some(AuthorRole::Admin),
            Role::Teacher => Some(AuthorRole::Teacher),
            Role::Parent => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentImage {
    /// Assigned by the service when left empty.
    #[serde(default)]
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub alt: Bilingual,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Bilingual>,
    #[serde(default)]
    pub order: i32,
}

impl ContentImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// The author-editable part of a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFields {
    pub title: Bilingual,
    pub summary: Bilingual,
    /// Rich text (HTML) per language.
    pub body: Bilingual,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<ContentImage>,
    #[serde(default)]
    pub images: Vec<ContentImage>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<Bilingual>,
    #[serde(default)]
    pub meta_keywords: Vec<String>,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl Default for ContentFields {
    fn default() -> Self {
        Self {
            title: Bilingual::default(),
            summary: Bilingual::default(),
            body: Bilingual::default(),
            category: Category::default(),
            tags: Vec::new(),
            featured_image: None,
            images: Vec::new(),
            priority: DEFAULT_PRIORITY,
            is_pinned: false,
            start_date: None,
            end_date: None,
            meta_description: None,
            meta_keywords: Vec::new(),
        }
    }
}

impl ContentFields {
    /// Assigns ids to new images, pins the featured image to order 0 and
    /// sorts the gallery by its explicit order.
    pub fn normalize_images(&mut self) {
        if let Some(featured) = self.featured_image.as_mut() {
            if featured.id.is_empty() {
                featured.id = new_image_id();
            }
            featured.order = 0;
        }
        for image in &mut self.images {
            if image.id.is_empty() {
                image.id = new_image_id();
            }
        }
        self.images.sort_by_key(|image| image.order);
    }
}

fn new_image_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("img_{}", &id[..12])
}

/// Partial update of [`ContentFields`]. `None` leaves a field untouched;
/// for the nested options `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    pub title: Option<Bilingual>,
    pub summary: Option<Bilingual>,
    pub body: Option<Bilingual>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<Option<ContentImage>>,
    pub images: Option<Vec<ContentImage>>,
    pub priority: Option<i32>,
    pub is_pinned: Option<bool>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub meta_description: Option<Option<Bilingual>>,
    pub meta_keywords: Option<Vec<String>>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        *self == ContentPatch::default()
    }

    /// Whether the patch touches fields reserved for moderators.
    pub fn touches_display_controls(&self) -> bool {
        self.priority.is_some()
            || self.is_pinned.is_some()
            || self.start_date.is_some()
            || self.end_date.is_some()
    }

    pub fn apply_to(self, fields: &mut ContentFields) {
        if let Some(v) = self.title {
            fields.title = v;
        }
        if let Some(v) = self.summary {
            fields.summary = v;
        }
        if let Some(v) = self.body {
            fields.body = v;
        }
        if let Some(v) = self.category {
            fields.category = v;
        }
        if let Some(v) = self.tags {
            fields.tags = v;
        }
        if let Some(v) = self.featured_image {
            fields.featured_image = v;
        }
        if let Some(v) = self.images {
            fields.images = v;
        }
        if let Some(v) = self.priority {
            fields.priority = v;
        }
        if let Some(v) = self.is_pinned {
            fields.is_pinned = v;
        }
        if let Some(v) = self.start_date {
            fields.start_date = v;
        }
        if let Some(v) = self.end_date {
            fields.end_date = v;
        }
        if let Some(v) = self.meta_description {
            fields.meta_description = v;
        }
        if let Some(v) = self.meta_keywords {
            fields.meta_keywords = v;
        }
    }
}

/// Moderator-only ordering and visibility settings, adjustable in any
/// status. Same `None` / `Some(None)` convention as [`ContentPatch`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayControls {
    pub priority: Option<i32>,
    pub is_pinned: Option<bool>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
}

impl DisplayControls {
    pub fn pin(pinned: bool) -> Self {
        Self {
            is_pinned: Some(pinned),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DisplayControls::default()
    }

    pub fn apply_to(self, fields: &mut ContentFields) {
        if let Some(v) = self.priority {
            fields.priority = v;
        }
        if let Some(v) = self.is_pinned {
            fields.is_pinned = v;
        }
        if let Some(v) = self.start_date {
            fields.start_date = v;
        }
        if let Some(v) = self.end_date {
            fields.end_date = v;
        }
    }
}

/// A news post or announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: Uuid,
    /// URL slug, unique across live items.
    pub slug: String,
    #[serde(flatten)]
    pub fields: ContentFields,

    pub status: ContentStatus,
    pub author_id: String,
    pub author_name: String,
    pub author_role: AuthorRole,
    /// Non-empty exactly when `status == Rejected`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Set on first publication and never cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublished_by: Option<String>,

    pub views: u64,
    /// Soft-delete marker. Deleted items never resolve through the ports.
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency token; bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
}

impl ContentItem {
    /// Builds a fresh draft owned by `author`. Returns `None` when the
    /// principal's role cannot author content.
    pub fn new_draft(
        mut fields: ContentFields,
        author: &Principal,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let author_role = AuthorRole::from_role(author.role)?;
        let id = Uuid::new_v4();
        fields.normalize_images();
        Some(Self {
            id,
            slug: generate_slug(&fields.title.en, id),
            fields,
            status: ContentStatus::Draft,
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            author_role,
            rejection_reason: None,
            submitted_at: None,
            reviewed_by: None,
            reviewed_at: None,
            published_at: None,
            published_by: None,
            unpublished_at: None,
            unpublished_by: None,
            views: 0,
            deleted: false,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn is_authored_by(&self, principal: &Principal) -> bool {
        self.author_id == principal.id
    }

    /// Published, live, and inside the optional start/end window.
    pub fn is_publicly_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ContentStatus::Published
            && !self.deleted
            && self.fields.start_date.is_none_or(|start| start <= now)
            && self.fields.end_date.is_none_or(|end| end >= now)
    }
}

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

const MAX_SLUG_BASE: usize = 80;

/// URL-friendly slug: lowercase ASCII words joined by hyphens, cut to 80
/// chars, suffixed with a short fragment of the item id.
pub fn generate_slug(title: &str, id: Uuid) -> String {
    let lowered = title.trim().to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    let base: String = collapsed.chars().take(MAX_SLUG_BASE).collect();
    let base = base.trim_matches('-');
    let suffix = &id.simple().to_string()[..8];
    if base.is_empty() {
        format!("post-{suffix}")
    } else {
        format!("{base}-{suffix}")
    }
}

/// How callers address an item in `get_content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentKey {
    Id(Uuid),
    Slug(String),
}

impl ContentKey {
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => ContentKey::Id(id),
            Err(_) => ContentKey::Slug(raw.to_string()),
        }
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKey::Id(id) => write!(f, "{id}"),
            ContentKey::Slug(slug) => f.write_str(slug),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFilter {
    pub status: Option<ContentStatus>,
    pub category: Option<Category>,
    pub author_id: Option<String>,
    pub author_role: Option<AuthorRole>,
    /// `None` returns every match.
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

impl ContentFilter {
    pub fn with_status(status: ContentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn matches(&self, item: &ContentItem) -> bool {
        !item.deleted
            && self.status.is_none_or(|s| item.status == s)
            && self.category.is_none_or(|c| item.fields.category == c)
            && self.author_role.is_none_or(|r| item.author_role == r)
            && self
                .author_id
                .as_deref()
                .is_none_or(|id| item.author_id == id)
    }
}

/// Moderator and author listings: pinned first, then priority, newest first.
pub fn listing_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.fields
        .is_pinned
        .cmp(&a.fields.is_pinned)
        .then_with(|| b.fields.priority.cmp(&a.fields.priority))
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Public listing: pinned first, then priority, most recently published first.
pub fn public_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    let published = |item: &ContentItem| item.published_at.unwrap_or(item.created_at);
    b.fields
        .is_pinned
        .cmp(&a.fields.is_pinned)
        .then_with(|| b.fields.priority.cmp(&a.fields.priority))
        .then_with(|| published(b).cmp(&published(a)))
}

/// One page of a listing plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl<T> Page<T> {
    /// Cuts an already filtered and ordered list.
    pub fn paginate(all: Vec<T>, limit: Option<usize>, offset: usize) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Reader-facing projection of a published item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedContent {
    pub id: Uuid,
    pub slug: String,
    pub title: Bilingual,
    pub summary: Bilingual,
    pub body: Bilingual,
    pub category: Category,
    pub tags: Vec<String>,
    pub featured_image: Option<ContentImage>,
    pub images: Vec<ContentImage>,
    pub author_name: String,
    pub published_at: DateTime<Utc>,
    pub priority: i32,
    pub is_pinned: bool,
    pub views: u64,
    pub meta_description: Option<Bilingual>,
    pub meta_keywords: Vec<String>,
}

impl From<ContentItem> for PublishedContent {
    fn from(item: ContentItem) -> Self {
        let published_at = item.published_at.unwrap_or(item.created_at);
        let fields = item.fields;
        Self {
            id: item.id,
            slug: item.slug,
            title: fields.title,
            summary: fields.summary,
            body: fields.body,
            category: fields.category,
            tags: fields.tags,
            featured_image: fields.featured_image,
            images: fields.images,
            author_name: item.author_name,
            published_at,
            priority: fields.priority,
            is_pinned: fields.is_pinned,
            views: item.views,
            meta_description: fields.meta_description,
            meta_keywords: fields.meta_keywords,
        }
    }
}
