//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be wired into the services.
//! Every read returns the current stored snapshot; every write is a single
//! conditional update keyed on the `version` the caller observed.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{
    ClassFilter, ClassSection, ContentFilter, ContentItem, ContentStatus, EnrollmentChange,
    Page, Principal, Student,
};

/// Resolves who is calling. Implementations are request-scoped: they are
/// constructed with whatever credential the transport carried.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with `Unauthorized` when the caller cannot be identified.
    async fn resolve_acting_principal(&self) -> Result<Principal>;
}

/// Persistence contract for content items. Soft-deleted items are invisible
/// through every read.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fails with `Conflict(SlugTaken)` when the slug is in use.
    async fn insert(&self, item: &ContentItem) -> Result<ContentItem>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ContentItem>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ContentItem>>;

    /// Writes `item` if the stored version still equals `item.version`,
    /// returning the stored snapshot with the bumped version. Fails with
    /// `Conflict(StaleWrite)` otherwise.
    async fn update(&self, item: &ContentItem) -> Result<ContentItem>;

    /// Filtered, ordered (pinned, priority, newest) and paginated.
    async fn list(&self, filter: &ContentFilter) -> Result<Page<ContentItem>>;

    async fn count_by_status(&self, status: ContentStatus) -> Result<usize>;

    /// Unconditional counter bump; not versioned.
    async fn increment_views(&self, id: Uuid) -> Result<()>;
}

/// Persistence contract for class sections.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn insert(&self, class: &ClassSection) -> Result<ClassSection>;

    async fn get(&self, id: Uuid) -> Result<Option<ClassSection>>;

    /// Conditional on `class.version`, like [`ContentRepository::update`].
    async fn update(&self, class: &ClassSection) -> Result<ClassSection>;

    /// Every match ordered by name. `limit`/`offset` are left to the caller.
    async fn list(&self, filter: &ClassFilter) -> Result<Vec<ClassSection>>;
}

/// Persistence contract for students and their enrollment.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn insert(&self, student: &Student) -> Result<Student>;

    async fn get(&self, id: Uuid) -> Result<Option<Student>>;

    /// Conditional on `student.version`.
    async fn update(&self, student: &Student) -> Result<Student>;

    /// Atomically writes the student and the affected class(es). Either every
    /// version matches and everything is written, or nothing is.
    async fn commit_enrollment(&self, change: &EnrollmentChange) -> Result<Student>;
}
