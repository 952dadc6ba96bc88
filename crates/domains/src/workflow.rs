//! # Content Workflow
//!
//! The publication lifecycle as one static edge table. Every status change
//! goes through [`transition`], which looks the edge up, checks the actor
//! and guard, and only then mutates the item.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, Result};
use crate::models::{AuthorRole, ContentItem, ContentStatus, Principal};

const ENTITY: &str = "content";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAction {
    Submit,
    Approve,
    Reject,
    Publish,
    Unpublish,
}

impl fmt::Display for ContentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentAction::Submit => "submit",
            ContentAction::Approve => "approve",
            ContentAction::Reject => "reject",
            ContentAction::Publish => "publish",
            ContentAction::Unpublish => "unpublish",
        })
    }
}

/// Who may walk an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The item's author, provided their role can still author content.
    Author,
    /// Any admin-tier principal.
    Moderator,
}

/// Extra precondition evaluated after the actor check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    None,
    /// Edge only exists for items created by an admin.
    AdminAuthored,
    /// A non-blank rejection reason must accompany the call.
    ReasonRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    StampSubmitted,
    ClearRejection,
    RecordReview,
    RecordRejection,
    /// Sets `published_at` only when it was never set.
    RecordPublication,
    RecordUnpublication,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: ContentStatus,
    pub action: ContentAction,
    pub to: ContentStatus,
    pub actor: Actor,
    pub guard: Guard,
    pub effects: &'static [Effect],
}

use ContentAction as A;
use ContentStatus as S;

pub const EDGES: &[Edge] = &[
    Edge {
        from: S::Draft,
        action: A::Submit,
        to: S::PendingReview,
        actor: Actor::Author,
        guard: Guard::None,
        effects: &[Effect::StampSubmitted],
    },
    Edge {
        from: S::Draft,
        action: A::Publish,
        to: S::Published,
        actor: Actor::Moderator,
        guard: Guard::AdminAuthored,
        effects: &[Effect::RecordPublication],
    },
    Edge {
        from: S::PendingReview,
        action: A::Approve,
        to: S::Approved,
        actor: Actor::Moderator,
        guard: Guard::None,
        effects: &[Effect::RecordReview],
    },
    Edge {
        from: S::PendingReview,
        action: A::Reject,
        to: S::Rejected,
        actor: Actor::Moderator,
        guard: Guard::ReasonRequired,
        effects: &[Effect::RecordReview, Effect::RecordRejection],
    },
    Edge {
        from: S::Rejected,
        action: A::Submit,
        to: S::PendingReview,
        actor: Actor::Author,
        guard: Guard::None,
        effects: &[Effect::ClearRejection, Effect::StampSubmitted],
    },
    Edge {
        from: S::Approved,
        action: A::Publish,
        to: S::Published,
        actor: Actor::Moderator,
        guard: Guard::None,
        effects: &[Effect::RecordPublication],
    },
    Edge {
        from: S::Published,
        action: A::Unpublish,
        to: S::Unpublished,
        actor: Actor::Moderator,
        guard: Guard::None,
        effects: &[Effect::RecordUnpublication],
    },
    Edge {
        from: S::Unpublished,
        action: A::Publish,
        to: S::Published,
        actor: Actor::Moderator,
        guard: Guard::None,
        effects: &[Effect::RecordPublication],
    },
];

pub fn edge(from: ContentStatus, action: ContentAction) -> Option<&'static Edge> {
    EDGES.iter().find(|e| e.from == from && e.action == action)
}

/// Actions the principal could successfully request right now. Used to
/// decide which buttons to offer.
pub fn available_actions(item: &ContentItem, principal: &Principal) -> Vec<ContentAction> {
    EDGES
        .iter()
        .filter(|e| e.from == item.status)
        .filter(|e| actor_allowed(e.actor, item, principal))
        .filter(|e| e.guard != Guard::AdminAuthored || item.author_role == AuthorRole::Admin)
        .map(|e| e.action)
        .collect()
}

fn actor_allowed(actor: Actor, item: &ContentItem, principal: &Principal) -> bool {
    match actor {
        Actor::Author => item.is_authored_by(principal) && principal.role.can_author(),
        Actor::Moderator => principal.is_moderator(),
    }
}

/// Resolves and checks the edge for `action` without touching the item.
pub fn authorize(
    item: &ContentItem,
    action: ContentAction,
    principal: &Principal,
    reason: Option<&str>,
) -> Result<&'static Edge> {
    let edge = edge(item.status, action)
        .ok_or_else(|| DomainError::invalid_transition(ENTITY, item.status, action))?;

    if !actor_allowed(edge.actor, item, principal) {
        let who = match edge.actor {
            Actor::Author => "the author",
            Actor::Moderator => "a moderator",
        };
        return Err(DomainError::unauthorized(format!(
            "only {who} may {action} this item (caller role: {})",
            principal.role
        )));
    }

    match edge.guard {
        Guard::None => {}
        Guard::AdminAuthored if item.author_role == AuthorRole::Admin => {}
        Guard::AdminAuthored => {
            return Err(DomainError::invalid_transition(ENTITY, item.status, action));
        }
        Guard::ReasonRequired => {
            if reason.is_none_or(|r| r.trim().is_empty()) {
                return Err(DomainError::invalid_field(
                    "rejectionReason",
                    "Rejection reason is required",
                ));
            }
        }
    }

    Ok(edge)
}

/// Walks the edge for `action`. On error the item is left untouched.
pub fn transition(
    item: &mut ContentItem,
    action: ContentAction,
    principal: &Principal,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<&'static Edge> {
    let edge = authorize(item, action, principal, reason)?;

    for effect in edge.effects {
        match effect {
            Effect::StampSubmitted => item.submitted_at = Some(now),
            Effect::ClearRejection => {
                item.rejection_reason = None;
                item.reviewed_by = None;
                item.reviewed_at = None;
            }
            Effect::RecordReview => {
                item.reviewed_by = Some(principal.id.clone());
                item.reviewed_at = Some(now);
            }
            Effect::RecordRejection => {
                item.rejection_reason = reason.map(|r| r.trim().to_string());
            }
            Effect::RecordPublication => {
                if item.published_at.is_none() {
                    item.published_at = Some(now);
                }
                item.published_by = Some(principal.id.clone());
            }
            Effect::RecordUnpublication => {
                item.unpublished_at = Some(now);
                item.unpublished_by = Some(principal.id.clone());
            }
        }
    }
    item.status = edge.to;
    item.updated_at = now;
    Ok(edge)
}

/// Content fields change only while editable and only by the author.
pub fn authorize_edit(item: &ContentItem, principal: &Principal) -> Result<()> {
    if !item.is_authored_by(principal) || !principal.role.can_author() {
        return Err(DomainError::unauthorized("only the author may edit this item"));
    }
    if !item.status.is_editable() {
        return Err(DomainError::invalid_transition(ENTITY, item.status, "edit"));
    }
    Ok(())
}

/// Moderators may delete in any state; authors only their own drafts.
pub fn authorize_delete(item: &ContentItem, principal: &Principal) -> Result<()> {
    if principal.is_moderator() {
        return Ok(());
    }
    if !item.is_authored_by(principal) {
        return Err(DomainError::unauthorized(
            "only the author or a moderator may delete this item",
        ));
    }
    if item.status != ContentStatus::Draft {
        return Err(DomainError::invalid_transition(ENTITY, item.status, "delete"));
    }
    Ok(())
}
