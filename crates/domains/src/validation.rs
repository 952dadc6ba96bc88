//! # Content Validation
//!
//! Write-time field rules for content items. All violations are collected
//! so the caller can highlight every offending input at once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationErrors};
use crate::models::{Bilingual, ContentFields, ContentImage};

/// Length and count bounds for content fields. Lengths count characters,
/// not bytes, so Tamil text gets the same room as English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLimits {
    pub max_title_len: usize,
    pub max_summary_len: usize,
    pub max_body_len: usize,
    pub max_images: usize,
    pub max_tags: usize,
    pub max_tag_len: usize,
    pub min_priority: i32,
    pub max_priority: i32,
    pub max_meta_description_len: usize,
    pub max_meta_keywords: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_title_len: 200,
            max_summary_len: 300,
            max_body_len: 50_000,
            max_images: 10,
            max_tags: 10,
            max_tag_len: 50,
            min_priority: 1,
            max_priority: 100,
            max_meta_description_len: 160,
            max_meta_keywords: 10,
        }
    }
}

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static HTML_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)&nbsp;|&#160;").unwrap());
static MEDIA_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<\s*(img|iframe|video)\b").unwrap());

/// True for rich text that renders as nothing, e.g. `<p><br></p>`.
/// Embedded media counts as content even without any text around it.
pub fn is_blank_rich_text(html: &str) -> bool {
    if MEDIA_TAG.is_match(html) {
        return false;
    }
    let without_tags = HTML_TAG.replace_all(html, "");
    HTML_SPACE.replace_all(&without_tags, " ").trim().is_empty()
}

/// Ordering and visibility rules only. Used on their own when a moderator
/// adjusts a post outside the editable states.
pub fn validate_display_controls(fields: &ContentFields, limits: &ContentLimits) -> Result<()> {
    let mut errors = ValidationErrors::default();
    check_display_controls(&mut errors, fields, limits);
    errors.into_result()
}

fn check_display_controls(errors: &mut ValidationErrors, fields: &ContentFields, limits: &ContentLimits) {
    if !(limits.min_priority..=limits.max_priority).contains(&fields.priority) {
        errors.add(
            "priority",
            format!(
                "Priority must be between {} and {}",
                limits.min_priority, limits.max_priority
            ),
        );
    }
    if let (Some(start), Some(end)) = (fields.start_date, fields.end_date) {
        if end < start {
            errors.add("endDate", "End date must be after the start date");
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn check_bilingual(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    text: &Bilingual,
    max: usize,
) {
    if text.en.trim().is_empty() {
        errors.add(format!("{field}.en"), format!("{label} (English) is required"));
    } else if char_len(&text.en) > max {
        errors.add(
            format!("{field}.en"),
            format!("{label} (English) must be at most {max} characters"),
        );
    }
    if char_len(&text.ta) > max {
        errors.add(
            format!("{field}.ta"),
            format!("{label} (Tamil) must be at most {max} characters"),
        );
    }
}

fn check_image(errors: &mut ValidationErrors, field: &str, image: &ContentImage) {
    if image.url.trim().is_empty() {
        errors.add(format!("{field}.url"), "Image URL is required");
    }
}

/// Validates a complete set of content fields (create, or edit after the
/// patch has been merged).
pub fn validate_content(fields: &ContentFields, limits: &ContentLimits) -> Result<()> {
    let mut errors = ValidationErrors::default();

    check_bilingual(&mut errors, "title", "Title", &fields.title, limits.max_title_len);
    check_bilingual(
        &mut errors,
        "summary",
        "Summary",
        &fields.summary,
        limits.max_summary_len,
    );

    if is_blank_rich_text(&fields.body.en) {
        errors.add("body.en", "Body (English) is required");
    } else if char_len(&fields.body.en) > limits.max_body_len {
        errors.add(
            "body.en",
            format!("Body (English) must be at most {} characters", limits.max_body_len),
        );
    }
    if char_len(&fields.body.ta) > limits.max_body_len {
        errors.add(
            "body.ta",
            format!("Body (Tamil) must be at most {} characters", limits.max_body_len),
        );
    }

    if fields.tags.len() > limits.max_tags {
        errors.add("tags", format!("At most {} tags are allowed", limits.max_tags));
    }
    for (i, tag) in fields.tags.iter().enumerate() {
        if tag.trim().is_empty() {
            errors.add(format!("tags[{i}]"), "Tags cannot be blank");
        } else if char_len(tag) > limits.max_tag_len {
            errors.add(
                format!("tags[{i}]"),
                format!("Tags must be at most {} characters", limits.max_tag_len),
            );
        }
    }

    if let Some(featured) = &fields.featured_image {
        check_image(&mut errors, "featuredImage", featured);
    }
    if fields.images.len() > limits.max_images {
        errors.add(
            "images",
            format!("At most {} gallery images are allowed", limits.max_images),
        );
    }
    for (i, image) in fields.images.iter().enumerate() {
        check_image(&mut errors, &format!("images[{i}]"), image);
    }

    check_display_controls(&mut errors, fields, limits);

    if let Some(meta) = &fields.meta_description {
        for (lang, text) in [("en", &meta.en), ("ta", &meta.ta)] {
            if char_len(text) > limits.max_meta_description_len {
                errors.add(
                    format!("metaDescription.{lang}"),
                    format!(
                        "Meta description must be at most {} characters",
                        limits.max_meta_description_len
                    ),
                );
            }
        }
    }
    if fields.meta_keywords.len() > limits.max_meta_keywords {
        errors.add(
            "metaKeywords",
            format!("At most {} keywords are allowed", limits.max_meta_keywords),
        );
    }

    errors.into_result()
}
