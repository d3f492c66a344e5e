use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub const MIN_TITLE_LEN: usize = 5;
pub const MIN_CONTENT_LEN: usize = 100;
pub const MAX_SLUG_LEN: usize = 50;
pub const EXCERPT_LEN: usize = 150;
pub const WORDS_PER_MINUTE: usize = 200;
pub const DEFAULT_AUTHOR: &str = "Quill";

/// Post entity - a blog article, draft or published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    /// Rich text, HTML-bearing.
    pub content: String,
    pub excerpt: Option<String>,
    pub topic: String,
    pub tags: Vec<String>,
    pub featured_image: Option<String>,
    pub author_name: String,
    pub is_published: bool,
    pub is_featured: bool,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub reading_time_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Editable fields of a post, as submitted by the admin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub topic: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
}

impl PostInput {
    /// Check every documented constraint, reporting all failures at once.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut errors = Vec::new();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("Title is required".to_string());
        } else if title.chars().count() < MIN_TITLE_LEN {
            errors.push(format!(
                "Title must be at least {MIN_TITLE_LEN} characters long"
            ));
        } else if slugify(title).is_empty() {
            errors.push("Title must contain at least one letter or digit".to_string());
        }

        if self.content.trim().is_empty() {
            errors.push("Content is required".to_string());
        } else if self.content.chars().count() < MIN_CONTENT_LEN {
            errors.push(format!(
                "Content must be at least {MIN_CONTENT_LEN} characters long"
            ));
        }

        if self.topic.trim().is_empty() {
            errors.push("Topic is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Trim tags, dropping blanks and repeats while keeping the given order.
    fn normalized_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        tags
    }
}

/// Derive a URL-safe slug from a title.
///
/// Lowercases, drops everything that is not `[a-z0-9]` or whitespace,
/// collapses whitespace runs into a single `-` and truncates to
/// [`MAX_SLUG_LEN`] characters. Leading and trailing whitespace yield
/// hyphens as well.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_whitespace = false;

    for c in title.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            in_whitespace = false;
        }
    }

    // Only ASCII survives the filter, so byte truncation is char-safe.
    slug.truncate(MAX_SLUG_LEN);
    slug
}

/// Strip markup from HTML content, collapsing whitespace.
pub fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn derive_excerpt(content: &str) -> String {
    let text = plain_text(content);
    if text.chars().count() <= EXCERPT_LEN {
        return text;
    }
    let mut excerpt: String = text.chars().take(EXCERPT_LEN).collect();
    excerpt.push_str("...");
    excerpt
}

fn reading_time(content: &str) -> u32 {
    let words = plain_text(content).split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

impl Post {
    /// Build a new post from validated input.
    pub fn new(input: PostInput, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        let mut post = Self {
            id,
            title: String::new(),
            slug: String::new(),
            content: String::new(),
            excerpt: None,
            topic: String::new(),
            tags: Vec::new(),
            featured_image: None,
            author_name: DEFAULT_AUTHOR.to_string(),
            is_published: false,
            is_featured: false,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            reading_time_minutes: 1,
            created_at: now,
            updated_at: now,
            published_at: None,
        };
        post.apply(input, now);
        post
    }

    /// Overwrite the editable fields, keeping counters and identity.
    ///
    /// `published_at` is stamped on first publish, kept while the post stays
    /// published and cleared when it goes back to draft.
    pub fn apply(&mut self, input: PostInput, now: DateTime<Utc>) {
        let tags = input.normalized_tags();

        self.slug = slugify(&input.title);
        self.title = input.title.trim().to_string();
        self.reading_time_minutes = reading_time(&input.content);
        self.content = input.content;
        self.excerpt = input
            .excerpt
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self.topic = input.topic.trim().to_string();
        self.tags = tags;
        self.featured_image = input.featured_image.filter(|url| !url.trim().is_empty());
        if let Some(author) = input.author_name.filter(|a| !a.trim().is_empty()) {
            self.author_name = author.trim().to_string();
        }
        self.is_featured = input.is_featured;

        match (self.is_published, input.is_published) {
            (false, true) => self.published_at = Some(now),
            (_, false) => self.published_at = None,
            (true, true) => {}
        }
        self.is_published = input.is_published;
        self.updated_at = now;
    }

    /// The stored excerpt, or one derived from the content.
    pub fn summary(&self) -> String {
        self.excerpt
            .clone()
            .unwrap_or_else(|| derive_excerpt(&self.content))
    }
}

/// Read-only counters for a single post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStats {
    pub id: Uuid,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

impl From<&Post> for PostStats {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            view_count: post.view_count,
            like_count: post.like_count,
            comment_count: post.comment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> PostInput {
        PostInput {
            title: title.to_string(),
            content: "<p>".to_string() + &"lorem ipsum ".repeat(20) + "</p>",
            topic: "Rust".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn slugify_follows_derivation_rules() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("Rust   2024:  what's new"), "rust-2024-whats-new");
        assert_eq!(slugify(" padded "), "-padded-");
        assert_eq!(slugify("Tabs\tand\nnewlines"), "tabs-and-newlines");
        assert_eq!(slugify("Café au lait"), "caf-au-lait");
    }

    #[test]
    fn slugify_truncates_to_fifty_characters() {
        let title = "a very long title that keeps going and going well past the limit";
        let slug = slugify(title);

        assert_eq!(slug.len(), MAX_SLUG_LEN);
        assert_eq!(slug, slugify(title));
    }

    #[test]
    fn short_title_is_rejected() {
        let err = input("Tiny").validate().unwrap_err();
        match err {
            DomainError::Validation(errors) => {
                assert_eq!(errors, vec!["Title must be at least 5 characters long"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn every_failed_constraint_is_reported() {
        let bad = PostInput {
            title: "abc".into(),
            content: "too short".into(),
            topic: "  ".into(),
            ..Default::default()
        };

        match bad.validate().unwrap_err() {
            DomainError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input("Five!").validate().is_ok());
    }

    #[test]
    fn publishing_stamps_and_clears_published_at() {
        let t0 = Utc::now();
        let mut post = Post::new(input("A draft post"), t0);
        assert!(post.published_at.is_none());

        let t1 = t0 + chrono::Duration::minutes(5);
        post.apply(
            PostInput {
                is_published: true,
                ..input("A draft post")
            },
            t1,
        );
        assert_eq!(post.published_at, Some(t1));

        let t2 = t1 + chrono::Duration::minutes(5);
        post.apply(
            PostInput {
                is_published: true,
                ..input("A draft post, edited")
            },
            t2,
        );
        assert_eq!(post.published_at, Some(t1));
        assert_eq!(post.slug, "a-draft-post-edited");

        post.apply(input("A draft post"), t2);
        assert!(post.published_at.is_none());
    }

    #[test]
    fn symbol_only_title_is_rejected() {
        let err = input("!!!!!!").validate().unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(errors)
                if errors == ["Title must contain at least one letter or digit"]
        ));
        assert_eq!(slugify("!!!!!!"), "");
    }

    #[test]
    fn title_length_ignores_surrounding_whitespace() {
        assert!(matches!(
            input("   abc   ").validate(),
            Err(DomainError::Validation(errors)) if errors.len() == 1
        ));
        assert!(input("  Hello  ").validate().is_ok());
    }

    #[test]
    fn tags_are_trimmed_and_deduplicated_in_order() {
        let post = Post::new(
            PostInput {
                tags: vec![" rust ".into(), "".into(), "web".into(), "rust".into()],
                ..input("Tagged post")
            },
            Utc::now(),
        );
        assert_eq!(post.tags, vec!["rust", "web"]);
    }

    #[test]
    fn summary_derives_from_stripped_content() {
        let post = Post::new(input("Excerpt test"), Utc::now());
        let summary = post.summary();

        assert!(!summary.contains('<'));
        assert!(summary.ends_with("..."));
        assert_eq!(summary.chars().count(), EXCERPT_LEN + 3);
    }

    #[test]
    fn reading_time_is_at_least_one_minute() {
        assert_eq!(reading_time("<p>short</p>"), 1);
        assert_eq!(reading_time(&"word ".repeat(401)), 3);
    }
}
