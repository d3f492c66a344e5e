//! Email composition: site identity, askama templates and link building.

use askama::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{Post, Subscriber};
use crate::error::DomainError;
use crate::ports::EmailMessage;

/// Public identity of the blog, used in every outgoing email.
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    pub author: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "Quill".to_string(),
            url: "http://localhost:8080".to_string(),
            author: "The Quill author".to_string(),
        }
    }
}

/// The part of a post a notification needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub topic: String,
    pub tags: Vec<String>,
    pub reading_time_minutes: u32,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: Some(post.summary()),
            topic: post.topic.clone(),
            tags: post.tags.clone(),
            reading_time_minutes: post.reading_time_minutes,
            published_at: post.published_at,
        }
    }
}

/// Someone to notify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<&Subscriber> for Recipient {
    fn from(subscriber: &Subscriber) -> Self {
        Self {
            email: subscriber.email.clone(),
            name: subscriber.name.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "email/blog_notification.html")]
struct BlogNotificationEmail<'a> {
    site: &'a SiteInfo,
    title: &'a str,
    excerpt: &'a str,
    topic: &'a str,
    tags: String,
    reading_time: u32,
    published: String,
    post_url: String,
    unsubscribe_url: String,
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmail<'a> {
    site: &'a SiteInfo,
    greeting_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/test.html")]
struct TestEmail<'a> {
    site: &'a SiteInfo,
}

fn render(template: &impl Template, what: &str) -> Result<String, DomainError> {
    template.render().map_err(|e| {
        tracing::error!(template = what, error = %e, "Email template rendering failed");
        DomainError::Provider(format!("Failed to render {what} email"))
    })
}

/// Builds every email the blog sends.
#[derive(Debug, Clone, Default)]
pub struct EmailTemplates {
    site: SiteInfo,
}

impl EmailTemplates {
    pub fn new(site: SiteInfo) -> Self {
        Self { site }
    }

    pub fn site(&self) -> &SiteInfo {
        &self.site
    }

    fn link(&self, path: &str) -> Result<Url, DomainError> {
        Url::parse(&self.site.url)
            .and_then(|base| base.join(path))
            .map_err(|e| DomainError::Provider(format!("Invalid site URL: {e}")))
    }

    /// `<site>/unsubscribe?email=<url-encoded email>`.
    pub fn unsubscribe_url(&self, email: &str) -> Result<String, DomainError> {
        let mut url = self.link("unsubscribe")?;
        url.query_pairs_mut().append_pair("email", email);
        Ok(url.to_string())
    }

    pub fn post_url(&self, slug: &str) -> Result<String, DomainError> {
        Ok(self.link(&format!("blog/{slug}"))?.to_string())
    }

    /// Personalised new-post email for one recipient.
    pub fn blog_notification(
        &self,
        post: &PostSummary,
        recipient: &Recipient,
    ) -> Result<EmailMessage, DomainError> {
        let template = BlogNotificationEmail {
            site: &self.site,
            title: &post.title,
            excerpt: post.excerpt.as_deref().unwrap_or_default(),
            topic: if post.topic.trim().is_empty() {
                "General"
            } else {
                post.topic.as_str()
            },
            tags: post.tags.join(", "),
            reading_time: post.reading_time_minutes.max(1),
            published: post
                .published_at
                .unwrap_or_else(Utc::now)
                .format("%B %-d, %Y")
                .to_string(),
            post_url: self.post_url(&post.slug)?,
            unsubscribe_url: self.unsubscribe_url(&recipient.email)?,
        };

        Ok(EmailMessage {
            to: recipient.email.clone(),
            subject: format!("New Blog Post: {}", post.title),
            html: render(&template, "blog notification")?,
        })
    }

    pub fn welcome(&self, email: &str, name: Option<&str>) -> Result<EmailMessage, DomainError> {
        let template = WelcomeEmail {
            site: &self.site,
            greeting_name: name.filter(|n| !n.trim().is_empty()).unwrap_or("there"),
        };

        Ok(EmailMessage {
            to: email.to_string(),
            subject: format!("Welcome to the {} newsletter!", self.site.name),
            html: render(&template, "welcome")?,
        })
    }

    pub fn test(&self, email: &str, subject: Option<&str>) -> Result<EmailMessage, DomainError> {
        let template = TestEmail { site: &self.site };

        Ok(EmailMessage {
            to: email.to_string(),
            subject: subject
                .map(str::to_string)
                .unwrap_or_else(|| format!("Test email from {}", self.site.name)),
            html: render(&template, "test")?,
        })
    }
}
