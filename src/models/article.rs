use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A categorized label attached to an article
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tag: String,
    pub tag_type: String,
}

impl Tag {
    pub fn new(tag: impl Into<String>, tag_type: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            tag_type: tag_type.into(),
        }
    }
}

/// An outbound reference from an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

impl Link {
    pub fn new(
        href: impl Into<String>,
        rel: Option<String>,
        link_type: Option<String>,
    ) -> Self {
        Self {
            href: href.into(),
            rel,
            link_type,
        }
    }

    /// A link with only an `href`
    pub fn href(href: impl Into<String>) -> Self {
        Self::new(href, None, None)
    }
}

/// A syndicated content item
///
/// `url` is the article's identity and the document id it is written under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "URL", default)]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Article {
    /// Fields searched by a free-text query when the caller has no preference
    pub const DEFAULT_SEARCH_FIELDS: [&'static str; 6] =
        ["URL", "content", "author", "title", "description", "source"];

    pub fn builder() -> ArticleBuilder {
        ArticleBuilder::default()
    }

    /// Serialize to the JSON document stored by the engine
    pub fn to_document(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// An article returned by a search, with its relevance score and engine id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleHit {
    /// Engine-assigned document id
    pub id: String,

    /// Relevance, higher is more relevant
    pub search_score: f32,

    #[serde(flatten)]
    pub article: Article,
}

impl ArticleHit {
    /// Build a hit from a raw engine document body
    pub fn from_source(
        id: impl Into<String>,
        score: f32,
        source: serde_json::Value,
    ) -> serde_json::Result<Self> {
        let article: Article = serde_json::from_value(source)?;
        Ok(Self {
            id: id.into(),
            search_score: score,
            article,
        })
    }

    pub fn into_article(self) -> Article {
        self.article
    }
}

/// Fluent construction of an [`Article`]
#[derive(Debug, Clone, Default)]
pub struct ArticleBuilder {
    article: Article,
}

impl ArticleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.article.url = url.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.article.author = Some(author.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.article.content_type = Some(content_type.into());
        self
    }

    pub fn published(mut self, published: DateTime<Utc>) -> Self {
        self.article.published = Some(published);
        self
    }

    pub fn updated(mut self, updated: DateTime<Utc>) -> Self {
        self.article.updated = Some(updated);
        self
    }

    pub fn created(mut self, created: DateTime<Utc>) -> Self {
        self.article.created = Some(created);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.article.content = Some(content.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.article.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.article.description = Some(description.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.article.source = Some(source.into());
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.article.tags.push(tag);
        self
    }

    pub fn tag_pair(self, tag: impl Into<String>, tag_type: impl Into<String>) -> Self {
        self.tag(Tag::new(tag, tag_type))
    }

    pub fn link(mut self, link: Link) -> Self {
        self.article.links.push(link);
        self
    }

    pub fn link_href(self, href: impl Into<String>) -> Self {
        self.link(Link::href(href))
    }

    pub fn build(self) -> Article {
        self.article
    }
}
