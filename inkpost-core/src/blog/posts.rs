//! Blog posts and their comments (`posts` collection)

use super::timestamp;
use crate::error::{BlogError, BlogResult, StoreError};
use crate::store::{from_document, to_document, Collection, Document, DocumentStore, Query};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Comment embedded in a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub author: String,
    pub content: String,
    pub date: String,
}

/// Post document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    /// Category id
    #[serde(default)]
    pub category: String,
    /// Resolved on read, never stored
    #[serde(skip)]
    pub category_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Fields supplied when creating a post
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub image_url: Option<String>,
    pub excerpt: Option<String>,
}

/// Partial post update
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub excerpt: Option<String>,
}

/// Repository for the `posts` collection
#[derive(Clone)]
pub struct PostRepository {
    store: Arc<dyn DocumentStore>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a post, returning its generated id
    pub async fn create_post(&self, post: NewPost) -> BlogResult<String> {
        if post.title.trim().is_empty() {
            return Err(BlogError::Validation("post title is required".to_string()));
        }

        let now = timestamp();
        let doc = Post {
            id: String::new(),
            title: post.title,
            content: post.content,
            author: post.author,
            category: post.category,
            category_name: String::new(),
            image_url: post.image_url,
            excerpt: post.excerpt,
            comments: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        };
        let id = self.store.create(Collection::POSTS, to_document(&doc)?).await?;
        log::debug!("Created post {}", id);
        Ok(id)
    }

    /// All posts, newest first, with category names resolved
    pub async fn get_posts(&self) -> BlogResult<Vec<Post>> {
        let docs = self.store.query(Collection::POSTS, Query::order_by_desc("createdAt")).await?;
        let names = self.category_names().await?;

        docs.into_iter()
            .map(|stored| {
                let mut post: Post = from_document(stored.data)?;
                post.id = stored.id;
                post.category_name =
                    names.get(&post.category).cloned().unwrap_or_else(|| post.category.clone());
                Ok(post)
            })
            .collect()
    }

    pub async fn get_post_by_id(&self, id: &str) -> BlogResult<Option<Post>> {
        let Some(data) = self.store.get(Collection::POSTS, id).await? else {
            return Ok(None);
        };
        let mut post: Post = from_document(data)?;
        post.id = id.to_string();
        post.category_name = match self.store.get(Collection::CATEGORIES, &post.category).await? {
            Some(category) => category
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| post.category.clone()),
            None => post.category.clone(),
        };
        Ok(Some(post))
    }

    /// Merge fields into a post and refresh `updatedAt`
    pub async fn update_post(&self, id: &str, update: PostUpdate) -> BlogResult<()> {
        let mut fields = Document::new();
        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(BlogError::Validation("post title is required".to_string()));
            }
            fields.insert("title".to_string(), Value::String(title));
        }
        let optional = [
            ("content", update.content),
            ("category", update.category),
            ("imageUrl", update.image_url),
            ("excerpt", update.excerpt),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value));
            }
        }
        fields.insert("updatedAt".to_string(), Value::String(timestamp()));
        self.store.update(Collection::POSTS, id, fields).await?;
        Ok(())
    }

    pub async fn delete_post(&self, id: &str) -> BlogResult<()> {
        self.store.delete(Collection::POSTS, id).await?;
        Ok(())
    }

    /// Append a comment, returning the post's full comment list
    pub async fn add_comment(&self, post_id: &str, comment: Comment) -> BlogResult<Vec<Comment>> {
        let data = self
            .store
            .get(Collection::POSTS, post_id)
            .await?
            .ok_or_else(|| BlogError::NotFound { kind: "post", id: post_id.to_string() })?;
        let post: Post = from_document(data)?;

        let mut comments = post.comments;
        comments.push(comment);

        let mut fields = Document::new();
        fields.insert(
            "comments".to_string(),
            serde_json::to_value(&comments).map_err(StoreError::from)?,
        );
        fields.insert("updatedAt".to_string(), Value::String(timestamp()));
        self.store.update(Collection::POSTS, post_id, fields).await?;
        Ok(comments)
    }

    async fn category_names(&self) -> BlogResult<HashMap<String, String>> {
        let categories = self.store.query(Collection::CATEGORIES, Query::all()).await?;
        Ok(categories
            .into_iter()
            .filter_map(|stored| {
                let name = stored.data.get("name").and_then(Value::as_str)?.to_string();
                Some((stored.id, name))
            })
            .collect())
    }
}
