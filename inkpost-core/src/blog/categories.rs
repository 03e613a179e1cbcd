//! Post categories (`categories` collection)

use super::timestamp;
use crate::error::{BlogError, BlogResult};
use crate::store::{from_document, to_document, Collection, Document, DocumentStore, Query};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Badge colors a category may use
pub const CATEGORY_COLORS: [&str; 8] = [
    "bg-blue-500",
    "bg-purple-500",
    "bg-pink-500",
    "bg-green-500",
    "bg-yellow-500",
    "bg-red-500",
    "bg-orange-500",
    "bg-gray-500",
];

/// Check a color against the palette
pub fn validate_color(color: &str) -> bool {
    CATEGORY_COLORS.contains(&color)
}

/// Category document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Fields supplied when creating a category
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
}

/// Partial category update
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// Repository for the `categories` collection
#[derive(Clone)]
pub struct CategoryRepository {
    store: Arc<dyn DocumentStore>,
}

impl CategoryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a category, returning its generated id
    pub async fn create_category(&self, category: NewCategory) -> BlogResult<String> {
        let name = category.name.trim().to_string();
        if name.is_empty() {
            return Err(BlogError::Validation("category name is required".to_string()));
        }
        if !validate_color(&category.color) {
            return Err(BlogError::InvalidColor(category.color));
        }

        let now = timestamp();
        let doc = Category {
            id: String::new(),
            name,
            color: category.color,
            created_at: now.clone(),
            updated_at: now,
        };
        let id = self.store.create(Collection::CATEGORIES, to_document(&doc)?).await?;
        log::debug!("Created category {} ({})", doc.name, id);
        Ok(id)
    }

    /// All categories ordered by name
    pub async fn get_categories(&self) -> BlogResult<Vec<Category>> {
        let docs = self.store.query(Collection::CATEGORIES, Query::order_by("name")).await?;
        docs.into_iter()
            .map(|stored| {
                let mut category: Category = from_document(stored.data)?;
                category.id = stored.id;
                Ok(category)
            })
            .collect()
    }

    pub async fn get_category_by_id(&self, id: &str) -> BlogResult<Option<Category>> {
        match self.store.get(Collection::CATEGORIES, id).await? {
            Some(data) => {
                let mut category: Category = from_document(data)?;
                category.id = id.to_string();
                Ok(Some(category))
            }
            None => Ok(None),
        }
    }

    /// Merge fields into a category and refresh `updatedAt`
    pub async fn update_category(&self, id: &str, update: CategoryUpdate) -> BlogResult<()> {
        let mut fields = Document::new();
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BlogError::Validation("category name is required".to_string()));
            }
            fields.insert("name".to_string(), Value::String(name));
        }
        if let Some(color) = update.color {
            if !validate_color(&color) {
                return Err(BlogError::InvalidColor(color));
            }
            fields.insert("color".to_string(), Value::String(color));
        }
        fields.insert("updatedAt".to_string(), Value::String(timestamp()));
        self.store.update(Collection::CATEGORIES, id, fields).await?;
        Ok(())
    }

    pub async fn delete_category(&self, id: &str) -> BlogResult<()> {
        self.store.delete(Collection::CATEGORIES, id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    fn repo() -> CategoryRepository {
        CategoryRepository::new(Arc::new(MemoryDocumentStore::new()))
    }

    fn new_category(name: &str, color: &str) -> NewCategory {
        NewCategory { name: name.to_string(), color: color.to_string() }
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("bg-blue-500"));
        assert!(validate_color("bg-gray-500"));
        assert!(!validate_color("bg-blue-600"));
        assert!(!validate_color(""));
    }

    #[tokio::test]
    async fn test_create_and_list_sorted_by_name() {
        let categories = repo();
        categories.create_category(new_category("Rust", "bg-orange-500")).await.unwrap();
        let go = categories.create_category(new_category("Go", "bg-blue-500")).await.unwrap();

        let listed = categories.get_categories().await.unwrap();
        let names: Vec<_> = listed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Go", "Rust"]);
        assert_eq!(listed[0].id, go);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let categories = repo();
        assert!(matches!(
            categories.create_category(new_category("Rust", "bg-teal-500")).await.unwrap_err(),
            BlogError::InvalidColor(_)
        ));
        assert!(matches!(
            categories.create_category(new_category("  ", "bg-red-500")).await.unwrap_err(),
            BlogError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let categories = repo();
        let id = categories.create_category(new_category("Rust", "bg-orange-500")).await.unwrap();

        categories
            .update_category(
                &id,
                CategoryUpdate { color: Some("bg-red-500".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        let updated = categories.get_category_by_id(&id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Rust");
        assert_eq!(updated.color, "bg-red-500");

        let err = categories
            .update_category(&id, CategoryUpdate { color: Some("pink".into()), name: None })
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::InvalidColor(_)));

        categories.delete_category(&id).await.unwrap();
        assert!(categories.get_category_by_id(&id).await.unwrap().is_none());
    }
}
