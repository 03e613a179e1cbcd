//! User documents (`users` collection, keyed by identity uid)

use super::timestamp;
use crate::error::{BlogError, BlogResult};
use crate::identity::Identity;
use crate::store::{from_document, to_document, Collection, Document, DocumentStore, Query};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// User document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl UserDoc {
    pub fn new(email: impl Into<String>, roles: Vec<String>) -> Self {
        let now = timestamp();
        Self { email: email.into(), roles, created_at: now.clone(), updated_at: now }
    }
}

/// User document with its uid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: String,
    pub doc: UserDoc,
}

/// Partial user update
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
}

/// Repository for the `users` collection
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Write the user document for an identity, replacing any existing one
    pub async fn create_user_document(
        &self,
        identity: &Identity,
        roles: Vec<String>,
    ) -> BlogResult<UserDoc> {
        let doc = UserDoc::new(identity.email.clone(), roles);
        self.store.set(Collection::USERS, &identity.uid, to_document(&doc)?).await?;
        Ok(doc)
    }

    pub async fn get_user_document(&self, uid: &str) -> BlogResult<Option<UserDoc>> {
        match self.store.get(Collection::USERS, uid).await? {
            Some(data) => Ok(Some(from_document(data)?)),
            None => Ok(None),
        }
    }

    /// Merge fields into a user document and refresh `updatedAt`
    pub async fn update_user_document(&self, uid: &str, update: UserUpdate) -> BlogResult<()> {
        let mut fields = Document::new();
        if let Some(email) = update.email {
            fields.insert("email".to_string(), Value::String(email));
        }
        if let Some(roles) = update.roles {
            fields.insert("roles".to_string(), Value::from(roles));
        }
        fields.insert("updatedAt".to_string(), Value::String(timestamp()));
        self.store.update(Collection::USERS, uid, fields).await?;
        Ok(())
    }

    /// All users ordered by email
    pub async fn list_users(&self) -> BlogResult<Vec<UserRecord>> {
        let docs = self.store.query(Collection::USERS, Query::order_by("email")).await?;
        docs.into_iter()
            .map(|stored| Ok(UserRecord { uid: stored.id, doc: from_document(stored.data)? }))
            .collect()
    }

    /// Replace a user's roles (dashboard user management)
    pub async fn set_user_roles(&self, uid: &str, roles: Vec<String>) -> BlogResult<()> {
        let mut roles: Vec<String> =
            roles.into_iter().map(|r| r.trim().to_string()).filter(|r| !r.is_empty()).collect();
        roles.sort();
        roles.dedup();
        if roles.is_empty() {
            return Err(BlogError::Validation("a user needs at least one role".to_string()));
        }
        self.update_user_document(uid, UserUpdate { roles: Some(roles), ..Default::default() })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryDocumentStore;

    fn repo() -> UserRepository {
        UserRepository::new(Arc::new(MemoryDocumentStore::new()))
    }

    #[tokio::test]
    async fn test_create_and_get_user_document() {
        let users = repo();
        let ada = Identity::new("u1", "ada@example.com");

        users.create_user_document(&ada, vec!["user".to_string()]).await.unwrap();

        let doc = users.get_user_document("u1").await.unwrap().unwrap();
        assert_eq!(doc.email, "ada@example.com");
        assert_eq!(doc.roles, vec!["user".to_string()]);
        assert!(!doc.created_at.is_empty());

        assert!(users.get_user_document("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_user_roles_normalises() {
        let users = repo();
        let ada = Identity::new("u1", "ada@example.com");
        users.create_user_document(&ada, vec!["user".to_string()]).await.unwrap();

        users
            .set_user_roles("u1", vec!["admin".into(), " user ".into(), "admin".into()])
            .await
            .unwrap();
        let doc = users.get_user_document("u1").await.unwrap().unwrap();
        assert_eq!(doc.roles, vec!["admin".to_string(), "user".to_string()]);

        let err = users.set_user_roles("u1", vec![" ".into()]).await.unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_missing_user_fails() {
        let users = repo();
        let err = users
            .update_user_document("ghost", UserUpdate { email: Some("x@y.z".into()), roles: None })
            .await
            .unwrap_err();
        assert!(matches!(err, BlogError::Store(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_users_ordered_by_email() {
        let users = repo();
        users
            .create_user_document(&Identity::new("u2", "zoe@example.com"), vec!["user".into()])
            .await
            .unwrap();
        users
            .create_user_document(&Identity::new("u1", "ada@example.com"), vec!["admin".into()])
            .await
            .unwrap();

        let listed = users.list_users().await.unwrap();
        let uids: Vec<_> = listed.iter().map(|u| u.uid.as_str()).collect();
        assert_eq!(uids, vec!["u1", "u2"]);
    }
}
