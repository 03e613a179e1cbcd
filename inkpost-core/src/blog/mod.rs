//! Blog persistence
//!
//! Thin repositories over a [`DocumentStore`](crate::store::DocumentStore) for
//! the three collections the blog uses: `users`, `categories` and `posts`.
//! Documents are stored with camelCase field names and RFC 3339 timestamps.

mod categories;
mod posts;
mod users;

pub use categories::{
    validate_color, Category, CategoryRepository, CategoryUpdate, NewCategory, CATEGORY_COLORS,
};
pub use posts::{Comment, NewPost, Post, PostRepository, PostUpdate};
pub use users::{UserDoc, UserRecord, UserRepository, UserUpdate};

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 UTC string with millisecond precision
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
