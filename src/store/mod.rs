//! Storage seams consumed by the post service and the authorization gate.

use async_trait::async_trait;

use crate::model::{BlogPost, PostId, PostPatch, User, UserId};

mod memory;

pub use memory::MemoryStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Stores a new user. Returns `false`, storing nothing, when the
    /// username is already taken.
    async fn insert_user(&self, user: User) -> eyre::Result<bool>;

    async fn find_user(&self, id: UserId) -> eyre::Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> eyre::Result<Option<User>>;

    /// Appends `post` to the user's owned posts.
    async fn attach_post(&self, user: UserId, post: PostId) -> eyre::Result<()>;

    async fn list_users(&self) -> eyre::Result<Vec<User>>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: BlogPost) -> eyre::Result<BlogPost>;

    async fn find_post(&self, id: PostId) -> eyre::Result<Option<BlogPost>>;

    /// Returns `None` when there is no post with this id.
    async fn update_post(&self, id: PostId, patch: PostPatch) -> eyre::Result<Option<BlogPost>>;

    /// Returns whether a post was removed.
    async fn delete_post(&self, id: PostId) -> eyre::Result<bool>;

    /// All posts, in insertion order.
    async fn list_posts(&self) -> eyre::Result<Vec<BlogPost>>;
}
