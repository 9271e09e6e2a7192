use async_trait::async_trait;
use eyre::{ContextCompat, bail};
use indexmap::IndexMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::model::{BlogPost, PostId, PostPatch, User, UserId};
use crate::store::{PostStore, UserStore};

/// Process-local store for users and posts.
///
/// Maps keep insertion order so listings come back in creation order.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<IndexMap<UserId, User>>,
    posts: RwLock<IndexMap<PostId, BlogPost>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> eyre::Result<bool> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Ok(false);
        }
        if users.contains_key(&user.id) {
            bail!("user {} already exists", user.id);
        }
        debug!("registered user {}", user.id);
        users.insert(user.id, user);
        Ok(true)
    }

    async fn find_user(&self, id: UserId) -> eyre::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> eyre::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn attach_post(&self, user: UserId, post: PostId) -> eyre::Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user)
            .with_context(|| format!("user {user} does not exist"))?;
        user.blogs.push(post);
        Ok(())
    }

    async fn list_users(&self) -> eyre::Result<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: BlogPost) -> eyre::Result<BlogPost> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            bail!("post {} already exists", post.id);
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: PostId) -> eyre::Result<Option<BlogPost>> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn update_post(&self, id: PostId, patch: PostPatch) -> eyre::Result<Option<BlogPost>> {
        let mut posts = self.posts.write().await;
        Ok(posts.get_mut(&id).map(|post| {
            patch.apply(post);
            post.clone()
        }))
    }

    async fn delete_post(&self, id: PostId) -> eyre::Result<bool> {
        Ok(self.posts.write().await.shift_remove(&id).is_some())
    }

    async fn list_posts(&self) -> eyre::Result<Vec<BlogPost>> {
        Ok(self.posts.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::model::NewUser;

    fn new_user(username: &str) -> User {
        NewUser {
            username: username.to_owned(),
            name: "Tim Farrell".to_owned(),
            password_hash: "hash".to_owned(),
        }
        .into_user()
        .unwrap()
    }

    fn post(title: &str, user: UserId) -> BlogPost {
        BlogPost {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            author: "Michael Chan".to_owned(),
            url: "https://reactpatterns.com/".to_owned(),
            likes: 0,
            user,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_not_inserted() {
        let store = MemoryStore::new();
        let first = new_user("tfarrell01");
        assert!(store.insert_user(first.clone()).await.unwrap());
        assert!(!store.insert_user(new_user("tfarrell01")).await.unwrap());
        assert_eq!(store.list_users().await.unwrap(), vec![first.clone()]);
        assert_eq!(
            store.find_by_username("tfarrell01").await.unwrap(),
            Some(first)
        );
        assert_eq!(store.find_by_username("root").await.unwrap(), None);
    }

    #[tokio::test]
    async fn attach_post_to_missing_user_fails() {
        let store = MemoryStore::new();
        assert!(store.attach_post(Uuid::new_v4(), Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn list_keeps_insertion_order_after_delete() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let first = store.insert_post(post("first", owner)).await.unwrap();
        let second = store.insert_post(post("second", owner)).await.unwrap();
        let third = store.insert_post(post("third", owner)).await.unwrap();

        assert!(store.delete_post(second.id).await.unwrap());
        assert!(!store.delete_post(second.id).await.unwrap());

        let titles: Vec<_> = store
            .list_posts()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, ["first", "third"]);
        assert_eq!(store.find_post(first.id).await.unwrap(), Some(first));
        assert_eq!(store.find_post(third.id).await.unwrap(), Some(third));
    }

    #[tokio::test]
    async fn update_of_missing_post_is_none() {
        let store = MemoryStore::new();
        let res = store
            .update_post(Uuid::new_v4(), PostPatch::default())
            .await
            .unwrap();
        assert!(res.is_none());
    }
}
