use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, persistence};
use crate::model::{BlogPost, ListedPost, NewPost, PostId, PostPatch, User, is_blank};
use crate::store::{PostStore, UserStore};

/// Reads and writes posts on top of the storage seams.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, users: Arc<dyn UserStore>) -> Self {
        Self { posts, users }
    }

    /// All posts with their owners resolved. A post whose owner is gone is
    /// listed without one.
    pub async fn list(&self) -> Result<Vec<ListedPost>, ApiError> {
        let posts = self
            .posts
            .list_posts()
            .await
            .map_err(persistence("cannot list posts"))?;
        let users: HashMap<_, _> = self
            .users
            .list_users()
            .await
            .map_err(persistence("cannot list users"))?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        Ok(posts
            .into_iter()
            .map(|p| {
                let owner = users.get(&p.user);
                ListedPost::new(p, owner)
            })
            .collect_vec())
    }

    pub async fn find(&self, id: PostId) -> Result<BlogPost, ApiError> {
        self.posts
            .find_post(id)
            .await
            .map_err(persistence("cannot load post"))?
            .ok_or(ApiError::NotFound)
    }

    /// Creates a post owned by `owner` and links it from the owner's record.
    ///
    /// Either both writes happen or neither does: when linking fails the
    /// inserted post is removed again.
    pub async fn create(&self, owner: &User, payload: NewPost) -> Result<BlogPost, ApiError> {
        let title = required(payload.title, "title")?;
        let url = required(payload.url, "url")?;
        let post = BlogPost {
            id: Uuid::new_v4(),
            title,
            author: payload.author,
            url,
            likes: payload.likes.unwrap_or(0),
            user: owner.id,
        };

        let saved = self
            .posts
            .insert_post(post)
            .await
            .map_err(persistence("cannot save post"))?;

        if let Err(e) = self.users.attach_post(owner.id, saved.id).await {
            error!("cannot link post {} to user {}: {e:?}", saved.id, owner.id);
            if let Err(e) = self.posts.delete_post(saved.id).await {
                error!("cannot roll back post {}: {e:?}", saved.id);
            }
            return Err(ApiError::Persistence);
        }

        info!("user {} created post {}", owner.id, saved.id);
        Ok(saved)
    }

    /// Applies `patch` to an existing post. Ownership is not checked.
    pub async fn update(&self, id: PostId, patch: PostPatch) -> Result<BlogPost, ApiError> {
        patch.validate()?;
        self.posts
            .update_post(id, patch)
            .await
            .map_err(persistence("cannot update post"))?
            .ok_or(ApiError::NotFound)
    }

    /// Removes a post if it exists. Ownership is not checked.
    pub async fn delete(&self, id: PostId) -> Result<(), ApiError> {
        let removed = self
            .posts
            .delete_post(id)
            .await
            .map_err(persistence("cannot delete post"))?;
        if !removed {
            warn!("post {id} was already gone");
        }
        Ok(())
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !is_blank(&v) => Ok(v),
        _ => Err(ApiError::Validation(format!("{field} is required"))),
    }
}
