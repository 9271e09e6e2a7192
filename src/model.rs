use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

pub type UserId = Uuid;
pub type PostId = Uuid;

const MIN_USERNAME_LEN: usize = 3;

/// A registered user.
///
/// `blogs` is a back-reference kept in sync on post creation,
/// [`BlogPost::user`] is the source of truth for ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub blogs: Vec<PostId>,
}

/// Input for registering a user. The credential arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn into_user(self) -> Result<User, ApiError> {
        if self.username.chars().count() < MIN_USERNAME_LEN {
            return Err(ApiError::Validation(format!(
                "username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        Ok(User {
            id: Uuid::new_v4(),
            username: self.username,
            name: self.name,
            password_hash: self.password_hash,
            blogs: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogPost {
    pub id: PostId,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: u64,
    /// Owner, fixed at creation.
    pub user: UserId,
}

/// Body of a create request. Everything is optional at the wire level so
/// that missing fields surface as validation errors instead of rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPost {
    pub title: Option<String>,
    #[serde(default)]
    pub author: String,
    pub url: Option<String>,
    pub likes: Option<u64>,
}

/// Body of an update request; absent fields are left untouched.
/// Carries no owner field, ownership is fixed at creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub likes: Option<u64>,
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.as_deref().is_some_and(is_blank) {
            return Err(ApiError::Validation("title must not be empty".into()));
        }
        if self.url.as_deref().is_some_and(is_blank) {
            return Err(ApiError::Validation("url must not be empty".into()));
        }
        Ok(())
    }

    pub fn apply(self, post: &mut BlogPost) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(author) = self.author {
            post.author = author;
        }
        if let Some(url) = self.url {
            post.url = url;
        }
        if let Some(likes) = self.likes {
            post.likes = likes;
        }
    }
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// The public part of a user, as embedded in listed posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerSummary {
    pub id: UserId,
    pub username: String,
    pub name: String,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }
}

/// A post with its owner resolved for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedPost {
    pub id: PostId,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: u64,
    pub user: Option<OwnerSummary>,
}

impl ListedPost {
    pub fn new(post: BlogPost, owner: Option<&User>) -> Self {
        Self {
            id: post.id,
            title: post.title,
            author: post.author,
            url: post.url,
            likes: post.likes,
            user: owner.map(OwnerSummary::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> BlogPost {
        BlogPost {
            id: Uuid::new_v4(),
            title: "React patterns".into(),
            author: "Michael Chan".into(),
            url: "https://reactpatterns.com/".into(),
            likes: 7,
            user: Uuid::new_v4(),
        }
    }

    #[test]
    fn short_username_is_rejected() {
        let res = NewUser {
            username: "ab".into(),
            name: "A B".into(),
            password_hash: "x".into(),
        }
        .into_user();
        assert!(matches!(res, Err(ApiError::Validation(_))));
    }

    #[test]
    fn patch_keeps_owner_and_untouched_fields() {
        let mut p = post();
        let owner = p.user;
        PostPatch {
            likes: Some(8),
            ..PostPatch::default()
        }
        .apply(&mut p);
        assert_eq!(p.likes, 8);
        assert_eq!(p.title, "React patterns");
        assert_eq!(p.user, owner);
    }

    #[test]
    fn patch_with_blank_url_is_invalid() {
        let patch = PostPatch {
            url: Some("  ".into()),
            ..PostPatch::default()
        };
        assert!(matches!(patch.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = NewUser {
            username: "tfarrell01".into(),
            name: "Tim Farrell".into(),
            password_hash: "secret-hash".into(),
        }
        .into_user()
        .unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "tfarrell01");
    }
}
