use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::debug;
use uuid::Uuid;

use crate::authorization::{Authorization, TokenKeys};
use crate::credentials::CredentialHasher;
use crate::error::ApiError;
use crate::model::{BlogPost, ListedPost, NewPost, PostPatch, User};
use crate::posts::PostService;
use crate::store::MemoryStore;
use crate::users::{Login, LoginResponse, Registration, UserService};

/// Application state
/// Should be cheaply cloneable
#[derive(Clone)]
pub struct ApplicationState {
    authorization: Authorization,
    posts: PostService,
    users: UserService,
}

impl ApplicationState {
    pub fn new(authorization: Authorization, posts: PostService, users: UserService) -> Self {
        Self {
            authorization,
            posts,
            users,
        }
    }

    /// State backed by a fresh in-process store.
    pub fn in_memory(keys: TokenKeys, hasher: Arc<dyn CredentialHasher>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            Authorization::new(keys.clone(), store.clone()),
            PostService::new(store.clone(), store.clone()),
            UserService::new(store, hasher, keys),
        )
    }
}

pub fn router(state: ApplicationState) -> Router {
    Router::new()
        .route("/api/blogs", get(list_posts).post(create_post))
        .route(
            "/api/blogs/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/login", post(login))
        .with_state(state)
}

pub async fn list_users(
    State(ApplicationState { users, .. }): State<ApplicationState>,
) -> Result<Json<Vec<User>>, ApiError> {
    users.list().await.map(Json)
}

pub async fn create_user(
    State(ApplicationState { users, .. }): State<ApplicationState>,
    body: Result<Json<Registration>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(registration) = body.map_err(invalid_body)?;
    users.register(registration).await.map(Json)
}

pub async fn login(
    State(ApplicationState { users, .. }): State<ApplicationState>,
    body: Result<Json<Login>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(login) = body.map_err(invalid_body)?;
    users.login(login).await.map(Json)
}

pub async fn list_posts(
    State(ApplicationState { posts, .. }): State<ApplicationState>,
) -> Result<Json<Vec<ListedPost>>, ApiError> {
    posts.list().await.map(Json)
}

pub async fn get_post(
    State(ApplicationState { posts, .. }): State<ApplicationState>,
    Path(id): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;
    posts.find(id).await.map(Json)
}

pub async fn create_post(
    State(ApplicationState {
        authorization,
        posts,
        ..
    }): State<ApplicationState>,
    headers: HeaderMap,
    body: Result<Json<NewPost>, JsonRejection>,
) -> Result<Json<BlogPost>, ApiError> {
    // 401 takes precedence over a bad body
    let owner = authorization.authenticate(&headers).await?;
    let Json(payload) = body.map_err(invalid_body)?;
    posts.create(&owner, payload).await.map(Json)
}

pub async fn delete_post(
    State(ApplicationState { posts, .. }): State<ApplicationState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if let Some(id) = parse_id(&id) {
        posts.delete(id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_post(
    State(ApplicationState { posts, .. }): State<ApplicationState>,
    Path(id): Path<String>,
    body: Result<Json<PostPatch>, JsonRejection>,
) -> Result<Json<BlogPost>, ApiError> {
    let id = parse_id(&id).ok_or(ApiError::NotFound)?;
    let Json(patch) = body.map_err(invalid_body)?;
    posts.update(id, patch).await.map(Json)
}

fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw)
        .inspect_err(|e| debug!("ignoring malformed id {raw:?}: {e}"))
        .ok()
}

fn invalid_body(rejection: JsonRejection) -> ApiError {
    debug!("rejected request body: {}", rejection.body_text());
    ApiError::Validation("malformed request body".into())
}
