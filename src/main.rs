#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
use std::sync::Arc;

use bloglist::authorization::TokenKeys;
use bloglist::credentials::Argon2Hasher;
use bloglist::front::{ApplicationState, router};
use bloglist::logging;
use shuttle_runtime::{CustomError, SecretStore};

#[expect(clippy::unused_async)]
#[shuttle_runtime::main]
async fn axum(#[shuttle_runtime::Secrets] secrets: SecretStore) -> shuttle_axum::ShuttleAxum {
    logging::init_logging().map_err(CustomError::msg)?;
    let keys = TokenKeys::from_secrets(&secrets).map_err(CustomError::msg)?;
    let router = router(ApplicationState::in_memory(keys, Arc::new(Argon2Hasher)));

    Ok(router.into())
}
