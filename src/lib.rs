#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]
//! Shared blog list backend: accounts, post ownership, bearer-token admission
//! and corpus statistics.

pub mod authorization;
pub mod credentials;
pub mod error;
pub mod front;
pub mod logging;
pub mod model;
pub mod posts;
pub mod stats;
pub mod store;
pub mod users;
