//! Route registration.

use crate::api;
use axum::{routing::get, Router};

/// Path prefix every user route lives under.
pub const USERS_PREFIX: &str = "/users";

/// Binds the user endpoints onto `router`.
///
/// | Method | Path          | Handler                  |
/// |--------|---------------|--------------------------|
/// | GET    | `/users`      | list                     |
/// | POST   | `/users`      | create                   |
/// | GET    | `/users/{id}` | placeholder              |
pub fn register(router: Router) -> Router {
    router
        .route(
            USERS_PREFIX,
            get(api::list_users_handler).post(api::create_user_handler),
        )
        .route(
            &format!("{}/{{id}}", USERS_PREFIX),
            get(api::get_user_handler),
        )
}
