pub mod me;
pub mod subscribe;
pub mod subscriptions;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me::me))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route(
            "/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        me::me,
        subscribe::subscribe,
        subscribe::unsubscribe,
        subscriptions::list_subscriptions,
    ),
    components(schemas(subscriptions::FeedEntry))
)]
pub struct ApiDoc;
