use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{apply_security_headers, create_cors_layer};
use crate::handlers::{events, health_check, profiles, purchases, uploads};
use crate::middleware::auth_middleware;
use crate::AppState;

pub fn create_routes(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_check))
        .route("/events", get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/invite/:token", get(events::resolve_invitation));

    let protected = Router::new()
        .route("/events", post(events::create_event))
        .route("/events/mine", get(events::list_my_events))
        .route(
            "/events/:id",
            put(events::update_event)
                .patch(events::patch_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/publish", post(events::publish_event))
        .route(
            "/events/:id/regenerate-invitation",
            post(events::regenerate_invitation),
        )
        .route(
            "/events/:id/purchases",
            post(purchases::create_purchase).get(purchases::list_event_purchases),
        )
        .route("/upload", post(uploads::upload_media))
        .route("/auth/user", post(profiles::upsert_user))
        .route(
            "/auth/profile/:uid",
            get(profiles::get_profile).put(profiles::update_profile),
        )
        .route(
            "/auth/upgrade-to-seller/:uid",
            put(profiles::upgrade_to_seller),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer())
        .with_state(state);

    apply_security_headers(router)
}
