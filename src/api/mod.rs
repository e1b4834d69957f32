//! HTTP surface: route table, shared state, and handlers grouped by area.

mod admin;
mod courses;
mod payments;
mod users;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::notify::Mailer;
use crate::payments::PaymentGateway;
use crate::store::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<Mailer>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<MemoryStore>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<Mailer>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            mailer,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // accounts
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", get(users::logout))
        .route("/me", get(users::profile).delete(users::delete_my_profile))
        .route("/changepassword", put(users::change_password))
        .route("/updateprofile", put(users::update_profile))
        .route("/forgotpassword", post(users::forgot_password))
        .route("/resetpassword/{token}", put(users::reset_password))
        .route("/addtoplaylist", post(users::add_to_playlist))
        .route("/removefromplaylist", delete(users::remove_from_playlist))
        // catalog
        .route("/courses", get(courses::list))
        .route("/createcourse", post(courses::create))
        .route(
            "/course/{id}",
            get(courses::lectures)
                .post(courses::add_lecture)
                .delete(courses::delete_course),
        )
        .route("/lecture", delete(courses::delete_lecture))
        // subscriptions
        .route("/paymentkey", get(payments::payment_key))
        .route("/subscribe", post(payments::subscribe))
        .route("/paymentverification", post(payments::verify_payment))
        .route("/subscribe/cancel", delete(payments::cancel))
        // forms + admin
        .route("/contact", post(admin::contact))
        .route("/courserequest", post(admin::course_request))
        .route("/admin/stats", get(admin::dashboard_stats))
        .route("/admin/users", get(users::list_users))
        .route(
            "/admin/user/{id}",
            put(users::update_user_role).delete(users::delete_user),
        );

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api/v1", api)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
