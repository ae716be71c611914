pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::services::{image_service::ImageHostService, mail_service::MailService};
use crate::storage::ApplicationStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn ApplicationStore>,
    pub images: ImageHostService,
    pub mailer: MailService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ApplicationStore>) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        let images = ImageHostService::new(
            config.imgbb_api_key.clone(),
            config.imgbb_endpoint.clone(),
            http_client.clone(),
        );
        let mailer = MailService::new(
            config.mail_relay_url.clone(),
            config.mail_from.clone(),
            http_client,
        );

        Self {
            config: Arc::new(config),
            store,
            images,
            mailer,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/applications",
            get(routes::application_routes::list_applications)
                .post(routes::application_routes::submit_application),
        )
        .route(
            "/api/applications/stats",
            get(routes::application_routes::application_stats),
        )
        .route(
            "/api/applications/:id",
            get(routes::application_routes::get_application)
                .patch(routes::application_routes::update_application_status)
                .delete(routes::application_routes::delete_application),
        )
        .route("/api/images", post(routes::image_routes::upload_image))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
}
