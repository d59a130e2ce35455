mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod policy;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::Config;
use dotenv::dotenv;
use routes::create_router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::filter::LevelFilter;

use crate::db::{db::DBClient, userdb::UserExt};
use crate::models::usermodel::UserRole;
use crate::service::{role_request_service::RoleRequestService, ticket_service::TicketService};
use crate::utils::password;

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub ticket_service: Arc<TicketService>,
    pub role_request_service: Arc<RoleRequestService>,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client_arc = Arc::new(db_client);

        let ticket_service = Arc::new(TicketService::new(db_client_arc.clone()));
        let role_request_service = Arc::new(RoleRequestService::new(db_client_arc.clone()));

        Self {
            env: config,
            db_client: db_client_arc,
            ticket_service,
            role_request_service,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .init();

    dotenv().ok();

    let config = Config::init();

    let db_client = DBClient::new();
    let app_state = Arc::new(AppState::new(db_client, config.clone()));

    // Fresh store has no accounts; seed the bootstrap admin so someone can
    // review role requests.
    match app_state.db_client.user_count().await {
        Ok(0) => {
            let hashed_password = match password::hash(&config.admin_password) {
                Ok(hashed) => hashed,
                Err(e) => {
                    println!("🔥 Failed to hash the bootstrap admin password: {:?}", e);
                    std::process::exit(1);
                }
            };

            match app_state
                .db_client
                .save_user(
                    config.admin_name.clone(),
                    config.admin_email.clone(),
                    hashed_password,
                    UserRole::Admin,
                )
                .await
            {
                Ok(admin) => println!("✅ Bootstrap admin created: {}", admin.email),
                Err(e) => {
                    println!("🔥 Failed to create the bootstrap admin: {:?}", e);
                    std::process::exit(1);
                }
            }
        }
        Ok(_) => {}
        Err(e) => {
            println!("🔥 Failed to inspect the user store: {:?}", e);
            std::process::exit(1);
        }
    }

    let allowed_origins = vec![
        "http://localhost:5173".parse::<HeaderValue>().unwrap(),
        "http://localhost:3000".parse::<HeaderValue>().unwrap(),
        "http://localhost:8000".parse::<HeaderValue>().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app = create_router(app_state.clone()).layer(cors);

    println!("🚀 Server is running on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", &config.port))
        .await
        .unwrap();

    axum::serve(listener, app).await.unwrap();
}
