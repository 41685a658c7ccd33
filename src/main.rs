mod auth;
mod config;
mod db;
mod errors;
mod filters;
mod handlers;
mod media;
mod middleware;
mod models;
mod state;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use actix_governor::{Governor, GovernorConfigBuilder};
use dotenv::dotenv;

use auth::TokenService;
use config::AppConfig;
use media::{CloudinaryClient, MediaStore};
use middleware::Authentication;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut app_config = AppConfig::from_env().expect("Invalid configuration");

    let database = config::init_database(&app_config)
        .await
        .expect("Failed to connect to database");

    if let Err(e) = db::ensure_indexes(&database).await {
        log::warn!("Could not create indexes: {}", e);
    }

    let tokens = Arc::new(TokenService::new(
        &app_config.jwt_secret,
        app_config.jwt_ttl_hours,
    ));

    let media = match app_config.cloudinary.take() {
        Some(cloudinary) => {
            log::info!("Uploads go to Cloudinary folder {}", cloudinary.folder);
            Some(Arc::new(CloudinaryClient::new(cloudinary)) as Arc<dyn MediaStore>)
        }
        None => {
            log::warn!("CLOUDINARY_* not set, upload endpoints are disabled");
            None
        }
    };

    let state = web::Data::new(AppState::with_database(
        &database,
        tokens.clone(),
        media,
        app_config.bcrypt_cost,
    ));

    // Configure rate limiting: 1 request per second, bursts of 60
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(1)
        .burst_size(60)
        .finish()
        .unwrap();

    let frontend_url = app_config.frontend_url.clone();
    log::info!("Listening on {}:{}", app_config.host, app_config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(Governor::new(&governor_conf))
            .wrap(Authentication::new(tokens.clone()))
            .app_data(state.clone())
            .app_data(handlers::json_config())
            .configure(handlers::configure)
    })
    .bind((app_config.host.as_str(), app_config.port))?
    .run()
    .await
}
