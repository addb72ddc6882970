pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;
pub mod store;
pub mod utils;

use actix_cors::Cors;
use actix_web::web;
use config::Config;

/// Browser access for the frontend, which is served from another origin.
pub fn cors(config: &Config) -> Cors {
    if config.cors_origins.is_empty() {
        return Cors::permissive();
    }
    config
        .cors_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "DELETE"])
        .allow_any_header()
        .max_age(3600)
}

/// Registers the CV routes on an app or test service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/cvs")
            .route(web::post().to(handlers::cv::submit_cv))
            .route(web::get().to(handlers::cv::list_cvs)),
    )
    .service(
        web::resource("/api/cvs/{id}")
            .route(web::get().to(handlers::cv::get_cv))
            .route(web::delete().to(handlers::cv::delete_cv)),
    )
    .service(
        web::resource("/uploads/{file_name}")
            .route(web::get().to(handlers::cv::download_cv_file)),
    );
}
