use actix_web::{middleware::Logger, web, App, HttpServer};
use cv_registry_backend::config::Config;
use cv_registry_backend::service::CvService;
use cv_registry_backend::store::files::FileStore;
use dotenv::dotenv;
use log::{info, warn};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    let files = FileStore::open(&config.upload_dir)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;

    // Records live in memory only, so anything already on disk is unreferenced.
    match files.stored_names() {
        Ok(names) if !names.is_empty() => warn!(
            "{} file(s) in {} are not bound to any CV and will not be listed",
            names.len(),
            files.root().display()
        ),
        Ok(_) => {}
        Err(err) => warn!("Could not scan upload directory: {}", err),
    }

    let service = web::Data::new(CvService::new(files));
    let app_config = web::Data::new(config.clone());

    info!("CV registry backend running on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(cv_registry_backend::cors(&app_config))
            .wrap(Logger::default())
            .app_data(service.clone())
            .app_data(app_config.clone())
            .configure(cv_registry_backend::configure)
    })
    .bind(config.bind_address())?
    .run()
    .await
}
