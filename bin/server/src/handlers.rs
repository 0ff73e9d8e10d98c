pub mod download;
pub mod error;
pub mod files;
pub mod health;
pub mod login;
pub mod signup;
pub mod upload;
pub mod upload_form;

use actix_multipart::form::MultipartFormConfig;
use actix_web::web;

/// Register every route plus JSON error bodies for malformed payloads
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| error::payload_error(err)))
        .app_data(
            web::PathConfig::default().error_handler(|err, _req| error::payload_error(err)),
        )
        .app_data(
            MultipartFormConfig::default()
                .total_limit(26 * 1024 * 1024)
                .error_handler(|err, _req| error::payload_error(err)),
        )
        .service(health::health)
        .service(signup::signup)
        .service(signup::verify_email)
        .service(login::login)
        .service(files::list_files)
        .service(files::download_link)
        .service(upload::upload)
        .service(download::download);
}
