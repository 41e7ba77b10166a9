//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod error;
pub mod group_sets;
pub mod groups;
pub mod health;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub(crate) mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler together with the extractor error
/// handlers, so malformed bodies and paths answer with the JSON error shape.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use groups_backend::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| error::extractor_error(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| error::extractor_error(err)))
        .service(users::login)
        .service(group_sets::list_group_sets)
        .service(group_sets::create_group_set)
        .service(group_sets::update_group_set)
        .service(group_sets::delete_group_set)
        .service(groups::list_unit_groups)
        .service(groups::list_groups)
        .service(groups::create_group)
        .service(groups::get_group)
        .service(groups::update_group)
        .service(groups::delete_group)
        .service(groups::list_members)
        .service(groups::add_member)
        .service(groups::remove_member);
}
