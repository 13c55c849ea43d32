use actix_web::{error, HttpResponse};
use actix_web_validator::{Error, PathConfig};
use paperclip::actix::web;

mod data_provider;
mod resources;
mod schemas;

#[derive(serde::Serialize)]
pub struct ValidationErrorJsonPayload {
    pub message: String,
    pub fields: Vec<String>,
}

/// Custom error handler
impl From<&validator::ValidationErrors> for ValidationErrorJsonPayload {
    fn from(error: &validator::ValidationErrors) -> Self {
        ValidationErrorJsonPayload {
            message: "Validation error".to_owned(),
            fields: error
                .field_errors()
                .iter()
                .map(|(field, _)| field.to_string())
                .collect(),
        }
    }
}

pub(crate) fn register_services(app: &mut web::ServiceConfig) {
    app.app_data(PathConfig::default().error_handler(|err, _| {
        let json_error = match &err {
            Error::Validate(error) => ValidationErrorJsonPayload::from(error),
            _ => ValidationErrorJsonPayload {
                message: err.to_string(),
                fields: Vec::new(),
            },
        };
        error::InternalError::from_response(err, HttpResponse::Conflict().json(json_error)).into()
    }))
    .service(web::resource("/balances/{user_id}").route(web::get().to(resources::get_balances)))
    .service(
        web::resource("/history/{user_id}").route(web::get().to(resources::get_transfer_history)),
    )
    .service(
        web::resource("/claims/{user_id}").route(web::get().to(resources::get_claim_history)),
    )
    .service(web::resource("/prices/sell").route(web::get().to(resources::get_sell_price)))
    .service(web::resource("/prices/buy").route(web::get().to(resources::get_buy_price)))
    .service(web::resource("/points/{symbol}").route(web::get().to(resources::get_point_info)));
}
