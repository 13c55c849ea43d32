use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use actix_web_prom::PrometheusMetricsBuilder;
use paperclip::actix::OpenApiExt;

pub mod config;
pub mod curve;
mod db_helpers;
pub mod errors;
mod modules;
pub mod projection;
pub mod types;

pub(crate) use sqlx::types::BigDecimal;

pub type Result<T> = std::result::Result<T, errors::Error>;

pub(crate) const LOGGER_MSG: &str = "commun_wallet";

// Chain constants. Actions and events are routed by contract account; value
// classification keys off the distinguished accounts below.
pub(crate) const TOKEN_CONTRACT: &str = "cyber.token";
pub(crate) const POINT_CONTRACT: &str = "c.point";
pub(crate) const LIST_CONTRACT: &str = "c.list";
pub(crate) const GALLERY_CONTRACT: &str = "c.gallery";
pub(crate) const SOCIAL_CONTRACT: &str = "c.social";
pub(crate) const DOMAIN_CONTRACT: &str = "cyber.domain";
/// The only account whose `newusername` registrations are projected.
pub(crate) const USERNAME_REGISTRAR: &str = "c";
pub(crate) const BOUNTY_ACCOUNT: &str = "c.bounty";
pub(crate) const BURN_ACCOUNT: &str = "cyber.null";
/// Symbolic alias of the base reserve currency.
pub(crate) const RESERVE_SYMBOL: &str = "CMN";

/// Spawns the read API over the projected store. Reads are pure queries; they
/// never block the projection writer and never block each other.
pub fn start(config: config::Config, pool: sqlx::Pool<sqlx::Postgres>) {
    let prometheus = PrometheusMetricsBuilder::new("commun_wallet")
        .endpoint("/metrics")
        .build()
        .expect("failed to set up the prometheus middleware");

    let addr = config.addr.clone();
    let server = HttpServer::new(move || {
        let cors = if config
            .cors_allowed_origins
            .iter()
            .any(|origin| origin == "*")
        {
            Cors::permissive()
        } else {
            config
                .cors_allowed_origins
                .iter()
                .fold(Cors::default().allowed_methods(vec!["GET"]), |cors, origin| {
                    cors.allowed_origin(origin)
                })
        };

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::JsonConfig::default().limit(config.limits.input_payload_max_size))
            .wrap(prometheus.clone())
            .wrap(cors)
            .wrap_api()
            .configure(modules::wallet::register_services)
            .with_json_spec_at("/api/spec/v2")
            .build()
    })
    .bind(addr)
    .expect("failed to bind the server address")
    .run();

    tokio::spawn(server);
}
