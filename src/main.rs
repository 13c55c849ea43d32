use std::time::Duration;

use commun_wallet::projection::store::PgStore;
use commun_wallet::projection::{subscriber, Projector};
use commun_wallet::{config, start};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("commun_wallet=info")),
        )
        .init();

    let url = &std::env::var("DATABASE_URL").expect("failed to get database url");
    let pool = sqlx::PgPool::connect(url)
        .await
        .expect("failed to connect to the database");

    if config::env_flag("ENABLE_READ_MODE", true) {
        start(config::Config::from_env(), pool.clone());
    }

    if config::env_flag("ENABLE_WRITE_MODE", true) {
        // The block stream arrives as JSON lines; the transport feeding stdin
        // is an external collaborator. A dispersal or rollback failure must
        // stop the process: continuing would diverge from the chain.
        let mut projector = Projector::new(PgStore::new(pool));
        let reader = tokio::io::BufReader::new(tokio::io::stdin());
        if let Err(error) = subscriber::run(&mut projector, reader).await {
            tracing::error!("Error while processing the block stream: {}", error);
            std::process::exit(1);
        }
    } else {
        loop {
            tokio::time::sleep(Duration::from_secs(100)).await;
        }
    }
}
