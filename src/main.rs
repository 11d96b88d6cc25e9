use std::sync::Arc;

use log::{debug, info, warn};
use simplelog::SimpleLogger;

use broadside::config::Config;
use broadside::engine::Engine;
use broadside::store::{MemoryStore, MySqlStore, Store};
use broadside::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // set up logging facility
    let _ = SimpleLogger::init(config.log_level, simplelog::Config::default());
    info!("Starting..");

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            debug!("Connecting to the database");
            let store = MySqlStore::connect(database_url).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            warn!("$DATABASE_URL is not set, battles are kept in memory and lost on restart");
            Arc::new(MemoryStore::new())
        }
    };
    let engine = Arc::new(Engine::new(store));

    let state = AppState {
        jwt_secret: config.jwt_secret.clone(),
        token_duration: config.token_duration,
    };
    let app = router(state, engine);

    debug!("Listening on {}", config.listen_addr);
    axum::Server::bind(&config.listen_addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
