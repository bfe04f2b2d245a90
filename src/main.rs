use poimap_api::app::create_app;
use poimap_api::config::{load_config, save_default_config, Config};
use poimap_api::constants::{CONFIG_PATH, DATA_DIR};
use poimap_api::database::seed::{sample_points, seed_points};
use poimap_api::database::{create_pool, init_database, PointStore, SqlitePointStore};
use poimap_api::logging::{init_logging, install_panic_hook};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

fn open_store(config: &Config) -> SqlitePointStore {
    let db_path = config.database.resolved_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let pool = create_pool(&db_path, config.database.pool_size)
        .expect("Failed to create database pool");

    {
        let conn = pool.get().expect("Failed to get connection");
        init_database(&conn).expect("Failed to initialize database");
    }

    info!("Using point store at {:?}", db_path);
    SqlitePointStore::new(pool)
}

#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--init-config") {
        match save_default_config(&CONFIG_PATH) {
            Ok(_) => {
                println!("Default configuration saved to {:?}", *CONFIG_PATH);
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to save default configuration: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Load configuration
    std::fs::create_dir_all(&*DATA_DIR).ok();
    let config = Arc::new(load_config(&CONFIG_PATH));

    // Initialize logging
    init_logging(config.server.debug);
    install_panic_hook();

    let store = open_store(&config);

    if std::env::args().any(|arg| arg == "--seed") {
        match seed_points(&store, &sample_points(), true) {
            Ok(count) => {
                println!("Seeded {} points", count);
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to seed points: {}", e);
                std::process::exit(1);
            }
        }
    }

    let store: Arc<dyn PointStore> = Arc::new(store);
    let app = create_app(Arc::clone(&config), store);

    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .unwrap_or_else(|_| [0, 0, 0, 0].into());
    let addr = SocketAddr::new(ip, config.server.port);
    info!("Starting POI map API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server failed");
}
