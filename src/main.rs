use actix_web::{middleware::Compress, App, HttpServer};
use actix_cors::Cors;
use utoipa_swagger_ui::SwaggerUi;

use hostel::auth::prepare_dummy_hash;
use hostel::config::Config;
use hostel::openapi::ApiDoc;
use hostel::repo::sqlite::SqliteRepo;
use hostel::routes::{config, AppState};
use hostel::seed::seed_warden;
use hostel::storage::build_image_store;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds; production sets the environment externally.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Bootstrapping hostel server");
    let cfg = Config::from_env();
    info!("Database: {}", cfg.database_url);
    info!("Upload directory: {}", cfg.upload_dir.display());

    // Startup failures below are fatal: schema, upload directories, seed account.
    let repo = SqliteRepo::connect(&cfg.database_url).await?;
    info!("Schema migrated");
    seed_warden(&repo, &cfg.warden).await?;
    if prepare_dummy_hash().await.is_none() {
        tracing::warn!("dummy password hash unavailable; unknown-user logins skip verification");
    }
    let image_store = build_image_store(&cfg.upload_dir).await?;

    let openapi = ApiDoc::openapi();
    let state = AppState { repo: Arc::new(repo), image_store };

    let server = HttpServer::new(move || {
        // any origin may call the API; no credentials are involved
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_header()
            .allowed_methods(["GET", "POST", "PUT", "OPTIONS"])
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(cors)
            .app_data(actix_web::web::Data::new(state.clone()))
            .configure(config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", openapi.clone()))
    })
    .bind((cfg.host.as_str(), cfg.port))?;

    info!("Listening on http://{}:{}", cfg.host, cfg.port);

    server.run().await?;
    Ok(())
}
