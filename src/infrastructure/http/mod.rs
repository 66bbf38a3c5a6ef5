use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    controllers::{
        cache::CacheController,
        health,
        tts::{TtsController, X_CACHE, X_CHARACTER_COUNT, X_PROVIDER, X_VOICE_USED},
    },
    domain::{
        artifact::{ArtifactService, TemporaryArtifactReaper},
        auth::JwtManager,
        tts::{ProviderDispatcher, TtsService},
    },
    infrastructure::{
        auth::{optional_auth_middleware, request_id_middleware, require_admin_middleware, X_GUEST_ID},
        cache::{AudioCache, CacheStore, FsCacheStore, MemoryCacheStore},
        config::{CacheBackend, Config},
        db::{check_connection, create_pool, run_migrations},
        repositories::{
            ArtifactRepository, FptTtsRepository, InMemoryArtifactRepository,
            OpenAiTtsRepository, PgArtifactRepository,
        },
    },
};

/// Everything the router needs, already wired
pub struct AppComponents {
    pub jwt_manager: Arc<JwtManager>,
    pub artifacts: Arc<dyn ArtifactRepository>,
    pub tts_controller: Arc<TtsController>,
    pub cache_controller: Arc<CacheController>,
}

/// A wired application: the router plus the background reaper to spawn next to it
pub struct Application {
    pub router: Router,
    pub reaper: TemporaryArtifactReaper,
}

async fn create_artifact_repository(
    config: &Config,
) -> Result<Arc<dyn ArtifactRepository>, Box<dyn std::error::Error>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, artifact metadata is kept in process");
        return Ok(Arc::new(InMemoryArtifactRepository::new()));
    };

    let pool = create_pool(database_url).await?;
    tracing::info!("Database connection pool created");

    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Arc::new(PgArtifactRepository::new(Arc::new(pool))))
}

async fn create_cache_store(
    config: &Config,
) -> Result<Arc<dyn CacheStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Filesystem => Arc::new(FsCacheStore::new(&config.cache_dir).await?),
        CacheBackend::Memory => {
            tracing::info!(max_bytes = config.cache_memory_max_bytes, "In-memory audio cache ready");
            Arc::new(MemoryCacheStore::new(config.cache_memory_max_bytes))
        }
    };
    Ok(store)
}

/// Instantiate repositories, services and controllers from configuration
pub async fn build_application(
    config: &Config,
    shutdown: CancellationToken,
) -> Result<Application, Box<dyn std::error::Error>> {
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let artifacts = create_artifact_repository(config).await?;
    let cache = Arc::new(AudioCache::new(create_cache_store(config).await?));

    let openai = Arc::new(OpenAiTtsRepository::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
        Duration::from_secs(config.openai_timeout_secs),
    )?);
    let fpt = Arc::new(FptTtsRepository::new(config.fpt_settings(), shutdown.clone())?);
    let dispatcher = Arc::new(ProviderDispatcher::new(openai, fpt));

    // 2. Instantiate services
    tracing::info!("Instantiating services...");
    let artifact_service = Arc::new(ArtifactService::new(
        artifacts.clone(),
        cache.clone(),
        config.artifact_retention(),
    ));
    let tts_service = Arc::new(TtsService::new(
        dispatcher,
        cache.clone(),
        artifact_service.clone(),
        config.text_limits(),
        config.synthesis_timeout(),
    ));
    let reaper = TemporaryArtifactReaper::new(
        artifacts.clone(),
        artifact_service,
        cache.clone(),
        config.artifact_retention(),
        config.reaper_batch_size,
        Duration::from_secs(config.reaper_interval_secs),
    );

    // 3. Instantiate controllers
    tracing::info!("Instantiating controllers...");
    let components = AppComponents {
        jwt_manager: Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        )),
        artifacts,
        tts_controller: Arc::new(TtsController::new(tts_service)),
        cache_controller: Arc::new(CacheController::new(cache)),
    };

    Ok(Application {
        router: create_router(components),
        reaper,
    })
}

/// Build application routes
pub fn create_router(components: AppComponents) -> Router {
    // TTS routes (guests allowed)
    let tts_routes = Router::new()
        .route("/api/tts/synthesize", post(TtsController::synthesize))
        .route("/api/tts/voices", get(TtsController::list_voices))
        .with_state(components.tts_controller.clone())
        .layer(middleware::from_fn_with_state(
            components.jwt_manager.clone(),
            optional_auth_middleware,
        ));

    // Cache administration (admin only)
    let admin_routes = Router::new()
        .route("/api/admin/cache/stats", get(CacheController::stats))
        .route("/api/admin/cache", delete(CacheController::clear))
        .with_state(components.cache_controller.clone())
        .layer(middleware::from_fn_with_state(
            components.jwt_manager.clone(),
            require_admin_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT_LANGUAGE,
            HeaderName::from_static(X_GUEST_ID),
        ])
        .expose_headers([
            HeaderName::from_static(X_CACHE),
            HeaderName::from_static(X_VOICE_USED),
            HeaderName::from_static(X_PROVIDER),
            HeaderName::from_static(X_CHARACTER_COUNT),
            HeaderName::from_static(X_GUEST_ID),
        ]);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(components.artifacts.clone())
        .merge(tts_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server; returns once `shutdown` is cancelled and in-flight requests drained
pub async fn start_http_server(
    config: &Config,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
