//! course-gate - video access and progression control

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_gate::{
    auth::JwtValidator,
    catalog::Catalog,
    clock::{Clock, SystemClock},
    config::Args,
    credentials::SignedUrlIssuer,
    events::{spawn_logging_listener, EventBus, EventSink, HttpEventSink, QueuedSink},
    server::{self, AppState},
    services::{Collaborators, Services},
    store::{MemoryProgressStore, ProgressRepository, SledProgressStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("course_gate={},info", args.log_level).into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let policy = args.progress_policy()?;

    info!("======================================");
    info!("  course-gate");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Catalog: {}", args.catalog_path.display());
    info!("Content base: {}", args.content_base_url);
    info!("Credential TTL: {}s", args.credential_ttl_seconds);
    info!("Completion threshold: {}%", policy.completion.percent());
    info!("Merge policy: {}", policy.merge);
    info!("======================================");

    let catalog = Arc::new(Catalog::load(&args.catalog_path)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (store, sled): (Arc<dyn ProgressRepository>, Option<Arc<SledProgressStore>>) =
        match &args.data_dir {
            Some(dir) => {
                let sled = Arc::new(SledProgressStore::open(dir)?);
                (sled.clone() as Arc<dyn ProgressRepository>, Some(sled))
            }
            None => {
                warn!("DATA_DIR not set, progress is kept in memory only");
                (Arc::new(MemoryProgressStore::new()) as Arc<dyn ProgressRepository>, None)
            }
        };

    let issuer = match &args.signing_key {
        Some(seed) => SignedUrlIssuer::from_seed_base64(&args.content_base_url, seed, clock.clone())?,
        None => {
            warn!("SIGNING_KEY not set, using a generated key (dev mode)");
            SignedUrlIssuer::generate(&args.content_base_url, clock.clone())
        }
    };
    let content_key = issuer.verifying_key();

    let events: Arc<dyn EventSink> = match &args.analytics_url {
        Some(url) => {
            info!("Analytics events posted to {}", url);
            let http = Arc::new(HttpEventSink::new(url, args.analytics_timeout()));
            Arc::new(QueuedSink::new(http, args.analytics_queue_capacity))
        }
        None => {
            let bus = Arc::new(EventBus::new());
            spawn_logging_listener(Arc::clone(&bus));
            bus
        }
    };

    let jwt = match &args.jwt_secret {
        Some(secret) => JwtValidator::new(secret.clone(), args.jwt_expiry_seconds)?,
        None => JwtValidator::new_dev(),
    };

    let services = Services::new(
        Collaborators {
            curriculum: catalog.clone(),
            enrollments: catalog,
            store,
            credentials: Arc::new(issuer),
            events,
            clock,
        },
        policy,
    );

    let state = Arc::new(AppState::new(services, jwt, args.dev_mode, content_key));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    };
    server::run(state, args.listen, shutdown).await?;

    if let Some(sled) = sled {
        let flushed = sled.flush().await?;
        info!(bytes = flushed, "Progress store flushed");
    }

    Ok(())
}
