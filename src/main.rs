use std::{
    env,
    fs::{self, create_dir_all},
    io,
    path::PathBuf,
    process,
    sync::Arc,
};

use anyhow::{Context as _, Result};
use dirs::{config_dir, data_local_dir};
use parish_core::{
    Context,
    config::{Config, DEFAULT_CONFIG},
    events::run_activity_recorder,
};
use tracing::{error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt::time::LocalTime, layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

#[tokio::main]
async fn main() {
    if let Err(err) = app_main().await {
        error!("AppError: {err:?}");
        eprintln!("{:?}", err);
        process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let log_dir = env::var("PARISH_LOG_DIR")
        .map(|path| {
            if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            }
        })
        .unwrap_or_else(|_| {
            #[cfg(debug_assertions)]
            return None;
            #[allow(unused)]
            Some(
                data_local_dir()
                    .map(|d| d.join("Parish").join("logs"))
                    .unwrap_or_else(|| "logs".into()),
            )
        });

    let stderr_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(io::stderr);

    let file_layer = log_dir
        .as_ref()
        .map(|log_dir| {
            Result::<_, anyhow::Error>::Ok(
                tracing_subscriber::fmt::layer().pretty().with_writer(
                    RollingFileAppender::builder()
                        .rotation(Rotation::DAILY)
                        .filename_prefix("parish")
                        .filename_suffix("log")
                        .build(log_dir)?,
                ),
            )
        })
        .transpose()?;

    let file_filter = log_filter()?;
    tracing_subscriber::registry()
        .with(
            stderr_layer
                .with_timer(LocalTime::rfc_3339())
                .with_filter(log_filter()?),
        )
        .with(file_layer.map(|file_layer| {
            file_layer
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false)
                .with_filter(file_filter)
        }))
        .try_init()?;

    let config_file = env::var("PARISH_CONFIG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            #[cfg(debug_assertions)]
            return "config.toml".into();
            #[allow(unused)]
            config_dir()
                .map(|d| d.join("Parish").join("config.toml"))
                .unwrap_or_else(|| "config.toml".into())
        });
    if !config_file.exists() {
        if let Some(dir) = config_file.parent() {
            create_dir_all(dir)?;
        }
        fs::write(&config_file, DEFAULT_CONFIG)?;
        info!("wrote default config to {}", config_file.display());
    }
    let config = Config::load(&config_file)
        .with_context(|| format!("could not load {}", config_file.display()))?;
    let config = Arc::new(config);

    let context = Context::connect(config.clone())?;
    tokio::spawn(run_activity_recorder(
        context.events.subscribe(&[]),
        context.activity.clone(),
    ));

    start_webserver(config, context).await
}

fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::builder()
        .with_default_directive("parish=debug".parse()?)
        .with_env_var("PARISH_LOG")
        .from_env_lossy())
}

async fn start_webserver(config: Arc<Config>, context: Context) -> Result<()> {
    let listener =
        tokio::net::TcpListener::bind((config.web_host.clone(), config.web_port)).await?;
    info!(
        "listening on http://{}:{} with backend {}",
        config.web_host, config.web_port, config.backend_url
    );
    axum::serve(listener, parish_web_askama::router(context)).await?;
    Ok(())
}
