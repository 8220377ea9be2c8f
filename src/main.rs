use fashion_haul::{logger, server, Config, Pipeline};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env()?;

    let logger_config = if config.json_logs {
        logger::LoggerConfig::production()
    } else {
        logger::LoggerConfig::development().with_level(logger::LogLevel::Info)
    };
    logger::init_with_config(logger_config)?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let address = format!("{}:{}", config.host(), config.port());
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), &address);
    logger::log_config_info(&config);

    let pipeline = Pipeline::from_config(&config.genai)?;
    if !pipeline.is_configured() {
        log::error!("❌ No API key configured; /cutout and /generate will return 500");
    }

    server::run(config, pipeline).await?;
    Ok(())
}
