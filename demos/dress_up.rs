use fashion_haul::{
    logger, ClientConfig, GarmentCategory, ImageSource, PipelineClient, Studio,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

fn parse_category(raw: &str) -> Option<GarmentCategory> {
    GarmentCategory::ALL
        .into_iter()
        .find(|category| category.as_str() == raw)
}

/// Usage: dress_up <model.png> <category=garment.webp>... [--out result.png]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    logger::init()?;
    if !dotenv_loaded {
        log::warn!("⚠️  No .env file found");
    }

    let mut args = env::args().skip(1);
    let model_path = args.next().ok_or("missing model image path")?;
    let mut out = PathBuf::from("dressed.png");
    let mut garments = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--out" {
            out = PathBuf::from(args.next().ok_or("--out needs a path")?);
            continue;
        }
        let (category, path) = arg
            .split_once('=')
            .ok_or_else(|| format!("expected category=path, got {}", arg))?;
        let category =
            parse_category(category).ok_or_else(|| format!("unknown category {}", category))?;
        garments.push((category, PathBuf::from(path)));
    }

    let client = PipelineClient::new(&ClientConfig::from_env()?)?;
    if !client.health().await.unwrap_or(false) {
        log::warn!("⚠️  {} did not answer the health check", client.base_url());
    }

    let mut studio = Studio::new(Arc::new(client));
    let model = studio.add_model("Model", ImageSource::Path(PathBuf::from(&model_path)));
    studio.select_model(&model)?;

    for (category, path) in garments {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| category.to_string());
        let id = studio.add_garment(name, category, ImageSource::Path(path));
        studio.stage_garment(&id)?;
    }

    let result = studio.dress_up(None).await;
    for notice in studio.drain_notices() {
        println!("[{:?}] {}", notice.level, notice.message);
    }

    let image = result?;
    tokio::fs::write(&out, image.bytes()).await?;
    log::info!("💾 Saved {} ({} bytes) to {}", image.media_type(), image.len(), out.display());
    Ok(())
}
