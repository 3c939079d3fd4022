//! Entry point: loads the requested models through one cache, lays them out
//! on a grid and builds a single frame of draw batches.

mod config;

use anyhow::{Context, Result};
use asset::{ModelCache, MtlLoader};
use renderer::{BatchRasterizer, Placement, Scene};

use crate::config::AppConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_args(std::env::args().skip(1));
    log::info!(
        "Starting meshworks. models={}, grid={}x{}, spacing={}, textures={:?}",
        config.models.len(),
        config.columns,
        config.rows,
        config.spacing,
        config.textures
    );

    if config.models.is_empty() {
        log::warn!("No --model=PATH given, nothing to draw.");
        return Ok(());
    }

    let mut cache = ModelCache::with_loader(MtlLoader::new().with_textures(config.decode_textures));
    let scene = build_scene(&config, &mut cache)?;

    let mut rasterizer = BatchRasterizer::new();
    scene.draw(&mut rasterizer);

    log::info!(
        "Frame built: {} entities, {} cached models, {} draw calls, {} triangles, {} vertices",
        scene.len(),
        cache.len(),
        rasterizer.draw_calls(),
        rasterizer.triangle_count(),
        rasterizer.vertex_count()
    );
    for (i, batch) in rasterizer.batches().iter().enumerate() {
        log::debug!(
            "batch {}: material={:?} textured={} triangles={} bytes={}",
            i,
            batch.material.as_ref().map(|m| m.name.as_str()),
            batch.textured,
            batch.triangle_count(),
            batch.vertex_bytes().len() + batch.index_bytes().len()
        );
    }

    log::info!("Done.");
    Ok(())
}

/// Spawn `config.copies()` entities per model; each block of copies starts
/// on a new grid row.
fn build_scene(config: &AppConfig, cache: &mut ModelCache) -> Result<Scene> {
    let mut scene = Scene::new();
    let copies = config.copies();

    for (m, path) in config.models.iter().enumerate() {
        let model = cache
            .get_or_load(path)
            .with_context(|| format!("Failed to load model {path}"))?;
        for i in 0..copies {
            let placement = Placement::on_grid(m * copies + i, config.columns, config.spacing);
            scene.spawn(placement, model.clone());
        }
    }

    scene.set_texture_mode_all(config.textures);
    Ok(scene)
}
