//! Command-line front end: load a scene, run the interactive pass and
//! optionally write the offline image.
//!
//! Usage: march <scene.json> [--config <config.json>] [--image <out.png>] [--pixel <x>,<y>]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use march_core::load_scene;
use march_renderer::{
    approximations, render, render_image, tree_indicators, ImageBuffer, RayTree, RenderConfig,
};

const USAGE: &str =
    "Usage: march <scene.json> [--config <config.json>] [--image <out.png>] [--pixel <x>,<y>]";

/// Parsed command line.
#[derive(Debug, PartialEq)]
struct Args {
    scene: PathBuf,
    config: Option<PathBuf>,
    image: Option<PathBuf>,
    pixel: Option<(u32, u32)>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = args.into_iter();
    let mut scene = None;
    let mut config = None;
    let mut image = None;
    let mut pixel = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(value_of(&mut args, "--config")?)),
            "--image" => image = Some(PathBuf::from(value_of(&mut args, "--image")?)),
            "--pixel" => pixel = Some(parse_pixel(&value_of(&mut args, "--pixel")?)?),
            flag if flag.starts_with("--") => bail!("Unknown option {flag}\n{USAGE}"),
            _ if scene.is_none() => scene = Some(PathBuf::from(arg)),
            _ => bail!("Unexpected argument {arg}\n{USAGE}"),
        }
    }

    let Some(scene) = scene else {
        bail!("{USAGE}");
    };

    Ok(Args {
        scene,
        config,
        image,
        pixel,
    })
}

fn value_of(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("{flag} needs a value\n{USAGE}"))
}

fn parse_pixel(value: &str) -> Result<(u32, u32)> {
    let (x, y) = value
        .split_once(',')
        .with_context(|| format!("Pixel must be <x>,<y>, got {value}"))?;
    let x = x.trim().parse().with_context(|| format!("Invalid pixel x: {x}"))?;
    let y = y.trim().parse().with_context(|| format!("Invalid pixel y: {y}"))?;
    Ok((x, y))
}

fn load_config(path: Option<&Path>) -> Result<RenderConfig> {
    let Some(path) = path else {
        return Ok(RenderConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: RenderConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

fn print_tree(tree: &RayTree, indent: usize) {
    let ray = &tree.data;
    println!(
        "{:indent$}{} length={:.4} color=({:.3}, {:.3}, {:.3})",
        "",
        ray.kind.name(),
        ray.length,
        ray.color.x,
        ray.color.y,
        ray.color.z,
        indent = indent * 2
    );
    for child in &tree.children {
        print_tree(child, indent + 1);
    }
}

fn save_png(image: &ImageBuffer, path: &Path) -> Result<()> {
    let rgba = image::RgbaImage::from_raw(image.width, image.height, image.to_rgba())
        .context("Image buffer size does not match its resolution")?;
    rgba.save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(args.config.as_deref())?;
    let scene = load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;

    for approximation in approximations(&scene) {
        log::warn!(
            "Object '{}' uses an approximate distance ({})",
            approximation.name,
            approximation.reason
        );
    }

    let output = render(&scene, &config)?;
    let pixels = output.ray_trees.len();
    let hits = output.hit_count();
    log::info!(
        "Interactive pass {}x{}: {} hit, {} missed",
        output.width,
        output.height,
        hits,
        pixels - hits
    );

    if let Some((x, y)) = args.pixel {
        let Some((rays, collisions)) = output.ray_at(x, y) else {
            bail!("Pixel ({x}, {y}) is outside {}x{}", output.width, output.height);
        };
        println!("Ray tree for pixel ({x}, {y}):");
        print_tree(rays, 1);
        println!(
            "{} rays, {} march indicators",
            rays.node_count(),
            tree_indicators(rays, collisions).len()
        );
    }

    if let Some(path) = &args.image {
        let image = render_image(&scene, &config)?;
        save_png(&image, path)?;
        log::info!("Wrote {}x{} image to {}", image.width, image.height, path.display());
    }

    Ok(())
}
