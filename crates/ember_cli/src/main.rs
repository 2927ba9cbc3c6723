//! `ember` - render a built-in scene to an image file.

mod scenes;

use anyhow::{Context, Result};
use clap::Parser;
use ember_render::{render, with_default_extension, OutputSink, PathIntegrator, RenderConfig};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scenes::SceneKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ember", version, about = "Monte Carlo path tracer")]
struct Args {
    /// Output image; `.ppm` is appended when there is no extension
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SceneKind::Cornell)]
    scene: SceneKind,

    /// JSON render settings; the flags below take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Samples per pixel
    #[arg(long, short = 's')]
    samples: Option<u32>,

    /// Maximum path depth
    #[arg(long, short = 'd')]
    depth: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => RenderConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => RenderConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(samples) = self.samples {
            config.samples_per_pixel = samples;
        }
        if let Some(depth) = self.depth {
            config.max_depth = depth;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        config.validate()?;
        Ok(config)
    }

    fn output_path(&self) -> PathBuf {
        let path = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.scene.default_output()));
        with_default_extension(path)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    run(&Args::parse())
}

fn run(args: &Args) -> Result<()> {
    let config = args.render_config()?;
    let output = args.output_path();

    // Acquire the output file before spending any time on the render
    let sink = OutputSink::create(&output)
        .with_context(|| format!("Failed to open output {}", output.display()))?;

    log::info!("Building {:?} scene", args.scene);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let setup = args.scene.build(&mut rng);

    let mut camera = setup.camera.with_aspect_ratio(config.aspect_ratio());
    camera.initialize();

    let bar = ProgressBar::new(config.height as u64);
    bar.set_style(
        ProgressStyle::with_template("{elapsed_precise} [{bar:40}] {pos}/{len} rows (eta {eta})")?
            .progress_chars("=> "),
    );

    let image = render(&setup.scene, &camera, &config, &PathIntegrator::new(), |_| {
        bar.inc(1)
    });
    bar.finish_and_clear();

    sink.write(&image)
        .with_context(|| format!("Failed to save image to {}", output.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args =
            Args::try_parse_from(["ember", "--width", "64", "-s", "8", "--seed", "3"]).unwrap();
        let config = args.render_config().unwrap();

        assert_eq!(config.width, 64);
        assert_eq!(config.height, RenderConfig::default().height);
        assert_eq!(config.samples_per_pixel, 8);
        assert_eq!(config.seed, 3);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.json");
        std::fs::write(&path, r#"{ "width": 32, "height": 16, "max_depth": 4 }"#).unwrap();

        let args = Args::try_parse_from([
            "ember",
            "--config",
            path.to_str().unwrap(),
            "--depth",
            "12",
        ])
        .unwrap();
        let config = args.render_config().unwrap();

        assert_eq!((config.width, config.height), (32, 16));
        assert_eq!(config.max_depth, 12);
    }

    #[test]
    fn test_zero_samples_rejected() {
        let args = Args::try_parse_from(["ember", "--samples", "0"]).unwrap();
        assert!(args.render_config().is_err());
    }

    #[test]
    fn test_unwritable_output_fails_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let output = blocker.join("out.ppm");

        // Large enough that reaching the render would not finish in a test run
        let args = Args::try_parse_from([
            "ember",
            output.to_str().unwrap(),
            "--width",
            "20000",
            "--height",
            "20000",
            "--samples",
            "1000",
        ])
        .unwrap();

        let err = run(&args).unwrap_err();
        assert!(err.to_string().contains("Failed to open output"), "{err:#}");
        let source = err.downcast_ref::<ember_render::OutputError>().unwrap();
        assert!(matches!(source, ember_render::OutputError::Create { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_output_path() {
        let args = Args::try_parse_from(["ember"]).unwrap();
        assert_eq!(args.output_path(), PathBuf::from("cornell_volume_box2.ppm"));

        let args = Args::try_parse_from(["ember", "renders/out", "--scene", "spheres"]).unwrap();
        assert_eq!(args.output_path(), PathBuf::from("renders/out.ppm"));

        let args = Args::try_parse_from(["ember", "--scene", "cornell-glass"]).unwrap();
        assert_eq!(args.output_path(), PathBuf::from("cornell_glass.ppm"));
    }
}
