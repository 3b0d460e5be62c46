mod bindings;
mod platform;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colorcube_common::HarnessSettings;
use colorcube_render::{FrameComposer, RenderBackend, RenderLoop, Shape};
use platform::DesktopBackend;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ShapeArg {
    Cube,
    Triangle,
}

impl From<ShapeArg> for Shape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Cube => Shape::Cube,
            ShapeArg::Triangle => Shape::Triangle,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "colorcube-desktop",
    about = "Draw a primitive in several windows, rotating their clear colors"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Number of windows to open
    #[arg(short, long, default_value_t = 1)]
    windows: usize,

    /// Primitive to draw
    #[arg(long, value_enum, default_value_t = ShapeArg::Cube)]
    shape: ShapeArg,

    /// Fixed orthographic view with per-vertex colors; ignores the camera
    #[arg(long)]
    legacy: bool,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Window titles, in window order
    titles: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("{e:#}");
        std::process::exit(-1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = HarnessSettings {
        window_count: cli.windows,
        titles: cli.titles,
        max_frames: cli.frames,
        ..HarnessSettings::default()
    }
    .validate()
    .context("invalid window configuration")?;

    let shape = Shape::from(cli.shape);
    let backend = DesktopBackend::new(&config, shape)
        .context("failed to initialize windows and graphics")?;
    tracing::info!("running on {}", backend.version_string());

    let composer = if cli.legacy {
        FrameComposer::legacy(shape)
    } else {
        FrameComposer::modern(shape)
    };
    let mut render_loop = RenderLoop::new(&config, backend, composer)?;
    bindings::register(render_loop.registry_mut());

    let reason = render_loop.run().context("render loop failed")?;
    tracing::info!(?reason, frames = render_loop.frames(), "colorcube-desktop finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["colorcube-desktop"]);
        assert_eq!(cli.windows, 1);
        assert!(matches!(cli.shape, ShapeArg::Cube));
        assert!(!cli.legacy);
        assert!(cli.frames.is_none());
        assert!(cli.titles.is_empty());
    }

    #[test]
    fn cli_parses_windows_and_titles() {
        let cli = Cli::parse_from([
            "colorcube-desktop",
            "--windows",
            "3",
            "--shape",
            "triangle",
            "--legacy",
            "a",
            "b",
        ]);
        assert_eq!(cli.windows, 3);
        assert_eq!(Shape::from(cli.shape), Shape::Triangle);
        assert!(cli.legacy);
        assert_eq!(cli.titles, ["a", "b"]);
    }
}
