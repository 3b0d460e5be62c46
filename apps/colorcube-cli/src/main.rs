use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colorcube_common::{Color, DEFAULT_PALETTE, DEFAULT_ROTATION_PERIOD, HarnessSettings};
use colorcube_render::{FrameComposer, FrameEvent, HeadlessBackend, RenderLoop, StopReason};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colorcube-cli", about = "Headless tool for the colorcube harness")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List the available colors
    Palette,
    /// Run the render loop against the headless backend
    Simulate {
        /// Number of windows
        #[arg(short, long, default_value_t = 3)]
        windows: usize,
        /// Frames to run
        #[arg(short, long, default_value_t = 300)]
        frames: u64,
        /// Close the first window after this frame
        #[arg(long)]
        close_at: Option<u64>,
        /// Frames between color rotations
        #[arg(long, default_value_t = DEFAULT_ROTATION_PERIOD)]
        period: u32,
        /// Clear colors, comma-separated (default: black,teal,gray,olive)
        #[arg(long, value_delimiter = ',')]
        colors: Vec<Color>,
        /// Print every frame instead of only color changes
        #[arg(long)]
        full: bool,
    },
}

struct SimulateArgs {
    windows: usize,
    frames: u64,
    close_at: Option<u64>,
    period: u32,
    colors: Vec<Color>,
}

struct Simulation {
    reason: StopReason,
    frames: u64,
    /// Per-frame clear colors, one row per frame, one column per window.
    rows: Vec<Vec<Color>>,
    trace: String,
}

impl Simulation {
    /// Frames (1-based) whose colors differ from the previous frame.
    fn changes(&self) -> impl Iterator<Item = (usize, &[Color])> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(i, row)| *i == 0 || self.rows[i - 1] != **row)
            .map(|(i, row)| (i + 1, row.as_slice()))
    }
}

fn simulate(args: SimulateArgs) -> Result<Simulation> {
    let mut settings = HarnessSettings {
        window_count: args.windows,
        rotation_period: args.period,
        max_frames: Some(args.frames),
        ..HarnessSettings::default()
    };
    if !args.colors.is_empty() {
        settings.palette = args.colors;
    }
    let config = settings.validate().context("invalid simulation settings")?;

    let mut backend = HeadlessBackend::new(&config);
    if let Some(frame) = args.close_at {
        // One poll per window per frame; close after the frame's last poll.
        let at_poll = frame.max(1) * config.window_count() as u64;
        backend.schedule(at_poll, 0, FrameEvent::CloseRequested);
    }

    let mut render_loop = RenderLoop::new(&config, backend, FrameComposer::default())?;
    tracing::info!(
        windows = config.window_count(),
        frames = args.frames,
        close_at = ?args.close_at,
        "simulation starting"
    );
    let reason = render_loop.run()?;
    tracing::info!(?reason, frames = render_loop.frames(), "simulation finished");

    let backend = render_loop.backend();
    let frames = render_loop.frames();
    let rows = (0..frames as usize)
        .map(|frame| {
            (0..config.window_count())
                .filter_map(|slot| backend.clear_history(slot).get(frame).copied())
                .collect()
        })
        .collect();
    Ok(Simulation {
        reason,
        frames,
        rows,
        trace: backend.trace(),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Info => {
            println!("colorcube-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", colorcube_common::crate_info());
            println!("input: {}", colorcube_input::crate_info());
            println!("render: {}", colorcube_render::crate_info());
        }
        Commands::Palette => {
            for color in Color::ALL {
                let [r, g, b] = color.rgb();
                let marker = if DEFAULT_PALETTE.contains(&color) {
                    "  (default)"
                } else {
                    ""
                };
                println!("{color:<8} #{r:02x}{g:02x}{b:02x}{marker}");
            }
        }
        Commands::Simulate {
            windows,
            frames,
            close_at,
            period,
            colors,
            full,
        } => {
            let sim = simulate(SimulateArgs {
                windows,
                frames,
                close_at,
                period,
                colors,
            })?;
            if full {
                print!("{}", sim.trace);
            } else {
                for (frame, row) in sim.changes() {
                    let names: Vec<String> = row.iter().map(|c| format!("{c:<7}")).collect();
                    println!("frame {frame:>5}: {}", names.join(" "));
                }
            }
            println!("stopped after {} frames: {:?}", sim.frames, sim.reason);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(windows: usize, frames: u64) -> SimulateArgs {
        SimulateArgs {
            windows,
            frames,
            close_at: None,
            period: DEFAULT_ROTATION_PERIOD,
            colors: Vec::new(),
        }
    }

    #[test]
    fn colors_change_every_period() {
        let sim = simulate(args(3, 300)).unwrap();
        assert_eq!(sim.reason, StopReason::FrameLimit);
        assert_eq!(sim.frames, 300);
        let changes: Vec<(usize, Vec<Color>)> =
            sim.changes().map(|(f, row)| (f, row.to_vec())).collect();
        assert_eq!(
            changes,
            vec![
                (1, vec![Color::Black, Color::Teal, Color::Gray]),
                (101, vec![Color::Teal, Color::Gray, Color::Olive]),
                (201, vec![Color::Gray, Color::Olive, Color::Black]),
            ]
        );
    }

    #[test]
    fn close_stops_after_that_frame() {
        let sim = simulate(SimulateArgs {
            close_at: Some(5),
            ..args(2, 100)
        })
        .unwrap();
        assert_eq!(sim.reason, StopReason::WindowClosed(0));
        assert_eq!(sim.frames, 5);
    }

    #[test]
    fn custom_palette_is_used() {
        let sim = simulate(SimulateArgs {
            colors: vec![Color::Red, Color::Blue],
            period: 1,
            ..args(2, 2)
        })
        .unwrap();
        assert_eq!(
            sim.rows,
            vec![vec![Color::Red, Color::Blue], vec![Color::Blue, Color::Red]]
        );
    }

    #[test]
    fn too_many_windows_is_rejected() {
        assert!(simulate(args(4, 1)).is_err());
    }

    #[test]
    fn colors_parse_comma_separated() {
        let cli = Cli::parse_from(["colorcube-cli", "simulate", "--colors", "red,navy"]);
        match cli.command {
            Commands::Simulate { colors, windows, .. } => {
                assert_eq!(colors, [Color::Red, Color::Navy]);
                assert_eq!(windows, 3);
            }
            _ => panic!("expected simulate"),
        }
    }
}
