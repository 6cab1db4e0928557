use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use skisun_cli::commands::{exposure, plan, shade, sun};
use skisun_cli::{ExposureArgs, GlobalOptions, PlanArgs, ShadeArgs, SunArgs};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Sun positions, slope shade and sun-aware ski route planning"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report the sun position and the day's sunrise and sunset for a location.
    Sun(SunArgs),
    /// Decide whether a slope facet is lit at an instant.
    Shade(ShadeArgs),
    /// Score the sun exposure of every open run of a ski area over a day.
    Exposure(ExposureArgs),
    /// Plan an itinerary that covers as many runs as possible while chasing the sun.
    Plan(PlanArgs),
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let format = cli.global.format;

    match &cli.command {
        Command::Sun(args) => sun::handle_sun(args, format),
        Command::Shade(args) => shade::handle_shade(args, format),
        Command::Exposure(args) => exposure::handle_exposure(&cli.global, args, format),
        Command::Plan(args) => plan::handle_plan(&cli.global, args, format),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
