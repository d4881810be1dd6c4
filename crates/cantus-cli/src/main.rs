//! Cantus CLI - the synthesizer's command-line entry point.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cantus")]
#[command(author, version, about = "Cantus polyphonic synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the realtime engine with socket IPC and audio output
    Serve(commands::serve::ServeArgs),

    /// Precompute the band-limited wavetable files
    Gentables(commands::gentables::GentablesArgs),

    /// Render a command script offline to a WAV file
    Render(commands::render::RenderArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Gentables(args) => commands::gentables::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
