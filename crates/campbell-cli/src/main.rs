// ─────────────────────────────────────────────────────────────────────
// Campbell Core — CLI Entry Point
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use campbell_cli::{run_config, run_diagram, run_modes, Cli, Commands};
use campbell_core::cancel::CancelToken;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let cancel = CancelToken::new();

    match &cli.command {
        Commands::Diagram(args) => run_diagram(args, &cancel)?,
        Commands::Modes(args) => run_modes(args, &cancel)?,
        Commands::Config(args) => run_config(args)?,
    }
    Ok(())
}
