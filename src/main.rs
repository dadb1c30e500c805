use clap::Parser;
use miette::Result;
use qcsim::cli::{Cli, Commands, GlobalOpts};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(&cli.global);

    match cli.command {
        Commands::Run(args) => qcsim::cli::commands::run::run(args, &cli.global).await,
        Commands::Batch(args) => qcsim::cli::commands::batch::run(args, &cli.global),
        Commands::Config(cmd) => qcsim::cli::commands::config::run(cmd, &cli.global),
        Commands::Completions(args) => qcsim::cli::commands::completions::run(args),
    }
}

/// Log to stderr so stdout stays clean for records; RUST_LOG wins over flags
fn init_tracing(global: &GlobalOpts) {
    let default_level = if global.quiet {
        "error"
    } else {
        match global.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("qcsim={}", default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
