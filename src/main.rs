use clap::Parser;

mod cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = cli::Args::parse();
    if let Err(err) = app::run(args.into()) {
        tracing::error!(%err, "event loop failed");
        std::process::exit(1);
    }
}
