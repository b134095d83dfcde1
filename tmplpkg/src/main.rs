use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tmplpkg::output::Output;
use tmplpkg::{Builder, Cli};

fn init_tracing(verbose: bool) {
    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default = if verbose { "tmplpkg=debug" } else { "tmplpkg=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let root = cli.resolve_root()?;
    let mut builder = Builder::from_root(&root, cli.options())?;
    tracing::debug!(?builder, command = %cli.command, "Builder ready");
    builder.run(&cli.command)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        Output::error(format!("{err:#}"));
        std::process::exit(1);
    }
}
