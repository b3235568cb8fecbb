//! `taxonomy-images` entry point

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let matches = ti_cli::command().get_matches();

    let default_level = if matches.get_flag("verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let output = ti_cli::run(&matches)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
