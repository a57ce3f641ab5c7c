use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    // Load `.env` before clap so an env-sourced API key is visible to parsing.
    dotenvy::dotenv().ok();

    clipharvest::logging::init().context("init logging")?;

    let cli = clipharvest::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let config = clipharvest::config::RunConfig::from_cli(cli).context("build run config")?;
    let client = clipharvest::youtube::Client::new(&config.api_base_url, &config.api_key)
        .context("build api client")?;

    let summary = clipharvest::collect::run(&config, &client).context("collect")?;
    println!(
        "finished: {} new videos appended to {}",
        summary.new_records,
        config.out_path.display()
    );

    Ok(())
}
