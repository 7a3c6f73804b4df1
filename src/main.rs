use std::{fs, io::Write, process};

use anyhow::Context;
use backfill_median::rolling_median::MedianError;
use clap::Parser;
use gskits::utils::command_line_str;
use tracing_subscriber::EnvFilter;

mod cli;
mod rolling_median_etl;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Cli::parse();
    if let Err(err) = run(&args) {
        tracing::error!("{:#}", err);
        if let Some(err) = err.downcast_ref::<MedianError>() {
            eprintln!("hint: {}", err.hint());
        }
        process::exit(1);
    }
}

fn run(args: &cli::Cli) -> anyhow::Result<()> {
    args.build_output_dir()?;
    write_meta(&args.output_dir)?;

    match &args.commands {
        cli::Subcommands::RollingMedian(param) => {
            rolling_median_etl::rolling_median_main(param, &args.output_dir)?;
        }
    }
    Ok(())
}

fn write_meta(output_dir: &str) -> anyhow::Result<()> {
    let meta_filepath = format!("{}/meta.txt", output_dir);
    let mut meta_file = fs::File::create(&meta_filepath)
        .with_context(|| format!("create file error. {}", meta_filepath))?;
    writeln!(meta_file, "version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(meta_file, "cmd_line: {}", command_line_str())?;
    Ok(())
}
