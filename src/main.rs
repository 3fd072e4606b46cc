mod aoi;
mod archive;
mod cli;
mod dates;
mod evalscript;
mod index;
mod raster;
mod sentinel;
mod zonal;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Search(args) => match command::search(args).await {
            Ok(filename) => println!("Results saved to `{}`", filename),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Dates(args) => match command::dates(args) {
            Ok(summary) => println!("{}", summary),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Download(args) => match command::download(args).await {
            Ok(summary) => println!("{}", summary),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Snow(args) => match command::snow(args) {
            Ok(summary) => println!("{}", summary),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Clouds(args) => match command::clouds(args) {
            Ok(filename) => println!("File saved to `{}`", filename),
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::RenameBands(args) => match command::rename_bands(args) {
            Ok(summary) => println!("{}", summary),
            Err(e) => eprintln!("Error: {}", e),
        },
    }

    Ok(())
}
