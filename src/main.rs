use clap::Parser as _;
use roomsensor_schema::commands;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

const LOG_FILTER_VAR: &str = "ROOMSENSOR_SCHEMA_LOG";

#[derive(clap::Parser)]
#[clap(version, about, author)]
enum Commands {
    Devices(commands::devices_list::Args),
    ComObjects(commands::com_objects::Args),
    Params(commands::params::Args),
    Decode(commands::decode::Args),
    Encode(commands::encode::Args),
}

fn end<E: std::error::Error>(r: Result<(), E>) {
    std::process::exit(match r {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            let mut cause = e.source();
            while let Some(e) = cause {
                eprintln!("  because: {e}");
                cause = e.source();
            }
            1
        }
    });
}

fn main() {
    let filter_description = std::env::var(LOG_FILTER_VAR).unwrap_or_else(|_| "warn".into());
    let filter = match filter_description.parse::<tracing_subscriber::filter::targets::Targets>() {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("error: could not parse {LOG_FILTER_VAR}={filter_description:?}: {e}");
            std::process::exit(2);
        }
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    match Commands::parse() {
        Commands::Devices(args) => end(commands::devices_list::run(args)),
        Commands::ComObjects(args) => end(commands::com_objects::run(args)),
        Commands::Params(args) => end(commands::params::run(args)),
        Commands::Decode(args) => end(commands::decode::run(args)),
        Commands::Encode(args) => end(commands::encode::run(args)),
    }
}
