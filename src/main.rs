extern crate image;
extern crate rand;
extern crate serde;

mod cli_app;
mod commands;
mod contour;
mod error;
mod geometry;
mod imagery;
mod inout;
mod progress;
mod shape;
mod store;

use tracing::Level;

fn log_level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn main() {
    let args = cli_app::parse_args();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(log_level(args.verbosity))
        .with_target(false)
        .init();

    if args.verbosity > 1 {
        tracing::debug!("Running with arguments: {:?}", args);
    }

    match commands::run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
