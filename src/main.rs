use std::process;

use clap::Parser;
use rsfam::cli::args::Cli;
use rsfam::cli::commands::execute_command;
use rsfam::cli::output;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.debug);

    if let Err(e) = execute_command(&cli) {
        output::error(&e);
        process::exit(e.exit_code());
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsfam::util::testing;

    #[test]
    fn verify_cli() {
        testing::init_test_setup();
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn given_rotate_with_negative_delta_when_parsing_then_accepts_it() {
        let cli = Cli::try_parse_from(["rsfam", "rotate", "_P1", "--by", "-12.5", "tree.gramps"])
            .unwrap();
        match cli.command {
            Some(rsfam::cli::Commands::Rotate { handle, by, source }) => {
                assert_eq!(handle, "_P1");
                assert_eq!(by, Some(-12.5));
                assert_eq!(source.file.unwrap().to_str(), Some("tree.gramps"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
