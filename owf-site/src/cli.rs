use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use getopts::Options;
use thiserror::Error;

pub struct Args {
    pub address: SocketAddr,
    pub data: PathBuf,
    pub enable_cache: bool,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub verbose: usize,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Getopts(#[from] getopts::Fail),

    #[error("Provided value for option '{option}' is invalid: {reason}")]
    Invalid { option: &'static str, reason: String },
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Default: 127.0.0.1:8080, Env: OWF_ADDRESS]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "d",
        "data",
        "Conference data file [Default: conference.json, Env: OWF_DATA]",
        "PATH",
    );
    opts.optflag(
        "c",
        "enable-cache",
        "Enable caching of rendered pages [Default: false]",
    );
    opts.optopt(
        "t",
        "cache-ttl",
        "Time-to-live for cached pages [Default: 3600]",
        "SECONDS",
    );
    opts.optopt(
        "",
        "cache-capacity",
        "Maximum number of cached pages [Default: 256]",
        "COUNT",
    );
    opts.optflagmulti("v", "verbose", "Increase log verbosity (-v, -vv)");
    opts
}

fn parse_option<T: std::str::FromStr>(
    value: Option<String>,
    option: &'static str,
    default: T,
) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value.parse().map_err(|err: T::Err| CliError::Invalid {
            option,
            reason: err.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parses arguments (without the program name). `Ok(None)` means help was
/// requested.
pub fn try_parse(args: &[String]) -> Result<Option<Args>, CliError> {
    let matches = opts().parse(args)?;

    if matches.opt_present("help") {
        return Ok(None);
    }

    let address = parse_option(
        matches
            .opt_str("address")
            .or_else(|| env::var("OWF_ADDRESS").ok()),
        "address",
        SocketAddr::from(([127, 0, 0, 1], 8080)),
    )?;

    let data = matches
        .opt_str("data")
        .or_else(|| env::var("OWF_DATA").ok())
        .map_or_else(|| PathBuf::from("conference.json"), PathBuf::from);

    let cache_ttl = Duration::from_secs(parse_option(
        matches.opt_str("cache-ttl"),
        "cache-ttl",
        3600,
    )?);

    let cache_capacity = parse_option(matches.opt_str("cache-capacity"), "cache-capacity", 256)?;

    Ok(Some(Args {
        address,
        data,
        enable_cache: matches.opt_present("enable-cache"),
        cache_ttl,
        cache_capacity,
        verbose: matches.opt_count("verbose"),
    }))
}

pub fn parse(args: Vec<String>) -> Args {
    match try_parse(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            let opts = opts();
            println!("{}", opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))));
            process::exit(0);
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
