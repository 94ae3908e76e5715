extern crate anyhow;
extern crate chrono;
extern crate chrono_tz;
extern crate flexi_logger;
extern crate getopts;
#[macro_use]
extern crate log;
extern crate reqwest;
extern crate scraper;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate tiny_http;
extern crate urlencoding;

mod board;
mod client;
mod config;
mod poller;
mod render;
mod result;
mod server;
mod snapshot;
mod token;

fn init_logging(log_dir: Option<&String>) -> result::CommuterResult<flexi_logger::LoggerHandle> {
    let logger = flexi_logger::Logger::try_with_env_or_str("info")
        .map_err(|err| result::make_error(&format!("Bad log spec: {}", err)))?;

    let logger = match log_dir {
        Some(dir) => logger
            .log_to_file(flexi_logger::FileSpec::default().directory(dir))
            .duplicate_to_stderr(flexi_logger::Duplicate::Info),
        None => logger.log_to_stderr(),
    };

    return logger.start()
        .map_err(|err| result::make_error(&format!("Couldn't start logger: {}", err)));
}

fn run(config: config::Config) -> result::CommuterResult<()> {
    let source = client::HttpClient::new(&config.base_url, config.request_timeout)?;
    let mut session = poller::PollingSession::new(
        source, board::Board::empty().shared(), config.session_options());
    debug!("CSRF token is {} characters", session.token().len());

    let server_handle = match config.port {
        Some(port) => Some(server::run_board_server(port, session.board())?),
        None => None,
    };

    if config.one_shot {
        return session.poll_once();
    }

    session.start()?;
    session.join();

    if let Some(handle) = server_handle {
        let _ = handle.join();
    }
    return Ok(());
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let opts = config::options();

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("{}\n{}", err, opts.usage(&format!("Usage: {} [options]", args[0])));
            std::process::exit(2);
        }
    };

    if matches.opt_present("help") {
        print!("{}", opts.usage(&format!("Usage: {} [options]", args[0])));
        return;
    }

    let config = match config::from_matches(&matches) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    let _logger = match init_logging(config.log_dir.as_ref()) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    info!("Running. url={} interval={:?} one-shot={}",
          config.base_url, config.interval, config.one_shot);

    if let Err(err) = run(config) {
        error!("{}", err);
        std::process::exit(1);
    }
}
