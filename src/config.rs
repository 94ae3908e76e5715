extern crate anyhow;
extern crate getopts;
extern crate serde_json;

use anyhow::Context;
use crate::poller;
use crate::result;
use crate::token;

pub const DEFAULT_BASE_URL: &'static str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// Everything here can also come from the command line, which wins.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub token: Option<String>,
    pub cookie_name: Option<String>,
    pub token_element_id: Option<String>,
    pub output: Option<String>,
    pub port: Option<u16>,
    pub log_dir: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub interval: std::time::Duration,
    pub request_timeout: std::time::Duration,
    pub token: Option<String>,
    pub cookie_name: String,
    pub token_element_id: String,
    pub output: Option<std::path::PathBuf>,
    pub port: Option<u16>,
    pub log_dir: Option<String>,
    pub one_shot: bool,
}

impl Config {
    pub fn session_options(&self) -> poller::SessionOptions {
        let mut options = poller::SessionOptions::defaults();
        options.interval = self.interval;
        options.explicit_token = self.token.clone();
        options.cookie_name = self.cookie_name.clone();
        options.token_element_id = self.token_element_id.clone();
        options.output = self.output.clone();
        return options;
    }
}

pub fn options() -> getopts::Options {
    let mut opts = getopts::Options::new();
    opts.optopt("u", "url", "Base URL of the commuter rail site.", "URL");
    opts.optopt("i", "interval", "Seconds between polls (default 15).", "SECS");
    opts.optopt("t", "token", "CSRF token to send instead of reading the cookie.", "TOKEN");
    opts.optopt("o", "output", "Write the board page here after every refresh.", "FILENAME");
    opts.optopt("p", "port", "Serve the board on this port.", "PORT");
    opts.optopt("c", "config", "JSON config file.", "FILENAME");
    opts.optopt("l", "log-dir", "Directory for log files.", "DIR");
    opts.optflag("1", "one-shot", "Poll once and exit.");
    opts.optflag("h", "help", "Print this help.");
    return opts;
}

pub fn file_config_from_file<P: AsRef<std::path::Path>>(path: P) -> result::CommuterResult<FileConfig> {
    let debug_path = path.as_ref().to_str().map(|x| x.to_string());
    let file = std::fs::File::open(path)
        .with_context(|| format!("Opening config from '{:?}'", debug_path))?;
    let reader = std::io::BufReader::new(file);
    let config: FileConfig = serde_json::from_reader(reader)
        .with_context(|| format!("while parsing config"))?;
    return Ok(config);
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> result::CommuterResult<T> {
    return value.trim().parse::<T>().map_err(|_| {
        result::CommuterError::ConfigError(format!("--{} expects a number, got '{}'", flag, value))
    });
}

pub fn from_matches(matches: &getopts::Matches) -> result::CommuterResult<Config> {
    let file_config = match matches.opt_str("config") {
        Some(path) => file_config_from_file(path)?,
        None => FileConfig::default(),
    };

    let interval_secs = match matches.opt_str("interval") {
        Some(v) => parse_number::<u64>("interval", &v)?,
        None => file_config.interval_secs.unwrap_or(poller::DEFAULT_INTERVAL.as_secs()),
    };
    if interval_secs == 0 {
        return Err(result::CommuterError::ConfigError("interval must be at least one second".to_string()));
    }

    let port = match matches.opt_str("port") {
        Some(v) => Some(parse_number::<u16>("port", &v)?),
        None => file_config.port,
    };

    return Ok(Config{
        base_url: matches.opt_str("url")
            .or(file_config.url)
            .unwrap_or(DEFAULT_BASE_URL.to_string()),
        interval: std::time::Duration::from_secs(interval_secs),
        request_timeout: std::time::Duration::from_secs(
            file_config.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)),
        token: matches.opt_str("token").or(file_config.token),
        cookie_name: file_config.cookie_name.unwrap_or(token::COOKIE_NAME.to_string()),
        token_element_id: file_config.token_element_id.unwrap_or(token::FALLBACK_ELEMENT_ID.to_string()),
        output: matches.opt_str("output").or(file_config.output).map(std::path::PathBuf::from),
        port: port,
        log_dir: matches.opt_str("log-dir").or(file_config.log_dir),
        one_shot: matches.opt_present("one-shot"),
    });
}
