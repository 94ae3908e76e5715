extern crate anyhow;
extern crate reqwest;
extern crate serde_json;
extern crate std;

pub type CommuterResult<T> = std::result::Result<T, CommuterError>;

#[derive(Debug)]
pub enum CommuterError {
    ConfigError(String),
    HttpError(reqwest::Error),
    HttpStatusError(reqwest::StatusCode),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
    SchemaError(String),
    OtherError(anyhow::Error),
}

pub fn make_error(msg: &str) -> CommuterError {
    return CommuterError::OtherError(anyhow::anyhow!(msg.to_string()));
}

impl std::fmt::Display for CommuterError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            CommuterError::ConfigError(ref msg) => {
                return write!(f, "Config Error: {}", msg);
            },
            CommuterError::HttpError(ref err) => {
                return write!(f, "HTTP Error: {}", err);
            },
            CommuterError::HttpStatusError(ref status) => {
                return write!(f, "HTTP Status Error: {}", status);
            },
            CommuterError::IoError(ref err) => {
                return write!(f, "IO Error: {}", err);
            },
            CommuterError::JsonError(ref err) => {
                return write!(f, "JSON Error: {}", err);
            },
            CommuterError::SchemaError(ref msg) => {
                return write!(f, "Schema Error: {}", msg);
            },
            CommuterError::OtherError(ref err) => {
                return write!(f, "Error: {:#}", err);
            },
        }
    }
}

impl std::error::Error for CommuterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            CommuterError::HttpError(ref err) => Some(err),
            CommuterError::IoError(ref err) => Some(err),
            CommuterError::JsonError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CommuterError {
    fn from(err: reqwest::Error) -> CommuterError {
        return CommuterError::HttpError(err);
    }
}

impl From<std::io::Error> for CommuterError {
    fn from(err: std::io::Error) -> CommuterError {
        return CommuterError::IoError(err);
    }
}

impl From<serde_json::Error> for CommuterError {
    fn from(err: serde_json::Error) -> CommuterError {
        // A body that is valid JSON but the wrong shape is a schema problem,
        // not a transport one.
        if err.is_data() {
            return CommuterError::SchemaError(err.to_string());
        }
        return CommuterError::JsonError(err);
    }
}

impl From<anyhow::Error> for CommuterError {
    fn from(err: anyhow::Error) -> CommuterError {
        return CommuterError::OtherError(err);
    }
}
