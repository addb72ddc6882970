use std::env;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Allowed browser origins; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 3001,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: Vec::new(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>, default: T) -> io::Result<T> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("{} must be a number, got {:?}", name, raw))
        }),
        None => Ok(default),
    }
}

impl Config {
    /// Reads `HOST`, `PORT`, `UPLOAD_DIR`, `MAX_UPLOAD_BYTES` and the
    /// comma-separated `CORS_ORIGINS`, falling back
    /// to the defaults for anything unset.
    pub fn from_env() -> io::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> io::Result<Self> {
        let defaults = Config::default();
        Ok(Config {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", lookup("PORT"), defaults.port)?,
            upload_dir: lookup("UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", lookup("MAX_UPLOAD_BYTES"), defaults.max_upload_bytes)?,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
