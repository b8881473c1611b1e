use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub upload: Option<UploadConfig>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let demo_password =
            env::var("APP_DEMO_PASSWORD").unwrap_or_else(|_| "dormhub".to_string());
        if demo_password.trim().is_empty() {
            return Err(ConfigError::EmptyDemoPassword);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig { demo_password },
            upload: UploadConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credentials shared by the built-in operator accounts.
#[derive(Clone)]
pub struct AuthConfig {
    pub demo_password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("demo_password", &"<redacted>")
            .finish()
    }
}

/// Signed-upload account for room photos. Absent when none of the
/// `CLOUDINARY_*` variables are set.
#[derive(Clone)]
pub struct UploadConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_preset: String,
}

impl UploadConfig {
    const VARS: [&'static str; 3] = [
        "CLOUDINARY_CLOUD_NAME",
        "CLOUDINARY_API_KEY",
        "CLOUDINARY_API_SECRET",
    ];

    fn from_env() -> Result<Option<Self>, ConfigError> {
        let values: Vec<Option<String>> = Self::VARS
            .iter()
            .map(|name| env::var(name).ok().filter(|value| !value.trim().is_empty()))
            .collect();

        if values.iter().all(Option::is_none) {
            return Ok(None);
        }

        let missing: Vec<&'static str> = Self::VARS
            .iter()
            .zip(&values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::IncompleteUpload { missing });
        }

        let mut values = values.into_iter().flatten();
        let (Some(cloud_name), Some(api_key), Some(api_secret)) =
            (values.next(), values.next(), values.next())
        else {
            return Err(ConfigError::IncompleteUpload {
                missing: Self::VARS.to_vec(),
            });
        };

        let upload_preset =
            env::var("CLOUDINARY_UPLOAD_PRESET").unwrap_or_else(|_| "ml_default".to_string());

        Ok(Some(Self {
            cloud_name,
            api_key,
            api_secret,
            upload_preset,
        }))
    }
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("upload_preset", &self.upload_preset)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyDemoPassword,
    IncompleteUpload { missing: Vec<&'static str> },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyDemoPassword => write!(f, "APP_DEMO_PASSWORD must not be blank"),
            ConfigError::IncompleteUpload { missing } => write!(
                f,
                "image uploads are partially configured; missing {}",
                missing.join(", ")
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::EmptyDemoPassword
            | ConfigError::IncompleteUpload { .. } => None,
        }
    }
}
