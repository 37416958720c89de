use std::{env, fmt::Display, io::Write, str::FromStr, time::Duration};

use accrual_client::AccrualConfig;
use log::*;
use loyalty_common::Secret;
use loyalty_engine::settlement::{ReconcilerConfig, SettlementMode};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_LOYALTY_HOST: &str = "127.0.0.1";
const DEFAULT_LOYALTY_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24);
const MIN_JWT_SECRET_LENGTH: usize = 16;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub auth: AuthConfig,
    /// Where and how to reach the accrual service.
    pub accrual: AccrualConfig,
    /// Schedule and write mode of the settlement worker.
    pub reconciler: ReconcilerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LOYALTY_HOST.to_string(),
            port: DEFAULT_LOYALTY_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            accrual: AccrualConfig::default(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let (run_host, run_port) = env::var("RUN_ADDRESS")
            .ok()
            .and_then(|s| {
                parse_run_address(&s).or_else(|| {
                    warn!("🪛️ RUN_ADDRESS ({s}) is not a valid host:port address. Ignoring it.");
                    None
                })
            })
            .map(|(h, p)| (Some(h), Some(p)))
            .unwrap_or((None, None));
        let host = env::var("LOYALTY_HOST").ok().or(run_host).unwrap_or_else(|| DEFAULT_LOYALTY_HOST.into());
        let port = match env::var("LOYALTY_PORT") {
            Ok(_) => env_or_default("LOYALTY_PORT", DEFAULT_LOYALTY_PORT),
            Err(_) => run_port.unwrap_or(DEFAULT_LOYALTY_PORT),
        };
        let database_url = env::var("LOYALTY_DATABASE_URL").or_else(|_| env::var("DATABASE_URI")).unwrap_or_else(|_| {
            warn!("🪛️ LOYALTY_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = env_or_default("LOYALTY_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let accrual = AccrualConfig::new_from_env_or_default();
        let reconciler = reconciler_config_from_env();
        Self { host, port, database_url, max_connections, auth, accrual, reconciler }
    }
}

fn reconciler_config_from_env() -> ReconcilerConfig {
    let defaults = ReconcilerConfig::default();
    let interval = env_or_default("LOYALTY_RECONCILE_INTERVAL_SECS", defaults.interval.as_secs()).max(1);
    let batch_size = env_or_default("LOYALTY_RECONCILE_BATCH_SIZE", defaults.batch_size).max(1);
    let mode = env_or_default("LOYALTY_SETTLEMENT_MODE", SettlementMode::default());
    info!("🪛️ Settlement worker: every {interval}s, up to {batch_size} orders per tick, {mode} mode");
    defaults.with_interval(Duration::from_secs(interval)).with_batch_size(batch_size).with_mode(mode)
}

/// Reads and parses `name`. Invalid values are logged and replaced with `default`.
fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

/// Splits `host:port`. An empty host (`:8080`) means all interfaces.
fn parse_run_address(address: &str) -> Option<(String, u16)> {
    let (host, port) = address.trim().rsplit_once(':')?;
    let port = port.parse::<u16>().ok()?;
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Some((host.to_string(), port))
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 key that access tokens are signed with.
    pub jwt_secret: Secret<String>,
    /// How long tokens minted by [`crate::auth::TokenIssuer`] stay valid.
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this, since every token will be invalid after a restart. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        match NamedTempFile::new().ok().and_then(|f| f.keep().ok()) {
            Some((mut f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, you \
                     are doing it wrong! Set the LOYALTY_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => warn!("🪛️ Could not create a temporary file to store the JWT secret."),
        }
        Self { jwt_secret: Secret::new(secret), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_lifetime: DEFAULT_TOKEN_LIFETIME }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("LOYALTY_JWT_SECRET")
            .or_else(|_| env::var("TOKEN_SIGN_KEY"))
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [LOYALTY_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "LOYALTY_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self::new(secret))
    }
}
