use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Profiled key lookup: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
///
/// Empty values count as unset.
struct ProfiledEnv<'a> {
    profile: &'a str,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl ProfiledEnv<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        if !self.profile.is_empty() {
            let prefixed = format!("{}_{}", self.profile, key);
            if let Some(v) = (self.lookup)(&prefixed).filter(|s| !s.is_empty()) {
                return Some(v);
            }
        }
        (self.lookup)(key).filter(|s| !s.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.opt(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.opt(key) {
            None => Ok(default),
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: v,
            }),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.opt(key) {
            None => Ok(default),
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    key: key.to_string(),
                    value: v,
                }),
            },
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub stream: StreamConfig,
    pub postgres: PostgresConfig,
    pub search: SearchConfig,
    pub amqp: AmqpConfig,
    pub intake: IntakeConfig,
    pub health: HealthConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `INTAKE_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env::var("INTAKE_PROFILE").unwrap_or_default();
        Self::from_lookup(&profile, &|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(
        profile: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let env = ProfiledEnv {
            profile: &p,
            lookup,
        };
        Ok(Self {
            profile: p.clone(),
            stream: StreamConfig::from_env(&env)?,
            postgres: PostgresConfig::from_env(&env)?,
            search: SearchConfig::from_env(&env)?,
            amqp: AmqpConfig::from_env(&env)?,
            intake: IntakeConfig::from_env(&env)?,
            health: HealthConfig::from_env(&env),
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  stream:    servers={}, topic={}, group={}, sasl={}",
            self.stream.bootstrap_servers,
            self.stream.topic,
            self.stream.group_id,
            self.stream.sasl_mechanism.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  postgres:  url={}, max_connections={}",
            self.postgres.redacted_url(),
            self.postgres.max_connections
        );
        tracing::info!(
            "  search:    nodes={}, index={}",
            self.search.addresses.len(),
            self.search.index
        );
        tracing::info!(
            "  amqp:      queue={}, dead_letter={}",
            self.amqp.ocr_queue,
            self.amqp.dead_letter_queue.as_deref().unwrap_or("(none)")
        );
        tracing::info!(
            "  intake:    actor={}, priority={}, detect_face={}",
            self.intake.system_key_id,
            self.intake.default_priority,
            self.intake.detect_face
        );
    }
}

// ── Stream (Kafka) ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub group_id: String,
    pub client_id: String,
    pub security_protocol: Option<String>,
    pub sasl_mechanism: Option<String>,
    pub sasl_username: Option<String>,
    pub sasl_password: Option<String>,
    pub auto_offset_reset: String,
    pub poll_timeout_ms: u64,
}

impl StreamConfig {
    fn from_env(env: &ProfiledEnv<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            bootstrap_servers: env.required("BOOTSTRAP_SERVERS")?,
            topic: env.required("TOPIC")?,
            group_id: env.required("GROUP_ID")?,
            client_id: env.required("CLIENT_ID")?,
            security_protocol: env.opt("SECURITY_PROTOCOL"),
            sasl_mechanism: env.opt("SASL_MECHANISM"),
            sasl_username: env.opt("SASL_USERNAME"),
            sasl_password: env.opt("SASL_PASSWORD"),
            auto_offset_reset: env.or("AUTO_OFFSET_RESET", "earliest"),
            poll_timeout_ms: env.parsed("POLL_TIMEOUT_MS", 100)?,
        })
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl PostgresConfig {
    fn from_env(env: &ProfiledEnv<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env.required("DATABASE_URL")?,
            max_connections: env.parsed("PG_MAX_CONNECTIONS", 5)?,
            run_migrations: env.flag("PG_RUN_MIGRATIONS", false)?,
        })
    }

    /// Connection URL with the password (if any) masked.
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.database_url.split_once("://") else {
            return self.database_url.clone();
        };
        match rest.split_once('@') {
            Some((creds, host)) => {
                let user = creds.split(':').next().unwrap_or("");
                format!("{scheme}://{user}:***@{host}")
            }
            None => self.database_url.clone(),
        }
    }
}

// ── Search index (Elasticsearch / OpenSearch) ─────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub addresses: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub index: String,
    pub timeout_secs: u64,
}

impl SearchConfig {
    fn from_env(env: &ProfiledEnv<'_>) -> Result<Self, ConfigError> {
        let raw = env.required("ES_ADDRESSES")?;
        let addresses: Vec<String> = raw
            .split(',')
            .map(|a| a.trim().trim_end_matches('/').to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if addresses.is_empty() {
            return Err(ConfigError::Invalid {
                key: "ES_ADDRESSES".into(),
                value: raw,
            });
        }
        Ok(Self {
            addresses,
            username: env.opt("ES_USERNAME"),
            password: env.opt("ES_PASSWORD"),
            index: env.or("ES_INDEX", "icocr.staging.document"),
            timeout_secs: env.parsed("ES_TIMEOUT_SECS", 30)?,
        })
    }
}

// ── AMQP (RabbitMQ) ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmqpConfig {
    pub url: String,
    pub ocr_queue: String,
    pub max_priority: u8,
    pub dead_letter_queue: Option<String>,
}

impl AmqpConfig {
    fn from_env(env: &ProfiledEnv<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            url: env.required("RABBITMQ_URL")?,
            ocr_queue: env.or("OCR_QUEUE", "process-ocr-requests-priority"),
            max_priority: env.parsed("OCR_QUEUE_MAX_PRIORITY", 10)?,
            dead_letter_queue: env.opt("DEAD_LETTER_QUEUE"),
        })
    }
}

// ── Intake defaults / system actor ────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Creator id stamped on every ingested document.
    pub system_key_id: String,
    pub creator_name: String,
    pub input_source_type: String,
    pub default_priority: i32,
    pub detect_face: bool,
}

impl IntakeConfig {
    fn from_env(env: &ProfiledEnv<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            system_key_id: env.required("SYSTEM_KEY_ID")?,
            creator_name: env.or("SYSTEM_CREATOR_NAME", "system"),
            input_source_type: env.or("INPUT_SOURCE_TYPE", "tich_hop_gd_1"),
            default_priority: env.parsed("DEFAULT_PRIORITY", 8)?,
            detect_face: env.flag("DETECT_FACE", true)?,
        })
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            system_key_id: String::new(),
            creator_name: "system".to_string(),
            input_source_type: "tich_hop_gd_1".to_string(),
            default_priority: 8,
            detect_face: true,
        }
    }
}

// ── Health endpoint ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub addr: String,
}

impl HealthConfig {
    fn from_env(env: &ProfiledEnv<'_>) -> Self {
        Self {
            addr: env.or("HEALTH_ADDR", "0.0.0.0:8080"),
        }
    }
}
