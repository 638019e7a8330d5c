//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! Every variable is optional. An empty value counts as unset.
//!
//! ## Server
//! - `MEGAMI_HOST` - Bind address (default: 127.0.0.1)
//! - `MEGAMI_PORT` - Listen port (default: 8501)
//! - `MEGAMI_BASE_URL` - Public URL (default: <http://localhost:8501>)
//!
//! ## Chat completion
//! - `OPENAI_API_KEY` - Enables model replies; demo replies otherwise
//! - `OPENAI_MODEL` - Model id (default: gpt-4o-mini)
//! - `OPENAI_BASE_URL` - OpenAI-compatible endpoint
//! - `PERSONA_FILE` - Text file used as the persona system prompt
//!
//! ## Admin and booking
//! - `ADMIN_TOKEN` - Shared admin secret; admin login is disabled when unset
//! - `BOOKING_URL` - External booking page
//! - `BOOKING_EMBED` - Render the booking page in an iframe (default: false)
//! - `BOOKING_ANNOUNCE_AFTER`, `BOOKING_PANEL_AFTER`, `SUMMARY_MAIL_AFTER` -
//!   turn thresholds (defaults: 10, 3, 10)
//!
//! ## Collaborator groups (all members or none)
//! - `GMAIL_FROM`, `GMAIL_APP_PASSWORD`, `RECIPIENT_EMAIL` - summary mail
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY` - summary store
//!
//! ## Other
//! - `SMTP_HOST`, `SMTP_PORT` - Mail relay (default: smtp.gmail.com:465)
//! - `SUPABASE_TABLE` - Summary table (default: summaries)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking
//! - `LOG_FORMAT` - `json` for structured logs, text otherwise

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use megami_core::TriggerPolicy;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "admin",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Incomplete {group} configuration: missing {missing}")]
    IncompleteGroup {
        group: &'static str,
        missing: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Chat-completion configuration, if an API key is set
    pub openai: Option<OpenAiConfig>,
    /// Persona prompt file
    pub persona_file: Option<PathBuf>,
    /// Shared admin secret
    pub admin_token: Option<SecretString>,
    /// Booking call-to-action
    pub booking: BookingConfig,
    /// Turn thresholds
    pub triggers: TriggerPolicy,
    /// Legacy summary mail
    pub email: Option<EmailConfig>,
    /// Summary row store
    pub supabase: Option<SupabaseConfig>,
    /// Error tracking
    pub sentry: SentryConfig,
    /// Log output format
    pub log_format: LogFormat,
}

/// OpenAI-compatible chat-completion configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Booking link configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingConfig {
    /// Booking page; `None` renders an informational notice instead.
    pub url: Option<String>,
    /// Embed the booking page in an iframe instead of linking to it.
    pub embed: bool,
}

/// SMTP configuration for the summary mail.
///
/// Implements `Debug` manually to redact the app password.
#[derive(Clone)]
pub struct EmailConfig {
    pub from_address: String,
    pub app_password: SecretString,
    pub recipient: String,
    pub smtp_host: String,
    pub smtp_port: u16,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("from_address", &self.from_address)
            .field("app_password", &"[REDACTED]")
            .field("recipient", &self.recipient)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .finish()
    }
}

/// Supabase (`PostgREST`) configuration for the summary store.
///
/// Implements `Debug` manually to redact the anon key.
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: SecretString,
    pub table: String,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("table", &self.table)
            .finish()
    }
}

/// Sentry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or a collaborator
    /// group is only partially set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a fixed set of variables.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup };

        let host = env.parse("MEGAMI_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse("MEGAMI_PORT", 8501_u16)?;
        let base_url = env.or_default("MEGAMI_BASE_URL", "http://localhost:8501");
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("MEGAMI_BASE_URL".to_string(), e.to_string()))?;

        let openai = env.optional("OPENAI_API_KEY").map(|api_key| OpenAiConfig {
            api_key: SecretString::from(api_key),
            model: env.or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            base_url: env
                .or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        });

        let booking = BookingConfig {
            url: env.optional("BOOKING_URL"),
            embed: env.flag("BOOKING_EMBED")?,
        };

        let triggers = TriggerPolicy {
            booking_announce_after: env.parse(
                "BOOKING_ANNOUNCE_AFTER",
                TriggerPolicy::DEFAULT_BOOKING_ANNOUNCE_AFTER,
            )?,
            booking_panel_after: env
                .parse("BOOKING_PANEL_AFTER", TriggerPolicy::DEFAULT_BOOKING_PANEL_AFTER)?,
            summary_mail_after: env
                .parse("SUMMARY_MAIL_AFTER", TriggerPolicy::DEFAULT_SUMMARY_MAIL_AFTER)?,
        };

        let email = match env.group(
            "email",
            ["GMAIL_FROM", "GMAIL_APP_PASSWORD", "RECIPIENT_EMAIL"],
        )? {
            Some([from_address, app_password, recipient]) => Some(EmailConfig {
                from_address,
                app_password: SecretString::from(app_password),
                recipient,
                smtp_host: env.or_default("SMTP_HOST", "smtp.gmail.com"),
                smtp_port: env.parse("SMTP_PORT", 465_u16)?,
            }),
            None => None,
        };

        let supabase = match env.group("supabase", ["SUPABASE_URL", "SUPABASE_ANON_KEY"])? {
            Some([url, anon_key]) => {
                Url::parse(&url).map_err(|e| {
                    ConfigError::InvalidEnvVar("SUPABASE_URL".to_string(), e.to_string())
                })?;
                Some(SupabaseConfig {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key: SecretString::from(anon_key),
                    table: env.or_default("SUPABASE_TABLE", "summaries"),
                })
            }
            None => None,
        };

        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.optional("SENTRY_ENVIRONMENT"),
            sample_rate: env.parse("SENTRY_SAMPLE_RATE", 1.0_f32)?,
            traces_sample_rate: env.parse("SENTRY_TRACES_SAMPLE_RATE", 0.1_f32)?,
        };

        let log_format = match env.optional("LOG_FORMAT").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            host,
            port,
            base_url,
            openai,
            persona_file: env.optional("PERSONA_FILE").map(PathBuf::from),
            admin_token: env.optional("ADMIN_TOKEN").map(SecretString::from),
            booking,
            triggers,
            email,
            supabase,
            sentry,
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Describes why the configured admin token looks weak, if it does.
    ///
    /// A weak token is still accepted; callers log the reason.
    #[must_use]
    pub fn admin_token_weakness(&self) -> Option<String> {
        let token = self.admin_token.as_ref()?;
        validate_secret_strength(token.expose_secret()).err()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the empty-means-unset rule applied.
struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a boolean flag (default false).
    fn flag(&self, key: &str) -> Result<bool, ConfigError> {
        match self.optional(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("false" | "0" | "no" | "off") => Ok(false),
            Some("true" | "1" | "yes" | "on") => Ok(true),
            Some(other) => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }

    /// Read variables that only make sense together.
    ///
    /// Returns `None` when none are set and an error when only some are.
    fn group<const N: usize>(
        &self,
        group: &'static str,
        keys: [&str; N],
    ) -> Result<Option<[String; N]>, ConfigError> {
        let values = keys.map(|key| self.optional(key));
        let set = values.iter().filter(|v| v.is_some()).count();

        if set == 0 {
            return Ok(None);
        }
        if set < N {
            let missing = keys
                .iter()
                .zip(&values)
                .filter(|(_, v)| v.is_none())
                .map(|(k, _)| *k)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ConfigError::IncompleteGroup { group, missing });
        }
        Ok(Some(values.map(Option::unwrap_or_default)))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Check that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str) -> Result<(), String> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_vars(&vars)
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let config = config(&[]).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8501");
        assert!(config.openai.is_none());
        assert!(config.supabase.is_none());
        assert!(config.email.is_none());
        assert!(config.admin_token.is_none());
        assert_eq!(config.booking, BookingConfig::default());
        assert_eq!(config.triggers, TriggerPolicy::default());
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_empty_values_count_as_unset() {
        let config = config(&[("OPENAI_API_KEY", ""), ("BOOKING_URL", "  ")]).unwrap();
        assert!(config.openai.is_none());
        assert!(config.booking.url.is_none());
    }

    #[test]
    fn test_openai_defaults() {
        let config = config(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        let openai = config.openai.unwrap();
        assert_eq!(openai.model, "gpt-4o-mini");
        assert_eq!(openai.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_partial_supabase_group_is_rejected() {
        let err = config(&[("SUPABASE_URL", "https://abc.supabase.co")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IncompleteGroup { group: "supabase", ref missing }
                if missing == "SUPABASE_ANON_KEY"
        ));
    }

    #[test]
    fn test_partial_email_group_names_every_missing_key() {
        let err = config(&[("GMAIL_FROM", "bot@example.com")]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Incomplete email configuration: missing GMAIL_APP_PASSWORD, RECIPIENT_EMAIL"
        );
    }

    #[test]
    fn test_complete_groups() {
        let config = config(&[
            ("SUPABASE_URL", "https://abc.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("GMAIL_FROM", "bot@example.com"),
            ("GMAIL_APP_PASSWORD", "app-pass"),
            ("RECIPIENT_EMAIL", "owner@example.com"),
        ])
        .unwrap();

        let supabase = config.supabase.unwrap();
        assert_eq!(supabase.url, "https://abc.supabase.co");
        assert_eq!(supabase.table, "summaries");

        let email = config.email.unwrap();
        assert_eq!(email.smtp_host, "smtp.gmail.com");
        assert_eq!(email.smtp_port, 465);
    }

    #[test]
    fn test_thresholds_and_booking_flags() {
        let config = config(&[
            ("BOOKING_URL", "https://book.example.com"),
            ("BOOKING_EMBED", "true"),
            ("BOOKING_ANNOUNCE_AFTER", "5"),
            ("BOOKING_PANEL_AFTER", "2"),
        ])
        .unwrap();
        assert!(config.booking.embed);
        assert_eq!(config.triggers.booking_announce_after, 5);
        assert_eq!(config.triggers.booking_panel_after, 2);
        assert_eq!(
            config.triggers.summary_mail_after,
            TriggerPolicy::DEFAULT_SUMMARY_MAIL_AFTER
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("MEGAMI_PORT", "http")]).is_err());
        assert!(config(&[("BOOKING_EMBED", "maybe")]).is_err());
        assert!(config(&[("MEGAMI_BASE_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_https_base_url_is_secure() {
        let config = config(&[("MEGAMI_BASE_URL", "https://megami.example.com")]).unwrap();
        assert!(config.is_secure());
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_weak_admin_token_is_reported() {
        let weak = config(&[("ADMIN_TOKEN", "changeme")]).unwrap();
        assert!(weak.admin_token_weakness().unwrap().contains("placeholder"));

        let low_entropy = config(&[("ADMIN_TOKEN", "aaaaaaaaaaaa")]).unwrap();
        assert!(low_entropy.admin_token_weakness().unwrap().contains("entropy"));

        let strong = config(&[("ADMIN_TOKEN", "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6")]).unwrap();
        assert!(strong.admin_token_weakness().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = config(&[
            ("OPENAI_API_KEY", "sk-super-secret-key"),
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon-super-secret"),
        ])
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("abc.supabase.co"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-super-secret-key"));
        assert!(!debug_output.contains("anon-super-secret"));
    }
}
