mod types;

pub use types::*;

use crate::provider::Credentials;
use anyhow::{Context, Result};
use scenegrab_parser::QualityProfile;
use std::path::{Path, PathBuf};

/// Environment variable holding the provider account name
pub const ACCOUNT_ENV: &str = "SCENEGRAB_ACCOUNT";

/// Environment variable holding the provider premium key
pub const PREMIUM_KEY_ENV: &str = "SCENEGRAB_PREMIUM_KEY";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;
    expand_paths(&mut config);

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./scenegrab.toml",
        "./config.toml",
        "~/.config/scenegrab/config.toml",
        "/etc/scenegrab/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    let mut config = Config::default();
    expand_paths(&mut config);
    Ok(config)
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.download.max_concurrent == 0 {
        anyhow::bail!("download.max_concurrent cannot be 0");
    }

    if config.feed.recency_hours == 0 {
        anyhow::bail!("feed.recency_hours cannot be 0");
    }
    if config.feed.recency_hours > MAX_RECENCY_HOURS {
        anyhow::bail!(
            "feed.recency_hours cannot exceed {} (got {})",
            MAX_RECENCY_HOURS,
            config.feed.recency_hours
        );
    }

    if config.filter.resolutions.is_empty() {
        anyhow::bail!("filter.resolutions must list at least one marker");
    }
    if config.filter.sources.is_empty() {
        anyhow::bail!("filter.sources must list at least one marker");
    }
    if config.filter.codecs.is_empty() {
        anyhow::bail!("filter.codecs must list at least one marker");
    }

    if config.provider.timeout_secs == 0 {
        anyhow::bail!("provider.timeout_secs cannot be 0");
    }

    let watchlist = expand(&config.filter.watchlist);
    if !watchlist.exists() {
        tracing::warn!("Watchlist does not exist: {:?}", watchlist);
    }
    if let Some(stoplist) = &config.filter.stoplist {
        let stoplist = expand(stoplist);
        if !stoplist.exists() {
            tracing::warn!("Stoplist does not exist: {:?}", stoplist);
        }
    }

    Ok(())
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn expand_paths(config: &mut Config) {
    config.filter.watchlist = expand(&config.filter.watchlist);
    config.filter.stoplist = config.filter.stoplist.as_deref().map(expand);
    config.paths.download_dir = expand(&config.paths.download_dir);
    config.ledger.path = expand(&config.ledger.path);
}

impl FilterConfig {
    pub fn quality_profile(&self) -> QualityProfile {
        QualityProfile::new(
            self.resolutions.clone(),
            self.sources.clone(),
            self.codecs.clone(),
        )
    }
}

/// Resolve provider credentials from the environment, falling back to config.
pub fn resolve_credentials(provider: &ProviderConfig) -> Result<Credentials> {
    resolve_credentials_with(provider, |name| std::env::var(name).ok())
}

/// Resolve credentials with an injectable environment lookup.
///
/// Empty values count as missing.
pub fn resolve_credentials_with<F>(provider: &ProviderConfig, lookup: F) -> Result<Credentials>
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |env: &str, fallback: &Option<String>| {
        lookup(env)
            .or_else(|| fallback.clone())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let account = pick(ACCOUNT_ENV, &provider.account)
        .ok_or_else(|| scenegrab_common::Error::missing_credential(ACCOUNT_ENV))?;
    let premium_key = pick(PREMIUM_KEY_ENV, &provider.premium_key)
        .ok_or_else(|| scenegrab_common::Error::missing_credential(PREMIUM_KEY_ENV))?;

    Ok(Credentials::new(account, premium_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CommitPolicy;
    use scenegrab_db::LedgerBackend;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.feed.recency_hours, 12);
        assert!(config.feed.enforce_window);
        assert_eq!(config.download.max_concurrent, 4);
        assert_eq!(config.download.commit_policy, CommitPolicy::OnDownload);
        assert_eq!(config.ledger.backend, LedgerBackend::File);
        assert_eq!(config.provider.api_base, "https://nitroflare.com/api/v2");
        assert_eq!(config.render.label, "NitroFlare:");
        assert_eq!(config.render.wait_secs, 15);
    }

    #[test]
    fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[feed]
url = "https://example.com/feed.xml"
enforce_window = false

[ledger]
backend = "sqlite"
path = "/tmp/seen.db"

[download]
max_concurrent = 2
commit_policy = "on_accept"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.feed.url.as_deref(), Some("https://example.com/feed.xml"));
        assert!(!config.feed.enforce_window);
        assert_eq!(config.feed.recency_hours, 12);
        assert_eq!(config.ledger.backend, LedgerBackend::Sqlite);
        assert_eq!(config.download.max_concurrent, 2);
        assert_eq!(config.download.commit_policy, CommitPolicy::OnAccept);
        assert_eq!(config.filter.codecs.len(), 4);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.download.max_concurrent = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_caps_recency_hours() {
        let mut config = Config::default();
        config.feed.recency_hours = MAX_RECENCY_HOURS;
        assert!(validate_config(&config).is_ok());

        config.feed.recency_hours = u64::MAX;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("recency_hours"));
    }

    #[test]
    fn test_validate_rejects_empty_markers() {
        let mut config = Config::default();
        config.filter.sources.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_tilde_expansion() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[paths]\ndownload_dir = \"~/media\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert!(!config.paths.download_dir.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_credentials_env_overrides_config() {
        let provider = ProviderConfig {
            account: Some("from-config".into()),
            premium_key: Some("config-key".into()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [(ACCOUNT_ENV, "from-env")].into_iter().collect();

        let creds = resolve_credentials_with(&provider, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.account(), "from-env");
        assert_eq!(creds.premium_key(), "config-key");
    }

    #[test]
    fn test_missing_account_is_error() {
        let provider = ProviderConfig {
            premium_key: Some("key".into()),
            ..Default::default()
        };
        let err = resolve_credentials_with(&provider, |_| None).unwrap_err();
        assert!(err.to_string().contains(ACCOUNT_ENV));
    }

    #[test]
    fn test_blank_key_is_missing() {
        let provider = ProviderConfig {
            account: Some("user".into()),
            premium_key: Some("   ".into()),
            ..Default::default()
        };
        let err = resolve_credentials_with(&provider, |_| None).unwrap_err();
        assert!(err.to_string().contains(PREMIUM_KEY_ENV));
    }

    #[test]
    fn test_quality_profile_from_config() {
        let profile = FilterConfig::default().quality_profile();
        assert!(profile.accepts("The.Show.S01E02.1080p.NF.WEB-DL.HEVC"));
    }
}
