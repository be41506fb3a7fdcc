use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const CONFIG_ENV_VAR: &str = "DAYBOOK_CONFIG";
const DATA_ENV_VAR: &str = "DAYBOOK_DATA";
const TIMEZONE_ENV_VAR: &str = "DAYBOOK_TIMEZONE";
const DEFAULT_TIMEZONE: &str = "Asia/Dhaka";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow!("unknown theme: {other} (expected light/dark)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bn,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Bn => "bn",
        }
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "bn" => Ok(Language::Bn),
            other => Err(anyhow!("unknown language: {other} (expected en/bn)")),
        }
    }
}

/// Process-wide UI preferences. Loaded once on startup from the persisted
/// file (or defaults when none exists); saved back explicitly. Theme and
/// language never influence core logic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub data: Option<String>,
}

impl Preferences {
    #[tracing::instrument(skip(override_path))]
    pub fn load(override_path: Option<&Path>) -> anyhow::Result<Self> {
        let path = config_path(override_path)?;
        if !path.exists() {
            info!(file = %path.display(), "no preferences file; using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let prefs: Preferences = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        info!(file = %path.display(), "loaded preferences");
        Ok(prefs)
    }

    #[tracing::instrument(skip(self, override_path))]
    pub fn save(&self, override_path: Option<&Path>) -> anyhow::Result<()> {
        let path = config_path(override_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("failed to serialize preferences")?;
        fs::write(&path, raw).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// The calendar basis for every date-window decision. Env override
    /// wins, then the persisted preference, then the default; anything
    /// unparsable falls back to UTC rather than failing startup.
    pub fn timezone(&self) -> Tz {
        if let Ok(raw) = std::env::var(TIMEZONE_ENV_VAR)
            && let Some(tz) = parse_timezone(&raw, TIMEZONE_ENV_VAR)
        {
            return tz;
        }

        if let Some(raw) = self.timezone.as_deref()
            && let Some(tz) = parse_timezone(raw, "preferences")
        {
            return tz;
        }

        parse_timezone(DEFAULT_TIMEZONE, "DEFAULT_TIMEZONE").unwrap_or_else(|| {
            tracing::error!("failed to parse fallback timezone; using UTC");
            chrono_tz::UTC
        })
    }
}

fn parse_timezone(raw: &str, source: &str) -> Option<Tz> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        warn!(source, "timezone source was empty");
        return None;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(err) => {
            tracing::error!(source, timezone = %trimmed, error = %err, "failed to parse timezone id");
            None
        }
    }
}

fn config_path(override_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(raw) = std::env::var(CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(expand_tilde(Path::new(trimmed)));
        }
    }

    let base = dirs::config_dir().ok_or_else(|| anyhow!("cannot determine config directory"))?;
    Ok(base.join("daybook").join("config.toml"))
}

#[tracing::instrument(skip(prefs, override_dir))]
pub fn resolve_data_dir(prefs: &Preferences, override_dir: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = if let Some(path) = override_dir {
        path.to_path_buf()
    } else if let Ok(raw) = std::env::var(DATA_ENV_VAR) {
        expand_tilde(Path::new(raw.trim()))
    } else if let Some(configured) = prefs.data.as_deref() {
        expand_tilde(Path::new(configured))
    } else {
        let base = dirs::data_dir().ok_or_else(|| anyhow!("cannot determine data directory"))?;
        base.join("daybook")
    };

    if !dir.exists() {
        info!(dir = %dir.display(), "creating data directory");
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

fn expand_tilde(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{Language, Preferences, Theme};

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let prefs = Preferences::load(Some(&path)).expect("load");
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.language, Language::En);
        assert_eq!(prefs.timezone, None);
    }

    #[test]
    fn preferences_round_trip() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("config.toml");

        let mut prefs = Preferences::default();
        prefs.theme = Theme::Dark;
        prefs.language = Language::Bn;
        prefs.timezone = Some("Asia/Dhaka".to_string());
        prefs.save(Some(&path)).expect("save");

        let loaded = Preferences::load(Some(&path)).expect("load");
        assert_eq!(loaded.theme, Theme::Dark);
        assert_eq!(loaded.language, Language::Bn);
        assert_eq!(loaded.timezone.as_deref(), Some("Asia/Dhaka"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "theme = \"dark\"\n").expect("write");

        let prefs = Preferences::load(Some(&path)).expect("load");
        assert_eq!(prefs.theme, Theme::Dark);
        assert_eq!(prefs.language, Language::En);
    }
}
