use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use client_core::{tiles::TileSource, DEFAULT_MUNRO_API_URL};
use serde::Deserialize;
use shared::domain::MapVariant;
use url::Url;

use crate::ui::StartupConfig;

pub const DEFAULT_SETTINGS_FILE: &str = "munro_map.toml";
pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 512;
/// Enough slots for every tile a large window shows at once.
pub const MIN_TILE_CACHE_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub tile_url_template: String,
    pub tile_subdomains: Vec<String>,
    pub tile_attribution: String,
    pub tile_attribution_url: Option<String>,
    pub variant: MapVariant,
    pub log_filter: String,
    pub tile_cache_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let osm = TileSource::openstreetmap();
        Self {
            api_url: DEFAULT_MUNRO_API_URL.into(),
            tile_url_template: osm.url_template,
            tile_subdomains: osm.subdomains,
            tile_attribution: osm.attribution,
            tile_attribution_url: osm.attribution_url,
            variant: MapVariant::Interactive,
            log_filter: "info".into(),
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
        }
    }
}

/// Values given on the command line; they beat every other layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub tile_url: Option<String>,
    pub variant: Option<MapVariant>,
}

/// Resolves settings: defaults, then the TOML file, then `MUNRO_MAP__*`
/// environment variables, then command-line flags.
pub fn load_settings(cli: &CliOverrides) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config_path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    apply_cli_overrides(&mut settings, cli);
    Ok(settings)
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str::<Settings>(&raw)
        .with_context(|| format!("invalid settings file '{}'", path.display()))
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(v) = read("MUNRO_MAP__API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = read("MUNRO_MAP__TILE_URL") {
        settings.tile_url_template = v;
    }
    if let Some(v) = read("MUNRO_MAP__TILE_ATTRIBUTION") {
        settings.tile_attribution = v;
    }
    if let Some(v) = read("MUNRO_MAP__VARIANT") {
        settings.variant = MapVariant::parse(&v)
            .with_context(|| format!("MUNRO_MAP__VARIANT has unknown value '{v}'"))?;
    }
    if let Some(v) = read("MUNRO_MAP__LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = read("MUNRO_MAP__TILE_CACHE_CAPACITY") {
        settings.tile_cache_capacity = v
            .trim()
            .parse()
            .with_context(|| format!("MUNRO_MAP__TILE_CACHE_CAPACITY is not a number: '{v}'"))?;
    }
    Ok(())
}

pub(crate) fn apply_cli_overrides(settings: &mut Settings, cli: &CliOverrides) {
    if let Some(v) = &cli.api_url {
        settings.api_url = v.clone();
    }
    if let Some(v) = &cli.tile_url {
        settings.tile_url_template = v.clone();
    }
    if let Some(v) = cli.variant {
        settings.variant = v;
    }
}

impl Settings {
    pub fn tile_source(&self) -> TileSource {
        TileSource {
            url_template: self.tile_url_template.clone(),
            subdomains: self.tile_subdomains.clone(),
            attribution: self.tile_attribution.clone(),
            attribution_url: self.tile_attribution_url.clone(),
        }
    }

    pub fn into_startup(self) -> anyhow::Result<StartupConfig> {
        let api_url = Url::parse(self.api_url.trim())
            .with_context(|| format!("invalid munro api url '{}'", self.api_url))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            bail!("munro api url must be http(s), got '{}'", api_url);
        }
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !self.tile_url_template.contains(placeholder) {
                bail!(
                    "tile url template '{}' is missing {placeholder}",
                    self.tile_url_template
                );
            }
        }

        Ok(StartupConfig {
            api_url,
            tile_source: self.tile_source(),
            variant: self.variant,
            tile_cache_capacity: self.tile_cache_capacity.max(MIN_TILE_CACHE_CAPACITY),
        })
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
