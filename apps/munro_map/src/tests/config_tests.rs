use super::{
    apply_cli_overrides, apply_env_overrides, load_settings, CliOverrides, Settings,
    DEFAULT_TILE_CACHE_CAPACITY, MIN_TILE_CACHE_CAPACITY,
};

use std::{collections::HashMap, fs};

use shared::domain::MapVariant;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_point_at_munro_api_and_osm() {
    let settings = Settings::default();
    assert_eq!(settings.api_url, "https://munroapi.herokuapp.com/munros");
    assert_eq!(
        settings.tile_url_template,
        "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"
    );
    assert_eq!(settings.tile_subdomains, ["a", "b", "c"]);
    assert_eq!(settings.variant, MapVariant::Interactive);
    assert_eq!(settings.tile_cache_capacity, DEFAULT_TILE_CACHE_CAPACITY);
}

#[test]
fn file_values_fill_in_over_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("munro_map.toml");
    fs::write(
        &path,
        r#"
api_url = "http://127.0.0.1:9000/munros"
variant = "static"
"#,
    )
    .expect("write settings");

    let settings = load_settings(&CliOverrides {
        config_path: Some(path),
        ..CliOverrides::default()
    })
    .expect("load settings");

    assert_eq!(settings.api_url, "http://127.0.0.1:9000/munros");
    assert_eq!(settings.variant, MapVariant::Static);
    assert_eq!(settings.tile_attribution, Settings::default().tile_attribution);
}

#[test]
fn missing_explicit_settings_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_settings(&CliOverrides {
        config_path: Some(dir.path().join("absent.toml")),
        ..CliOverrides::default()
    })
    .expect_err("explicit file must exist");
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn environment_overrides_file_and_cli_overrides_environment() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env(&[
            ("MUNRO_MAP__API_URL", "http://env.example/munros"),
            ("MUNRO_MAP__VARIANT", "static"),
            ("MUNRO_MAP__LOG", "debug"),
            ("MUNRO_MAP__TILE_URL", "  "),
        ]),
    )
    .expect("apply env");

    assert_eq!(settings.api_url, "http://env.example/munros");
    assert_eq!(settings.variant, MapVariant::Static);
    assert_eq!(settings.log_filter, "debug");
    assert_eq!(
        settings.tile_url_template,
        Settings::default().tile_url_template,
        "blank variables are ignored"
    );

    apply_cli_overrides(
        &mut settings,
        &CliOverrides {
            api_url: Some("http://cli.example/munros".into()),
            variant: Some(MapVariant::Interactive),
            ..CliOverrides::default()
        },
    );
    assert_eq!(settings.api_url, "http://cli.example/munros");
    assert_eq!(settings.variant, MapVariant::Interactive);
}

#[test]
fn unknown_variant_in_environment_is_rejected() {
    let mut settings = Settings::default();
    let err = apply_env_overrides(&mut settings, env(&[("MUNRO_MAP__VARIANT", "wobbly")]))
        .expect_err("unknown variant");
    assert!(err.to_string().contains("wobbly"));
}

#[test]
fn startup_config_validates_urls() {
    let startup = Settings::default().into_startup().expect("defaults are valid");
    assert_eq!(startup.api_url.as_str(), "https://munroapi.herokuapp.com/munros");

    let bad_api = Settings {
        api_url: "not a url".into(),
        ..Settings::default()
    };
    assert!(bad_api.into_startup().is_err());

    let bad_template = Settings {
        tile_url_template: "https://tiles.example/{z}.png".into(),
        ..Settings::default()
    };
    let err = bad_template.into_startup().expect_err("template without x/y");
    assert!(err.to_string().contains("{x}"));
}

#[test]
fn tiny_tile_cache_is_raised_to_minimum() {
    let startup = Settings {
        tile_cache_capacity: 2,
        ..Settings::default()
    }
    .into_startup()
    .expect("valid settings");
    assert_eq!(startup.tile_cache_capacity, MIN_TILE_CACHE_CAPACITY);
}
