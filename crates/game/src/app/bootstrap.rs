use std::fs;
use std::path::{Path, PathBuf};

use engine::app::{Engine, EngineConfig, HeadlessHost};
use engine::{load_blueprints, resolve_app_paths, AppPaths, ContentCompileError, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::demo::{self, DemoError, DemoState};

const CONFIG_ENV_VAR: &str = "BLUEPRINTS_CONFIG";
const FRAMES_ENV_VAR: &str = "BLUEPRINTS_DEMO_FRAMES";
const DEFAULT_FRAMES: u32 = 600;
pub(crate) const FRAME_STEP_MS: f64 = 16.0;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read engine config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid engine config {path} at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{var} must be a whole number of frames, got '{value}'")]
    Frames { var: &'static str, value: String },
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("blueprint content failed to load: {0}")]
    Content(#[from] ContentCompileError),
    #[error(transparent)]
    Demo(#[from] DemoError),
}

pub(crate) struct AppWiring {
    pub(crate) engine: Engine,
    pub(crate) host: HeadlessHost,
    pub(crate) demo: DemoState,
    pub(crate) frames: u32,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Blueprint Engine Startup ===");

    let paths = resolve_app_paths()?;
    let config = load_engine_config(&config_path(&paths))?;
    let frames = frames_from_env()?;
    let (width, height) = (config.screen_width, config.screen_height);

    let mut engine = Engine::new(config);
    load_blueprints(&mut engine, &paths)?;
    let mut host = HeadlessHost::new().with_screen_size(width, height);
    let demo = demo::install(&mut engine, &mut host)?;

    Ok(AppWiring {
        engine,
        host,
        demo,
        frames,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn config_path(paths: &AppPaths) -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.asset_dir.join("engine.json"))
}

/// Reads the engine config from `path`. A missing file means defaults.
pub(crate) fn load_engine_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "engine_config_missing_using_defaults");
            return Ok(EngineConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_engine_config(path, &raw)
}

fn parse_engine_config(path: &Path, raw: &str) -> Result<EngineConfig, ConfigError> {
    let deserializer = &mut serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(deserializer).map_err(|error| ConfigError::Parse {
        path: path.to_path_buf(),
        field: error.path().to_string(),
        source: error.into_inner(),
    })
}

fn frames_from_env() -> Result<u32, ConfigError> {
    match std::env::var(FRAMES_ENV_VAR) {
        Ok(value) => parse_frames(&value),
        Err(_) => Ok(DEFAULT_FRAMES),
    }
}

fn parse_frames(value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Frames {
        var: FRAMES_ENV_VAR,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use engine::app::ObjectScope;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_config_file_means_defaults() {
        let temp = TempDir::new().expect("temp");
        let config = load_engine_config(&temp.path().join("engine.json")).expect("config");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn config_file_overrides_fields() {
        let temp = TempDir::new().expect("temp");
        let path = temp.path().join("engine.json");
        fs::write(&path, r#"{ "object_scope": "global", "max_frame_delta_ms": 50 }"#)
            .expect("write");
        let config = load_engine_config(&path).expect("config");
        assert_eq!(config.object_scope, ObjectScope::Global);
        assert_eq!(config.max_frame_delta_ms, Some(50.0));
    }

    #[test]
    fn bad_field_is_reported_by_path() {
        let err = parse_engine_config(Path::new("engine.json"), r#"{ "screen_width": "wide" }"#)
            .expect_err("invalid");
        match err {
            ConfigError::Parse { field, .. } => assert_eq!(field, "screen_width"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn frames_must_be_a_number() {
        assert_eq!(parse_frames(" 120 ").expect("frames"), 120);
        assert!(matches!(parse_frames("lots"), Err(ConfigError::Frames { .. })));
    }

    #[test]
    fn shipped_config_parses() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("assets")
            .join("engine.json");
        let config = load_engine_config(&path).expect("shipped config");
        assert_eq!(config.object_scope, ObjectScope::PerScreen);
    }
}
