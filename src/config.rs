//! Application-level configuration loading: game identity, course and score limits.

use std::{
    env, fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::leaderboard::model::{Course, CourseError, GameId, Stop};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "PUB_GOLF_BACK_CONFIG_PATH";
/// Environment variable that overrides the admin token of the file.
const ADMIN_TOKEN_ENV: &str = "PUB_GOLF_ADMIN_TOKEN";

const DEFAULT_GAME_ID: &str = "drinkers-society";
const DEFAULT_TITLE: &str = "Pub Golf";
const DEFAULT_STROKES_MIN: u32 = 1;
const DEFAULT_STROKES_MAX: u32 = 20;

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid JSON for this schema.
    #[error("malformed config file {path}: {source}")]
    Malformed {
        /// File that was parsed.
        path: PathBuf,
        /// Parser failure with line and column.
        #[source]
        source: serde_json::Error,
    },
    /// The stop list breaks a course rule.
    #[error("invalid course: {0}")]
    InvalidCourse(#[from] CourseError),
    /// `strokes_min` is above `strokes_max`.
    #[error("invalid strokes range {min}..={max}")]
    InvalidStrokesRange {
        /// Lower bound as configured.
        min: u32,
        /// Upper bound as configured.
        max: u32,
    },
    /// The game id is empty or whitespace.
    #[error("game id must not be blank")]
    EmptyGameId,
    /// The game id contains `:`, which separates the parts of stored document ids.
    #[error("game id `{0}` must not contain ':'")]
    InvalidGameId(String),
}

/// Inclusive range a submitted score is clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokesRange {
    /// Smallest accepted value.
    pub min: u32,
    /// Largest accepted value.
    pub max: u32,
}

impl StrokesRange {
    /// Build a range, rejecting `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidStrokesRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Clamp a raw submission, negative values included.
    pub fn clamp(&self, strokes: i64) -> u32 {
        let clamped = strokes.clamp(i64::from(self.min), i64::from(self.max));
        u32::try_from(clamped).unwrap_or(self.max)
    }
}

impl Default for StrokesRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_STROKES_MIN,
            max: DEFAULT_STROKES_MAX,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Game whose players and scores this instance serves.
    pub game_id: GameId,
    /// Display title of the event.
    pub title: String,
    /// Validated course, in play order.
    pub course: Arc<Course>,
    /// Bounds submissions are clamped into.
    pub strokes: StrokesRange,
    /// Secret expected in the `x-admin-token` header; admin routes stay locked when unset.
    pub admin_token: Option<String>,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to the built-in course when the
    /// file does not exist.
    ///
    /// A file that exists but cannot be read or parsed, or that describes an
    /// unusable course, is a fatal error.
    pub fn load() -> Result<Self, ConfigError> {
        let raw = read_raw(&resolve_config_path())?;
        let mut config = Self::try_from(raw)?;
        if let Some(token) = env::var(ADMIN_TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
            config.admin_token = Some(token);
        }
        info!(
            game_id = %config.game_id,
            stops = config.course.len(),
            admin = config.admin_token.is_some(),
            "configuration ready"
        );
        Ok(config)
    }

    /// Configuration made only of built-in defaults.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::try_from(RawConfig::default())
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    game_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    stops: Option<Vec<RawStop>>,
    #[serde(default)]
    strokes_min: Option<u32>,
    #[serde(default)]
    strokes_max: Option<u32>,
    #[serde(default)]
    admin_token: Option<String>,
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single stop; `sequence_index` defaults to list position.
struct RawStop {
    id: String,
    name: String,
    #[serde(default)]
    drink: String,
    #[serde(default)]
    emoji: String,
    par: i64,
    #[serde(default)]
    sequence_index: Option<u32>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let game_id = match raw.game_id {
            Some(id) if id.trim().is_empty() => return Err(ConfigError::EmptyGameId),
            Some(id) if id.contains(':') => return Err(ConfigError::InvalidGameId(id)),
            Some(id) => GameId::new(id.trim()),
            None => GameId::new(DEFAULT_GAME_ID),
        };

        let course = match raw.stops {
            Some(stops) => Course::new(
                stops
                    .into_iter()
                    .enumerate()
                    .map(|(position, stop)| stop.into_stop(position))
                    .collect::<Result<Vec<_>, _>>()?,
            )?,
            None => default_course()?,
        };

        let strokes = StrokesRange::new(
            raw.strokes_min.unwrap_or(DEFAULT_STROKES_MIN),
            raw.strokes_max.unwrap_or(DEFAULT_STROKES_MAX),
        )?;

        Ok(Self {
            game_id,
            title: raw.title.unwrap_or_else(|| DEFAULT_TITLE.into()),
            course: Arc::new(course),
            strokes,
            admin_token: raw.admin_token.filter(|token| !token.is_empty()),
        })
    }
}

impl RawStop {
    fn into_stop(self, position: usize) -> Result<Stop, CourseError> {
        let par = u32::try_from(self.par)
            .ok()
            .filter(|par| *par > 0)
            .ok_or_else(|| CourseError::InvalidPar(self.id.clone()))?;
        Ok(Stop {
            sequence_index: self
                .sequence_index
                .unwrap_or_else(|| u32::try_from(position).unwrap_or(u32::MAX)),
            id: self.id,
            name: self.name,
            drink: self.drink,
            emoji: self.emoji,
            par,
        })
    }
}

/// Read and parse the file at `path`; a missing file yields the defaults.
fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            );
            return Ok(RawConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let raw = serde_json::from_str(&contents).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "loaded configuration file");
    Ok(raw)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in nine-stop course shipped with the binary.
fn default_course() -> Result<Course, CourseError> {
    let stops = [
        ("as", "A's", "24oz beer", 3, "\u{1F37A}"),
        ("pmans", "Pmans", "Mimosas", 5, "\u{1F942}"),
        ("dogs", "Doggies", "Iced Coffee", 2, "\u{2615}"),
        ("cafe", "Cafe", "Pitcher", 6, "\u{1F37B}"),
        ("pickles", "Pickles", "Busch Pitcher", 6, "\u{1F37A}"),
        ("bdubs", "Bdubs", "Any tall beer", 2, "\u{1F37A}"),
        ("phyrst", "Phyrst", "Trashcan (BJ shot = -1)", 3, "\u{1F9EA}"),
        ("champs", "Champs", "Dirty Sprite", 2, "\u{1F964}"),
        ("zenos", "Zenos", "Irish Goodbye", 4, "\u{1F943}"),
    ];

    let stops = stops
        .into_iter()
        .zip(0u32..)
        .map(|((id, name, drink, par, emoji), sequence_index)| Stop {
            id: id.into(),
            name: name.into(),
            drink: drink.into(),
            emoji: emoji.into(),
            par,
            sequence_index,
        })
        .collect();

    Course::new(stops)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::try_from(serde_json::from_str::<RawConfig>(json).unwrap())
    }

    #[test]
    fn empty_file_uses_builtin_course() {
        let config = parse("{}").unwrap();
        assert_eq!(config.game_id.as_str(), DEFAULT_GAME_ID);
        assert_eq!(config.course.len(), 9);
        assert_eq!(config.course.stops()[0].id, "as");
        assert_eq!(config.course.stops()[8].id, "zenos");
        assert_eq!(config.strokes, StrokesRange::new(1, 20).unwrap());
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn stops_default_to_list_order() {
        let config = parse(
            r#"{"stops": [
                {"id": "b", "name": "B", "par": 2},
                {"id": "a", "name": "A", "par": 3, "sequence_index": 7}
            ]}"#,
        )
        .unwrap();
        let ids: Vec<_> = config.course.stops().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn invalid_courses_are_fatal() {
        assert!(matches!(
            parse(r#"{"stops": []}"#),
            Err(ConfigError::InvalidCourse(CourseError::Empty))
        ));
        assert!(matches!(
            parse(r#"{"stops": [{"id": "a", "name": "A", "par": -1}]}"#),
            Err(ConfigError::InvalidCourse(CourseError::InvalidPar(id))) if id == "a"
        ));
        assert!(matches!(
            parse(
                r#"{"stops": [{"id": "a", "name": "A", "par": 1}, {"id": "a", "name": "B", "par": 1}]}"#
            ),
            Err(ConfigError::InvalidCourse(CourseError::DuplicateId(_)))
        ));
    }

    #[test]
    fn inverted_range_and_blank_game_are_rejected() {
        assert!(matches!(
            parse(r#"{"strokes_min": 5, "strokes_max": 2}"#),
            Err(ConfigError::InvalidStrokesRange { min: 5, max: 2 })
        ));
        assert!(matches!(
            parse(r#"{"game_id": "  "}"#),
            Err(ConfigError::EmptyGameId)
        ));
    }

    #[test]
    fn game_id_with_separator_is_rejected() {
        assert!(matches!(
            parse(r#"{"game_id": "spring:2024"}"#),
            Err(ConfigError::InvalidGameId(id)) if id == "spring:2024"
        ));
        assert!(parse(r#"{"game_id": "spring-2024"}"#).is_ok());
    }

    #[test]
    fn missing_file_falls_back_but_broken_file_is_fatal() {
        let dir = env::temp_dir().join(format!("pub-golf-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let missing = read_raw(&dir.join("absent.json")).unwrap();
        assert!(missing.stops.is_none());

        let broken = dir.join("broken.json");
        fs::write(&broken, r#"{"stops": [{"id": "a", "name": "A", "par": 3},]}"#).unwrap();
        assert!(matches!(
            read_raw(&broken),
            Err(ConfigError::Malformed { path, .. }) if path == broken
        ));

        assert!(matches!(
            read_raw(&dir),
            Err(ConfigError::Unreadable { .. })
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn clamp_handles_out_of_range_values() {
        let range = StrokesRange::default();
        assert_eq!(range.clamp(-4), 1);
        assert_eq!(range.clamp(0), 1);
        assert_eq!(range.clamp(7), 7);
        assert_eq!(range.clamp(99), 20);
    }
}
