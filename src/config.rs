use std::{
    collections::BTreeMap,
    env,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{NoteError, Result};

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Directory (under the user's config directory) holding our files.
pub const CONFIG_DIR_NAME: &str = "tnotes";

/// Programs tried after the configured editor and `$EDITOR`.
const FALLBACK_EDITORS: [&str; 2] = ["nano", "vi"];

/// Kind of storage holding the notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryType {
    #[default]
    #[serde(alias = ":file_system")]
    FileSystem,
}

/// Selects which repository a run works on, so that development and test
/// runs never touch the real notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    #[default]
    #[serde(alias = ":production")]
    Production,
    #[serde(alias = ":development")]
    Development,
    #[serde(alias = ":test")]
    Test,
}

impl RunMode {
    /// Appended to the repository name.
    pub fn postfix(&self) -> &'static str {
        match self {
            RunMode::Production => "",
            RunMode::Development => "_deve",
            RunMode::Test => "_test",
        }
    }
}

/// Application configuration settings.
///
/// Every key is optional in the file; missing ones take the defaults.
/// Keys written with a leading colon (`:repository_name:`) are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(alias = ":repository_type")]
    pub repository_type: RepositoryType,

    /// Name of the repository directory, before the run mode postfix
    #[serde(alias = ":repository_name")]
    pub repository_name: String,

    /// Directory holding the repository; `~` is the home directory
    #[serde(alias = ":repository_base")]
    pub repository_base: String,

    #[serde(alias = ":run_mode")]
    pub run_mode: RunMode,

    /// Editor command line used by `add` and `update`
    #[serde(alias = ":editor", skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// Program `show` pipes notes through
    #[serde(alias = ":pager", skip_serializing_if = "Option::is_none")]
    pub pager: Option<String>,

    /// Program `pick` pipes headlines through
    #[serde(alias = ":picker", skip_serializing_if = "Option::is_none")]
    pub picker: Option<String>,

    /// Extra arguments for the picker
    #[serde(alias = ":picker_option", skip_serializing_if = "Option::is_none")]
    pub picker_option: Option<String>,

    /// Keyword `list` and `pick` use when given no argument
    #[serde(alias = ":list_default", skip_serializing_if = "Option::is_none")]
    pub list_default: Option<String>,

    /// How many notes the `recent` keyword keeps
    #[serde(alias = ":number_of_recent_notes", skip_serializing_if = "Option::is_none")]
    pub number_of_recent_notes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository_type: RepositoryType::FileSystem,
            repository_name: "notes".to_string(),
            repository_base: "~".to_string(),
            run_mode: RunMode::Production,
            editor: None,
            pager: None,
            picker: None,
            picker_option: None,
            list_default: None,
            number_of_recent_notes: None,
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when a file is there, and the built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(NoteError::NoConfFile {
                        path: path.to_path_buf(),
                    });
                }
                Self::from_file(path)
            }
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => {
                    debug!("No configuration file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Reads a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Repository name with the run mode postfix applied.
    pub fn repository_name(&self) -> String {
        format!("{}{}", self.repository_name, self.run_mode.postfix())
    }

    /// Full path of the repository directory.
    pub fn repository_path(&self) -> PathBuf {
        expand_tilde(&self.repository_base, dirs::home_dir().as_deref())
            .join(self.repository_name())
    }

    /// Editors to try, in order: configured, `$EDITOR`, then fallbacks.
    pub fn editor_candidates(&self) -> Vec<String> {
        let from_env = env::var("EDITOR").ok();
        self.editor
            .iter()
            .cloned()
            .chain(from_env)
            .chain(FALLBACK_EDITORS.iter().map(|editor| editor.to_string()))
            .filter(|candidate| !candidate.trim().is_empty())
            .collect()
    }

    /// The first available editor command line.
    pub fn find_editor(&self) -> Result<String> {
        let candidates = self.editor_candidates();
        find_program(&candidates).ok_or(NoteError::NoEditor { candidates })
    }

    /// Cap for the `recent` keyword; `None` keeps everything.
    pub fn recent_cap(&self) -> Option<usize> {
        self.number_of_recent_notes.filter(|cap| *cap > 0)
    }

    /// Every setting as text, sorted by key. Unset optional keys are left
    /// out and the repository name carries its run mode postfix.
    pub fn settings(&self) -> Result<BTreeMap<String, String>> {
        let mut settings = BTreeMap::new();
        if let serde_json::Value::Object(map) = serde_json::to_value(self)? {
            for (key, value) in map {
                let text = match value {
                    serde_json::Value::Null => continue,
                    serde_json::Value::String(text) => text,
                    other => other.to_string(),
                };
                settings.insert(key, text);
            }
        }
        settings.insert("repository_name".to_string(), self.repository_name());
        Ok(settings)
    }
}

/// Directory holding the configuration file.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_from(env::var_os("XDG_CONFIG_HOME"), dirs::home_dir())
}

/// `$XDG_CONFIG_HOME/tnotes` when set, `~/.config/tnotes` otherwise.
pub fn config_dir_from(xdg_config_home: Option<OsString>, home: Option<PathBuf>) -> Option<PathBuf> {
    match xdg_config_home.filter(|dir| !dir.is_empty()) {
        Some(dir) => Some(PathBuf::from(dir).join(CONFIG_DIR_NAME)),
        None => home.map(|home| home.join(".config").join(CONFIG_DIR_NAME)),
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Replaces a leading `~` with the home directory.
pub fn expand_tilde(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home.to_path_buf(),
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}

/// Returns the first candidate command line whose program is an
/// executable, either by absolute path or found in `PATH`.
pub fn find_program(candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| {
            let program = match shell_words::split(candidate) {
                Ok(words) => words.into_iter().next(),
                Err(_) => None,
            };
            match program {
                Some(program) => {
                    let found = which(&program).is_ok();
                    trace!("Looking for {}: {}", program, found);
                    found
                }
                None => false,
            }
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.repository_type, RepositoryType::FileSystem);
        assert_eq!(config.repository_name(), "notes");
        assert_eq!(config.repository_base, "~");
        assert_eq!(config.recent_cap(), None);
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.repository_path(), home.join("notes"));
        }
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "repository_name: memo\nrun_mode: development\nnumber_of_recent_notes: 5\n",
        )
        .unwrap();
        assert_eq!(config.repository_name(), "memo_deve");
        assert_eq!(config.repository_base, "~");
        assert_eq!(config.recent_cap(), Some(5));
        assert_eq!(config.pager, None);
    }

    #[test]
    fn test_colon_prefixed_keys() {
        let yaml = ":repository_type: :file_system\n:repository_name: notes\n:repository_base: /tmp/base\n:run_mode: :test\n:pager: less\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.run_mode, RunMode::Test);
        assert_eq!(config.pager.as_deref(), Some("less"));
        assert_eq!(config.repository_path(), PathBuf::from("/tmp/base/notes_test"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("run_mode: sometimes\n"),
            Err(NoteError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "repository_base: /srv\nrepository_name: diary").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.repository_path(), PathBuf::from("/srv/diary"));

        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yml");
        match Config::load(Some(&missing)) {
            Err(NoteError::NoConfFile { path }) => assert_eq!(path, missing),
            other => panic!("expected NoConfFile, got {other:?}"),
        }
    }

    #[test]
    fn test_config_dir_resolution() {
        let home = PathBuf::from("/home/alice");
        assert_eq!(
            config_dir_from(Some("/xdg".into()), Some(home.clone())),
            Some(PathBuf::from("/xdg/tnotes"))
        );
        assert_eq!(
            config_dir_from(None, Some(home.clone())),
            Some(PathBuf::from("/home/alice/.config/tnotes"))
        );
        assert_eq!(
            config_dir_from(Some("".into()), Some(home)),
            Some(PathBuf::from("/home/alice/.config/tnotes"))
        );
        assert_eq!(config_dir_from(None, None), None);
    }

    #[test]
    fn test_expand_tilde() {
        let home = Path::new("/home/alice");
        assert_eq!(expand_tilde("~", Some(home)), PathBuf::from("/home/alice"));
        assert_eq!(expand_tilde("~/docs", Some(home)), PathBuf::from("/home/alice/docs"));
        assert_eq!(expand_tilde("/var/notes", Some(home)), PathBuf::from("/var/notes"));
        assert_eq!(expand_tilde("~bob", Some(home)), PathBuf::from("~bob"));
        assert_eq!(expand_tilde("~", None), PathBuf::from("~"));
    }

    #[test]
    fn test_settings_are_sorted_and_skip_unset() {
        let config = Config::from_yaml("run_mode: test\npager: less -R\n").unwrap();
        let settings = config.settings().unwrap();
        let keys: Vec<&str> = settings.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "pager",
                "repository_base",
                "repository_name",
                "repository_type",
                "run_mode"
            ]
        );
        assert_eq!(settings["repository_name"], "notes_test");
        assert_eq!(settings["repository_type"], "file_system");
        assert_eq!(settings["pager"], "less -R");
    }

    #[test]
    fn test_find_program() {
        let exe = std::env::current_exe().unwrap().display().to_string();
        let candidates = vec![
            "/definitely/not/here/editor".to_string(),
            "no-such-program-tnotes".to_string(),
            exe.clone(),
        ];
        assert_eq!(find_program(&candidates), Some(exe));
        assert_eq!(find_program(&["no-such-program-tnotes".to_string()]), None);
        assert_eq!(find_program(&[]), None);
    }

    #[test]
    fn test_editor_candidates_start_with_configured() {
        let config = Config {
            editor: Some("my-editor --wait".to_string()),
            ..Default::default()
        };
        let candidates = config.editor_candidates();
        assert_eq!(candidates.first().map(String::as_str), Some("my-editor --wait"));
        assert_eq!(
            &candidates[candidates.len() - 2..],
            &["nano".to_string(), "vi".to_string()]
        );
    }
}
