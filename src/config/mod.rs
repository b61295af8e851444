//! Interpreter properties: built-in defaults, `.zintrc` file, environment overlay.

use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;

pub const POSTGRESQL_SERVER_URL: &str = "postgresql.url";
pub const POSTGRESQL_SERVER_USER: &str = "postgresql.user";
pub const POSTGRESQL_SERVER_PASSWORD: &str = "postgresql.password";
pub const POSTGRESQL_SERVER_DRIVER_NAME: &str = "postgresql.driver.name";
pub const POSTGRESQL_SERVER_MAX_RESULT: &str = "postgresql.max.result";

pub const DEFAULT_JDBC_URL: &str = "postgres://localhost:5432/";
pub const DEFAULT_JDBC_USER_NAME: &str = "gpadmin";
pub const DEFAULT_JDBC_USER_PASSWORD: &str = "";
pub const DEFAULT_JDBC_DRIVER_NAME: &str = "org.postgresql.Driver";
pub const DEFAULT_MAX_RESULT: &str = "1000";

pub const SPRINGXD_URL: &str = "springxd.url";
pub const SPRINGXD_TIMEOUT: &str = "springxd.timeout";

pub const DEFAULT_SPRINGXD_URL: &str = "http://localhost:9393";
pub const DEFAULT_SPRINGXD_TIMEOUT: &str = "60";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let mut map = default_map();

        if path.exists() {
            if let Ok(file) = fs::File::open(path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        // Environment takes precedence over the rc file
        for key in known_keys() {
            if let Ok(v) = env::var(env_key(key)) {
                map.insert((*key).to_string(), v);
            }
        }

        Self { inner: map, config_path: path.to_path_buf() }
    }

    /// Defaults overlaid with the given pairs. Does not read the filesystem or the environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        for (k, v) in pairs {
            map.insert(k.into(), v.into());
        }
        Self { inner: map, config_path: PathBuf::new() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }
}

/// `postgresql.url` -> `POSTGRESQL_URL`
pub fn env_key(key: &str) -> String {
    key.replace('.', "_").to_ascii_uppercase()
}

fn known_keys() -> &'static [&'static str] {
    &[
        POSTGRESQL_SERVER_URL,
        POSTGRESQL_SERVER_USER,
        POSTGRESQL_SERVER_PASSWORD,
        POSTGRESQL_SERVER_DRIVER_NAME,
        POSTGRESQL_SERVER_MAX_RESULT,
        SPRINGXD_URL,
        SPRINGXD_TIMEOUT,
    ]
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("zeppelin_interpreters").join(".zintrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert(POSTGRESQL_SERVER_URL.into(), DEFAULT_JDBC_URL.into());
    m.insert(POSTGRESQL_SERVER_USER.into(), DEFAULT_JDBC_USER_NAME.into());
    m.insert(POSTGRESQL_SERVER_PASSWORD.into(), DEFAULT_JDBC_USER_PASSWORD.into());
    m.insert(POSTGRESQL_SERVER_DRIVER_NAME.into(), DEFAULT_JDBC_DRIVER_NAME.into());
    m.insert(POSTGRESQL_SERVER_MAX_RESULT.into(), DEFAULT_MAX_RESULT.into());

    m.insert(SPRINGXD_URL.into(), DEFAULT_SPRINGXD_URL.into());
    m.insert(SPRINGXD_TIMEOUT.into(), DEFAULT_SPRINGXD_TIMEOUT.into());

    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_properties() {
        let cfg = Config::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(cfg.get(POSTGRESQL_SERVER_DRIVER_NAME).as_deref(), Some(DEFAULT_JDBC_DRIVER_NAME));
        assert_eq!(cfg.get(POSTGRESQL_SERVER_URL).as_deref(), Some(DEFAULT_JDBC_URL));
        assert_eq!(cfg.get(POSTGRESQL_SERVER_USER).as_deref(), Some(DEFAULT_JDBC_USER_NAME));
        assert_eq!(cfg.get(POSTGRESQL_SERVER_PASSWORD).as_deref(), Some(DEFAULT_JDBC_USER_PASSWORD));
        assert_eq!(cfg.get(SPRINGXD_URL).as_deref(), Some(DEFAULT_SPRINGXD_URL));
        assert_eq!(cfg.get_usize(POSTGRESQL_SERVER_MAX_RESULT), Some(1000));
    }

    #[test]
    fn test_pairs_override_defaults() {
        let cfg = Config::from_pairs([(SPRINGXD_URL, "http://xd:9393")]);
        assert_eq!(cfg.get(SPRINGXD_URL).as_deref(), Some("http://xd:9393"));
        assert_eq!(cfg.get_u64(SPRINGXD_TIMEOUT), Some(60));
    }

    #[test]
    fn test_rc_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".zintrc");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "# comment").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "postgresql.user = analyst").unwrap();
        drop(f);

        let cfg = Config::load_from(&path);
        if env::var(env_key(POSTGRESQL_SERVER_USER)).is_err() {
            assert_eq!(cfg.get(POSTGRESQL_SERVER_USER).as_deref(), Some("analyst"));
        }
        assert_eq!(cfg.config_path, path);
    }

    #[test]
    fn test_env_key() {
        assert_eq!(env_key("postgresql.max.result"), "POSTGRESQL_MAX_RESULT");
        assert_eq!(env_key("springxd.url"), "SPRINGXD_URL");
    }
}
