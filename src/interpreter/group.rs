//! Interpreters known to the host, with the properties each one reads.

use std::sync::Arc;

use super::Interpreter;
use crate::{
    config::{
        Config, DEFAULT_JDBC_DRIVER_NAME, DEFAULT_JDBC_URL, DEFAULT_JDBC_USER_NAME,
        DEFAULT_JDBC_USER_PASSWORD, DEFAULT_MAX_RESULT, DEFAULT_SPRINGXD_TIMEOUT,
        DEFAULT_SPRINGXD_URL, POSTGRESQL_SERVER_DRIVER_NAME, POSTGRESQL_SERVER_MAX_RESULT,
        POSTGRESQL_SERVER_PASSWORD, POSTGRESQL_SERVER_URL, POSTGRESQL_SERVER_USER,
        SPRINGXD_TIMEOUT, SPRINGXD_URL,
    },
    postgresql::PostgreSqlInterpreter,
    springxd::SpringXdInterpreter,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterProperty {
    pub key: &'static str,
    pub default: &'static str,
    pub description: &'static str,
}

pub struct RegisteredInterpreter {
    pub group: &'static str,
    pub name: &'static str,
    pub properties: Vec<InterpreterProperty>,
    factory: fn(&Config) -> Arc<dyn Interpreter>,
}

impl RegisteredInterpreter {
    pub fn create(&self, cfg: &Config) -> Arc<dyn Interpreter> {
        (self.factory)(cfg)
    }
}

pub struct InterpreterGroup {
    entries: Vec<RegisteredInterpreter>,
}

impl InterpreterGroup {
    pub fn builtin() -> Self {
        let xd_properties = || {
            vec![
                InterpreterProperty {
                    key: SPRINGXD_URL,
                    default: DEFAULT_SPRINGXD_URL,
                    description: "The URL for SpringXD REST API.",
                },
                InterpreterProperty {
                    key: SPRINGXD_TIMEOUT,
                    default: DEFAULT_SPRINGXD_TIMEOUT,
                    description: "SpringXD REST request timeout in seconds.",
                },
            ]
        };

        let entries = vec![
            RegisteredInterpreter {
                group: "psql",
                name: "sql",
                properties: vec![
                    InterpreterProperty {
                        key: POSTGRESQL_SERVER_URL,
                        default: DEFAULT_JDBC_URL,
                        description: "The URL for PostgreSQL.",
                    },
                    InterpreterProperty {
                        key: POSTGRESQL_SERVER_USER,
                        default: DEFAULT_JDBC_USER_NAME,
                        description: "The PostgreSQL user name.",
                    },
                    InterpreterProperty {
                        key: POSTGRESQL_SERVER_PASSWORD,
                        default: DEFAULT_JDBC_USER_PASSWORD,
                        description: "The PostgreSQL user password.",
                    },
                    InterpreterProperty {
                        key: POSTGRESQL_SERVER_DRIVER_NAME,
                        default: DEFAULT_JDBC_DRIVER_NAME,
                        description: "JDBC driver name.",
                    },
                    InterpreterProperty {
                        key: POSTGRESQL_SERVER_MAX_RESULT,
                        default: DEFAULT_MAX_RESULT,
                        description: "Max number of SQL results to display.",
                    },
                ],
                factory: create_psql,
            },
            RegisteredInterpreter {
                group: "xd",
                name: "stream",
                properties: xd_properties(),
                factory: create_xd_stream,
            },
            RegisteredInterpreter {
                group: "xd",
                name: "job",
                properties: xd_properties(),
                factory: create_xd_job,
            },
        ];
        Self { entries }
    }

    pub fn entries(&self) -> &[RegisteredInterpreter] {
        &self.entries
    }

    pub fn find(&self, group: &str, name: &str) -> Option<&RegisteredInterpreter> {
        self.entries.iter().find(|e| e.group == group && e.name == name)
    }

    /// Looks up by `group.name` or, when unambiguous, by bare name.
    pub fn resolve(&self, id: &str) -> Option<&RegisteredInterpreter> {
        if let Some((group, name)) = id.split_once('.') {
            return self.find(group, name);
        }
        let mut matches = self.entries.iter().filter(|e| e.name == id || e.group == id);
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }
}

fn create_psql(cfg: &Config) -> Arc<dyn Interpreter> {
    Arc::new(PostgreSqlInterpreter::new(cfg))
}

fn create_xd_stream(cfg: &Config) -> Arc<dyn Interpreter> {
    Arc::new(SpringXdInterpreter::stream(cfg))
}

fn create_xd_job(cfg: &Config) -> Arc<dyn Interpreter> {
    Arc::new(SpringXdInterpreter::job(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let group = InterpreterGroup::builtin();
        let ids: Vec<String> = group
            .entries()
            .iter()
            .map(|e| format!("{}.{}", e.group, e.name))
            .collect();
        assert_eq!(ids, vec!["psql.sql", "xd.stream", "xd.job"]);
    }

    #[test]
    fn test_resolve() {
        let group = InterpreterGroup::builtin();
        assert_eq!(group.resolve("xd.job").map(|e| e.name), Some("job"));
        assert_eq!(group.resolve("stream").map(|e| e.name), Some("stream"));
        assert_eq!(group.resolve("psql").map(|e| e.name), Some("sql"));
        // two interpreters in the xd group
        assert!(group.resolve("xd").is_none());
        assert!(group.resolve("hive").is_none());
    }

    #[test]
    fn test_property_defaults_match_config() {
        let group = InterpreterGroup::builtin();
        let cfg = Config::from_pairs(Vec::<(String, String)>::new());
        for entry in group.entries() {
            for p in &entry.properties {
                assert_eq!(cfg.get(p.key).as_deref(), Some(p.default), "{}", p.key);
            }
        }
    }

    #[test]
    fn test_create_builds_interpreter() {
        let group = InterpreterGroup::builtin();
        let cfg = Config::from_pairs(Vec::<(String, String)>::new());
        let psql = group.find("psql", "sql").unwrap().create(&cfg);
        assert_eq!(psql.form_type(), crate::interpreter::FormType::Native);
    }
}
