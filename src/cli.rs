use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "zint", about = "Run notebook paragraphs against PostgreSQL or SpringXD", version)]
pub struct Cli {
    /// Properties file to read instead of the default `.zintrc`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override a property, e.g. `--set springxd.url=http://xd:9393`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", action = clap::ArgAction::Append, global = true)]
    pub set: Vec<String>,

    /// Notebook id the paragraph belongs to.
    #[arg(long, default_value = "note_1", global = true)]
    pub note: String,

    /// Paragraph id used to track deployed resources.
    #[arg(long, default_value = "paragraph_1", global = true)]
    pub paragraph: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run one paragraph and print the result. Reads stdin when TEXT is omitted.
    ///
    /// The interpreter is closed on exit, and closing a SpringXD interpreter destroys
    /// every stream or job it deployed. Use `repl` to keep `xd.stream`/`xd.job`
    /// deployments running.
    Exec {
        /// Interpreter id: `psql.sql`, `xd.stream`, `xd.job` (or just `sql`, `stream`, `job`).
        interpreter: String,
        text: Option<String>,
    },

    /// Ask an interpreter for completions at a cursor position.
    Complete {
        interpreter: String,
        buffer: String,
        /// Cursor offset in characters; defaults to the end of the buffer.
        #[arg(long)]
        cursor: Option<usize>,
    },

    /// Keep an interpreter open and run paragraphs read from stdin.
    ///
    /// A blank line submits the paragraph typed so far. Commands:
    /// `:paragraph <id>`, `:note <id>`, `:status <DEPLOYED|DESTROYED>`, `:destroy`,
    /// `:complete <text>`, `:quit`.
    /// Ctrl-C cancels the running paragraph.
    Repl { interpreter: String },

    /// List the interpreters and the properties they read.
    List,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// `--set` pairs; entries without `=` are ignored.
    pub fn overrides(&self) -> Vec<(String, String)> {
        self.set
            .iter()
            .filter_map(|kv| kv.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_exec_help_points_xd_users_at_repl() {
        let mut cmd = Cli::command();
        let exec = cmd.find_subcommand_mut("exec").unwrap();
        let help = exec.render_long_help().to_string();
        assert!(help.contains("destroys"));
        assert!(help.contains("Use `repl`"));
    }

    #[test]
    fn test_overrides_skip_malformed_pairs() {
        let cli = Cli::try_parse_from([
            "zint",
            "--set",
            "springxd.url = http://xd:9393",
            "--set",
            "garbage",
            "list",
        ])
        .unwrap();
        assert_eq!(
            cli.overrides(),
            vec![("springxd.url".to_string(), "http://xd:9393".to_string())]
        );
    }
}
