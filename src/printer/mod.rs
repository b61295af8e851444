//! Printers: interpreter results on the terminal (owo-colors).

use owo_colors::OwoColorize;
use zeppelin_interpreters::{InterpreterResult, ResultType};

pub struct ResultPrinter {
    pub color: bool,
}

impl ResultPrinter {
    pub fn print(&self, result: &InterpreterResult) {
        if !result.is_success() {
            if self.color {
                eprintln!("{} {}", "ERROR".red().bold(), result.message);
            } else {
                eprintln!("ERROR {}", result.message);
            }
            return;
        }

        match result.kind {
            ResultType::Table => {
                let mut lines = layout_table(&result.message).into_iter();
                if let Some(header) = lines.next() {
                    if self.color {
                        println!("{}", header.cyan().bold());
                    } else {
                        println!("{}", header);
                    }
                }
                for line in lines {
                    println!("{}", line);
                }
            }
            ResultType::Angular => {
                if self.color {
                    println!("{}", result.message.magenta());
                } else {
                    println!("{}", result.message);
                }
            }
            ResultType::Text => println!("{}", result.message.trim_end_matches('\n')),
        }
    }

    pub fn print_completions(&self, suggestions: Option<&[String]>) {
        match suggestions {
            None => {
                if self.color {
                    println!("{}", "(no completions)".yellow());
                } else {
                    println!("(no completions)");
                }
            }
            Some(list) => {
                for s in list {
                    println!("{}", s);
                }
            }
        }
    }
}

/// Pads a tab separated table body into aligned columns.
fn layout_table(body: &str) -> Vec<String> {
    let rows: Vec<Vec<&str>> = body
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l.split('\t').collect())
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    rows.iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(i, cell)| {
                    let pad = widths[i] - cell.chars().count();
                    format!("{}{}", cell, " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_table_aligns_columns() {
        let lines = layout_table("id\tname\n1\talice\n22\tbo\n");
        assert_eq!(lines, vec!["id  name", "1   alice", "22  bo"]);
    }

    #[test]
    fn test_layout_empty_table() {
        assert!(layout_table("").is_empty());
    }
}
