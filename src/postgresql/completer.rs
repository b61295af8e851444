//! SQL keyword suggestions for the word under the cursor.

const KEYWORDS: &[&str] = &[
    "ALTER", "ANALYZE", "AND", "AS", "ASC", "BEGIN", "BETWEEN", "BY", "CASE", "CAST", "COMMIT",
    "COUNT", "CREATE", "CROSS", "DATABASE", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END",
    "EXISTS", "EXPLAIN", "FALSE", "FROM", "FULL", "FUNCTION", "GRANT", "GROUP", "HAVING", "ILIKE",
    "IN", "INDEX", "INNER", "INSERT", "INTO", "IS", "JOIN", "LEFT", "LIKE", "LIMIT", "NOT", "NULL",
    "OFFSET", "ON", "OR", "ORDER", "OUTER", "OVER", "PARTITION", "PRIMARY", "REFERENCES",
    "RETURNING", "REVOKE", "RIGHT", "ROLLBACK", "SCHEMA", "SELECT", "SET", "TABLE", "THEN", "TRUE",
    "TRUNCATE", "UNION", "UPDATE", "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WITH",
];

/// Keywords starting with the last word of `prefix`, in the word's case.
pub fn complete(prefix: &str) -> Vec<String> {
    let word = prefix
        .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("");
    if word.is_empty() {
        return Vec::new();
    }

    let upper = word.to_ascii_uppercase();
    let lower_case = word.chars().all(|c| !c.is_uppercase());
    KEYWORDS
        .iter()
        .filter(|k| k.starts_with(&upper))
        .map(|k| if lower_case { k.to_ascii_lowercase() } else { (*k).to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_last_word() {
        assert_eq!(complete("select * fr"), vec!["from"]);
        assert_eq!(complete("SELECT * FROM t WHE"), vec!["WHEN", "WHERE"]);
    }

    #[test]
    fn test_trailing_space_gives_nothing() {
        assert!(complete("select ").is_empty());
        assert!(complete("").is_empty());
    }

    #[test]
    fn test_multiple_matches_keep_order() {
        assert_eq!(complete("gr"), vec!["grant", "group"]);
    }
}
