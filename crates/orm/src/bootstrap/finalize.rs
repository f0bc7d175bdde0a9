//! Deferred statement rewriting applied after the host is ready.

use crate::session::{MappedStatement, SessionConfiguration};
use std::collections::BTreeMap;
use std::fmt;

/// Rewrites statement SQL once the full mapper set is known
pub trait StatementRewriter: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// New SQL for `statement`, or `None` to leave it unchanged
    fn rewrite(&self, statement: &MappedStatement, configuration: &SessionConfiguration) -> Option<String>;
}

const SQL_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "from", "where", "and", "or", "not", "into",
    "values", "set", "join", "left", "right", "inner", "outer", "on", "as", "group", "by",
    "order", "having", "limit", "offset", "union", "all", "distinct", "in", "is", "null",
    "like", "between", "exists", "case", "when", "then", "else", "end", "asc", "desc",
];

/// Uppercases SQL keywords outside quoted literals
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordCaseRewriter;

impl KeywordCaseRewriter {
    pub fn uppercase_keywords(sql: &str) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut word = String::new();
        let mut quote: Option<char> = None;

        for c in sql.chars() {
            if let Some(q) = quote {
                out.push(c);
                if c == q {
                    quote = None;
                }
                continue;
            }
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                continue;
            }
            flush_word(&mut out, &mut word);
            if c == '\'' || c == '"' || c == '`' {
                quote = Some(c);
            }
            out.push(c);
        }
        flush_word(&mut out, &mut word);
        out
    }
}

fn flush_word(out: &mut String, word: &mut String) {
    if word.is_empty() {
        return;
    }
    if SQL_KEYWORDS.contains(&word.to_lowercase().as_str()) {
        out.push_str(&word.to_uppercase());
    } else {
        out.push_str(word);
    }
    word.clear();
}

impl StatementRewriter for KeywordCaseRewriter {
    fn name(&self) -> &str {
        "keyword-case"
    }

    fn rewrite(&self, statement: &MappedStatement, _configuration: &SessionConfiguration) -> Option<String> {
        let sql = Self::uppercase_keywords(&statement.sql);
        (sql != statement.sql).then_some(sql)
    }
}

/// Run every rewriter over every statement, in rewriter order
pub fn rewrite_statements(
    configuration: &SessionConfiguration,
    rewriters: &[&dyn StatementRewriter],
) -> BTreeMap<String, MappedStatement> {
    configuration
        .mapped_statements()
        .map(|statement| {
            let mut current = statement.clone();
            for rewriter in rewriters {
                if let Some(sql) = rewriter.rewrite(&current, configuration) {
                    tracing::trace!("{} rewrote '{}'", rewriter.name(), current.id);
                    current.sql = sql;
                }
            }
            (current.id.clone(), current)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_uppercased_outside_literals() {
        let sql = KeywordCaseRewriter::uppercase_keywords(
            "select name from users where note = 'select from' and id in (1, 2)",
        );
        assert_eq!(
            sql,
            "SELECT name FROM users WHERE note = 'select from' AND id IN (1, 2)"
        );
    }

    #[test]
    fn test_identifiers_containing_keywords_untouched() {
        let sql = KeywordCaseRewriter::uppercase_keywords("select order_id, fromage from orders");
        assert_eq!(sql, "SELECT order_id, fromage FROM orders");
    }

    #[test]
    fn test_rewrite_statements() {
        let mut configuration = SessionConfiguration::new();
        configuration
            .add_mapped_statement(MappedStatement::new("a", "select 1"))
            .unwrap();
        configuration
            .add_mapped_statement(MappedStatement::new("b", "SELECT 2"))
            .unwrap();

        let rewritten = rewrite_statements(&configuration, &[&KeywordCaseRewriter]);

        assert_eq!(rewritten["a"].sql, "SELECT 1");
        assert_eq!(rewritten["b"].sql, "SELECT 2");
        assert_eq!(KeywordCaseRewriter.rewrite(&rewritten["b"], &configuration), None);
    }
}
