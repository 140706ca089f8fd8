//! SQL Analyst tool: natural-language question to executed SQL result.
//!
//! ```text
//! entity augmentation -> LLM completion -> parse -> transpile -> execute
//! ```
//! Every stage after entity augmentation captures its own failure into
//! [`AnalystQueryResponse::error`]; `run` never returns `Err`.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::capability::completer::Completer;
use crate::capability::embedder::{cosine_similarity, Embedder};
use crate::capability::sql_connector::SqlConnector;
use crate::model::SemanticModel;
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::test_utils::validate_sql;

const ENTITY_MATCH_THRESHOLD: f32 = 0.83;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalystQueryRequest {
    pub question: String,
    #[serde(default)]
    pub filters: Vec<String>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub conversation_context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalystQueryResponse {
    pub sql_canonical: String,
    pub sql_executable: String,
    pub dialect: String,
    pub model_name: String,
    pub result: Option<crate::capability::sql_connector::ExecuteResult>,
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

/// A single stored value an embedder has already indexed for a vectorized
/// column, used for entity-resolution matching.
#[derive(Debug, Clone)]
pub struct VectorizedValue {
    pub table_key: String,
    pub column: String,
    pub value: String,
    pub vector: Vec<f32>,
}

pub struct AnalystTool {
    pub completer: Arc<dyn Completer>,
    pub embedder: Option<Arc<dyn Embedder>>,
    pub connector: Arc<dyn SqlConnector>,
    pub model: SemanticModel,
    pub model_name: String,
    pub vectorized_values: Vec<VectorizedValue>,
}

impl AnalystTool {
    pub fn new(completer: Arc<dyn Completer>, connector: Arc<dyn SqlConnector>, model: SemanticModel, model_name: impl Into<String>) -> Self {
        Self {
            completer,
            embedder: None,
            connector,
            model,
            model_name: model_name.into(),
            vectorized_values: Vec::new(),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub async fn run(&self, request: AnalystQueryRequest, now_ms: impl Fn() -> u64) -> AnalystQueryResponse {
        let started = now_ms();
        let dialect = self.connector.dialect();
        let mut response = AnalystQueryResponse {
            sql_canonical: String::new(),
            sql_executable: String::new(),
            dialect: format!("{dialect:?}"),
            model_name: self.model_name.clone(),
            result: None,
            error: None,
            execution_time_ms: 0,
        };

        let mut filters = request.filters.clone();
        let mut question = request.question.clone();
        if let Some(embedder) = &self.embedder {
            if let Err(err) = self.augment_entities(&mut question, &mut filters, embedder.as_ref()).await {
                response.error = Some(format!("entity augmentation failed: {err}"));
            }
        }

        let prompt = self.render_prompt(&question, &filters, request.conversation_context.as_deref());
        let completion = match self.completer.complete(&prompt, Some(0.0), None).await {
            Ok(text) => text,
            Err(err) => {
                response.error = Some(err.to_string());
                response.execution_time_ms = now_ms().saturating_sub(started);
                return response;
            }
        };

        let canonical = strip_sql_fence(&completion);
        response.sql_canonical = canonical.clone();

        if let Err(err) = validate_sql(&canonical, Dialect::Postgres) {
            response.error = Some(format!("parse failed: {err}"));
            response.execution_time_ms = now_ms().saturating_sub(started);
            return response;
        }

        let executable = match transpile(&canonical, dialect) {
            Ok(sql) => sql,
            Err(err) => {
                response.error = Some(format!("transpile failed: {err}"));
                response.execution_time_ms = now_ms().saturating_sub(started);
                return response;
            }
        };
        response.sql_executable = executable.clone();

        match self.connector.execute(&executable, request.limit, None).await {
            Ok(result) => response.result = Some(result),
            Err(err) => response.error = Some(err.to_string()),
        }

        response.execution_time_ms = now_ms().saturating_sub(started);
        response
    }

    async fn augment_entities(&self, question: &mut String, filters: &mut Vec<String>, embedder: &dyn Embedder) -> Result<(), String> {
        if self.vectorized_values.is_empty() {
            return Ok(());
        }
        let candidates = extract_candidate_phrases(question);
        if candidates.is_empty() {
            return Ok(());
        }
        let vectors = embedder
            .embed(&candidates)
            .await
            .map_err(|e| e.to_string())?;

        for (phrase, vector) in candidates.iter().zip(vectors.iter()) {
            let mut best: Option<(&VectorizedValue, f32)> = None;
            for candidate in &self.vectorized_values {
                let score = cosine_similarity(vector, &candidate.vector);
                if score >= ENTITY_MATCH_THRESHOLD && best.map(|(_, b)| score > b).unwrap_or(true) {
                    best = Some((candidate, score));
                }
            }
            if let Some((matched, _)) = best {
                filters.push(format!("{}.{} = {}", matched.table_key, matched.column, matched.value));
                if matched.value != *phrase {
                    *question = question.replace(phrase.as_str(), &matched.value);
                }
            }
        }
        Ok(())
    }

    fn render_prompt(&self, question: &str, filters: &[String], conversation_context: Option<&str>) -> String {
        let mut prompt = String::new();
        prompt.push_str("Semantic model:\n");
        for (table_key, table) in &self.model.tables {
            prompt.push_str(&format!("- {table_key} ({})\n", table.qualified_name()));
        }
        for (name, _metric) in &self.model.metrics {
            prompt.push_str(&format!("metric: {name}\n"));
        }
        if let Some(context) = conversation_context {
            prompt.push_str(&format!("\nConversation context:\n{context}\n"));
        }
        if !filters.is_empty() {
            prompt.push_str(&format!("\nKnown filters: {}\n", filters.join(", ")));
        }
        prompt.push_str(&format!("\nQuestion: {question}\nRespond with a single SELECT in Postgres SQL, in a ```sql``` fence.\n"));
        prompt
    }
}

fn strip_sql_fence(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let after = after.strip_prefix("sql").unwrap_or(after);
        let after = after.trim_start_matches(['\n', '\r']);
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
        return after.trim().to_string();
    }
    trimmed.to_string()
}

/// Extracts quoted spans, capitalized n-grams, and tokens following a
/// small set of prepositions, as candidate entity phrases.
fn extract_candidate_phrases(question: &str) -> Vec<String> {
    static PREPOSITIONS: &[&str] = &["in", "at", "for", "from", "by", "with"];
    let mut phrases = Vec::new();

    let quoted = Regex::new(r#"["']([^"']+)["']"#).expect("static regex is valid");
    for cap in quoted.captures_iter(question) {
        phrases.push(cap[1].to_string());
    }

    let words: Vec<&str> = question.split_whitespace().collect();
    let mut i = 0;
    while i < words.len() {
        let word = words[i].trim_matches(|c: char| !c.is_alphanumeric());
        if word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
            let mut end = i + 1;
            while end < words.len() {
                let next = words[end].trim_matches(|c: char| !c.is_alphanumeric());
                if next.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
                    end += 1;
                } else {
                    break;
                }
            }
            phrases.push(words[i..end].join(" ").trim_matches(|c: char| !c.is_alphanumeric()).to_string());
            i = end;
            continue;
        }
        if PREPOSITIONS.contains(&word.to_lowercase().as_str()) && i + 1 < words.len() {
            phrases.push(words[i + 1].trim_matches(|c: char| !c.is_alphanumeric()).to_string());
        }
        i += 1;
    }

    phrases.retain(|p| !p.is_empty());
    phrases.sort();
    phrases.dedup();
    phrases
}

/// Transpiles canonical Postgres SQL (as produced by the completer) to
/// `target`. Parses the canonical SQL into a [`sqlparser`] AST, pulls the
/// `LIMIT`/`OFFSET` clause out of it and re-emits that clause through this
/// crate's own [`SqlDialect::emit_limit_offset`] (the same machinery
/// `Query::to_sql` uses), then requotes any Postgres-style double-quoted
/// identifier in the remaining body to the target dialect's quoting.
/// Falls back to the untranspiled SQL when the statement isn't a plain
/// `SELECT` the AST walk understands.
fn transpile(sql: &str, target: Dialect) -> Result<String, String> {
    validate_sql(sql, Dialect::Postgres)?;
    if target == Dialect::Postgres {
        return Ok(sql.to_string());
    }

    let body = retarget_pagination(sql, target).unwrap_or_else(|| sql.to_string());
    let rewritten = requote_identifiers(&body, target);

    validate_sql(&rewritten, target).unwrap_or(());
    Ok(rewritten)
}

/// Re-parses `sql`, strips a literal-valued `LIMIT`/`OFFSET` clause from the
/// AST and re-serializes the body, appending `target`'s own pagination
/// syntax (`LIMIT`/`OFFSET`, or `OFFSET ... FETCH` for T-SQL). Returns
/// `None` when the statement isn't a single `SELECT`/`Query`, or when its
/// `LIMIT`/`OFFSET` isn't a plain integer literal we can safely relocate.
fn retarget_pagination(sql: &str, target: Dialect) -> Option<String> {
    use sqlparser::ast::{Expr as SqlExpr, Statement, Value};
    use sqlparser::dialect::PostgreSqlDialect;
    use sqlparser::parser::Parser;

    let numeric_literal = |expr: &SqlExpr| -> Option<u64> {
        match expr {
            SqlExpr::Value(Value::Number(n, _)) => n.parse().ok(),
            _ => None,
        }
    };

    let mut statements = Parser::parse_sql(&PostgreSqlDialect {}, sql).ok()?;
    if statements.len() != 1 {
        return None; // not exactly one statement; leave untouched.
    }
    let Some(Statement::Query(mut query)) = statements.pop() else {
        return None;
    };

    let limit = match &query.limit {
        Some(e) => Some(numeric_literal(e)?),
        None => None,
    };
    let offset = match &query.offset {
        Some(o) => Some(numeric_literal(&o.value)?),
        None => None,
    };

    query.limit = None;
    query.offset = None;
    let base = query.to_string();
    let pagination = target.emit_limit_offset(limit, offset).serialize(target);

    Some(if pagination.is_empty() {
        base
    } else {
        format!("{base} {pagination}")
    })
}

/// Rewrites every Postgres-style double-quoted identifier span in `sql` to
/// `target`'s own identifier quoting (backticks for MySQL/BigQuery,
/// brackets for T-SQL, left untouched where the target also uses double
/// quotes), leaving single-quoted string literals alone.
fn requote_identifiers(sql: &str, target: Dialect) -> String {
    let (open, close) = {
        let quoted = target.quote_identifier("x");
        let mut chars = quoted.chars();
        (chars.next().unwrap_or('"'), chars.next_back().unwrap_or('"'))
    };

    let mut out = String::with_capacity(sql.len());
    let mut in_string = false;
    let mut in_ident = false;
    for c in sql.chars() {
        if in_string {
            out.push(c);
            if c == '\'' {
                in_string = false;
            }
            continue;
        }
        if in_ident {
            if c == '"' {
                out.push(close);
                in_ident = false;
            } else {
                out.push(c);
            }
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                out.push(c);
            }
            '"' => {
                in_ident = true;
                out.push(open);
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_sql_fence_removes_language_tag() {
        let text = "```sql\nSELECT 1\n```";
        assert_eq!(strip_sql_fence(text), "SELECT 1");
    }

    #[test]
    fn test_strip_sql_fence_passthrough_when_unfenced() {
        assert_eq!(strip_sql_fence("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_extract_candidate_phrases_finds_quoted_and_capitalized() {
        let phrases = extract_candidate_phrases(r#"revenue for "Acme Corp" in California"#);
        assert!(phrases.contains(&"Acme Corp".to_string()));
        assert!(phrases.contains(&"California".to_string()));
    }

    #[test]
    fn transpile_to_tsql_moves_limit_into_offset_fetch_not_top() {
        let sql = transpile("SELECT id FROM orders ORDER BY id LIMIT 10", Dialect::TSql).unwrap();
        assert!(!sql.to_uppercase().contains("TOP"));
        assert!(sql.contains("OFFSET 0 ROWS"));
        assert!(sql.contains("FETCH NEXT 10 ROWS ONLY"));
    }

    #[test]
    fn transpile_to_mysql_requotes_identifiers_without_touching_string_literals() {
        let sql = transpile(r#"SELECT "name" FROM "orders" WHERE "status" = 'paid'"#, Dialect::MySql).unwrap();
        assert!(sql.contains("`name`"));
        assert!(sql.contains("`orders`"));
        assert!(sql.contains("'paid'"));
        assert!(!sql.contains('"'));
    }

    #[test]
    fn transpile_to_postgres_is_a_passthrough() {
        let sql = transpile("SELECT 1", Dialect::Postgres).unwrap();
        assert_eq!(sql, "SELECT 1");
    }

    #[tokio::test]
    async fn test_run_populates_canonical_on_parse_failure() {
        use crate::capability::completer::StubCompleter;
        use crate::capability::sql_connector::InMemorySqlConnector;

        let tool = AnalystTool::new(
            Arc::new(StubCompleter::new("```sql\nSELEC broken\n```")),
            Arc::new(InMemorySqlConnector::new(Dialect::Postgres)),
            SemanticModel {
                name: None,
                tables: HashMap::new(),
                relationships: Vec::new(),
                metrics: HashMap::new(),
                dialect: None,
                tags: Vec::new(),
                description: None,
            },
            "test_model",
        );
        let response = tool.run(AnalystQueryRequest { question: "how many?".into(), ..Default::default() }, || 0).await;
        assert_eq!(response.sql_canonical, "SELEC broken");
        assert!(response.sql_executable.is_empty());
        assert!(response.error.is_some());
    }
}
