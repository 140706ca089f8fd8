//! Compiles a [`SemanticQuery`] against a [`SemanticModel`] into a SQL
//! string for a target [`Dialect`].
//!
//! The pipeline: resolve every referenced member, pick a base table,
//! plan the joins needed to reach every other required table, assign
//! aliases `t0, t1, ...` in join order, then assemble SELECT / FROM /
//! WHERE / GROUP BY / HAVING / ORDER BY / LIMIT.

use std::collections::HashMap;

use crate::model::{Aggregation, DataType, SemanticModel};
use crate::query::{DateRange, DateRangeOp, FilterItem, FilterOperator, SemanticQuery, TimeDimension};
use crate::semantic::{GraphError, JoinGraph, ResolvedMember, Resolver, ResolverError};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::query::{Query, SelectExpr, TableRef};
use crate::sql::token::TokenStream;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("query requests no measures, dimensions, time dimensions, filters, or segments")]
    Empty,

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("date_range on {member:?} is not a recognized preset, operator, or absolute range")]
    BadDateRange { member: String },

    #[error("order by references unknown member: {0}")]
    UnknownOrderMember(String),
}

/// Compile `query` against `model`, producing SQL text for `dialect`.
pub fn compile(
    model: &SemanticModel,
    query: &SemanticQuery,
    dialect: Dialect,
) -> Result<String, TranslateError> {
    if query.measures.is_empty()
        && query.dimensions.is_empty()
        && query.time_dimensions.is_empty()
        && query.filters.is_empty()
        && query.segments.is_empty()
    {
        return Err(TranslateError::Empty);
    }

    let resolver = Resolver::new(model);

    let base = select_base_table(model, &resolver, query)?;
    let required = required_tables(model, &resolver, query, base)?;

    let graph = JoinGraph::new(model);
    let plan = graph.plan(base, &required)?;

    let mut aliases: HashMap<&str, String> = HashMap::new();
    aliases.insert(base, "t0".to_string());
    for (i, step) in plan.iter().enumerate() {
        aliases.insert(step.table_key, format!("t{}", i + 1));
    }

    let base_table = &model.tables[base];
    let mut q = Query::new().from(table_ref(base_table, &aliases[base]));

    for step in &plan {
        let t = &model.tables[step.table_key];
        let on_sql = rewrite_qualified_refs(&step.relationship.join_on, &aliases, dialect);
        let join_type = step.relationship.relationship_type.join_kind();
        q = q.join(
            join_type,
            table_ref(t, &aliases[step.table_key]),
            crate::sql::expr::raw_sql(&on_sql),
        );
    }

    let mut select_exprs: Vec<SelectExpr> = Vec::new();
    let mut group_by_exprs: Vec<String> = Vec::new();
    // output alias -> underlying SQL expression, for ORDER BY-by-alias resolution.
    let mut output_members: HashMap<String, String> = HashMap::new();

    for member in &query.dimensions {
        let resolved = resolver.resolve_dimension(member)?;
        if let ResolvedMember::Dimension { table_key, dimension } = resolved {
            let alias = &aliases[table_key];
            let sql = qualify_member_expr_cross(dimension.expression.as_deref(), dimension.sql_expression(), alias, &aliases, dialect);
            let out_alias = output_alias(&model.tables[table_key].name, &dimension.name);
            select_exprs.push(raw_select(&sql, &out_alias));
            group_by_exprs.push(sql.clone());
            output_members.insert(out_alias, sql);
        }
    }

    for td in &query.time_dimensions {
        let resolved = resolver.resolve_dimension(&td.dimension)?;
        if let ResolvedMember::Dimension { table_key, dimension } = resolved {
            let alias = &aliases[table_key];
            let base_sql = qualify_member_expr_cross(dimension.expression.as_deref(), dimension.sql_expression(), alias, &aliases, dialect);
            let granularity = td.granularity.unwrap_or(crate::model::Granularity::Day);
            let truncated = dialect
                .date_trunc(granularity.as_sql_unit(), raw_tokens(&base_sql))
                .serialize(dialect);
            let out_alias = format!(
                "{}_{}",
                output_alias(&model.tables[table_key].name, &dimension.name),
                granularity.as_sql_unit()
            );
            select_exprs.push(raw_select(&truncated, &out_alias));
            group_by_exprs.push(truncated.clone());
            output_members.insert(out_alias, truncated);
        }
    }

    for member in &query.measures {
        let resolved = resolver.resolve_measure_or_metric(member)?;
        match resolved {
            ResolvedMember::Measure { table_key, measure } => {
                let alias = &aliases[table_key];
                let inner = qualify_member_expr_cross(measure.expression.as_deref(), measure.sql_expression(), alias, &aliases, dialect);
                let sql = apply_aggregation(measure.aggregation, &inner);
                let out_alias = output_alias(&model.tables[table_key].name, &measure.name);
                select_exprs.push(raw_select(&sql, &out_alias));
                output_members.insert(out_alias, sql);
            }
            ResolvedMember::Metric { name, metric } => {
                let sql = rewrite_qualified_refs(&metric.expression, &aliases, dialect);
                select_exprs.push(raw_select(&sql, name));
                output_members.insert(name.to_string(), sql);
            }
            _ => unreachable!("resolve_measure_or_metric only returns Measure or Metric"),
        }
    }

    if select_exprs.is_empty() {
        // measures/dimensions both empty but filters/segments present: still
        // need a non-empty SELECT list.
        select_exprs.push(crate::sql::expr::star().into());
    }

    q = q.select(select_exprs);
    if !group_by_exprs.is_empty() && has_aggregation(query, &resolver)? {
        q = q.group_by(group_by_exprs.into_iter().map(|s| crate::sql::expr::raw_sql(&s)).collect());
    }

    let mut where_parts: Vec<String> = Vec::new();
    let mut having_parts: Vec<String> = Vec::new();

    for f in &query.filters {
        let resolved = resolver.resolve_any(&f.member)?;
        let predicate = compile_filter(f, &resolved, &aliases, dialect)?;
        match resolved {
            ResolvedMember::Measure { .. } | ResolvedMember::Metric { .. } => {
                having_parts.push(predicate)
            }
            _ => where_parts.push(predicate),
        }
    }

    for seg in &query.segments {
        let resolved = resolver.resolve_segment(seg)?;
        if let ResolvedMember::Segment { table_key, segment, .. } = resolved {
            let alias = &aliases[table_key];
            where_parts.push(qualify_member_expr_cross(Some(segment.condition.as_str()), &segment.condition, alias, &aliases, dialect));
        }
    }

    for td in &query.time_dimensions {
        if let Some(range) = &td.date_range {
            let resolved = resolver.resolve_dimension(&td.dimension)?;
            if let ResolvedMember::Dimension { table_key, dimension } = resolved {
                let alias = &aliases[table_key];
                let col_sql = qualify_member_expr_cross(dimension.expression.as_deref(), dimension.sql_expression(), alias, &aliases, dialect);
                let predicate = compile_date_range(&td.dimension, range, &col_sql, dimension.data_type, dialect)?;
                where_parts.push(predicate);
            }
        }
    }

    if !where_parts.is_empty() {
        let combined = where_parts.join(" AND ");
        q = q.filter(crate::sql::expr::raw_sql(&combined));
    }
    if !having_parts.is_empty() {
        let combined = having_parts.join(" AND ");
        q = q.having(crate::sql::expr::raw_sql(&combined));
    }

    let mut order_exprs = Vec::new();
    for o in &query.order {
        let sql = resolve_order_member(o, &output_members, model, &resolver, &aliases, dialect)?;
        let expr = crate::sql::expr::raw_sql(&sql);
        order_exprs.push(match o.direction {
            crate::query::OrderDirection::Asc => crate::sql::query::OrderByExpr::asc(expr),
            crate::query::OrderDirection::Desc => crate::sql::query::OrderByExpr::desc(expr),
        });
    }
    if !order_exprs.is_empty() {
        q = q.order_by(order_exprs);
    }

    let limit = query.limit.unwrap_or(i32::MAX as u32) as u64;
    q = q.limit(limit);
    q = q.offset(query.offset.unwrap_or(0) as u64);

    Ok(q.to_sql(dialect))
}

fn has_aggregation(query: &SemanticQuery, resolver: &Resolver) -> Result<bool, TranslateError> {
    for m in &query.measures {
        if let ResolvedMember::Measure { measure, .. } = resolver.resolve_measure_or_metric(m)? {
            if measure.aggregation != Aggregation::None {
                return Ok(true);
            }
        } else {
            // metrics compose aggregated measures.
            return Ok(true);
        }
    }
    Ok(false)
}

fn table_ref(table: &crate::model::Table, alias: &str) -> TableRef {
    let mut t = TableRef::new(&table.name);
    let schema = match (&table.catalog, &table.schema) {
        (Some(c), Some(s)) => Some(format!("{c}.{s}")),
        (Some(c), None) => Some(c.clone()),
        (None, Some(s)) => Some(s.clone()),
        (None, None) => None,
    };
    if let Some(schema) = schema {
        t = t.with_schema(&schema);
    }
    t.with_alias(alias)
}

fn raw_select(sql: &str, alias: &str) -> SelectExpr {
    SelectExpr::new(crate::sql::expr::raw_sql(sql)).with_alias(alias)
}

fn raw_tokens(sql: &str) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(crate::sql::token::Token::Raw(sql.to_string()));
    ts
}

fn apply_aggregation(agg: Aggregation, inner: &str) -> String {
    match agg.sql_function() {
        None => inner.to_string(),
        Some(func) if agg.is_distinct() => format!("{func}(DISTINCT {inner})"),
        Some(func) => format!("{func}({inner})"),
    }
}

/// Qualify a member's SQL expression with its table alias and the dialect's
/// identifier quoting: a bare column name (no `expression` override) is
/// prefixed and quoted directly; an explicit expression is assumed to
/// reference its own table's columns unqualified, except for
/// `<table_key>.<column>` cross-references, and is rewritten by
/// `qualify_and_quote_expr` so every column identifier ends up quoted the
/// same way `TableRef`/`SelectExpr` quote theirs.
fn qualify_member_expr_cross(
    expression: Option<&str>,
    fallback_bare: &str,
    alias: &str,
    aliases: &HashMap<&str, String>,
    dialect: Dialect,
) -> String {
    match expression {
        None => format!("{alias}.{}", dialect.quote_identifier(fallback_bare)),
        Some(expr) => qualify_and_quote_expr(expr, alias, aliases, dialect),
    }
}

fn output_alias(table_name: &str, member_name: &str) -> String {
    let norm = |s: &str| s.to_lowercase().replace(['.', ' '], "_");
    format!("{}__{}", norm(table_name), norm(member_name))
}

/// SQL keywords and common function-adjacent words that can appear bare in
/// a member expression without being a column reference. Deliberately not
/// exhaustive — just enough to keep `CASE ... END` and boolean connectives
/// from being mistaken for columns.
const SQL_RESERVED_WORDS: &[&str] = &[
    "case", "when", "then", "else", "end", "and", "or", "not", "null", "true", "false", "is",
    "in", "like", "between", "distinct", "over", "partition", "by", "asc", "desc", "interval",
    "as", "exists", "all", "any", "some", "cast", "extract", "current_date", "current_timestamp",
    "current_time",
];

/// Rewrite a member's raw SQL expression into its qualified, dialect-quoted
/// form: a `<table_key>.<column>` cross-reference becomes
/// `<other_alias>.<quoted column>`, and any other bare identifier that
/// isn't a reserved word or a function-call name is treated as one of this
/// expression's own table's columns and becomes `<alias>.<quoted column>`.
/// Content inside single-quoted string literals is copied verbatim. A
/// manual scan, not a regex or a real SQL parser: good enough to recognize
/// identifier and string-literal boundaries in the small expressions these
/// members carry.
fn qualify_and_quote_expr(expr: &str, alias: &str, aliases: &HashMap<&str, String>, dialect: Dialect) -> String {
    let bytes = expr.as_bytes();
    let mut out = String::with_capacity(expr.len());
    let mut i = 0;
    let is_ident = |c: u8| c.is_ascii_alphanumeric() || c == b'_';
    let mut in_string = false;

    while i < bytes.len() {
        let c = bytes[i];
        if in_string {
            out.push(c as char);
            if c == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    out.push('\'');
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == b'\'' {
            in_string = true;
            out.push(c as char);
            i += 1;
            continue;
        }
        if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && is_ident(bytes[i]) {
                i += 1;
            }
            let ident = &expr[start..i];

            // `<table_key>.<column>` cross-reference.
            if bytes.get(i) == Some(&b'.') {
                let dot = i;
                let mut j = i + 1;
                while j < bytes.len() && is_ident(bytes[j]) {
                    j += 1;
                }
                if j > dot + 1 {
                    if let Some(other_alias) = aliases.get(ident) {
                        out.push_str(other_alias);
                        out.push('.');
                        out.push_str(&dialect.quote_identifier(&expr[dot + 1..j]));
                        i = j;
                        continue;
                    }
                }
            }

            let mut k = i;
            while bytes.get(k) == Some(&b' ') {
                k += 1;
            }
            let is_call = bytes.get(k) == Some(&b'(');
            if is_call || SQL_RESERVED_WORDS.contains(&ident.to_ascii_lowercase().as_str()) {
                out.push_str(ident);
                continue;
            }

            out.push_str(alias);
            out.push('.');
            out.push_str(&dialect.quote_identifier(ident));
            continue;
        }
        out.push(c as char);
        i += 1;
    }
    out
}

/// Rewrite every `<table_key>.<column>` occurrence in `expr` to
/// `<alias>.<quoted column>`, leaving bare identifiers and any qualifier
/// not present in `aliases` untouched. Used for expressions that span more
/// than one table (metric expressions, relationship `join_on` clauses)
/// where there's no single owning alias to fall back bare identifiers to.
fn rewrite_qualified_refs(expr: &str, aliases: &HashMap<&str, String>, dialect: Dialect) -> String {
    let bytes = expr.as_bytes();
    let mut out = String::with_capacity(expr.len());
    let mut i = 0;
    let is_ident = |c: u8| c.is_ascii_alphanumeric() || c == b'_';

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && is_ident(bytes[i]) {
                i += 1;
            }
            let ident = &expr[start..i];
            if i < bytes.len() && bytes[i] == b'.' {
                let dot = i;
                let mut j = i + 1;
                while j < bytes.len() && is_ident(bytes[j]) {
                    j += 1;
                }
                if j > dot + 1 {
                    if let Some(alias) = aliases.get(ident) {
                        out.push_str(alias);
                        out.push('.');
                        out.push_str(&dialect.quote_identifier(&expr[dot + 1..j]));
                        i = j;
                        continue;
                    }
                }
            }
            out.push_str(ident);
            continue;
        }
        out.push(c as char);
        i += 1;
    }
    out
}

fn select_base_table<'a>(
    model: &'a SemanticModel,
    resolver: &Resolver<'a>,
    query: &SemanticQuery,
) -> Result<&'a str, TranslateError> {
    for m in &query.measures {
        if let Ok(ResolvedMember::Measure { table_key, .. }) = resolver.resolve_measure_or_metric(m) {
            return Ok(table_key);
        }
    }
    for m in &query.measures {
        if let Ok(ResolvedMember::Metric { metric, .. }) = resolver.resolve_measure_or_metric(m) {
            if let Some(table_key) = first_table_ref_in_expr(&metric.expression, model) {
                return Ok(table_key);
            }
        }
    }
    for td in &query.time_dimensions {
        if let Ok(ResolvedMember::Dimension { table_key, .. }) = resolver.resolve_dimension(&td.dimension) {
            return Ok(table_key);
        }
    }
    for d in &query.dimensions {
        if let Ok(ResolvedMember::Dimension { table_key, .. }) = resolver.resolve_dimension(d) {
            return Ok(table_key);
        }
    }
    for f in &query.filters {
        if let Ok(resolved) = resolver.resolve_any(&f.member) {
            if let Some(table_key) = resolved.table_key() {
                return Ok(table_key);
            }
        }
    }
    for s in &query.segments {
        if let Ok(ResolvedMember::Segment { table_key, .. }) = resolver.resolve_segment(s) {
            return Ok(table_key);
        }
    }
    // Force the ordinary errors to surface for whatever the caller asked for.
    if let Some(m) = query.measures.first() {
        resolver.resolve_measure_or_metric(m)?;
    }
    if let Some(d) = query.dimensions.first() {
        resolver.resolve_dimension(d)?;
    }
    Err(TranslateError::Empty)
}

fn first_table_ref_in_expr<'a>(expr: &str, model: &'a SemanticModel) -> Option<&'a str> {
    let bytes = expr.as_bytes();
    let is_ident = |c: u8| c.is_ascii_alphanumeric() || c == b'_';
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' {
            let start = i;
            while i < bytes.len() && is_ident(bytes[i]) {
                i += 1;
            }
            let ident = &expr[start..i];
            if i < bytes.len() && bytes[i] == b'.' {
                if let Some((key, _)) = model.tables.get_key_value(ident) {
                    return Some(key.as_str());
                }
            }
        } else {
            i += 1;
        }
    }
    None
}

fn required_tables<'a>(
    model: &'a SemanticModel,
    resolver: &Resolver<'a>,
    query: &SemanticQuery,
    base: &'a str,
) -> Result<Vec<&'a str>, TranslateError> {
    let mut required = Vec::new();
    let mut push = |t: &'a str| {
        if t != base && !required.contains(&t) {
            required.push(t);
        }
    };

    for member in query.all_member_refs() {
        if let Ok(resolved) = resolver.resolve_any(member) {
            if let Some(table_key) = resolved.table_key() {
                push(table_key);
            }
            if let ResolvedMember::Metric { metric, .. } = resolved {
                for t in all_table_refs_in_expr(&metric.expression, model) {
                    push(t);
                }
            }
        }
    }
    for m in &query.measures {
        if let Ok(ResolvedMember::Metric { metric, .. }) = resolver.resolve_measure_or_metric(m) {
            for t in all_table_refs_in_expr(&metric.expression, model) {
                push(t);
            }
        }
    }
    Ok(required)
}

fn all_table_refs_in_expr<'a>(expr: &str, model: &'a SemanticModel) -> Vec<&'a str> {
    let bytes = expr.as_bytes();
    let is_ident = |c: u8| c.is_ascii_alphanumeric() || c == b'_';
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_alphabetic() || bytes[i] == b'_' {
            let start = i;
            while i < bytes.len() && is_ident(bytes[i]) {
                i += 1;
            }
            let ident = &expr[start..i];
            if i < bytes.len() && bytes[i] == b'.' {
                if let Some((key, _)) = model.tables.get_key_value(ident) {
                    if !out.contains(&key.as_str()) {
                        out.push(key.as_str());
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    out
}

fn compile_filter(
    f: &FilterItem,
    resolved: &ResolvedMember,
    aliases: &HashMap<&str, String>,
    dialect: Dialect,
) -> Result<String, TranslateError> {
    let column = match resolved {
        ResolvedMember::Dimension { table_key, dimension } => {
            qualify_member_expr_cross(dimension.expression.as_deref(), dimension.sql_expression(), &aliases[table_key], aliases, dialect)
        }
        ResolvedMember::Measure { table_key, measure } => {
            let inner = qualify_member_expr_cross(measure.expression.as_deref(), measure.sql_expression(), &aliases[table_key], aliases, dialect);
            apply_aggregation(measure.aggregation, &inner)
        }
        ResolvedMember::Metric { metric, .. } => rewrite_qualified_refs(&metric.expression, aliases, dialect),
        ResolvedMember::Segment { table_key, segment, .. } => {
            qualify_member_expr_cross(Some(&segment.condition), &segment.condition, &aliases[table_key], aliases, dialect)
        }
    };

    let q = |v: &str| dialect.quote_string(v);
    let list = || f.values.iter().map(|v| q(v)).collect::<Vec<_>>().join(", ");

    Ok(match f.operator {
        FilterOperator::Equals if f.values.len() > 1 => format!("{column} IN ({})", list()),
        FilterOperator::Equals => format!("{column} = {}", q(&f.values[0])),
        FilterOperator::NotEquals if f.values.len() > 1 => format!("{column} NOT IN ({})", list()),
        FilterOperator::NotEquals => format!("{column} <> {}", q(&f.values[0])),
        FilterOperator::Contains => format!("{column} LIKE {}", q(&format!("%{}%", f.values[0]))),
        FilterOperator::NotContains => format!("{column} NOT LIKE {}", q(&format!("%{}%", f.values[0]))),
        FilterOperator::StartsWith => format!("{column} LIKE {}", q(&format!("{}%", f.values[0]))),
        FilterOperator::EndsWith => format!("{column} LIKE {}", q(&format!("%{}", f.values[0]))),
        FilterOperator::Gt => format!("{column} > {}", q(&f.values[0])),
        FilterOperator::Gte => format!("{column} >= {}", q(&f.values[0])),
        FilterOperator::Lt => format!("{column} < {}", q(&f.values[0])),
        FilterOperator::Lte => format!("{column} <= {}", q(&f.values[0])),
        FilterOperator::BeforeDate => format!("{column} < {}", q(&f.values[0])),
        FilterOperator::AfterDate => format!("{column} > {}", q(&f.values[0])),
        FilterOperator::InDateRange => format!("{column} >= {} AND {column} <= {}", q(&f.values[0]), q(&f.values[1])),
        FilterOperator::NotInDateRange => {
            format!("NOT ({column} >= {} AND {column} <= {})", q(&f.values[0]), q(&f.values[1]))
        }
        FilterOperator::Set => format!("{column} IS NOT NULL"),
        FilterOperator::NotSet => format!("{column} IS NULL"),
        FilterOperator::In => format!("{column} IN ({})", list()),
        FilterOperator::NotIn => format!("{column} NOT IN ({})", list()),
    })
}

fn compile_date_range(
    member: &str,
    range: &DateRange,
    col_sql: &str,
    data_type: DataType,
    dialect: Dialect,
) -> Result<String, TranslateError> {
    let col = raw_tokens(col_sql);
    match range {
        DateRange::Absolute { start, end } => {
            if data_type == DataType::Date {
                let widened = dialect.date_add(raw_tokens(end), 1, "day").serialize(dialect);
                Ok(format!(
                    "{col_sql} >= {} AND {col_sql} < {widened}",
                    dialect.quote_string(start)
                ))
            } else {
                Ok(format!(
                    "{col_sql} >= {} AND {col_sql} <= {}",
                    dialect.quote_string(start),
                    dialect.quote_string(end)
                ))
            }
        }
        DateRange::Operator { op, date } => {
            let quoted = dialect.quote_string(date);
            match op {
                DateRangeOp::Before => Ok(format!("{col_sql} < {quoted}")),
                DateRangeOp::After => Ok(format!("{col_sql} > {quoted}")),
                DateRangeOp::On => {
                    if data_type.is_temporal() {
                        let widened = dialect
                            .date_add(raw_tokens(&quoted), 1, "day")
                            .serialize(dialect);
                        Ok(format!("{col_sql} >= {quoted} AND {col_sql} < {widened}"))
                    } else {
                        Ok(format!("{col_sql} = {quoted}"))
                    }
                }
            }
        }
        DateRange::Preset(preset) => compile_preset(member, preset, &col, dialect),
    }
}

fn compile_preset(
    member: &str,
    preset: &str,
    col: &TokenStream,
    dialect: Dialect,
) -> Result<String, TranslateError> {
    let today = "CURRENT_DATE".to_string();
    let trunc = |unit: &str| dialect.date_trunc(unit, raw_tokens(&today)).serialize(dialect);
    let add = |base: &str, amount: i64, unit: &str| dialect.date_add(raw_tokens(base), amount, unit).serialize(dialect);
    let col_sql = col.serialize(dialect);

    let sql = match preset {
        "today" => format!("{col_sql} >= {today} AND {col_sql} < {}", add(&today, 1, "day")),
        "yesterday" => {
            let y = add(&today, -1, "day");
            format!("{col_sql} >= {y} AND {col_sql} < {today}")
        }
        "last_7_days" => format!("{col_sql} >= {} AND {col_sql} < {}", add(&today, -7, "day"), add(&today, 1, "day")),
        "last_30_days" => format!("{col_sql} >= {} AND {col_sql} < {}", add(&today, -30, "day"), add(&today, 1, "day")),
        "month_to_date" => {
            let start = trunc("month");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&today, 1, "day"))
        }
        "year_to_date" => {
            let start = trunc("year");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&today, 1, "day"))
        }
        "this_week" => {
            let start = trunc("week");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&start, 7, "day"))
        }
        "this_month" => {
            let start = trunc("month");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&start, 1, "month"))
        }
        "this_quarter" => {
            let start = trunc("quarter");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&start, 3, "month"))
        }
        "this_year" => {
            let start = trunc("year");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&start, 1, "year"))
        }
        "last_week" => {
            let start = add(&trunc("week"), -7, "day");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&start, 7, "day"))
        }
        "last_month" => {
            let start = add(&trunc("month"), -1, "month");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&start, 1, "month"))
        }
        "last_quarter" => {
            let start = add(&trunc("quarter"), -3, "month");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&start, 3, "month"))
        }
        "last_year" => {
            let start = add(&trunc("year"), -1, "year");
            format!("{col_sql} >= {start} AND {col_sql} < {}", add(&start, 1, "year"))
        }
        other => {
            if let Some((amount, unit, forward)) = parse_relative_preset(other) {
                let step = if forward { amount } else { -amount };
                if forward {
                    format!("{col_sql} >= {today} AND {col_sql} < {}", add(&today, step, unit))
                } else {
                    format!("{col_sql} >= {} AND {col_sql} < {}", add(&today, step, unit), today)
                }
            } else {
                return Err(TranslateError::BadDateRange {
                    member: member.to_string(),
                });
            }
        }
    };
    Ok(sql)
}

/// `last N {day|week|month|quarter|year}` / `next N ...`.
fn parse_relative_preset(s: &str) -> Option<(i64, &'static str, bool)> {
    let mut parts = s.split_whitespace();
    let direction = parts.next()?;
    let forward = match direction {
        "next" => true,
        "last" => false,
        _ => return None,
    };
    let n: i64 = parts.next()?.parse().ok()?;
    let unit = match parts.next()? {
        "days" | "day" => "day",
        "weeks" | "week" => "week",
        "months" | "month" => "month",
        "quarters" | "quarter" => "quarter",
        "years" | "year" => "year",
        _ => return None,
    };
    Some((n, unit, forward))
}

fn resolve_order_member(
    order: &crate::query::Order,
    output_members: &HashMap<String, String>,
    model: &SemanticModel,
    resolver: &Resolver,
    aliases: &HashMap<&str, String>,
    dialect: Dialect,
) -> Result<String, TranslateError> {
    let norm = order.member.replace(' ', "_").to_lowercase();
    for (alias, sql) in output_members {
        if *alias == order.member || *alias == norm {
            return Ok(sql.clone());
        }
    }
    match resolver.resolve_any(&order.member) {
        Ok(ResolvedMember::Dimension { table_key, dimension }) => Ok(qualify_member_expr_cross(
            dimension.expression.as_deref(),
            dimension.sql_expression(),
            &aliases[table_key],
            aliases,
            dialect,
        )),
        Ok(ResolvedMember::Measure { table_key, measure }) => {
            let inner = qualify_member_expr_cross(measure.expression.as_deref(), measure.sql_expression(), &aliases[table_key], aliases, dialect);
            Ok(apply_aggregation(measure.aggregation, &inner))
        }
        Ok(ResolvedMember::Metric { metric, .. }) => Ok(rewrite_qualified_refs(&metric.expression, aliases, dialect)),
        Ok(ResolvedMember::Segment { .. }) | Err(_) => {
            let _ = model;
            Err(TranslateError::UnknownOrderMember(order.member.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SemanticModel {
        SemanticModel::from_yaml(
            r#"
tables:
  orders:
    name: orders
    dimensions:
      - {name: id, type: integer, primary_key: true}
      - {name: created_at, type: timestamp}
    measures:
      - {name: total_revenue, type: decimal, aggregation: sum, expression: amount}
      - {name: order_count, type: integer, aggregation: count}
  customers:
    name: customers
    dimensions:
      - {name: id, type: integer, primary_key: true}
      - {name: region, type: string}
relationships:
  - name: orders_to_customers
    from_table: orders
    to_table: customers
    type: many_to_one
    join_on: "orders.customer_id = customers.id"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_simple_measure_and_dimension() {
        let model = model();
        let query = SemanticQuery {
            measures: vec!["orders.total_revenue".into()],
            dimensions: vec!["customers.region".into()],
            ..Default::default()
        };
        let sql = compile(&model, &query, Dialect::Postgres).unwrap();
        assert!(sql.contains(r#"SUM(t0."amount")"#));
        assert!(sql.contains("GROUP BY"));
        assert!(sql.contains("JOIN"));
    }

    #[test]
    fn test_time_dimension_truncation() {
        let model = model();
        let query = SemanticQuery {
            measures: vec!["orders.total_revenue".into()],
            time_dimensions: vec![TimeDimension {
                dimension: "orders.created_at".into(),
                granularity: Some(crate::model::Granularity::Day),
                date_range: None,
            }],
            ..Default::default()
        };
        let sql = compile(&model, &query, Dialect::Postgres).unwrap();
        assert!(sql.contains(r#"DATE_TRUNC('DAY', t0."created_at")"#));
    }

    #[test]
    fn test_empty_query_rejected() {
        let model = model();
        let query = SemanticQuery::default();
        assert!(matches!(compile(&model, &query, Dialect::Postgres), Err(TranslateError::Empty)));
    }

    #[test]
    fn test_measure_filter_compiles_to_having() {
        let model = model();
        let query = SemanticQuery {
            measures: vec!["orders.total_revenue".into()],
            dimensions: vec!["customers.region".into()],
            filters: vec![FilterItem {
                member: "orders.total_revenue".into(),
                operator: FilterOperator::Gt,
                values: vec!["1000".into()],
            }],
            ..Default::default()
        };
        let sql = compile(&model, &query, Dialect::Postgres).unwrap();
        assert!(sql.contains("HAVING"));
    }
}
