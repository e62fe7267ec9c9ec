//! Filter compilation: simple filters, advanced filters and global search
//! into one parameterized WHERE predicate.

use indexmap::IndexMap;
use std::collections::HashSet;
use tabula_core::{ColumnSchema, Value};

use crate::{AdvancedFilter, IdentifierGuard, Operator, QueryResult};

/// Numeric affinity of a declared column type.
///
/// Classification is by substring of the upper-cased declared type, so
/// `BIGINT`, `UNSIGNED INTEGER` and `INT8` are all integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAffinity {
    Integer,
    Real,
    Numeric,
    Text,
}

impl ColumnAffinity {
    pub fn of(declared_type: &str) -> Self {
        let upper = declared_type.to_ascii_uppercase();
        if upper.contains("INT") {
            ColumnAffinity::Integer
        } else if ["REAL", "FLOA", "DOUB"].iter().any(|t| upper.contains(t)) {
            ColumnAffinity::Real
        } else if ["NUMERIC", "DECIMAL"].iter().any(|t| upper.contains(t)) {
            ColumnAffinity::Numeric
        } else {
            ColumnAffinity::Text
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnAffinity::Text)
    }

    /// Coerce an operand to this affinity.
    ///
    /// Numeric strings become numbers, and integer columns floor fractional
    /// operands. Anything that does not parse as a finite number is left
    /// untouched and compared as SQLite would compare it.
    pub fn coerce(&self, value: &Value) -> Value {
        if !self.is_numeric() {
            return value.clone();
        }

        let number = match value {
            Value::Int64(_) if *self == ColumnAffinity::Integer => return value.clone(),
            Value::Int64(i) => *i as f64,
            Value::Float64(f) => *f,
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(f) => f,
                Err(_) => {
                    tracing::trace!(operand = %s, "non-numeric operand left as text");
                    return value.clone();
                }
            },
            _ => return value.clone(),
        };

        if !number.is_finite() {
            return value.clone();
        }

        match self {
            ColumnAffinity::Integer => {
                let floored = number.floor();
                if floored >= i64::MIN as f64 && floored <= i64::MAX as f64 {
                    Value::Int64(floored as i64)
                } else {
                    Value::Float64(floored)
                }
            }
            _ => Value::Float64(number),
        }
    }
}

/// A compiled WHERE predicate and its bound parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// Predicates joined with `AND`, without the `WHERE` keyword
    pub predicates: Vec<String>,
    pub params: Vec<Value>,
    /// Number of simple and advanced filter predicates (search excluded)
    pub filters_applied: usize,
    pub has_search: bool,
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// ` WHERE ...`, or an empty string when there is nothing to filter on
    pub fn to_sql(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }
}

/// Compiles filters for one table
pub struct FilterCompiler<'a> {
    schema: &'a [ColumnSchema],
    guard: IdentifierGuard<'a>,
}

impl<'a> FilterCompiler<'a> {
    pub fn new(schema: &'a [ColumnSchema]) -> Self {
        Self {
            schema,
            guard: IdentifierGuard::for_schema(schema),
        }
    }

    /// Compile simple filters, advanced filters and an optional search term.
    ///
    /// Advanced filters come first, in request order. A simple filter on a
    /// column that also has an advanced filter is dropped. The search term,
    /// when given, matches any column and is parenthesized as a single
    /// predicate.
    pub fn compile(
        &self,
        simple: &IndexMap<String, String>,
        advanced: &[AdvancedFilter],
        search: Option<&str>,
    ) -> QueryResult<WhereClause> {
        let mut clause = WhereClause::default();

        let mut advanced_columns = HashSet::new();
        for filter in advanced {
            self.guard.validate(&filter.column)?;
            advanced_columns.insert(filter.column.as_str());
        }

        for filter in advanced {
            if let Some((sql, params)) = self.compile_advanced(filter)? {
                clause.predicates.push(sql);
                clause.params.extend(params);
                clause.filters_applied += 1;
            }
        }

        for (column, term) in simple {
            let quoted = self.guard.quote(column)?;
            if advanced_columns.contains(column.as_str()) {
                tracing::debug!(column = %column, "simple filter superseded by advanced filter");
                continue;
            }
            if term.is_empty() {
                continue;
            }
            clause
                .predicates
                .push(format!("CAST({} AS TEXT) LIKE ?", quoted));
            clause.params.push(Value::String(format!("%{}%", term)));
            clause.filters_applied += 1;
        }

        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            let pattern = Value::String(format!("%{}%", term));
            let mut alternatives = Vec::with_capacity(self.schema.len());
            for column in self.schema {
                let quoted = self.guard.quote(&column.name)?;
                alternatives.push(format!("CAST({} AS TEXT) LIKE ?", quoted));
                clause.params.push(pattern.clone());
            }
            if !alternatives.is_empty() {
                clause
                    .predicates
                    .push(format!("({})", alternatives.join(" OR ")));
                clause.has_search = true;
            }
        }

        Ok(clause)
    }

    /// Compile one advanced filter. `None` means the filter is incomplete and
    /// contributes nothing.
    fn compile_advanced(&self, filter: &AdvancedFilter) -> QueryResult<Option<(String, Vec<Value>)>> {
        let column = self.guard.quote(&filter.column)?;
        let affinity = self.affinity(&filter.column);
        let coerce = |v: &Value| {
            if filter.operator.coerces_operand() {
                affinity.coerce(v)
            } else {
                v.clone()
            }
        };

        let compiled = match filter.operator {
            Operator::IsNull => Some((format!("{} IS NULL", column), vec![])),
            Operator::IsNotNull => Some((format!("{} IS NOT NULL", column), vec![])),
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte => filter.value.as_ref().map(|value| {
                let op = match filter.operator {
                    Operator::Eq => "=",
                    Operator::Ne => "!=",
                    Operator::Gt => ">",
                    Operator::Gte => ">=",
                    Operator::Lt => "<",
                    _ => "<=",
                };
                (format!("{} {} ?", column, op), vec![coerce(value)])
            }),
            Operator::Like | Operator::Regex => filter
                .value
                .as_ref()
                .map(|value| (format!("{} LIKE ?", column), vec![contains_pattern(value)])),
            Operator::Ilike => filter.value.as_ref().map(|value| {
                (
                    format!("LOWER({}) LIKE LOWER(?)", column),
                    vec![contains_pattern(value)],
                )
            }),
            Operator::In | Operator::NotIn => {
                let items: Vec<Value> = match &filter.value {
                    Some(Value::Array(items)) => items.iter().map(coerce).collect(),
                    Some(scalar) => vec![coerce(scalar)],
                    None => Vec::new(),
                };
                if items.is_empty() {
                    None
                } else {
                    let placeholders = vec!["?"; items.len()].join(", ");
                    let keyword = if filter.operator == Operator::In {
                        "IN"
                    } else {
                        "NOT IN"
                    };
                    Some((format!("{} {} ({})", column, keyword, placeholders), items))
                }
            }
            Operator::Between => match (&filter.value, &filter.value2) {
                (Some(low), Some(high)) => Some((
                    format!("{} BETWEEN ? AND ?", column),
                    vec![coerce(low), coerce(high)],
                )),
                _ => None,
            },
        };

        if compiled.is_none() {
            tracing::debug!(
                column = %filter.column,
                operator = %filter.operator,
                "advanced filter has no operand, skipping"
            );
        }
        Ok(compiled)
    }

    fn affinity(&self, column: &str) -> ColumnAffinity {
        self.schema
            .iter()
            .find(|c| c.name == column)
            .map(|c| ColumnAffinity::of(&c.declared_type))
            .unwrap_or(ColumnAffinity::Text)
    }
}

/// `%value%` for substring operators
fn contains_pattern(value: &Value) -> Value {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Value::String(format!("%{}%", text))
}
