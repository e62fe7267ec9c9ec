//! Declarative table requests

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tabula_core::Value;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC", alias = "asc", alias = "Asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc", alias = "Desc")]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Comparison operator of an advanced filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    Regex,
}

impl Operator {
    /// Operators whose operand is coerced to the column's numeric affinity
    pub fn coerces_operand(&self) -> bool {
        matches!(
            self,
            Operator::Eq
                | Operator::Ne
                | Operator::Gt
                | Operator::Gte
                | Operator::Lt
                | Operator::Lte
                | Operator::Between
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Between => "between",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
            Operator::Regex => "regex",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an advanced filter joins its neighbours.
///
/// Accepted for forward compatibility. All compiled filters are currently
/// joined with `AND`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterLogic {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

/// A typed filter on one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedFilter {
    pub column: String,
    pub operator: Operator,
    /// Operand; a list for `in`/`not_in`. `null` and absent are the same.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Upper bound for `between`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<Value>,
    #[serde(default)]
    pub logic: FilterLogic,
}

impl AdvancedFilter {
    pub fn new(column: impl Into<String>, operator: Operator) -> Self {
        Self {
            column: column.into(),
            operator,
            value: None,
            value2: None,
            logic: FilterLogic::And,
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_value2(mut self, value: impl Into<Value>) -> Self {
        self.value2 = Some(value.into());
        self
    }
}

/// Aggregate function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Stddev,
    Variance,
    DistinctCount,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
            AggregateFunction::Stddev => "stddev",
            AggregateFunction::Variance => "variance",
            AggregateFunction::DistinctCount => "distinct_count",
        }
    }
}

/// One aggregate output column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aggregation {
    /// Column name, or `*` for `count`
    pub column: String,
    pub function: AggregateFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Aggregation {
    pub fn new(function: AggregateFunction, column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            function,
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Output column name: the alias, or `<function>_<column>` with `*` spelled `all`
    pub fn output_name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => {
                let column = if self.column == "*" {
                    "all"
                } else {
                    self.column.as_str()
                };
                format!("{}_{}", self.function.as_str(), column)
            }
        }
    }
}

/// A request for one page of a table.
///
/// Field names follow the JSON wire format. Everything except `table_name`
/// is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDataRequest {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_column: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_value: Option<String>,
    /// Simple per-column substring filters, in request order
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub col_filter: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<AdvancedFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<Aggregation>,
}

impl TableDataRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.sort_column = Some(column.into());
        self.sort_order = order;
        self
    }

    pub fn with_search(mut self, value: impl Into<String>) -> Self {
        self.search_value = Some(value.into());
        self
    }

    pub fn with_column_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.col_filter.insert(column.into(), value.into());
        self
    }

    pub fn with_filter(mut self, filter: AdvancedFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    /// Aggregation mode is selected by the presence of aggregations alone
    pub fn is_aggregation(&self) -> bool {
        !self.aggregations.is_empty()
    }

    /// The sort column, if one was given and is not blank
    pub fn sort_column(&self) -> Option<&str> {
        self.sort_column
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// The search term as given, unless it is blank
    pub fn search_term(&self) -> Option<&str> {
        self.search_value
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}
