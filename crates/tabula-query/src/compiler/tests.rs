use super::*;
use crate::{
    AdvancedFilter, AggregateFunction, Aggregation, IdentifierRejection, Operator, QueryError,
    SortOrder, TableDataRequest,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tabula_core::{ColumnSchema, Value};

fn items_schema() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("id", "INTEGER").primary_key(),
        ColumnSchema::new("name", "TEXT").not_null(),
        ColumnSchema::new("price", "REAL"),
    ]
}

fn assembly_schema() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("sample", "TEXT"),
        ColumnSchema::new("contigs", "INTEGER"),
        ColumnSchema::new("score", "NUMERIC"),
        ColumnSchema::new("category", "VARCHAR(32)"),
        ColumnSchema::new("value", "DOUBLE PRECISION"),
    ]
}

fn page() -> Page {
    Page::new(100, 0)
}

fn compile_advanced(filter: AdvancedFilter) -> WhereClause {
    FilterCompiler::new(&assembly_schema())
        .compile(&IndexMap::new(), &[filter], None)
        .unwrap()
}

#[rstest]
#[case("INTEGER", ColumnAffinity::Integer)]
#[case("bigint", ColumnAffinity::Integer)]
#[case("REAL", ColumnAffinity::Real)]
#[case("DOUBLE PRECISION", ColumnAffinity::Real)]
#[case("float", ColumnAffinity::Real)]
#[case("NUMERIC(10,2)", ColumnAffinity::Numeric)]
#[case("decimal", ColumnAffinity::Numeric)]
#[case("TEXT", ColumnAffinity::Text)]
#[case("", ColumnAffinity::Text)]
fn classifies_declared_types(#[case] declared: &str, #[case] expected: ColumnAffinity) {
    assert_eq!(ColumnAffinity::of(declared), expected);
}

#[test]
fn plain_request_selects_everything() {
    let compiled = compile(&TableDataRequest::new("items"), &items_schema(), page()).unwrap();

    assert_eq!(compiled.data_sql, "SELECT * FROM \"items\" LIMIT ? OFFSET ?");
    assert_eq!(compiled.count_sql, "SELECT COUNT(*) FROM \"items\"");
    assert_eq!(compiled.data_params, vec![Value::Int64(100), Value::Int64(0)]);
    assert!(compiled.count_params.is_empty());
    assert_eq!(compiled.expected_headers, vec!["id", "name", "price"]);
    assert_eq!(compiled.mode, QueryMode::Rows);
    assert_eq!(compiled.metadata.sql, compiled.data_sql);
}

#[test]
fn numeric_string_is_coerced_for_integer_column() {
    let clause = compile_advanced(AdvancedFilter::new("contigs", Operator::Gt).with_value("50"));

    assert_eq!(clause.to_sql(), " WHERE \"contigs\" > ?");
    assert_eq!(clause.params, vec![Value::Int64(50)]);
    assert_eq!(clause.filters_applied, 1);
}

#[rstest]
#[case("contigs", Value::String("50.9".into()), Value::Int64(50))]
#[case("contigs", Value::Float64(-1.5), Value::Int64(-2))]
#[case("value", Value::String(" 5 ".into()), Value::Float64(5.0))]
#[case("score", Value::String("7.25".into()), Value::Float64(7.25))]
#[case("contigs", Value::String("many".into()), Value::String("many".into()))]
#[case("sample", Value::String("50".into()), Value::String("50".into()))]
fn comparison_operands_follow_column_affinity(
    #[case] column: &str,
    #[case] operand: Value,
    #[case] bound: Value,
) {
    let clause = compile_advanced(AdvancedFilter::new(column, Operator::Eq).with_value(operand));
    assert_eq!(clause.params, vec![bound]);
}

#[test]
fn between_binds_both_bounds() {
    let clause = compile_advanced(
        AdvancedFilter::new("score", Operator::Between)
            .with_value(10i64)
            .with_value2(90i64),
    );

    assert_eq!(clause.to_sql(), " WHERE \"score\" BETWEEN ? AND ?");
    assert_eq!(clause.params, vec![Value::Int64(10), Value::Int64(90)]);
}

#[test]
fn between_without_upper_bound_is_dropped() {
    let clause = compile_advanced(AdvancedFilter::new("score", Operator::Between).with_value(10i64));

    assert!(clause.is_empty());
    assert_eq!(clause.to_sql(), "");
    assert_eq!(clause.filters_applied, 0);
}

#[test]
fn comparison_without_value_is_dropped() {
    let clause = compile_advanced(AdvancedFilter::new("contigs", Operator::Lt));
    assert!(clause.is_empty());
}

#[rstest]
#[case(Operator::Like, "\"sample\" LIKE ?")]
#[case(Operator::Regex, "\"sample\" LIKE ?")]
#[case(Operator::Ilike, "LOWER(\"sample\") LIKE LOWER(?)")]
fn substring_operators_wrap_operand(#[case] operator: Operator, #[case] predicate: &str) {
    let clause = compile_advanced(AdvancedFilter::new("sample", operator).with_value("ecoli"));

    assert_eq!(clause.predicates, vec![predicate.to_string()]);
    assert_eq!(clause.params, vec![Value::String("%ecoli%".into())]);
}

#[test]
fn in_list_is_sized_to_operand() {
    let clause = compile_advanced(
        AdvancedFilter::new("category", Operator::In)
            .with_value(Value::Array(vec!["a".into(), "b".into(), "c".into()])),
    );

    assert_eq!(clause.to_sql(), " WHERE \"category\" IN (?, ?, ?)");
    assert_eq!(clause.params.len(), 3);
}

#[test]
fn empty_in_list_is_dropped() {
    let clause = compile_advanced(
        AdvancedFilter::new("category", Operator::In).with_value(Value::Array(vec![])),
    );
    assert!(clause.is_empty());
}

#[test]
fn not_in_accepts_a_scalar() {
    let clause = compile_advanced(AdvancedFilter::new("category", Operator::NotIn).with_value("x"));

    assert_eq!(clause.to_sql(), " WHERE \"category\" NOT IN (?)");
    assert_eq!(clause.params, vec![Value::String("x".into())]);
}

#[rstest]
#[case(Operator::IsNull, "\"value\" IS NULL")]
#[case(Operator::IsNotNull, "\"value\" IS NOT NULL")]
fn null_checks_take_no_parameters(#[case] operator: Operator, #[case] predicate: &str) {
    let clause = compile_advanced(AdvancedFilter::new("value", operator));

    assert_eq!(clause.predicates, vec![predicate.to_string()]);
    assert!(clause.params.is_empty());
}

#[test]
fn advanced_filter_supersedes_simple_filter_on_same_column() {
    let mut simple = IndexMap::new();
    simple.insert("name".to_string(), "simple".to_string());
    simple.insert("price".to_string(), "5".to_string());
    let advanced = vec![AdvancedFilter::new("name", Operator::Eq).with_value("b")];

    let clause = FilterCompiler::new(&items_schema())
        .compile(&simple, &advanced, None)
        .unwrap();

    assert_eq!(
        clause.predicates,
        vec![
            "\"name\" = ?".to_string(),
            "CAST(\"price\" AS TEXT) LIKE ?".to_string(),
        ]
    );
    assert_eq!(
        clause.params,
        vec![Value::String("b".into()), Value::String("%5%".into())]
    );
    assert_eq!(clause.filters_applied, 2);
}

#[test]
fn empty_simple_filter_is_ignored() {
    let mut simple = IndexMap::new();
    simple.insert("name".to_string(), String::new());

    let clause = FilterCompiler::new(&items_schema())
        .compile(&simple, &[], None)
        .unwrap();
    assert!(clause.is_empty());
}

#[test]
fn search_spans_every_column() {
    let request = TableDataRequest::new("items")
        .with_search(" b ")
        .with_column_filter("name", "x");
    let compiled = compile(&request, &items_schema(), page()).unwrap();

    assert_eq!(
        compiled.count_sql,
        "SELECT COUNT(*) FROM \"items\" WHERE CAST(\"name\" AS TEXT) LIKE ? AND \
         (CAST(\"id\" AS TEXT) LIKE ? OR CAST(\"name\" AS TEXT) LIKE ? OR CAST(\"price\" AS TEXT) LIKE ?)"
    );
    assert_eq!(
        compiled.count_params,
        vec![
            Value::String("%x%".into()),
            Value::String("% b %".into()),
            Value::String("% b %".into()),
            Value::String("% b %".into()),
        ]
    );
    assert!(compiled.metadata.has_search);
    assert_eq!(compiled.metadata.filters_applied, 1);
}

#[test]
fn blank_search_is_ignored() {
    let request = TableDataRequest::new("items").with_search(" \t ");
    let compiled = compile(&request, &items_schema(), page()).unwrap();

    assert_eq!(compiled.count_sql, "SELECT COUNT(*) FROM \"items\"");
    assert!(!compiled.metadata.has_search);
}

#[test]
fn emptiness_key_trims_all_ascii_whitespace() {
    let request = TableDataRequest::new("items").with_sort("name", SortOrder::Asc);
    let compiled = compile(&request, &items_schema(), page()).unwrap();

    assert!(
        compiled
            .data_sql
            .contains("TRIM(CAST(\"name\" AS TEXT), ' ' || char(9, 10, 11, 12, 13)) = ''"),
        "{}",
        compiled.data_sql
    );
}

#[test]
fn integer_operand_is_widened_for_real_columns() {
    let clause = compile_advanced(AdvancedFilter::new("value", Operator::Lt).with_value(3i64));
    assert_eq!(clause.params, vec![Value::Float64(3.0)]);

    let clause = compile_advanced(AdvancedFilter::new("contigs", Operator::Lt).with_value(i64::MAX));
    assert_eq!(clause.params, vec![Value::Int64(i64::MAX)]);
}

#[test]
fn count_and_data_share_where_parameters() {
    let request = TableDataRequest::new("items")
        .with_filter(AdvancedFilter::new("price", Operator::Gte).with_value(5i64))
        .with_limit(10)
        .with_offset(20);
    let compiled = compile(&request, &items_schema(), Page::new(10, 20)).unwrap();

    assert_eq!(compiled.count_params, vec![Value::Float64(5.0)]);
    assert_eq!(
        compiled.data_params,
        vec![Value::Float64(5.0), Value::Int64(10), Value::Int64(20)]
    );
    assert!(compiled.data_sql.contains(" WHERE \"price\" >= ? "));
    assert_eq!(compiled.count_sql, "SELECT COUNT(*) FROM \"items\" WHERE \"price\" >= ?");
}

#[rstest]
#[case(SortOrder::Asc, "\"price\" COLLATE NOCASE ASC LIMIT ? OFFSET ?")]
#[case(SortOrder::Desc, "\"price\" COLLATE NOCASE DESC LIMIT ? OFFSET ?")]
fn sort_places_empty_values_last(#[case] order: SortOrder, #[case] suffix: &str) {
    let request = TableDataRequest::new("items").with_sort("price", order);
    let compiled = compile(&request, &items_schema(), page()).unwrap();

    assert!(compiled
        .data_sql
        .starts_with("SELECT * FROM \"items\" ORDER BY CASE WHEN \"price\" IS NULL"));
    assert!(compiled.data_sql.contains("THEN 1 ELSE 0 END, "));
    assert!(compiled.data_sql.ends_with(suffix), "{}", compiled.data_sql);
    assert_eq!(compiled.sort, Some(("price".to_string(), order)));
    assert!(compiled.metadata.has_sort);
}

#[test]
fn unknown_sort_column_is_rejected() {
    let request = TableDataRequest::new("items").with_sort("cost", SortOrder::Asc);

    assert_eq!(
        compile(&request, &items_schema(), page()).unwrap_err(),
        QueryError::InvalidIdentifier {
            identifier: "cost".into(),
            reason: IdentifierRejection::NotInSchema,
        }
    );
}

#[test]
fn projection_drops_unknown_columns() {
    let request = TableDataRequest::new("items").with_columns(["name", "bogus", "id"]);
    let compiled = compile(&request, &items_schema(), page()).unwrap();

    assert_eq!(
        compiled.data_sql,
        "SELECT \"name\", \"id\" FROM \"items\" LIMIT ? OFFSET ?"
    );
    assert_eq!(compiled.expected_headers, vec!["name", "id"]);
}

#[test]
fn projection_with_no_valid_columns_fails() {
    let request = TableDataRequest::new("items").with_columns(["bogus", "x;y"]);

    assert_eq!(
        compile(&request, &items_schema(), page()).unwrap_err(),
        QueryError::NoValidColumns {
            table: "items".into()
        }
    );
}

#[test]
fn empty_projection_means_all_columns() {
    let request = TableDataRequest::new("items").with_columns(Vec::<String>::new());
    let compiled = compile(&request, &items_schema(), page()).unwrap();
    assert!(compiled.data_sql.starts_with("SELECT * FROM"));
}

#[test]
fn aggregation_groups_and_wraps_count() {
    let request = TableDataRequest::new("assemblies")
        .with_group_by("category")
        .with_aggregation(Aggregation::new(AggregateFunction::Sum, "value").with_alias("total"));
    let compiled = compile(&request, &assembly_schema(), page()).unwrap();

    assert_eq!(
        compiled.data_sql,
        "SELECT \"category\", SUM(\"value\") AS \"total\" FROM \"assemblies\" \
         GROUP BY \"category\" ORDER BY \"category\" LIMIT ? OFFSET ?"
    );
    assert_eq!(
        compiled.count_sql,
        "SELECT COUNT(*) FROM (SELECT \"category\", SUM(\"value\") AS \"total\" \
         FROM \"assemblies\" GROUP BY \"category\")"
    );
    assert_eq!(compiled.expected_headers, vec!["category", "total"]);
    assert_eq!(compiled.mode, QueryMode::Aggregation);
    assert!(compiled.metadata.has_group_by);
    assert!(compiled.metadata.has_aggregations);
}

#[test]
fn aggregation_ignores_search_and_sort() {
    let request = TableDataRequest::new("assemblies")
        .with_search("abc")
        .with_sort("contigs", SortOrder::Desc)
        .with_aggregation(Aggregation::new(AggregateFunction::Count, "*"));
    let compiled = compile(&request, &assembly_schema(), page()).unwrap();

    assert_eq!(
        compiled.data_sql,
        "SELECT COUNT(*) AS \"count_all\" FROM \"assemblies\" LIMIT ? OFFSET ?"
    );
    assert_eq!(compiled.sort, None);
    assert!(!compiled.metadata.has_search);
    assert!(!compiled.metadata.has_sort);
}

#[rstest]
#[case(AggregateFunction::Avg, "AVG(\"value\")")]
#[case(AggregateFunction::Min, "MIN(\"value\")")]
#[case(AggregateFunction::Max, "MAX(\"value\")")]
#[case(AggregateFunction::Count, "COUNT(\"value\")")]
#[case(AggregateFunction::DistinctCount, "COUNT(DISTINCT \"value\")")]
#[case(AggregateFunction::Variance, "(AVG(\"value\" * \"value\") - AVG(\"value\") * AVG(\"value\"))")]
#[case(AggregateFunction::Stddev, "(AVG(\"value\" * \"value\") - AVG(\"value\") * AVG(\"value\"))")]
fn aggregate_expressions(#[case] function: AggregateFunction, #[case] expression: &str) {
    let request =
        TableDataRequest::new("assemblies").with_aggregation(Aggregation::new(function, "value"));
    let compiled = compile(&request, &assembly_schema(), page()).unwrap();

    let expected = format!(
        "SELECT {} AS \"{}_value\" FROM \"assemblies\" LIMIT ? OFFSET ?",
        expression,
        function.as_str()
    );
    assert_eq!(compiled.data_sql, expected);
}

#[test]
fn wildcard_only_counts() {
    let request = TableDataRequest::new("assemblies")
        .with_aggregation(Aggregation::new(AggregateFunction::Sum, "*"));

    assert_eq!(
        compile(&request, &assembly_schema(), page()).unwrap_err(),
        QueryError::InvalidIdentifier {
            identifier: "*".into(),
            reason: IdentifierRejection::Wildcard,
        }
    );
}

#[test]
fn alias_must_be_an_identifier() {
    let request = TableDataRequest::new("assemblies").with_aggregation(
        Aggregation::new(AggregateFunction::Max, "value").with_alias("max\" FROM x --"),
    );

    assert!(matches!(
        compile(&request, &assembly_schema(), page()),
        Err(QueryError::InvalidIdentifier {
            reason: IdentifierRejection::Pattern,
            ..
        })
    ));
}

#[test]
fn group_by_must_be_in_schema() {
    let request = TableDataRequest::new("assemblies")
        .with_group_by("species")
        .with_aggregation(Aggregation::new(AggregateFunction::Count, "*"));

    assert!(matches!(
        compile(&request, &assembly_schema(), page()),
        Err(QueryError::InvalidIdentifier {
            reason: IdentifierRejection::NotInSchema,
            ..
        })
    ));
}

#[rstest]
#[case("items; DROP TABLE items")]
#[case("items--")]
#[case("\"items\"")]
#[case("items)")]
fn hostile_table_names_never_reach_sql(#[case] table: &str) {
    let request = TableDataRequest::new(table);
    assert!(matches!(
        compile(&request, &items_schema(), page()),
        Err(QueryError::InvalidIdentifier {
            reason: IdentifierRejection::Pattern,
            ..
        })
    ));
}

#[rstest]
#[case("name'")]
#[case("name\"")]
#[case("name;")]
#[case("name--")]
#[case("/*name*/")]
#[case("name()")]
#[case("[name]")]
#[case("name<1")]
#[case("name >1")]
#[case("na\tme")]
fn hostile_filter_columns_are_rejected(#[case] column: &str) {
    let request = TableDataRequest::new("items")
        .with_filter(AdvancedFilter::new(column, Operator::Eq).with_value(1i64));
    assert!(matches!(
        compile(&request, &items_schema(), page()),
        Err(QueryError::InvalidIdentifier {
            reason: IdentifierRejection::Pattern,
            ..
        })
    ));
}

#[test]
fn hostile_values_travel_as_parameters() {
    let payload = "x' OR '1'='1";
    let request = TableDataRequest::new("items")
        .with_filter(AdvancedFilter::new("name", Operator::Eq).with_value(payload));
    let compiled = compile(&request, &items_schema(), page()).unwrap();

    assert!(!compiled.data_sql.contains(payload));
    assert_eq!(compiled.count_params, vec![Value::String(payload.into())]);
}
