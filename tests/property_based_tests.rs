mod common;

use common::strategies::*;
use native_query::binding::Parameter;
use native_query::pagination::{Order, Sort};
use native_query::sql::{references, to_positional};
use native_query::transform::Operator;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

proptest! {
    /// Property: wildcard operators wrap non-blank text and keep it intact
    #[test]
    fn wildcard_operators_wrap_non_blank_text(text in non_blank_text_strategy()) {
        prop_assert_eq!(Operator::Containing.transform(json!(text)), json!(format!("%{text}%")));
        prop_assert_eq!(Operator::StartsWith.transform(json!(text)), json!(format!("{text}%")));
        prop_assert_eq!(Operator::EndsWith.transform(json!(text)), json!(format!("%{text}")));
        prop_assert_eq!(Operator::Equal.transform(json!(text)), json!(text));
    }

    /// Property: blank text never becomes a match-everything pattern
    #[test]
    fn wildcard_operators_null_out_blank_text(text in blank_text_strategy()) {
        for operator in [Operator::Containing, Operator::StartsWith, Operator::EndsWith] {
            prop_assert_eq!(operator.transform(json!(text)), Value::Null);
        }
    }

    /// Property: every marker name written into SQL is found, casts included
    #[test]
    fn markers_are_detected(names in prop::collection::vec(marker_name_strategy(), 1..6)) {
        let sql = names
            .iter()
            .map(|name| format!("c = :{name}::text"))
            .collect::<Vec<_>>()
            .join(" AND ");

        let expected: HashSet<String> = names.iter().cloned().collect();
        prop_assert_eq!(references(&sql), expected);
    }

    /// Property: quoted text never yields markers
    #[test]
    fn quoted_markers_are_ignored(name in marker_name_strategy()) {
        let sql = format!("SELECT ':{name}', \":{name}\" FROM t");
        prop_assert!(references(&sql).is_empty());
    }

    /// Property: positional rewriting binds one value per array element
    #[test]
    fn array_values_expand_to_placeholder_lists(values in prop::collection::vec(any::<i64>(), 1..8)) {
        let parameters = vec![Parameter::new("ids", json!(values))];
        let positional = to_positional("SELECT * FROM t WHERE id IN (:ids)", &parameters).unwrap();

        prop_assert_eq!(positional.values.len(), values.len());
        let expected: Vec<String> = (1..=values.len()).map(|i| format!("${i}")).collect();
        prop_assert_eq!(positional.sql, format!("SELECT * FROM t WHERE id IN ({})", expected.join(", ")));
    }

    /// Property: ORDER BY lists every order in declaration order
    #[test]
    fn sort_renders_every_order(columns in prop::collection::vec(column_strategy(), 1..5)) {
        let mut sort = Sort::unsorted();
        for column in &columns {
            sort = sort.and(Order::asc(column));
        }

        let expected = columns
            .iter()
            .map(|c| format!("{c} ASC"))
            .collect::<Vec<_>>()
            .join(", ");
        prop_assert_eq!(sort.to_sql(), format!(" ORDER BY {expected}"));
    }
}
