use proptest::prelude::*;

use gridsift::core::{
    CellValue, ColumnFilterSet, CombineMode, FilterRegistry, OperatorKind, Predicate, RecordTable,
};
use gridsift::services::recompute;

const TEXT_OPERATORS: [OperatorKind; 8] = [
    OperatorKind::Contains,
    OperatorKind::NotContains,
    OperatorKind::Equals,
    OperatorKind::NotEquals,
    OperatorKind::StartsWith,
    OperatorKind::NotStartsWith,
    OperatorKind::EndsWith,
    OperatorKind::NotEndsWith,
];

fn text_operator() -> impl Strategy<Value = OperatorKind> {
    prop::sample::select(TEXT_OPERATORS.to_vec())
}

// Short ASCII words so contains/starts-with actually hit now and then.
fn word() -> impl Strategy<Value = String> {
    "[a-cA-C]{0,4}"
}

fn column_of_words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word(), 0..24)
}

fn table(values: &[String]) -> RecordTable {
    RecordTable::new(
        vec!["Name".into()],
        values.iter().map(|v| vec![CellValue::from(v.as_str())]).collect(),
    )
}

fn single(op: OperatorKind, operand: &str) -> Predicate {
    Predicate::text(op, operand, false).unwrap()
}

fn accepted(set: ColumnFilterSet, values: &[String]) -> Vec<usize> {
    let registry = FilterRegistry::default().with_column(0, set);
    recompute(&registry, &table(values)).accepted
}

proptest! {
    #[test]
    fn empty_registry_accepts_every_row(values in column_of_words()) {
        let pass = recompute(&FilterRegistry::default(), &table(&values));
        prop_assert_eq!(pass.accepted, (0..values.len()).collect::<Vec<_>>());
        prop_assert_eq!(pass.match_count, values.len());
    }

    #[test]
    fn case_insensitive_predicates_ignore_case(
        values in column_of_words(),
        op in text_operator(),
        operand in word(),
    ) {
        let set = || ColumnFilterSet::single(single(op, &operand));
        let upper: Vec<String> = values.iter().map(|v| v.to_uppercase()).collect();
        let lower: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();

        let original = accepted(set(), &values);
        prop_assert_eq!(&original, &accepted(set(), &upper));
        prop_assert_eq!(&original, &accepted(set(), &lower));
    }

    #[test]
    fn or_is_union_and_and_is_intersection(
        values in column_of_words(),
        op1 in text_operator(),
        op2 in text_operator(),
        a in word(),
        b in word(),
    ) {
        let only1 = accepted(ColumnFilterSet::single(single(op1, &a)), &values);
        let only2 = accepted(ColumnFilterSet::single(single(op2, &b)), &values);

        let both = |mode| ColumnFilterSet::new(vec![single(op1, &a), single(op2, &b)], Some(mode));
        let union: Vec<usize> = (0..values.len())
            .filter(|r| only1.contains(r) || only2.contains(r))
            .collect();
        let intersection: Vec<usize> = (0..values.len())
            .filter(|r| only1.contains(r) && only2.contains(r))
            .collect();

        prop_assert_eq!(accepted(both(CombineMode::Or), &values), union);
        prop_assert_eq!(accepted(both(CombineMode::And), &values), intersection);
    }

    #[test]
    fn match_count_is_accepted_len(
        values in prop::collection::vec(prop_oneof![
            (-50.0f64..50.0).prop_map(CellValue::Number),
            word().prop_map(CellValue::Text),
            Just(CellValue::Null),
        ], 0..32),
        threshold in -50.0f64..50.0,
        inter in prop_oneof![Just(CombineMode::And), Just(CombineMode::Or)],
    ) {
        let source = RecordTable::new(
            vec!["Value".into(), "Copy".into()],
            values.iter().map(|v| vec![v.clone(), v.clone()]).collect(),
        );
        let registry = FilterRegistry::new(inter)
            .with_column(0, ColumnFilterSet::single(
                Predicate::numeric(OperatorKind::NumericGte, threshold).unwrap(),
            ))
            .with_column(1, ColumnFilterSet::single(single(OperatorKind::Contains, "a")));
        let pass = recompute(&registry, &source);
        prop_assert_eq!(pass.match_count, pass.accepted.len());
        prop_assert!(pass.accepted.windows(2).all(|w| w[0] < w[1]));
    }
}
