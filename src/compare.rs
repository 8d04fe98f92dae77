//! Result value comparison
//!
//! Decides whether two results are the same measurement when they may have
//! reached us through different numeric representations.
//!
//! Rules:
//! - `Null` equals only `Null`
//! - sequences are equal when they have the same length and are pairwise equal
//! - integers of every machine width are already collapsed into `Int`
//! - a `Decimal` is compared by value against a non-decimal operand, which is
//!   converted to a decimal first (text is parsed)
//! - two `Decimal`s must be structurally identical: `5.0` is not `5`
//! - anything else that is not the same variant with the same value is unequal

use crate::model::ResultValue;

/// Compare two result values
pub fn values_equal(a: &ResultValue, b: &ResultValue) -> bool {
    use ResultValue as V;

    match (a, b) {
        (V::Null, V::Null) => true,
        (V::Null, _) | (_, V::Null) => false,
        (V::Bool(x), V::Bool(y)) => x == y,
        (V::Int(x), V::Int(y)) => x == y,
        (V::Text(x), V::Text(y)) => x == y,
        (V::Decimal(x), V::Decimal(y)) => x == y,
        (V::Decimal(x), other) | (other, V::Decimal(x)) => other
            .to_decimal()
            .is_some_and(|other| x.numeric_eq(&other)),
        (V::Sequence(xs), V::Sequence(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (V::Object(xs), V::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Decimal;
    use serde_json::json;
    use test_case::test_case;

    fn dec(s: &str) -> ResultValue {
        ResultValue::Decimal(s.parse().unwrap())
    }

    #[test]
    fn test_integer_widths() {
        assert!(values_equal(&5i32.into(), &5i64.into()));
        assert!(values_equal(&7u16.into(), &7i64.into()));
        assert!(!values_equal(&5i32.into(), &6i64.into()));
    }

    #[test]
    fn test_decimal_exact_representation() {
        assert!(!values_equal(&dec("5.0"), &dec("5")));
        assert!(values_equal(&dec("5.0"), &dec("5.0")));
    }

    #[test]
    fn test_sequences() {
        assert!(values_equal(
            &vec![1, 2, 3].into(),
            &vec![1i64, 2, 3].into()
        ));
        assert!(!values_equal(&vec![1, 2].into(), &vec![1, 2, 3].into()));
        assert!(!values_equal(&vec![1, 2, 3].into(), &vec![3, 2, 1].into()));
    }

    #[test]
    fn test_nested_sequences() {
        let a = ResultValue::from(json!([[1, 2], [3.5]]));
        let b = ResultValue::Sequence(vec![
            vec![1, 2].into(),
            ResultValue::Sequence(vec![ResultValue::Decimal(Decimal::new(35, 1))]),
        ]);
        assert!(values_equal(&a, &b));
    }

    #[test_case(dec("5.0"), ResultValue::Int(5), true ; "decimal vs int by value")]
    #[test_case(ResultValue::Int(5), dec("5.00"), true ; "int vs decimal symmetric")]
    #[test_case(dec("2.50"), ResultValue::Text("2.5".to_string()), true ; "decimal vs numeric text")]
    #[test_case(dec("2.5"), ResultValue::Text("abc".to_string()), false ; "decimal vs unparseable text")]
    #[test_case(dec("1"), ResultValue::Bool(true), false ; "decimal vs bool")]
    #[test_case(dec("1"), ResultValue::from(vec![1]), false ; "decimal vs sequence")]
    fn test_decimal_cross_type(a: ResultValue, b: ResultValue, expected: bool) {
        assert_eq!(values_equal(&a, &b), expected);
    }

    #[test_case(ResultValue::Null, ResultValue::Null, true ; "null null")]
    #[test_case(ResultValue::Null, ResultValue::Int(0), false ; "null vs zero")]
    #[test_case(ResultValue::Text(String::new()), ResultValue::Null, false ; "empty text vs null")]
    #[test_case(ResultValue::Int(5), ResultValue::Text("5".to_string()), false ; "int vs text")]
    #[test_case(ResultValue::Bool(true), ResultValue::Int(1), false ; "bool vs int")]
    #[test_case(ResultValue::Text("a".to_string()), ResultValue::Text("a".to_string()), true ; "same text")]
    fn test_other_pairs(a: ResultValue, b: ResultValue, expected: bool) {
        assert_eq!(values_equal(&a, &b), expected);
    }

    #[test]
    fn test_objects() {
        let a = ResultValue::from(json!({"t": 1, "h": 2.0}));
        let b = ResultValue::from(json!({"h": 2.0, "t": 1}));
        let c = ResultValue::from(json!({"t": 1}));
        assert!(values_equal(&a, &b));
        assert!(!values_equal(&a, &c));
        assert!(!values_equal(&c, &a));
    }
}
