//! Value ranges and search queries

use super::error::{MemoryError, MemoryResult};
use super::value::{FloatTolerance, NumericType, TypedValue};
use std::cmp::Ordering;

/// Separator between the bounds of a range query (`"min~max"`)
pub const RANGE_SEPARATOR: char = '~';

/// Inclusive range of values of one numeric type.
///
/// `min <= max` is not enforced: a reversed range simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    min: TypedValue,
    max: TypedValue,
}

impl ValueRange {
    /// Builds a range, failing if the bounds have different types
    pub fn new(min: TypedValue, max: TypedValue) -> MemoryResult<Self> {
        if min.numeric_type() != max.numeric_type() {
            return Err(MemoryError::InvalidRangeFormat(format!("{}~{}", min, max)));
        }
        Ok(ValueRange { min, max })
    }

    /// Parses `"min~max"` where both bounds are literals of `value_type`
    pub fn parse(text: &str, value_type: NumericType) -> MemoryResult<Self> {
        let parts: Vec<&str> = text.split(RANGE_SEPARATOR).collect();
        let [min, max] = parts.as_slice() else {
            return Err(MemoryError::InvalidRangeFormat(text.to_string()));
        };

        let min = TypedValue::parse(min, value_type)
            .map_err(|_| MemoryError::InvalidRangeFormat(text.to_string()))?;
        let max = TypedValue::parse(max, value_type)
            .map_err(|_| MemoryError::InvalidRangeFormat(text.to_string()))?;

        Ok(ValueRange { min, max })
    }

    pub fn min(&self) -> TypedValue {
        self.min
    }

    pub fn max(&self) -> TypedValue {
        self.max
    }

    pub fn numeric_type(&self) -> NumericType {
        self.min.numeric_type()
    }

    /// Inclusive containment using raw comparisons (no float tolerance)
    pub fn contains(&self, value: &TypedValue) -> bool {
        let above_min = matches!(
            value.compare(&self.min),
            Some(Ordering::Greater | Ordering::Equal)
        );
        let below_max = matches!(
            value.compare(&self.max),
            Some(Ordering::Less | Ordering::Equal)
        );
        above_min && below_max
    }
}

/// What a window must hold to become a search result
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchQuery {
    Exact(TypedValue),
    Range(ValueRange),
}

impl SearchQuery {
    /// Parses either a single literal or a `min~max` range
    pub fn parse(text: &str, value_type: NumericType) -> MemoryResult<Self> {
        if text.contains(RANGE_SEPARATOR) {
            ValueRange::parse(text, value_type).map(SearchQuery::Range)
        } else {
            TypedValue::parse(text, value_type).map(SearchQuery::Exact)
        }
    }

    pub fn numeric_type(&self) -> NumericType {
        match self {
            SearchQuery::Exact(value) => value.numeric_type(),
            SearchQuery::Range(range) => range.numeric_type(),
        }
    }

    pub fn matches(&self, value: &TypedValue, tolerance: FloatTolerance) -> bool {
        match self {
            SearchQuery::Exact(expected) => value.approx_eq(expected, tolerance),
            SearchQuery::Range(range) => range.contains(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_parse() {
        let range = ValueRange::parse("10~20", NumericType::I32).unwrap();
        assert_eq!(range.min(), TypedValue::I32(10));
        assert_eq!(range.max(), TypedValue::I32(20));

        let range = ValueRange::parse("0.1035~0.1070", NumericType::F32).unwrap();
        assert_eq!(range.numeric_type(), NumericType::F32);
    }

    #[test]
    fn test_range_parse_errors() {
        for text in ["10", "1~2~3", "a~5", "5~", "~5", "1.5~2", "1 ~ 5", " 1~5"] {
            assert!(
                matches!(
                    ValueRange::parse(text, NumericType::I32),
                    Err(MemoryError::InvalidRangeFormat(_))
                ),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_range_contains_inclusive() {
        let range = ValueRange::parse("10~20", NumericType::I64).unwrap();
        assert!(range.contains(&TypedValue::I64(10)));
        assert!(range.contains(&TypedValue::I64(15)));
        assert!(range.contains(&TypedValue::I64(20)));
        assert!(!range.contains(&TypedValue::I64(9)));
        assert!(!range.contains(&TypedValue::I64(21)));
        // type mismatch never matches
        assert!(!range.contains(&TypedValue::I32(15)));
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let range = ValueRange::parse("20~10", NumericType::I32).unwrap();
        for v in [5, 10, 15, 20, 25] {
            assert!(!range.contains(&TypedValue::I32(v)));
        }
    }

    #[test]
    fn test_float_range_ignores_nan() {
        let range = ValueRange::parse("-1~1", NumericType::F64).unwrap();
        assert!(range.contains(&TypedValue::F64(0.5)));
        assert!(!range.contains(&TypedValue::F64(f64::NAN)));
    }

    #[test]
    fn test_mismatched_bounds_rejected() {
        assert!(ValueRange::new(TypedValue::I32(1), TypedValue::I64(2)).is_err());
        assert!(ValueRange::new(TypedValue::I32(1), TypedValue::I32(2)).is_ok());
    }

    #[test]
    fn test_query_dispatch() {
        assert!(matches!(
            SearchQuery::parse("5", NumericType::I32).unwrap(),
            SearchQuery::Exact(TypedValue::I32(5))
        ));
        assert!(matches!(
            SearchQuery::parse("1~5", NumericType::I32).unwrap(),
            SearchQuery::Range(_)
        ));
        assert!(matches!(
            SearchQuery::parse("1~x", NumericType::I32),
            Err(MemoryError::InvalidRangeFormat(_))
        ));
        assert!(matches!(
            SearchQuery::parse("x", NumericType::I32),
            Err(MemoryError::InvalidValueFormat { .. })
        ));
    }

    #[test]
    fn test_query_matches() {
        let tolerance = FloatTolerance::default();
        let exact = SearchQuery::parse("100", NumericType::I32).unwrap();
        assert!(exact.matches(&TypedValue::I32(100), tolerance));
        assert!(!exact.matches(&TypedValue::I32(101), tolerance));

        let range = SearchQuery::parse("99~101", NumericType::I32).unwrap();
        assert!(range.matches(&TypedValue::I32(101), tolerance));
    }
}
