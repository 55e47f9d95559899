//! Value codec properties

use memprobe::core::types::{FloatTolerance, MemoryError, NumericType, TypedValue, ValueRange};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_i32_encode_decode(v in any::<i32>()) {
        let value = TypedValue::I32(v);
        let bytes = value.encode();
        prop_assert_eq!(bytes.len(), NumericType::I32.width());
        prop_assert_eq!(TypedValue::decode(&bytes, NumericType::I32).unwrap(), value);
    }

    #[test]
    fn prop_i64_bytes_reencode(bytes in prop::array::uniform8(any::<u8>())) {
        let value = TypedValue::decode(&bytes, NumericType::I64).unwrap();
        prop_assert_eq!(value.encode(), bytes.to_vec());
    }

    #[test]
    fn prop_f64_text_round_trip(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let value = TypedValue::F64(v);
        let parsed = TypedValue::parse(&value.to_string(), NumericType::F64).unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn prop_f32_text_round_trip(v in any::<f32>().prop_filter("finite", |v| v.is_finite())) {
        let value = TypedValue::F32(v);
        let parsed = TypedValue::parse(&value.to_string(), NumericType::F32).unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn prop_reversed_range_matches_nothing(a in any::<i32>(), b in any::<i32>(), x in any::<i32>()) {
        prop_assume!(a != b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let range = ValueRange::new(TypedValue::I32(hi), TypedValue::I32(lo)).unwrap();
        prop_assert!(!range.contains(&TypedValue::I32(x)));
    }

    #[test]
    fn prop_decode_rejects_wrong_width(len in 0usize..16) {
        prop_assume!(len != 4);
        let bytes = vec![0u8; len];
        let is_size_error = matches!(
            TypedValue::decode(&bytes, NumericType::F32),
            Err(MemoryError::InvalidBufferSize { expected: 4, .. })
        );
        prop_assert!(is_size_error);
    }
}

#[test]
fn test_parse_rejects_out_of_range() {
    assert!(matches!(
        TypedValue::parse("99999999999999999999", NumericType::I32),
        Err(MemoryError::InvalidValueFormat { .. })
    ));
    assert!(TypedValue::parse("99999999999999999999", NumericType::I64).is_err());
    assert!(TypedValue::parse("1e400", NumericType::F64).is_err());
    assert_eq!(
        TypedValue::parse("2147483647", NumericType::I32).unwrap(),
        TypedValue::I32(i32::MAX)
    );
}

#[test]
fn test_float_tolerance_absorbs_noise() {
    let target = TypedValue::F32(0.1);
    let noisy = TypedValue::F32(0.1 + f32::EPSILON * 2.0);
    assert!(noisy.approx_eq(&target, FloatTolerance::default()));
    assert!(!noisy.approx_eq(&target, FloatTolerance::exact()));
    assert!(!TypedValue::F32(0.2).approx_eq(&target, FloatTolerance::default()));
}
