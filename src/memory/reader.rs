//! Typed reads from the attached target

use crate::core::types::{Address, MemoryResult, NumericType, TypedValue};
use crate::process::{ProcessApi, ProcessSession};

/// Reads one value of `value_type` at `address` with a single OS read
pub fn read_value<A: ProcessApi>(
    session: &ProcessSession<A>,
    address: Address,
    value_type: NumericType,
) -> MemoryResult<TypedValue> {
    let bytes = session.read_bytes(address, value_type.width())?;
    TypedValue::decode(&bytes, value_type)
}
