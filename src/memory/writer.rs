//! Typed writes into the attached target

use crate::core::types::{Address, MemoryResult, TypedValue};
use crate::process::{ProcessApi, ProcessSession};
use tracing::debug;

/// Encodes `value` and writes it at `address` with a single OS write
pub fn write_value<A: ProcessApi>(
    session: &ProcessSession<A>,
    address: Address,
    value: &TypedValue,
) -> MemoryResult<()> {
    let bytes = value.encode();
    session.write_bytes(address, &bytes)?;
    debug!(%address, value = %value, bytes = %hex::encode(&bytes), "Wrote value");
    Ok(())
}

/// Writes `value` at every address, one write per address.
///
/// A failed write does not stop the remaining ones. Returns how many
/// writes succeeded.
pub fn write_all<A, I>(session: &ProcessSession<A>, addresses: I, value: &TypedValue) -> usize
where
    A: ProcessApi,
    I: IntoIterator<Item = Address>,
{
    addresses
        .into_iter()
        .filter(|address| write_value(session, *address, value).is_ok())
        .count()
}
