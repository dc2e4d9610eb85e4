//! Buffer helpers shared by the binary backend.

use crate::Error;
use bytes::Buf;

/// Checks that at least `len` bytes remain in `buf`.
#[inline]
pub fn at_least<B: Buf>(buf: &B, len: usize) -> Result<(), Error> {
    if buf.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    Ok(())
}
