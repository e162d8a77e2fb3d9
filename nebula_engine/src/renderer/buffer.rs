/// Buffer trait and mapping access modes

use std::any::Any;
use crate::error::Result;

/// Access requested when mapping a buffer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl MapAccess {
    pub const COUNT: usize = 3;

    pub const ALL: [MapAccess; Self::COUNT] = [MapAccess::ReadOnly, MapAccess::WriteOnly, MapAccess::ReadWrite];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn can_read(self) -> bool {
        self != MapAccess::WriteOnly
    }

    pub fn can_write(self) -> bool {
        self != MapAccess::ReadOnly
    }
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types. The storage size is fixed
/// for the lifetime of the object: growing a buffer allocates a new one.
/// The buffer is destroyed when dropped.
pub trait Buffer: Send + Sync {
    /// Storage size in bytes
    fn size(&self) -> u64;

    /// Update buffer data
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write
    fn write(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Read `out.len()` bytes starting at `offset`
    fn read(&self, offset: u64, out: &mut [u8]) -> Result<()>;

    /// Map a range into client memory
    ///
    /// The pointer stays valid until `unmap()`.
    fn map(&self, access: MapAccess, offset: u64, size: u64) -> Result<*mut u8>;

    /// Release the current mapping
    fn unmap(&self);

    /// Copy `size` bytes into `dst`
    fn copy_to(&self, dst: &dyn Buffer, src_offset: u64, dst_offset: u64, size: u64) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}
