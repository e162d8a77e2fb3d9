/// GPU buffers: fixed-size `Buffer`, growable `DynamicBuffer`, scoped `MappedView`
///
/// A Buffer wraps a backend buffer object. Resizing allocates a new backend
/// object, copies the overlapping range and drops the old one; the buffer's
/// generation counter is bumped so holders of the old binding (vertex
/// arrays) can rebind.

use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use crate::context::{ResourceKind, ResourceOwner};
use crate::error::{Error, Result};
use crate::renderer::{Buffer as BackendBuffer, MapAccess};
use crate::{engine_error, engine_fail, engine_fatal, engine_trace};

// ===== BUFFER =====

/// Fixed-size GPU buffer bound to the context it was created in
pub struct Buffer {
    owner: ResourceOwner,
    backend: RwLock<Arc<dyn BackendBuffer>>,
    mapped: AtomicBool,
    generation: AtomicU64,
}

impl Buffer {
    /// Create a buffer of `size` bytes, optionally initialized with `data`
    ///
    /// `data` may be shorter than `size`; the remainder is left undefined.
    /// Fatal if no context is current.
    pub fn new(size: u64, data: Option<&[u8]>) -> Result<Arc<Buffer>> {
        if let Some(data) = data {
            if data.len() as u64 > size {
                engine_fail!("nebula::Buffer", Error::InvalidArgument(format!(
                    "initial data ({} bytes) exceeds buffer size ({} bytes)", data.len(), size
                )));
            }
        }

        let (owner, context) = ResourceOwner::acquire(ResourceKind::Buffer, format!("{} bytes", size));
        let backend = context.renderer().create_buffer(size, data)?;
        engine_trace!("nebula::Buffer", "Created buffer of {} bytes", size);

        Ok(Arc::new(Buffer {
            owner,
            backend: RwLock::new(backend),
            mapped: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }))
    }

    /// Create a buffer holding exactly `data`
    pub fn from_data(data: &[u8]) -> Result<Arc<Buffer>> {
        Self::new(data.len() as u64, Some(data))
    }

    pub fn owner(&self) -> &ResourceOwner {
        &self.owner
    }

    /// Storage size in bytes
    pub fn size(&self) -> u64 {
        self.owner.check();
        self.current_backend().size()
    }

    /// Incremented every time the backend storage is replaced
    pub fn generation(&self) -> u64 {
        self.owner.check();
        self.generation.load(Ordering::Acquire)
    }

    /// Whether a MappedView is currently open
    pub fn is_mapped(&self) -> bool {
        self.owner.check();
        self.mapped.load(Ordering::Acquire)
    }

    /// Backend object currently holding the storage
    pub fn backend(&self) -> Arc<dyn BackendBuffer> {
        self.owner.check();
        self.current_backend()
    }

    fn current_backend(&self) -> Arc<dyn BackendBuffer> {
        Arc::clone(&self.backend.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn ensure_unmapped(&self, operation: &str) {
        if self.mapped.load(Ordering::Acquire) {
            engine_fatal!("nebula::Buffer", Error::AlreadyMapped(format!("cannot {} while a view is open", operation)));
        }
    }

    fn check_range(&self, backend: &dyn BackendBuffer, offset: u64, len: u64) -> Result<()> {
        let in_range = offset.checked_add(len).is_some_and(|end| end <= backend.size());
        if !in_range {
            engine_fail!("nebula::Buffer", Error::InvalidArgument(format!(
                "range [{}, {}+{}) is outside buffer of {} bytes", offset, offset, len, backend.size()
            )));
        }
        Ok(())
    }

    /// Upload `data` at `offset`
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.owner.check();
        self.ensure_unmapped("write");
        let backend = self.current_backend();
        self.check_range(backend.as_ref(), offset, data.len() as u64)?;
        backend.write(offset, data)
    }

    /// Download `len` bytes starting at `offset`
    pub fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        self.owner.check();
        self.ensure_unmapped("read");
        let backend = self.current_backend();
        self.check_range(backend.as_ref(), offset, len)?;
        let mut out = vec![0u8; len as usize];
        backend.read(offset, &mut out)?;
        Ok(out)
    }

    /// Open a view over `[offset, offset + size)`
    ///
    /// Fatal `AlreadyMapped` if another view is open on this buffer.
    pub fn map(&self, access: MapAccess, offset: u64, size: u64) -> Result<MappedView<'_>> {
        match self.try_map(access, offset, size) {
            Err(error @ Error::AlreadyMapped(_)) => engine_fatal!("nebula::Buffer", error),
            other => other,
        }
    }

    /// Like `map()`, but a second concurrent view is reported as `Err(AlreadyMapped)`
    pub fn try_map(&self, access: MapAccess, offset: u64, size: u64) -> Result<MappedView<'_>> {
        self.owner.check();
        if size == 0 {
            engine_fail!("nebula::Buffer", Error::InvalidArgument("cannot map an empty range".to_string()));
        }
        if self
            .mapped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadyMapped("a view is already open on this buffer".to_string()));
        }

        let backend = self.current_backend();
        let mapped = self
            .check_range(backend.as_ref(), offset, size)
            .and_then(|_| backend.map(access, offset, size));
        let ptr = match mapped.map(NonNull::new) {
            Ok(Some(ptr)) => ptr,
            Ok(None) => {
                backend.unmap();
                self.mapped.store(false, Ordering::Release);
                return Err(Error::BackendError("backend returned a null mapping".to_string()));
            }
            Err(error) => {
                self.mapped.store(false, Ordering::Release);
                return Err(error);
            }
        };

        Ok(MappedView {
            buffer: self,
            backend,
            ptr,
            len: size as usize,
            offset,
            access,
        })
    }

    /// Reallocate to `new_size` bytes, preserving the first `min(old, new)` bytes
    pub fn resize(&self, new_size: u64) -> Result<()> {
        self.reallocate(new_size, None)
    }

    /// Reallocate, copying only the first `preserve` bytes (clamped to both sizes)
    pub(crate) fn reallocate(&self, new_size: u64, preserve: Option<u64>) -> Result<()> {
        let context = self.owner.check();
        self.ensure_unmapped("resize");

        let mut slot = self.backend.write().unwrap_or_else(PoisonError::into_inner);
        let old_size = slot.size();
        let copy = preserve.unwrap_or(old_size).min(old_size).min(new_size);

        let replacement = context.renderer().create_buffer(new_size, None)?;
        if copy > 0 {
            slot.copy_to(replacement.as_ref(), 0, 0, copy)?;
        }
        *slot = replacement;
        self.generation.fetch_add(1, Ordering::AcqRel);

        engine_trace!("nebula::Buffer", "Reallocated buffer {} -> {} bytes ({} preserved)", old_size, new_size, copy);
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if !self.owner.release() {
            engine_error!(
                "nebula::Buffer",
                "Buffer dropped without a compatible current context; GPU storage is leaked"
            );
            let backend = self.backend.get_mut().unwrap_or_else(PoisonError::into_inner);
            std::mem::forget(Arc::clone(backend));
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("owner", &self.owner)
            .field("mapped", &self.mapped.load(Ordering::Acquire))
            .field("generation", &self.generation.load(Ordering::Acquire))
            .finish()
    }
}

// ===== MAPPED VIEW =====

/// Scoped view over a mapped buffer range; unmaps when dropped
pub struct MappedView<'a> {
    buffer: &'a Buffer,
    backend: Arc<dyn BackendBuffer>,
    ptr: NonNull<u8>,
    len: usize,
    offset: u64,
    access: MapAccess,
}

impl MappedView<'_> {
    pub fn access(&self) -> MapAccess {
        self.access
    }

    /// Byte offset of the view inside its buffer
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Deref for MappedView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: the backend keeps [ptr, ptr + len) mapped until unmap() in Drop
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for MappedView<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        if !self.access.can_write() {
            engine_fatal!("nebula::Buffer", Error::InvalidResource("mutable access to a read-only view".to_string()));
        }
        // SAFETY: as in deref(); the view is the only mapping of this buffer
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for MappedView<'_> {
    fn drop(&mut self) {
        self.backend.unmap();
        self.buffer.mapped.store(false, Ordering::Release);
    }
}

// ===== DYNAMIC BUFFER =====

/// Capacity after growing a buffer of `capacity` bytes to hold `required` bytes
pub fn grown_capacity(capacity: u64, required: u64) -> u64 {
    required.max(capacity.saturating_mul(2))
}

/// Buffer with a logical size that grows by doubling its capacity
pub struct DynamicBuffer {
    buffer: Arc<Buffer>,
    size: Mutex<u64>,
}

impl DynamicBuffer {
    /// Create an empty dynamic buffer with `capacity` bytes of storage
    pub fn new(capacity: u64) -> Result<DynamicBuffer> {
        Ok(DynamicBuffer {
            buffer: Buffer::new(capacity, None)?,
            size: Mutex::new(0),
        })
    }

    /// Underlying buffer, for binding
    pub fn buffer(&self) -> &Arc<Buffer> {
        self.buffer.owner().check();
        &self.buffer
    }

    /// Logical size in bytes
    pub fn size(&self) -> u64 {
        self.buffer.owner().check();
        *self.size.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Storage size in bytes
    pub fn capacity(&self) -> u64 {
        self.buffer.size()
    }

    /// Append `data` at the end, growing if needed. Returns the offset it was written at.
    pub fn append(&self, data: &[u8]) -> Result<u64> {
        self.buffer.owner().check();
        let mut size = self.size.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = *size;
        let required = offset + data.len() as u64;
        self.grow_to(required, offset)?;
        if !data.is_empty() {
            self.buffer.write(offset, data)?;
        }
        *size = required;
        Ok(offset)
    }

    /// Set the logical size, growing the storage if needed
    pub fn resize(&self, new_size: u64) -> Result<()> {
        self.buffer.owner().check();
        let mut size = self.size.lock().unwrap_or_else(PoisonError::into_inner);
        self.grow_to(new_size, *size)?;
        *size = new_size;
        Ok(())
    }

    /// Ensure room for `additional` more bytes
    pub fn reserve(&self, additional: u64) -> Result<()> {
        self.buffer.owner().check();
        let size = self.size.lock().unwrap_or_else(PoisonError::into_inner);
        self.grow_to(*size + additional, *size)
    }

    /// Reset the logical size to 0 (storage is kept)
    pub fn clear(&self) {
        self.buffer.owner().check();
        *self.size.lock().unwrap_or_else(PoisonError::into_inner) = 0;
    }

    /// Reallocate storage to exactly the logical size
    pub fn shrink_to_fit(&self) -> Result<()> {
        self.buffer.owner().check();
        let size = self.size.lock().unwrap_or_else(PoisonError::into_inner);
        if self.buffer.size() != *size {
            self.buffer.reallocate(*size, Some(*size))?;
        }
        Ok(())
    }

    fn grow_to(&self, required: u64, preserve: u64) -> Result<()> {
        let capacity = self.buffer.size();
        if required <= capacity {
            return Ok(());
        }
        let new_capacity = grown_capacity(capacity, required);
        self.buffer.reallocate(new_capacity, Some(preserve))
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
