//! Byte storage behind every view, and the liveness guard consulted before
//! (and, for callback-driven operations, during) every element access.
//!
//! An [`ArrayBuffer`] is either *exclusive* or *shared*:
//!
//! | Kind | Storage | Detachable | `Send + Sync` storage |
//! |------|---------|------------|------------------------|
//! | exclusive | [`BytesMut`] | yes, via [`ArrayBuffer::detach`] | no |
//! | shared | [`SharedBlock`] | never | yes |
//!
//! Detaching an exclusive buffer transfers its storage out as [`Bytes`] and
//! leaves the buffer permanently zero-length. A new buffer can take over
//! transferred storage with [`ArrayBuffer::from_bytes`].

use std::{cell::RefCell, fmt, rc::Rc};

#[cfg(feature = "shared")]
use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

use bytes::{Bytes, BytesMut};

use crate::{BufferSpecies, Error, Result, cold_path};

enum Block {
    Exclusive(RefCell<Option<BytesMut>>),
    #[cfg(feature = "shared")]
    Shared(Arc<SharedBlock>),
}

struct BufferInner {
    block: Block,
    species: RefCell<Option<Rc<dyn BufferSpecies>>>,
}

/// A handle to a fixed-length byte buffer.
///
/// Cloning the handle aliases the same buffer; use [`ArrayBuffer::ptr_eq`] to
/// compare identity.
#[derive(Clone)]
pub struct ArrayBuffer(Rc<BufferInner>);

impl ArrayBuffer {
    fn from_block(block: Block) -> Self {
        Self(Rc::new(BufferInner {
            block,
            species: RefCell::new(None),
        }))
    }

    /// Creates a zero-filled exclusive buffer of `byte_length` bytes.
    pub fn new(byte_length: usize) -> Self {
        Self::from_block(Block::Exclusive(RefCell::new(Some(BytesMut::zeroed(
            byte_length,
        )))))
    }

    /// Creates an exclusive buffer that takes over storage previously
    /// transferred out of another buffer (or any other `Bytes`).
    ///
    /// # Example
    ///
    /// ```
    /// use tarray::ArrayBuffer;
    ///
    /// let a = ArrayBuffer::new(4);
    /// let storage = a.detach().unwrap();
    /// let b = ArrayBuffer::from_bytes(storage);
    ///
    /// assert!(a.is_detached());
    /// assert_eq!(b.byte_length(), 4);
    /// ```
    pub fn from_bytes(storage: Bytes) -> Self {
        Self::from_block(Block::Exclusive(RefCell::new(Some(BytesMut::from(storage)))))
    }

    /// Creates a zero-filled shared buffer of `byte_length` bytes.
    #[cfg(feature = "shared")]
    pub fn new_shared(byte_length: usize) -> Self {
        Self::from_shared_block(Arc::new(SharedBlock::new(byte_length)))
    }

    /// Wraps an existing shared block, e.g. one handed over from another
    /// agent via [`ArrayBuffer::shared_block`].
    #[cfg(feature = "shared")]
    pub fn from_shared_block(block: Arc<SharedBlock>) -> Self {
        Self::from_block(Block::Shared(block))
    }

    /// Returns the shared block behind this buffer, or `None` for exclusive
    /// buffers.
    #[cfg(feature = "shared")]
    pub fn shared_block(&self) -> Option<Arc<SharedBlock>> {
        match &self.0.block {
            Block::Shared(block) => Some(block.clone()),
            Block::Exclusive(_) => None,
        }
    }

    /// Returns `true` if this buffer can never detach.
    #[inline]
    pub fn is_shared(&self) -> bool {
        match &self.0.block {
            Block::Exclusive(_) => false,
            #[cfg(feature = "shared")]
            Block::Shared(_) => true,
        }
    }

    /// Returns `true` once the storage has been transferred out. Always
    /// `false` for shared buffers.
    #[inline]
    pub fn is_detached(&self) -> bool {
        match &self.0.block {
            Block::Exclusive(cell) => cell.borrow().is_none(),
            #[cfg(feature = "shared")]
            Block::Shared(_) => false,
        }
    }

    /// Fails with [`Error::Detached`] if the storage has been released.
    #[inline]
    pub fn require_attached(&self) -> Result<()> {
        if self.is_detached() {
            cold_path();
            return Err(Error::Detached);
        }
        Ok(())
    }

    /// Returns the length in bytes, `0` once detached.
    pub fn byte_length(&self) -> usize {
        match &self.0.block {
            Block::Exclusive(cell) => cell.borrow().as_ref().map_or(0, BytesMut::len),
            #[cfg(feature = "shared")]
            Block::Shared(block) => block.len(),
        }
    }

    /// Detaches the buffer, transferring its storage out.
    ///
    /// Every view over this buffer becomes permanently unreadable. Fails with
    /// [`Error::NotDetachable`] for shared buffers and [`Error::Detached`] if
    /// already detached.
    pub fn detach(&self) -> Result<Bytes> {
        match &self.0.block {
            Block::Exclusive(cell) => match cell.borrow_mut().take() {
                Some(storage) => Ok(storage.freeze()),
                None => {
                    cold_path();
                    Err(Error::Detached)
                }
            },
            #[cfg(feature = "shared")]
            Block::Shared(_) => {
                cold_path();
                Err(Error::NotDetachable)
            }
        }
    }

    /// Returns `true` if both handles refer to the same buffer object.
    #[inline]
    pub fn ptr_eq(&self, other: &ArrayBuffer) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` if both buffers read and write the same bytes. Distinct
    /// buffer objects can share storage when they wrap the same shared block.
    pub(crate) fn same_storage(&self, other: &ArrayBuffer) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (&self.0.block, &other.0.block) {
            #[cfg(feature = "shared")]
            (Block::Shared(a), Block::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Installs (or clears) the hook consulted by [`ArrayBuffer::slice`] to
    /// construct its result.
    pub fn set_species(&self, species: Option<Rc<dyn BufferSpecies>>) {
        *self.0.species.borrow_mut() = species;
    }

    pub fn species(&self) -> Option<Rc<dyn BufferSpecies>> {
        self.0.species.borrow().clone()
    }

    /// Copies the whole contents out.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.read_vec(0, self.byte_length())
    }

    pub(crate) fn read_vec(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let mut out = vec![0; len];
        self.read(offset, &mut out)?;
        Ok(out)
    }

    /// Reads `out.len()` bytes starting at `offset`.
    pub(crate) fn read(&self, offset: usize, out: &mut [u8]) -> Result<()> {
        match &self.0.block {
            Block::Exclusive(cell) => {
                let storage = cell.borrow();
                let storage = attached(storage.as_ref())?;
                let src = storage
                    .get(offset..offset + out.len())
                    .ok_or(Error::OutOfBounds)?;
                out.copy_from_slice(src);
                Ok(())
            }
            #[cfg(feature = "shared")]
            Block::Shared(block) => block.load(offset, out),
        }
    }

    /// Writes `src` starting at `offset`.
    pub(crate) fn write(&self, offset: usize, src: &[u8]) -> Result<()> {
        match &self.0.block {
            Block::Exclusive(cell) => {
                let mut storage = cell.borrow_mut();
                let storage = attached(storage.as_mut())?;
                let dst = storage
                    .get_mut(offset..offset + src.len())
                    .ok_or(Error::OutOfBounds)?;
                dst.copy_from_slice(src);
                Ok(())
            }
            #[cfg(feature = "shared")]
            Block::Shared(block) => block.store(offset, src),
        }
    }

    /// Moves `len` bytes from `src` to `dst` within this buffer, correct for
    /// overlapping ranges.
    pub(crate) fn copy_within(&self, src: usize, dst: usize, len: usize) -> Result<()> {
        match &self.0.block {
            Block::Exclusive(cell) => {
                let mut storage = cell.borrow_mut();
                let storage = attached(storage.as_mut())?;
                if src.max(dst) + len > storage.len() {
                    cold_path();
                    return Err(Error::OutOfBounds);
                }
                storage.copy_within(src..src + len, dst);
                Ok(())
            }
            #[cfg(feature = "shared")]
            Block::Shared(block) => block.copy_within(src, dst, len),
        }
    }

    /// Copies `len` bytes from `src[src_offset..]` into `self[dst_offset..]`,
    /// handling the case where both buffers share storage.
    pub(crate) fn copy_from(
        &self,
        dst_offset: usize,
        src: &ArrayBuffer,
        src_offset: usize,
        len: usize,
    ) -> Result<()> {
        if self.same_storage(src) {
            return self.copy_within(src_offset, dst_offset, len);
        }
        let bytes = src.read_vec(src_offset, len)?;
        self.write(dst_offset, &bytes)
    }
}

#[inline]
fn attached<T>(storage: Option<T>) -> Result<T> {
    storage.ok_or_else(|| {
        cold_path();
        Error::Detached
    })
}

/// Liveness check on a possibly absent buffer: an absent buffer has never
/// been exposed and cannot be detached, and shared buffers never detach.
#[inline]
pub fn is_detached_buffer(buffer: Option<&ArrayBuffer>) -> bool {
    buffer.is_some_and(ArrayBuffer::is_detached)
}

impl fmt::Debug for ArrayBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayBuffer")
            .field("byte_length", &self.byte_length())
            .field("shared", &self.is_shared())
            .field("detached", &self.is_detached())
            .finish()
    }
}

/// Storage of a shared buffer: a fixed run of bytes that several agents may
/// read and write. Each byte access is a relaxed atomic; multi-byte element
/// accesses are not atomic as a whole.
#[cfg(feature = "shared")]
pub struct SharedBlock {
    cells: Box<[AtomicU8]>,
}

#[cfg(feature = "shared")]
impl SharedBlock {
    pub fn new(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| AtomicU8::new(0)).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn range(&self, offset: usize, len: usize) -> Result<&[AtomicU8]> {
        self.cells.get(offset..offset + len).ok_or_else(|| {
            cold_path();
            Error::OutOfBounds
        })
    }

    fn load(&self, offset: usize, out: &mut [u8]) -> Result<()> {
        let cells = self.range(offset, out.len())?;
        for (dst, cell) in out.iter_mut().zip(cells) {
            *dst = cell.load(Ordering::Relaxed);
        }
        Ok(())
    }

    fn store(&self, offset: usize, src: &[u8]) -> Result<()> {
        for (cell, byte) in self.range(offset, src.len())?.iter().zip(src) {
            cell.store(*byte, Ordering::Relaxed);
        }
        Ok(())
    }

    fn copy_within(&self, src: usize, dst: usize, len: usize) -> Result<()> {
        let from = self.range(src, len)?;
        let to = self.range(dst, len)?;
        if dst <= src {
            for (d, s) in to.iter().zip(from) {
                d.store(s.load(Ordering::Relaxed), Ordering::Relaxed);
            }
        } else {
            // destination starts inside the source run: walk backwards
            for (d, s) in to.iter().zip(from).rev() {
                d.store(s.load(Ordering::Relaxed), Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

#[cfg(feature = "shared")]
impl fmt::Debug for SharedBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBlock").field("len", &self.len()).finish()
    }
}
