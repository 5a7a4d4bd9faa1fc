use core::fmt;
use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicU32, Ordering};

use log::{debug, trace, warn};

/// Largest region size (in bytes) accepted by [`CircularBuffer::init`]
pub const CB_MAX_SIZE: u32 = 0x0080_0000;

/// Result codes for buffer setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// Requested size is 0, 1 or larger than [`CB_MAX_SIZE`]
    SizeInvalid,
    /// Supplied region is shorter than the requested size
    RegionTooSmall,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::SizeInvalid => {
                write!(f, "buffer size must be in 2..={}", CB_MAX_SIZE)
            }
            ResultCode::RegionTooSmall => f.write_str("region is shorter than buffer size"),
        }
    }
}

/// Byte ring buffer bound to a caller-owned region
///
/// - Single producer, single consumer
/// - Capacity is `size - 1`; one slot stays empty so full and empty differ
/// - Cursors are atomics, so neither side needs a lock or masked interrupts
pub struct CircularBuffer<'a> {
    /// Start of the borrowed region
    data: *mut u8,
    /// Total slot count
    size: u32,
    /// Next index to write, stored only by the producer
    writer: AtomicU32,
    /// Next index to read, stored only by the consumer
    reader: AtomicU32,
    /// Bytes dropped because the buffer was full, stored only by the producer
    overflow: AtomicU32,
    active: bool,
    _region: PhantomData<&'a mut [u8]>,
}

// The region is only reached through `&mut self` or through the single
// `Producer`/`Consumer` pair handed out by `split`, and those touch
// disjoint byte ranges.
unsafe impl Send for CircularBuffer<'_> {}
unsafe impl Sync for CircularBuffer<'_> {}

impl fmt::Debug for CircularBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("data", &self.data)
            .field("size", &self.size)
            .field("writer", &self.writer)
            .field("reader", &self.reader)
            .field("overflow", &self.overflow)
            .field("active", &self.active)
            .finish()
    }
}

impl Default for CircularBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CircularBuffer<'a> {
    /// Create an inactive buffer
    ///
    /// Reads and writes on it are no-ops until [`init`](Self::init) succeeds.
    pub const fn new() -> Self {
        CircularBuffer {
            data: ptr::null_mut(),
            size: 0,
            writer: AtomicU32::new(0),
            reader: AtomicU32::new(0),
            overflow: AtomicU32::new(0),
            active: false,
            _region: PhantomData,
        }
    }

    /// Create a buffer and bind it to `region` in one step
    pub fn with_region(region: &'a mut [u8], size: u32) -> Result<Self, ResultCode> {
        let mut cb = Self::new();
        cb.init(region, size)?;
        Ok(cb)
    }

    /// Bind the buffer to the first `size` bytes of `region`
    ///
    /// Cursors and the overflow counter are reset. On error the buffer is
    /// left inactive, dropping any previous binding.
    ///
    /// # Returns
    /// * `Err(ResultCode::SizeInvalid)` if `size` is not in `2..=CB_MAX_SIZE`
    /// * `Err(ResultCode::RegionTooSmall)` if `region` holds fewer than `size` bytes
    pub fn init(&mut self, region: &'a mut [u8], size: u32) -> Result<(), ResultCode> {
        self.active = false;
        self.data = ptr::null_mut();
        self.size = 0;
        self.reset_cursors();

        if size <= 1 || size > CB_MAX_SIZE {
            warn!("cbuffer: rejecting size {} (allowed 2..={})", size, CB_MAX_SIZE);
            return Err(ResultCode::SizeInvalid);
        }
        if region.len() < size as usize {
            warn!(
                "cbuffer: region of {} bytes cannot hold size {}",
                region.len(),
                size
            );
            return Err(ResultCode::RegionTooSmall);
        }

        self.data = region.as_mut_ptr();
        self.size = size;
        self.active = true;
        debug!("cbuffer: bound {} byte region, capacity {}", size, size - 1);
        Ok(())
    }

    /// Drop all buffered bytes and reset the overflow counter
    ///
    /// Region contents are left in place. `&mut self` guarantees that no
    /// producer or consumer is mid-transfer.
    pub fn clear(&mut self) {
        if !self.active {
            return;
        }
        self.reset_cursors();
        trace!("cbuffer: cleared");
    }

    /// Write as much of `src` as fits, returning the number of bytes written
    ///
    /// Bytes that do not fit are counted in [`overflow`](Self::overflow).
    pub fn write(&mut self, src: &[u8]) -> u32 {
        // Safety: `&mut self` excludes every other producer
        unsafe { self.produce(src) }
    }

    /// Read up to `dst.len()` bytes, returning the number of bytes read
    pub fn read(&mut self, dst: &mut [u8]) -> u32 {
        // Safety: `&mut self` excludes every other consumer
        unsafe { self.consume(dst) }
    }

    /// Split into a producer and a consumer that may run in different contexts
    ///
    /// While either handle is alive the buffer cannot be cleared or re-bound.
    pub fn split(&mut self) -> (Producer<'_, 'a>, Consumer<'_, 'a>) {
        let buffer: &CircularBuffer<'a> = self;
        (Producer { buffer }, Consumer { buffer })
    }

    /// Number of unread bytes
    pub fn data_count(&self) -> u32 {
        if !self.active {
            return 0;
        }
        self.used(
            self.writer.load(Ordering::Acquire),
            self.reader.load(Ordering::Acquire),
        )
    }

    /// Number of bytes that can be written before the buffer is full
    pub fn space_count(&self) -> u32 {
        if !self.active {
            return 0;
        }
        self.capacity() - self.data_count()
    }

    /// Total slot count passed to `init`, 0 when inactive
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Usable capacity in bytes (`size - 1`), 0 when inactive
    pub fn capacity(&self) -> u32 {
        self.size.saturating_sub(1)
    }

    /// Cumulative count of bytes dropped by writes since the last clear
    pub fn overflow(&self) -> u32 {
        self.overflow.load(Ordering::Relaxed)
    }

    /// Whether `init` has bound the buffer to a region
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether there is nothing to read
    pub fn is_empty(&self) -> bool {
        self.data_count() == 0
    }

    /// Whether there is no room to write
    pub fn is_full(&self) -> bool {
        self.space_count() == 0
    }

    fn reset_cursors(&mut self) {
        *self.writer.get_mut() = 0;
        *self.reader.get_mut() = 0;
        *self.overflow.get_mut() = 0;
    }

    /// Occupied slots for the given cursor pair; requires an active buffer
    fn used(&self, writer: u32, reader: u32) -> u32 {
        (writer + self.size - reader) % self.size
    }

    fn record_overflow(&self, dropped: u32) {
        let total = self.overflow.load(Ordering::Relaxed).saturating_add(dropped);
        self.overflow.store(total, Ordering::Relaxed);
        trace!("cbuffer: dropped {} bytes, overflow now {}", dropped, total);
    }

    /// Producer side of a transfer
    ///
    /// # Safety
    /// The caller must be the only context producing into this buffer.
    unsafe fn produce(&self, src: &[u8]) -> u32 {
        if !self.active || src.is_empty() {
            return 0;
        }

        let requested = u32::try_from(src.len()).unwrap_or(u32::MAX);
        let writer = self.writer.load(Ordering::Relaxed);
        let reader = self.reader.load(Ordering::Acquire);
        let free = self.capacity() - self.used(writer, reader);

        let count = requested.min(free);
        if count < requested {
            self.record_overflow(requested - count);
        }
        if count == 0 {
            return 0;
        }

        // Tail segment up to the end of the region, then the head from 0
        let tail = count.min(self.size - writer) as usize;
        let (first, second) = src[..count as usize].split_at(tail);
        ptr::copy_nonoverlapping(first.as_ptr(), self.data.add(writer as usize), first.len());
        ptr::copy_nonoverlapping(second.as_ptr(), self.data, second.len());

        self.writer
            .store((writer + count) % self.size, Ordering::Release);
        count
    }

    /// Consumer side of a transfer
    ///
    /// # Safety
    /// The caller must be the only context consuming from this buffer.
    unsafe fn consume(&self, dst: &mut [u8]) -> u32 {
        if !self.active || dst.is_empty() {
            return 0;
        }

        let requested = u32::try_from(dst.len()).unwrap_or(u32::MAX);
        let reader = self.reader.load(Ordering::Relaxed);
        let writer = self.writer.load(Ordering::Acquire);

        let count = requested.min(self.used(writer, reader));
        if count == 0 {
            return 0;
        }

        let tail = count.min(self.size - reader) as usize;
        let (first, second) = dst[..count as usize].split_at_mut(tail);
        ptr::copy_nonoverlapping(self.data.add(reader as usize), first.as_mut_ptr(), first.len());
        ptr::copy_nonoverlapping(self.data, second.as_mut_ptr(), second.len());

        self.reader
            .store((reader + count) % self.size, Ordering::Release);
        count
    }
}

/// Writing half of a split [`CircularBuffer`]
#[derive(Debug)]
pub struct Producer<'b, 'a> {
    buffer: &'b CircularBuffer<'a>,
}

impl Producer<'_, '_> {
    /// Write as much of `src` as fits, returning the number of bytes written
    pub fn write(&mut self, src: &[u8]) -> u32 {
        // Safety: `split` hands out exactly one producer per borrow
        unsafe { self.buffer.produce(src) }
    }

    /// Number of bytes that can be written right now
    pub fn space_count(&self) -> u32 {
        self.buffer.space_count()
    }

    /// Number of unread bytes
    pub fn data_count(&self) -> u32 {
        self.buffer.data_count()
    }

    /// Cumulative count of dropped bytes
    pub fn overflow(&self) -> u32 {
        self.buffer.overflow()
    }

    /// Usable capacity in bytes
    pub fn capacity(&self) -> u32 {
        self.buffer.capacity()
    }

    /// Whether there is no room to write
    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }
}

/// Reading half of a split [`CircularBuffer`]
#[derive(Debug)]
pub struct Consumer<'b, 'a> {
    buffer: &'b CircularBuffer<'a>,
}

impl Consumer<'_, '_> {
    /// Read up to `dst.len()` bytes, returning the number of bytes read
    pub fn read(&mut self, dst: &mut [u8]) -> u32 {
        // Safety: `split` hands out exactly one consumer per borrow
        unsafe { self.buffer.consume(dst) }
    }

    /// Number of unread bytes
    pub fn data_count(&self) -> u32 {
        self.buffer.data_count()
    }

    /// Number of bytes that can be written right now
    pub fn space_count(&self) -> u32 {
        self.buffer.space_count()
    }

    /// Cumulative count of dropped bytes
    pub fn overflow(&self) -> u32 {
        self.buffer.overflow()
    }

    /// Usable capacity in bytes
    pub fn capacity(&self) -> u32 {
        self.buffer.capacity()
    }

    /// Whether there is nothing to read
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
