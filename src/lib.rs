//! # cbuffer - interrupt-safe circular byte buffer
//!
//! A fixed-capacity byte ring buffer laid over memory the caller owns, meant
//! for one producer (typically an interrupt handler) and one consumer
//! (typically the main loop).
//!
//! ## Design
//!
//! - No allocation; the region is borrowed at `init` and never resized
//! - Capacity is `size - 1`, so the two cursors alone tell full from empty
//! - `writer` is stored only by the producer, `reader` only by the consumer
//! - Cursors are atomics published with release stores, so neither side
//!   needs a lock or masked interrupts
//! - Bytes that do not fit are dropped and counted in `overflow`
//! - `split` hands out one [`Producer`] and one [`Consumer`] that can live
//!   in different threads or interrupt contexts
//!
//! ## Example
//!
//! ```
//! use cbuffer::CircularBuffer;
//!
//! let mut storage = [0u8; 6];
//! let mut cb = CircularBuffer::with_region(&mut storage, 6).unwrap();
//!
//! assert_eq!(cb.write(&[0, 1, 2, 3, 4]), 5);
//! assert_eq!(cb.space_count(), 0);
//!
//! let (_producer, mut consumer) = cb.split();
//! let mut out = [0u8; 5];
//! assert_eq!(consumer.read(&mut out), 5);
//! assert_eq!(out, [0, 1, 2, 3, 4]);
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

mod ring_buffer;

pub use ring_buffer::{CircularBuffer, Consumer, Producer, ResultCode, CB_MAX_SIZE};
