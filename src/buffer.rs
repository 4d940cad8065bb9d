//! Buffers that operations read from and write into.
//!
//! Any `[T]` (and `Vec<T>`) of an [`Element`] type is a buffer. Two derived
//! views exist on top of a slice:
//!
//! - [`ReductionView`]: inbound items are combined with the existing contents
//!   through an [`Operator`] instead of overwriting them.
//! - a temporary view ([`BufExt::temporary_view`]): a scratch buffer of the
//!   same length for staging inbound data.

use crate::reduce::{Element, Operator};
use crate::types::DataType;

/// Byte-level access used by the transport.
pub trait Buf: Send + Sync {
    /// Element type of every item in the buffer.
    fn data_type(&self) -> DataType;

    /// Length in items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode every item into little-endian bytes.
    fn pack(&self) -> Vec<u8>;

    /// Store the first `min(self.len(), count)` items of `bytes`.
    ///
    /// Items past that point are left untouched. Returns the number stored.
    fn unpack(&mut self, bytes: &[u8], count: usize) -> usize;
}

fn pack_items<T: Element>(items: &[T]) -> Vec<u8> {
    let width = T::DATA_TYPE.size_in_bytes();
    let mut out = vec![0u8; items.len() * width];
    for (chunk, item) in out.chunks_exact_mut(width).zip(items) {
        item.write_le(chunk);
    }
    out
}

/// Number of whole items available in `bytes`, capped at `count` and `cap`.
fn storable(bytes: &[u8], count: usize, cap: usize, width: usize) -> usize {
    let available = if width == 0 { 0 } else { bytes.len() / width };
    count.min(cap).min(available)
}

impl<T: Element> Buf for [T] {
    fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn pack(&self) -> Vec<u8> {
        pack_items(self)
    }

    fn unpack(&mut self, bytes: &[u8], count: usize) -> usize {
        let width = T::DATA_TYPE.size_in_bytes();
        let n = storable(bytes, count, <[T]>::len(self), width);
        for (slot, chunk) in self[..n].iter_mut().zip(bytes.chunks_exact(width)) {
            *slot = T::read_le(chunk);
        }
        n
    }
}

impl<T: Element> Buf for Vec<T> {
    fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn pack(&self) -> Vec<u8> {
        pack_items(self)
    }

    fn unpack(&mut self, bytes: &[u8], count: usize) -> usize {
        self.as_mut_slice().unpack(bytes, count)
    }
}

/// A view whose writes combine with the existing contents.
pub struct ReductionView<'a, T, O> {
    data: &'a mut [T],
    op: &'a O,
}

impl<'a, T: Element, O: Operator<T>> ReductionView<'a, T, O> {
    pub fn new(data: &'a mut [T], op: &'a O) -> Self {
        Self { data, op }
    }

    /// Combine `src` into the view item by item, truncating to the shorter length.
    pub fn merge_from(&mut self, src: &[T]) -> usize {
        let n = self.data.len().min(src.len());
        for (dst, &item) in self.data[..n].iter_mut().zip(src) {
            *dst = self.op.combine(*dst, item);
        }
        n
    }
}

impl<T: Element, O: Operator<T>> Buf for ReductionView<'_, T, O> {
    fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn pack(&self) -> Vec<u8> {
        pack_items(self.data)
    }

    fn unpack(&mut self, bytes: &[u8], count: usize) -> usize {
        let width = T::DATA_TYPE.size_in_bytes();
        let n = storable(bytes, count, self.data.len(), width);
        for (dst, chunk) in self.data[..n].iter_mut().zip(bytes.chunks_exact(width)) {
            *dst = self.op.combine(*dst, T::read_le(chunk));
        }
        n
    }
}

/// Slice helpers shared by the collective algorithms.
pub trait BufExt<T: Element> {
    /// Copy from `src`, truncating to the shorter of the two lengths.
    fn copy_from_truncating(&mut self, src: &[T]) -> usize;

    /// A view that merges inbound data into `self` with `op`.
    fn reduction_view<'a, O: Operator<T>>(&'a mut self, op: &'a O) -> ReductionView<'a, T, O>;

    /// A scratch buffer with the same length as `self`.
    fn temporary_view(&self) -> Vec<T>;
}

impl<T: Element> BufExt<T> for [T] {
    fn copy_from_truncating(&mut self, src: &[T]) -> usize {
        let n = self.len().min(src.len());
        self[..n].copy_from_slice(&src[..n]);
        n
    }

    fn reduction_view<'a, O: Operator<T>>(&'a mut self, op: &'a O) -> ReductionView<'a, T, O> {
        ReductionView::new(self, op)
    }

    fn temporary_view(&self) -> Vec<T> {
        vec![T::default(); self.len()]
    }
}
