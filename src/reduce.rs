//! Element types and the reduction operators applied to them.

use crate::types::{DataType, ReduceOp};

/// A fixed-width value that can be carried in a message and reduced.
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    const DATA_TYPE: DataType;

    /// Write `self` as little-endian into the first `DATA_TYPE.size_in_bytes()` bytes.
    fn write_le(self, out: &mut [u8]);

    /// Read a value from the first `DATA_TYPE.size_in_bytes()` bytes.
    fn read_le(bytes: &[u8]) -> Self;

    /// Combine two values with a built-in operation.
    fn reduce(a: Self, b: Self, op: ReduceOp) -> Self;
}

macro_rules! impl_element {
    (int: $($ty:ty => $dt:ident),*) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dt;

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out[..size_of::<$ty>()].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..size_of::<$ty>()]);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn reduce(a: Self, b: Self, op: ReduceOp) -> Self {
                    match op {
                        ReduceOp::Sum => a.wrapping_add(b),
                        ReduceOp::Prod => a.wrapping_mul(b),
                        ReduceOp::Min => a.min(b),
                        ReduceOp::Max => a.max(b),
                    }
                }
            }
        )*
    };
    (float: $($ty:ty => $dt:ident),*) => {
        $(
            impl Element for $ty {
                const DATA_TYPE: DataType = DataType::$dt;

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out[..size_of::<$ty>()].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..size_of::<$ty>()]);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn reduce(a: Self, b: Self, op: ReduceOp) -> Self {
                    match op {
                        ReduceOp::Sum => a + b,
                        ReduceOp::Prod => a * b,
                        ReduceOp::Min => a.min(b),
                        ReduceOp::Max => a.max(b),
                    }
                }
            }
        )*
    };
}

impl_element!(int: i8 => I8, i16 => I16, i32 => I32, i64 => I64, u8 => U8, u16 => U16, u32 => U32, u64 => U64);
impl_element!(float: f32 => F32, f64 => F64);

/// Binary combination over `T`.
///
/// Reductions, scans and all-reduce only produce reproducible results when
/// `combine` is commutative and associative.
pub trait Operator<T>: Send + Sync {
    fn combine(&self, a: T, b: T) -> T;
}

impl<T: Element> Operator<T> for ReduceOp {
    #[inline]
    fn combine(&self, a: T, b: T) -> T {
        T::reduce(a, b, *self)
    }
}

/// Adapts a closure into an [`Operator`].
///
/// ```
/// use meshcomm::{FnOp, Operator};
///
/// let xor = FnOp(|a: u32, b: u32| a ^ b);
/// assert_eq!(xor.combine(0b1100, 0b1010), 0b0110);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnOp<F>(pub F);

impl<T, F> Operator<T> for FnOp<F>
where
    F: Fn(T, T) -> T + Send + Sync,
{
    #[inline]
    fn combine(&self, a: T, b: T) -> T {
        (self.0)(a, b)
    }
}
