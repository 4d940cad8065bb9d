use std::ops::RangeInclusive;

/// Rank of a participant in a communicator (0-indexed).
pub type Rank = u32;

/// Label distinguishing message streams between the same pair of ranks.
pub type Tag = u32;

/// Tag used by operations called without an explicit one.
pub const DEFAULT_TAG: Tag = 0;

/// Element types that can travel in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    I8 = 0,
    I16 = 1,
    I32 = 2,
    I64 = 3,
    U8 = 4,
    U16 = 5,
    U32 = 6,
    U64 = 7,
    F32 = 8,
    F64 = 9,
}

impl DataType {
    /// Size of one element in bytes.
    pub const fn size_in_bytes(self) -> usize {
        match self {
            DataType::I8 | DataType::U8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
        }
    }

    /// Decode the one-byte wire code written by `as u8`.
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => DataType::I8,
            1 => DataType::I16,
            2 => DataType::I32,
            3 => DataType::I64,
            4 => DataType::U8,
            5 => DataType::U16,
            6 => DataType::U32,
            7 => DataType::U64,
            8 => DataType::F32,
            9 => DataType::F64,
            _ => return None,
        })
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Built-in reduction operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    /// Element-wise sum across ranks.
    Sum,
    /// Element-wise product across ranks.
    Prod,
    /// Element-wise minimum across ranks.
    Min,
    /// Element-wise maximum across ranks.
    Max,
}

impl std::fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReduceOp::Sum => f.write_str("sum"),
            ReduceOp::Prod => f.write_str("prod"),
            ReduceOp::Min => f.write_str("min"),
            ReduceOp::Max => f.write_str("max"),
        }
    }
}

/// Which sender a receive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Rank(Rank),
    /// Any rank of the communicator, including this one.
    Any,
}

impl Source {
    pub fn matches(self, rank: Rank) -> bool {
        match self {
            Source::Rank(r) => r == rank,
            Source::Any => true,
        }
    }
}

impl From<Rank> for Source {
    fn from(rank: Rank) -> Self {
        Source::Rank(rank)
    }
}

/// Which tags a receive accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagMatch {
    Exact(Tag),
    /// Inclusive on both ends.
    Range { lo: Tag, hi: Tag },
    Any,
}

impl TagMatch {
    pub fn matches(self, tag: Tag) -> bool {
        match self {
            TagMatch::Exact(t) => t == tag,
            TagMatch::Range { lo, hi } => lo <= tag && tag <= hi,
            TagMatch::Any => true,
        }
    }
}

impl From<Tag> for TagMatch {
    fn from(tag: Tag) -> Self {
        TagMatch::Exact(tag)
    }
}

impl From<RangeInclusive<Tag>> for TagMatch {
    fn from(range: RangeInclusive<Tag>) -> Self {
        TagMatch::Range {
            lo: *range.start(),
            hi: *range.end(),
        }
    }
}

/// Outcome of a completed receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommStatus {
    /// Rank that sent the message.
    pub source: Rank,
    /// Tag the message was sent under.
    pub tag: Tag,
    /// Number of items in the message as sent.
    pub count: usize,
}
