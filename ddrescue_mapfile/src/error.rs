use crate::bytes::{ByteOffset, ByteSpan};
use crate::data::Block;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("line {line}: malformed mapfile line {text:?}: {cause}")]
    MalformedLine {
        line: usize,
        text: String,
        #[source]
        cause: Box<Error>,
    },

    #[error("invalid number: {token:?}")]
    InvalidNumber { token: String },

    #[error("invalid status or operation character: {token:?}")]
    InvalidEnumChar { token: String },

    #[error("invalid pass number: {token:?}")]
    InvalidPass { token: String },

    #[error("unexpected number of fields: {count}")]
    TokenCount { count: usize },

    #[error("block at {block_start} has a zero length")]
    NonPositiveLength { block_start: ByteOffset },

    #[error("block end overflows a 64-bit byte offset")]
    OffsetOverflow,

    #[error("line {line}: second status line {text:?}")]
    DuplicateStatusLine { line: usize, text: String },

    #[error("blocks are not contiguous: ({previous}) is followed by ({next})")]
    NonContiguousMap { previous: Block, next: Block },

    #[error("{dividend} is not a multiple of {divisor}")]
    DivisionRemainder { dividend: ByteSpan, divisor: ByteSpan },

    #[error("division by a zero byte span")]
    DivisionByZero,

    #[error("a grid of {columns} x {rows} squares is too large")]
    GridTooLarge { columns: usize, rows: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
