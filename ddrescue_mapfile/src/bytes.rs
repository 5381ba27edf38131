use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::parse::parse_number;

/// Position in the rescue domain, in bytes. Negative means unset.
#[derive(Debug, PartialEq, Eq, Ord, PartialOrd, Clone, Copy, Hash)]
pub struct ByteOffset(i64);

#[derive(Debug, Default, PartialEq, Eq, Ord, PartialOrd, Clone, Copy, Hash)]
pub struct ByteSpan(i64);

impl ByteOffset {
    pub const UNSET: ByteOffset = ByteOffset(-1);
    pub const ZERO: ByteOffset = ByteOffset(0);

    pub const fn new(position: i64) -> ByteOffset {
        ByteOffset(position)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_set(self) -> bool {
        self.0 >= 0
    }

    pub fn checked_add(self, span: ByteSpan) -> Option<ByteOffset> {
        self.0.checked_add(span.0).map(ByteOffset)
    }
}

impl Default for ByteOffset {
    fn default() -> ByteOffset {
        ByteOffset::UNSET
    }
}

impl ByteSpan {
    pub const ZERO: ByteSpan = ByteSpan(0);

    pub const fn new(length: i64) -> ByteSpan {
        ByteSpan(length)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: ByteSpan) -> Option<ByteSpan> {
        self.0.checked_add(other.0).map(ByteSpan)
    }

    pub fn checked_mul(self, factor: i64) -> Option<ByteSpan> {
        self.0.checked_mul(factor).map(ByteSpan)
    }

    pub fn div_ceil(self, divisor: ByteSpan) -> Result<i64> {
        if divisor.0 == 0 {
            return Err(Error::DivisionByZero);
        }
        let quotient = self.0 / divisor.0;
        if self.0 % divisor.0 != 0 {
            Ok(quotient + 1)
        } else {
            Ok(quotient)
        }
    }
}

/// # Panics
///
/// Panics if the sum does not fit in an `i64`, like primitive arithmetic.
impl Add<ByteSpan> for ByteOffset {
    type Output = ByteOffset;

    fn add(self, span: ByteSpan) -> ByteOffset {
        self.checked_add(span)
            .unwrap_or_else(|| panic!("byte offset overflow: {} + {}", self, span))
    }
}

/// Distance between two positions, clamped to an empty span when `other`
/// lies after `self`.
impl Sub for ByteOffset {
    type Output = ByteSpan;

    fn sub(self, other: ByteOffset) -> ByteSpan {
        ByteSpan(self.0.saturating_sub(other.0).max(0))
    }
}

impl Add for ByteSpan {
    type Output = ByteSpan;

    fn add(self, other: ByteSpan) -> ByteSpan {
        self.checked_add(other)
            .unwrap_or_else(|| panic!("byte span overflow: {} + {}", self, other))
    }
}

impl AddAssign for ByteSpan {
    fn add_assign(&mut self, other: ByteSpan) {
        *self = *self + other;
    }
}

impl Mul<i64> for ByteSpan {
    type Output = ByteSpan;

    fn mul(self, factor: i64) -> ByteSpan {
        self.checked_mul(factor)
            .unwrap_or_else(|| panic!("byte span overflow: {} * {}", self, factor))
    }
}

/// Exact division: the divisor must split the span into whole pieces.
impl Div for ByteSpan {
    type Output = Result<i64>;

    fn div(self, divisor: ByteSpan) -> Result<i64> {
        if divisor.0 == 0 {
            return Err(Error::DivisionByZero);
        }
        if self.0 % divisor.0 != 0 {
            return Err(Error::DivisionRemainder {
                dividend: self,
                divisor,
            });
        }
        Ok(self.0 / divisor.0)
    }
}

impl Sum for ByteSpan {
    fn sum<I: Iterator<Item = ByteSpan>>(iter: I) -> ByteSpan {
        iter.fold(ByteSpan::ZERO, Add::add)
    }
}

impl From<i64> for ByteOffset {
    fn from(position: i64) -> ByteOffset {
        ByteOffset(position)
    }
}

impl From<i64> for ByteSpan {
    fn from(length: i64) -> ByteSpan {
        ByteSpan(length)
    }
}

impl FromStr for ByteOffset {
    type Err = Error;

    fn from_str(token: &str) -> Result<ByteOffset> {
        parse_number(token).map(ByteOffset)
    }
}

impl FromStr for ByteSpan {
    type Err = Error;

    fn from_str(token: &str) -> Result<ByteSpan> {
        parse_number(token).map(ByteSpan)
    }
}

// ddrescue writes positions and sizes as 0x%08llX.
impl fmt::Display for ByteOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "{:#010X}", self.0)
        } else {
            f.write_str("unset")
        }
    }
}

impl fmt::Display for ByteSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}
