use std::convert::TryFrom;

use tracing::debug;

use crate::bytes::{ByteOffset, ByteSpan};
use crate::color::SquareColor;
use crate::data::Mapfile;
use crate::error::{Error, Result};
use crate::map::RescueMap;
use crate::totals::RescueTotals;

pub const MAX_SQUARES: usize = 1 << 20;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Square {
    pub index: usize,
    pub start: ByteOffset,
    pub size: ByteSpan,
    pub totals: RescueTotals,
    pub color: SquareColor,
}

/// Layout of a map on a `columns x rows` grid of equally sized squares.
///
/// Squares are a whole number of sectors, just large enough for the grid to
/// cover the map. Trailing squares past the end of the map have no data.
#[derive(Debug, Clone)]
pub struct HeatMap<'a> {
    map: &'a RescueMap,
    columns: usize,
    rows: usize,
    len: usize,
    sector_size: ByteSpan,
    square_size: ByteSpan,
}

impl<'a> HeatMap<'a> {
    pub fn new(
        map: &'a RescueMap,
        columns: usize,
        rows: usize,
        sector_size: ByteSpan,
    ) -> Result<HeatMap<'a>> {
        let columns = columns.max(1);
        let rows = rows.max(1);
        if sector_size.get() <= 0 {
            return Err(Error::DivisionByZero);
        }
        let len = columns
            .checked_mul(rows)
            .filter(|&len| len <= MAX_SQUARES)
            .ok_or(Error::GridTooLarge { columns, rows })?;
        let squares = len as i64;
        let sectors = map.size().div_ceil(sector_size)?;
        let mut sectors_per_square = sectors / squares;
        if sectors % squares != 0 {
            sectors_per_square += 1;
        }
        let square_size = sector_size
            .checked_mul(sectors_per_square)
            .ok_or(Error::OffsetOverflow)?;
        debug!(
            columns,
            rows,
            sectors,
            square_size = square_size.get(),
            "laid out heat map"
        );
        Ok(HeatMap {
            map,
            columns,
            rows,
            len,
            sector_size,
            square_size,
        })
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn sector_size(&self) -> ByteSpan {
        self.sector_size
    }

    /// Bytes covered by each square; zero for an empty map.
    pub fn square_size(&self) -> ByteSpan {
        self.square_size
    }

    pub fn sectors_per_square(&self) -> Result<i64> {
        self.square_size / self.sector_size
    }

    fn origin(&self) -> ByteOffset {
        if self.map.is_empty() {
            ByteOffset::ZERO
        } else {
            self.map.start()
        }
    }

    pub fn square_range(&self, index: usize) -> Option<(ByteOffset, ByteSpan)> {
        if index >= self.len() {
            return None;
        }
        let offset = self.square_size.checked_mul(i64::try_from(index).ok()?)?;
        let start = self.origin().checked_add(offset)?;
        Some((start, self.square_size))
    }

    pub fn square(&self, index: usize) -> Option<Square> {
        let (start, size) = self.square_range(index)?;
        let totals = RescueTotals::from(&self.map.extract(start, size));
        Some(Square {
            index,
            start,
            size,
            totals,
            color: SquareColor::from(&totals),
        })
    }

    pub fn squares(&self) -> impl Iterator<Item = Square> + '_ {
        (0..self.len()).filter_map(move |index| self.square(index))
    }

    /// Index of the square drawing `position`, if the map covers it.
    pub fn square_at(&self, position: ByteOffset) -> Option<usize> {
        if self.square_size.is_zero() || position < self.map.start() || position >= self.map.end() {
            return None;
        }
        let index = (position - self.map.start()).get() / self.square_size.get();
        usize::try_from(index).ok().filter(|&index| index < self.len())
    }
}

impl Mapfile {
    pub fn heat_map(&self, columns: usize, rows: usize) -> Result<HeatMap<'_>> {
        HeatMap::new(&self.map, columns, rows, self.block_size)
    }
}
