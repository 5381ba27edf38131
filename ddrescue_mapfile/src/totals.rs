use std::fmt;
use std::iter::FromIterator;
use std::ops::{Add, AddAssign};

use crate::bytes::ByteSpan;
use crate::data::{Block, BlockStatus};
use crate::map::RescueMap;

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct RescueTotals {
    non_tried: ByteSpan,
    non_trimmed: ByteSpan,
    non_scraped: ByteSpan,
    bad_sector: ByteSpan,
    rescued: ByteSpan,
    unknown: ByteSpan,
}

impl RescueTotals {
    pub fn new() -> RescueTotals {
        RescueTotals::default()
    }

    pub fn reset(&mut self) {
        *self = RescueTotals::default();
    }

    pub fn add_span(&mut self, length: ByteSpan, status: BlockStatus) {
        match status {
            BlockStatus::NonTried => self.non_tried += length,
            BlockStatus::NonTrimmed => self.non_trimmed += length,
            BlockStatus::NonScraped => self.non_scraped += length,
            BlockStatus::BadSector => self.bad_sector += length,
            BlockStatus::Rescued => self.rescued += length,
        }
    }

    pub fn add_unknown(&mut self, length: ByteSpan) {
        self.unknown += length;
    }

    pub fn get(&self, status: BlockStatus) -> ByteSpan {
        match status {
            BlockStatus::NonTried => self.non_tried,
            BlockStatus::NonTrimmed => self.non_trimmed,
            BlockStatus::NonScraped => self.non_scraped,
            BlockStatus::BadSector => self.bad_sector,
            BlockStatus::Rescued => self.rescued,
        }
    }

    pub fn non_tried(&self) -> ByteSpan {
        self.non_tried
    }

    pub fn non_trimmed(&self) -> ByteSpan {
        self.non_trimmed
    }

    pub fn non_scraped(&self) -> ByteSpan {
        self.non_scraped
    }

    pub fn bad_sector(&self) -> ByteSpan {
        self.bad_sector
    }

    pub fn rescued(&self) -> ByteSpan {
        self.rescued
    }

    pub fn unknown(&self) -> ByteSpan {
        self.unknown
    }

    pub fn total(&self) -> ByteSpan {
        BlockStatus::ALL
            .iter()
            .map(|&status| self.get(status))
            .sum::<ByteSpan>()
            + self.unknown
    }

    pub fn is_empty(&self) -> bool {
        self.total().is_zero()
    }

    pub fn dominant_status(&self) -> Option<BlockStatus> {
        BlockStatus::ALL
            .iter()
            .copied()
            .filter(|&status| !self.get(status).is_zero())
            .max_by_key(|status| status.weight())
    }
}

impl<'a> From<&'a RescueMap> for RescueTotals {
    fn from(map: &RescueMap) -> RescueTotals {
        map.iter().collect()
    }
}

impl<'a> Extend<&'a Block> for RescueTotals {
    fn extend<I: IntoIterator<Item = &'a Block>>(&mut self, blocks: I) {
        for block in blocks {
            self.add_span(block.length(), block.status());
        }
    }
}

impl<'a> FromIterator<&'a Block> for RescueTotals {
    fn from_iter<I: IntoIterator<Item = &'a Block>>(blocks: I) -> RescueTotals {
        let mut totals = RescueTotals::default();
        totals.extend(blocks);
        totals
    }
}

impl Add for RescueTotals {
    type Output = RescueTotals;

    fn add(mut self, other: RescueTotals) -> RescueTotals {
        self += other;
        self
    }
}

impl AddAssign for RescueTotals {
    fn add_assign(&mut self, other: RescueTotals) {
        self.non_tried += other.non_tried;
        self.non_trimmed += other.non_trimmed;
        self.non_scraped += other.non_scraped;
        self.bad_sector += other.bad_sector;
        self.rescued += other.rescued;
        self.unknown += other.unknown;
    }
}

impl fmt::Display for RescueTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "?={} *={} /={} -={} +={} unknown={}",
            self.non_tried,
            self.non_trimmed,
            self.non_scraped,
            self.bad_sector,
            self.rescued,
            self.unknown
        )
    }
}
