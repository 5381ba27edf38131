use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use crate::bytes::{ByteOffset, ByteSpan};
use crate::error::{Error, Result};
use crate::map::RescueMap;

/// Sector size assumed when the mapfile does not echo a `-b` option.
pub const DEFAULT_BLOCK_SIZE: ByteSpan = ByteSpan::new(512);

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum RescueOperation {
    Copying,
    Trimming,
    Scraping,
    Retrying,
    Filling,
    Generating,
    Finished,
    Unknown,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BlockStatus {
    NonTried,
    NonTrimmed,
    NonScraped,
    BadSector,
    Rescued,
}

impl RescueOperation {
    pub fn from_char(c: char) -> Option<RescueOperation> {
        match c {
            '?' => Some(RescueOperation::Copying),
            '*' => Some(RescueOperation::Trimming),
            '/' => Some(RescueOperation::Scraping),
            '-' => Some(RescueOperation::Retrying),
            'F' => Some(RescueOperation::Filling),
            'G' => Some(RescueOperation::Generating),
            '+' => Some(RescueOperation::Finished),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            RescueOperation::Copying => '?',
            RescueOperation::Trimming => '*',
            RescueOperation::Scraping => '/',
            RescueOperation::Retrying => '-',
            RescueOperation::Filling => 'F',
            RescueOperation::Generating => 'G',
            RescueOperation::Finished => '+',
            RescueOperation::Unknown => 'U',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RescueOperation::Copying => "Copying non-tried blocks",
            RescueOperation::Trimming => "Trimming non-trimmed blocks",
            RescueOperation::Scraping => "Scraping non-scraped blocks",
            RescueOperation::Retrying => "Retrying bad sectors",
            RescueOperation::Filling => "Filling specified blocks",
            RescueOperation::Generating => "Generating approximate mapfile",
            RescueOperation::Finished => "Finished",
            RescueOperation::Unknown => "Unknown operation",
        }
    }
}

impl Default for RescueOperation {
    fn default() -> RescueOperation {
        RescueOperation::Unknown
    }
}

impl BlockStatus {
    pub const ALL: [BlockStatus; 5] = [
        BlockStatus::NonTried,
        BlockStatus::NonTrimmed,
        BlockStatus::NonScraped,
        BlockStatus::BadSector,
        BlockStatus::Rescued,
    ];

    pub fn from_char(c: char) -> Option<BlockStatus> {
        match c {
            '?' => Some(BlockStatus::NonTried),
            '*' => Some(BlockStatus::NonTrimmed),
            '/' => Some(BlockStatus::NonScraped),
            '-' => Some(BlockStatus::BadSector),
            '+' => Some(BlockStatus::Rescued),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            BlockStatus::NonTried => '?',
            BlockStatus::NonTrimmed => '*',
            BlockStatus::NonScraped => '/',
            BlockStatus::BadSector => '-',
            BlockStatus::Rescued => '+',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BlockStatus::NonTried => "non-tried block",
            BlockStatus::NonTrimmed => "failed block non-trimmed",
            BlockStatus::NonScraped => "failed block non-scraped",
            BlockStatus::BadSector => "failed block bad-sector(s)",
            BlockStatus::Rescued => "block recovered",
        }
    }

    /// Weight in a square's color blend. Grows with severity so that a few
    /// bad sectors stay visible in a mostly rescued square.
    pub fn weight(self) -> u32 {
        match self {
            BlockStatus::NonTried => 1,
            BlockStatus::Rescued => 2,
            BlockStatus::NonTrimmed => 4,
            BlockStatus::NonScraped => 10,
            BlockStatus::BadSector => 40,
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            BlockStatus::NonTried => [0x40, 0x40, 0x40],
            BlockStatus::NonTrimmed => [0xff, 0xe0, 0x00],
            BlockStatus::NonScraped => [0x20, 0x20, 0xff],
            BlockStatus::BadSector => [0xff, 0x00, 0x00],
            BlockStatus::Rescued => [0x00, 0xff, 0x00],
        }
    }

    pub fn is_failed(self) -> bool {
        match self {
            BlockStatus::NonTrimmed | BlockStatus::NonScraped | BlockStatus::BadSector => true,
            BlockStatus::NonTried | BlockStatus::Rescued => false,
        }
    }
}

impl TryFrom<char> for RescueOperation {
    type Error = Error;

    fn try_from(c: char) -> Result<RescueOperation> {
        RescueOperation::from_char(c).ok_or_else(|| Error::InvalidEnumChar {
            token: c.to_string(),
        })
    }
}

impl TryFrom<char> for BlockStatus {
    type Error = Error;

    fn try_from(c: char) -> Result<BlockStatus> {
        BlockStatus::from_char(c).ok_or_else(|| Error::InvalidEnumChar {
            token: c.to_string(),
        })
    }
}

fn single_char(token: &str) -> Result<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::InvalidEnumChar {
            token: token.to_owned(),
        }),
    }
}

impl FromStr for RescueOperation {
    type Err = Error;

    fn from_str(token: &str) -> Result<RescueOperation> {
        single_char(token).and_then(RescueOperation::try_from)
    }
}

impl FromStr for BlockStatus {
    type Err = Error;

    fn from_str(token: &str) -> Result<BlockStatus> {
        single_char(token).and_then(BlockStatus::try_from)
    }
}

impl fmt::Display for RescueOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Block {
    start: ByteOffset,
    length: ByteSpan,
    status: BlockStatus,
}

impl Block {
    pub fn new(start: ByteOffset, length: ByteSpan, status: BlockStatus) -> Block {
        Block {
            start,
            length,
            status,
        }
    }

    pub fn start(&self) -> ByteOffset {
        self.start
    }

    pub fn length(&self) -> ByteSpan {
        self.length
    }

    pub fn status(&self) -> BlockStatus {
        self.status
    }

    pub fn end(&self) -> ByteOffset {
        self.start + self.length
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}  {}", self.start, self.length, self.status)
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Hash)]
pub struct RescueStatus {
    current_position: ByteOffset,
    current_operation: RescueOperation,
    current_pass: Option<u32>,
}

impl RescueStatus {
    pub fn new(
        current_position: ByteOffset,
        current_operation: RescueOperation,
        current_pass: Option<u32>,
    ) -> RescueStatus {
        RescueStatus {
            current_position,
            current_operation,
            current_pass,
        }
    }

    pub fn current_position(&self) -> ByteOffset {
        self.current_position
    }

    pub fn current_operation(&self) -> RescueOperation {
        self.current_operation
    }

    /// `None` for mapfiles written before ddrescue recorded passes.
    pub fn current_pass(&self) -> Option<u32> {
        self.current_pass
    }

    pub fn is_set(&self) -> bool {
        self.current_operation != RescueOperation::Unknown
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Hash)]
pub struct MapfileHeader {
    pub version: Option<String>,
    pub command_line: Option<String>,
    pub start_time: Option<String>,
    pub current_time: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Mapfile {
    pub header: MapfileHeader,
    pub status: RescueStatus,
    pub map: RescueMap,
    pub block_size: ByteSpan,
}
