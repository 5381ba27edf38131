use std::cmp::Ordering;
use std::fmt;
use std::slice;

use crate::bytes::{ByteOffset, ByteSpan};
use crate::data::Block;
use crate::error::{Error, Result};

/// Blocks of a mapfile; every block ends where the next one starts.
#[derive(Debug, Default, PartialEq, Eq, Clone, Hash)]
pub struct RescueMap {
    blocks: Vec<Block>,
}

fn locate(block: &Block, position: ByteOffset) -> Ordering {
    if block.end() <= position {
        Ordering::Less
    } else if block.start() > position {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

impl RescueMap {
    pub fn new() -> RescueMap {
        RescueMap::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Result<RescueMap> {
        for block in &blocks {
            if !block.start().is_set() {
                return Err(Error::InvalidNumber {
                    token: block.start().get().to_string(),
                });
            }
            if block.length().get() <= 0 {
                return Err(Error::NonPositiveLength {
                    block_start: block.start(),
                });
            }
            block
                .start()
                .checked_add(block.length())
                .ok_or(Error::OffsetOverflow)?;
        }
        for pair in blocks.windows(2) {
            if pair[0].end() != pair[1].start() {
                return Err(Error::NonContiguousMap {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(RescueMap { blocks })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// First byte of the map, [`ByteOffset::UNSET`] when empty.
    pub fn start(&self) -> ByteOffset {
        self.blocks
            .first()
            .map_or(ByteOffset::UNSET, |block| block.start())
    }

    pub fn end(&self) -> ByteOffset {
        self.blocks
            .last()
            .map_or(ByteOffset::UNSET, |block| block.end())
    }

    pub fn size(&self) -> ByteSpan {
        if self.blocks.is_empty() {
            return ByteSpan::ZERO;
        }
        self.end() - self.start()
    }

    pub fn block_at(&self, position: ByteOffset) -> Option<&Block> {
        self.blocks
            .binary_search_by(|block| locate(block, position))
            .ok()
            .map(|found| &self.blocks[found])
    }

    pub fn error_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| block.status().is_failed())
            .count()
    }

    /// Index of the first block that does not end before `position`.
    fn first_overlap(&self, position: ByteOffset) -> usize {
        match self
            .blocks
            .binary_search_by(|block| locate(block, position))
        {
            Ok(found) => found,
            Err(found) => found,
        }
    }

    /// Copies the part of the map covering `[start, start + size)`.
    ///
    /// Blocks crossing the range boundaries are cut to the range and keep
    /// their status. Ranges outside the map give an empty map.
    pub fn extract(&self, start: ByteOffset, size: ByteSpan) -> RescueMap {
        let mut blocks = Vec::new();
        if size.get() <= 0 {
            return RescueMap { blocks };
        }
        let extract_start = start;
        let extract_finish = start
            .checked_add(size)
            .unwrap_or_else(|| ByteOffset::new(i64::MAX));

        for block in &self.blocks[self.first_overlap(extract_start)..] {
            let block_start = block.start();
            let block_finish = block.end();
            let status = block.status();

            // block before the extract
            if block_finish <= extract_start {
                continue;
            }

            // extract starts inside the block, block ends inside the extract
            if block_start <= extract_start
                && extract_start < block_finish
                && block_finish <= extract_finish
            {
                blocks.push(Block::new(
                    extract_start,
                    block_finish - extract_start,
                    status,
                ));
                continue;
            }

            // extract entirely inside the block
            if block_start <= extract_start
                && extract_start < extract_finish
                && extract_finish <= block_finish
            {
                blocks.push(Block::new(
                    extract_start,
                    extract_finish - extract_start,
                    status,
                ));
                break;
            }

            // block entirely inside the extract
            if extract_start <= block_start && block_finish <= extract_finish {
                blocks.push(*block);
                continue;
            }

            // block starts inside the extract and ends after it
            if extract_start <= block_start
                && block_start < extract_finish
                && extract_finish <= block_finish
            {
                blocks.push(Block::new(
                    block_start,
                    extract_finish - block_start,
                    status,
                ));
                break;
            }

            // block after the extract
            if extract_finish <= block_start {
                break;
            }

            unreachable!(
                "extract [{}, {}) has no overlap case with block ({})",
                extract_start, extract_finish, block
            );
        }
        RescueMap { blocks }
    }
}

impl<'a> IntoIterator for &'a RescueMap {
    type Item = &'a Block;
    type IntoIter = slice::Iter<'a, Block>;

    fn into_iter(self) -> slice::Iter<'a, Block> {
        self.blocks.iter()
    }
}

impl fmt::Display for RescueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            writeln!(f, "{}", block)?;
        }
        Ok(())
    }
}
