use std::str::FromStr;

use nom::{
    alt,
    bytes::complete::tag_no_case,
    character::complete::{digit1, hex_digit1},
    map_res, named, preceded, IResult,
};
use tracing::{debug, trace, warn};

use super::bytes::{ByteOffset, ByteSpan};
use super::data::*;
use super::error::{Error, Result};
use super::map::RescueMap;

const COMMAND_LINE: &str = "# Command line:";
const START_TIME: &str = "# Start time:";
const CURRENT_TIME: &str = "# Current time:";
const VERSION: &str = "GNU ddrescue version";

fn from_hex(input: &str) -> std::result::Result<i64, std::num::ParseIntError> {
    i64::from_str_radix(input, 16)
}
fn from_dec(input: &str) -> std::result::Result<i64, std::num::ParseIntError> {
    i64::from_str_radix(input, 10)
}
fn from_dec_u32(input: &str) -> std::result::Result<u32, std::num::ParseIntError> {
    u32::from_str_radix(input, 10)
}

named!(dec_i64<&str, i64>, map_res!(digit1, from_dec));
named!(hex_i64<&str, i64>, preceded!(tag_no_case("0x"), map_res!(hex_digit1, from_hex)));
named!(number<&str, i64>, alt!(hex_i64 | dec_i64));
named!(pass<&str, u32>, map_res!(digit1, from_dec_u32));

fn whole<'a, O, F>(parser: F, token: &'a str) -> Option<O>
where
    F: Fn(&'a str) -> IResult<&'a str, O>,
{
    match parser(token) {
        Ok(("", value)) => Some(value),
        _ => None,
    }
}

/// Parses a non-negative integer, hexadecimal when prefixed with `0x`.
pub fn parse_number(token: &str) -> Result<i64> {
    whole(number, token).ok_or_else(|| Error::InvalidNumber {
        token: token.to_owned(),
    })
}

pub fn parse_pass(token: &str) -> Result<u32> {
    match whole(pass, token) {
        Some(pass) if pass > 0 => Ok(pass),
        _ => Err(Error::InvalidPass {
            token: token.to_owned(),
        }),
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Record {
    Status(RescueStatus),
    Block(Block),
}

/// Line oriented mapfile reader.
///
/// Lines are fed one at a time with [`MapfileParser::feed_line`]; the first
/// malformed line aborts the parse. [`MapfileParser::finish`] checks that the
/// blocks cover a contiguous range and hands out the [`Mapfile`].
#[derive(Debug, Default)]
pub struct MapfileParser {
    line: usize,
    header: MapfileHeader,
    status: RescueStatus,
    blocks: Vec<Block>,
    block_size: Option<ByteSpan>,
}

impl MapfileParser {
    pub fn new() -> MapfileParser {
        MapfileParser::default()
    }

    pub fn feed_line(&mut self, raw: &str) -> Result<()> {
        self.line += 1;
        let line = raw.trim();
        if line.is_empty() {
            return Ok(());
        }
        if line.starts_with(COMMAND_LINE) {
            self.read_command_line(line);
            return Ok(());
        }
        if line.starts_with('#') {
            self.read_metadata(line);
            return Ok(());
        }

        let data = match line.find('#') {
            Some(comment) => &line[..comment],
            None => line,
        };
        let tokens: Vec<&str> = data.split_whitespace().collect();
        let record = self.classify(&tokens, line).map_err(|cause| match cause {
            Error::DuplicateStatusLine { .. } => cause,
            cause => Error::MalformedLine {
                line: self.line,
                text: line.to_owned(),
                cause: Box::new(cause),
            },
        })?;
        trace!(line = self.line, ?record, "classified mapfile line");
        match record {
            Record::Status(status) => self.status = status,
            Record::Block(block) => self.blocks.push(block),
        }
        Ok(())
    }

    pub fn finish(self) -> Result<Mapfile> {
        let map = RescueMap::from_blocks(self.blocks)?;
        let block_size = self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE);
        debug!(
            lines = self.line,
            blocks = map.len(),
            start = %map.start(),
            size = %map.size(),
            block_size = block_size.get(),
            "parsed mapfile"
        );
        Ok(Mapfile {
            header: self.header,
            status: self.status,
            map,
            block_size,
        })
    }

    fn classify(&self, tokens: &[&str], text: &str) -> Result<Record> {
        match tokens.len() {
            2 => self.legacy_status_line(tokens, text),
            3 => match self.status_line(tokens, text) {
                Ok(record) => Ok(record),
                Err(status_error) => Self::block_line(tokens).map_err(|block_error| {
                    // Report whichever grammar the second field points at.
                    if RescueOperation::from_str(tokens[1]).is_ok() {
                        status_error
                    } else {
                        block_error
                    }
                }),
            },
            count => Err(Error::TokenCount { count }),
        }
    }

    fn legacy_status_line(&self, tokens: &[&str], text: &str) -> Result<Record> {
        let position = tokens[0].parse::<ByteOffset>()?;
        let operation = tokens[1].parse::<RescueOperation>()?;
        self.check_first_status(text)?;
        Ok(Record::Status(RescueStatus::new(position, operation, None)))
    }

    fn status_line(&self, tokens: &[&str], text: &str) -> Result<Record> {
        let position = tokens[0].parse::<ByteOffset>()?;
        let operation = tokens[1].parse::<RescueOperation>()?;
        let pass = parse_pass(tokens[2])?;
        self.check_first_status(text)?;
        Ok(Record::Status(RescueStatus::new(
            position,
            operation,
            Some(pass),
        )))
    }

    fn block_line(tokens: &[&str]) -> Result<Record> {
        let start = tokens[0].parse::<ByteOffset>()?;
        let length = tokens[1].parse::<ByteSpan>()?;
        if length.is_zero() {
            return Err(Error::NonPositiveLength { block_start: start });
        }
        let status = tokens[2].parse::<BlockStatus>()?;
        start.checked_add(length).ok_or(Error::OffsetOverflow)?;
        Ok(Record::Block(Block::new(start, length, status)))
    }

    fn check_first_status(&self, text: &str) -> Result<()> {
        if self.status.is_set() {
            return Err(Error::DuplicateStatusLine {
                line: self.line,
                text: text.to_owned(),
            });
        }
        Ok(())
    }

    fn read_command_line(&mut self, line: &str) {
        let command = line[COMMAND_LINE.len()..].trim();
        self.header.command_line = Some(command.to_owned());
        let value = match block_size_option(command) {
            Some(value) => value,
            None => return,
        };
        match value.parse::<ByteSpan>() {
            Ok(size) if size.get() > 0 => self.block_size = Some(size),
            _ => warn!(
                line = self.line,
                value, "ignoring unparseable block size in command line"
            ),
        }
    }

    fn read_metadata(&mut self, line: &str) {
        if let Some(time) = line.strip_prefix(START_TIME) {
            self.header.start_time = Some(time.trim().to_owned());
        } else if let Some(time) = line.strip_prefix(CURRENT_TIME) {
            self.header.current_time = Some(time.trim().to_owned());
        } else if let Some(index) = line.find(VERSION) {
            let version = line[index + VERSION.len()..].trim();
            if !version.is_empty() {
                self.header.version = Some(version.to_owned());
            }
        }
    }
}

/// Finds the value of `-b`, `--block-size` or `--sector-size` in an echoed
/// ddrescue command line.
fn block_size_option(command: &str) -> Option<&str> {
    let mut args = command.split_whitespace();
    while let Some(arg) = args.next() {
        match arg {
            "-b" | "--block-size" | "--sector-size" => return args.next(),
            _ => {}
        }
        for prefix in &["--block-size=", "--sector-size="] {
            if let Some(value) = arg.strip_prefix(prefix) {
                return Some(value);
            }
        }
        if let Some(value) = arg.strip_prefix("-b") {
            if !value.starts_with('-') && !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

pub fn parse_lines<I, S>(lines: I) -> Result<Mapfile>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = MapfileParser::new();
    for line in lines {
        parser.feed_line(line.as_ref())?;
    }
    parser.finish()
}

pub fn parse_mapfile(text: &str) -> Result<Mapfile> {
    parse_lines(text.lines())
}

impl FromStr for Mapfile {
    type Err = Error;

    fn from_str(text: &str) -> Result<Mapfile> {
        parse_mapfile(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: i64, length: i64, status: BlockStatus) -> Block {
        Block::new(ByteOffset::new(start), ByteSpan::new(length), status)
    }

    #[test]
    fn test_basic() {
        assert_eq!(hex_i64("0xdEaDbEeF "), Ok((" ", 0xdeadbeef)));
        assert_eq!(dec_i64("5;"), Ok((";", 5)));
        assert_eq!(pass("5;"), Ok((";", 5)));
        assert_eq!(parse_number("0xdEaDbEeF"), Ok(0xdeadbeef));
        assert_eq!(parse_number("0XFF"), Ok(255));
        assert_eq!(parse_number("4096"), Ok(4096));
        assert_eq!(parse_number("0"), Ok(0));
    }

    #[test]
    fn test_invalid_numbers() {
        for token in &["", "0x", "0x1G", "12a", "-1", "+1", "0x8000000000000000", "abc"] {
            assert_eq!(
                parse_number(token),
                Err(Error::InvalidNumber {
                    token: token.to_string()
                }),
                "{:?}",
                token
            );
        }
        assert_eq!(parse_number("0x7FFFFFFFFFFFFFFF"), Ok(i64::MAX));
    }

    #[test]
    fn test_pass() {
        assert_eq!(parse_pass("1"), Ok(1));
        assert_eq!(parse_pass("12"), Ok(12));
        for token in &["0", "0x1", "-1", "x"] {
            assert_eq!(
                parse_pass(token),
                Err(Error::InvalidPass {
                    token: token.to_string()
                })
            );
        }
    }

    #[test]
    fn test_current_state() {
        let mapfile = parse_mapfile("0x24F35400     +\r\n").unwrap();
        assert_eq!(
            mapfile.status,
            RescueStatus::new(
                ByteOffset::new(0x24f35400),
                RescueOperation::Finished,
                None
            )
        );
        let mapfile = parse_mapfile("0x24F35400     +   1\r\n").unwrap();
        assert_eq!(
            mapfile.status,
            RescueStatus::new(
                ByteOffset::new(0x24f35400),
                RescueOperation::Finished,
                Some(1)
            )
        );
        assert!(mapfile.map.is_empty());
    }

    #[test]
    fn test_block() {
        let mapfile = parse_mapfile("0x00000001  0x2237B000  +  # first block").unwrap();
        assert_eq!(
            mapfile.map.blocks(),
            &[block(0x1, 0x2237B000, BlockStatus::Rescued)][..]
        );
        assert!(!mapfile.status.is_set());
    }

    #[test]
    fn test_file() {
        let mapfile = parse_mapfile(
            "# Rescue Logfile. Created by GNU ddrescue version 1.14
# current_pos  current_status
0x24F35400     +
#      pos        size  status
0x00000000  0x2237B000  +
0x2237B000  0x02BBA800  -",
        )
        .unwrap();
        assert_eq!(
            mapfile,
            Mapfile {
                header: MapfileHeader {
                    version: Some("1.14".into()),
                    ..MapfileHeader::default()
                },
                status: RescueStatus::new(
                    ByteOffset::new(0x24f35400),
                    RescueOperation::Finished,
                    None
                ),
                map: RescueMap::from_blocks(vec![
                    block(0x0, 0x2237B000, BlockStatus::Rescued),
                    block(0x2237B000, 0x02BBA800, BlockStatus::BadSector),
                ])
                .unwrap(),
                block_size: DEFAULT_BLOCK_SIZE,
            }
        );
    }

    #[test]
    fn test_file2() {
        let mapfile = parse_mapfile(
            "# Mapfile. Created by GNU ddrescue version 1.23
# Command line: ddrescue -d -r3 -b 4096 /dev/sdb disk.img disk.map
# Start time:   2018-03-11 20:05:17
# Current time: 2018-03-11 21:40:03
# Finished
# current_pos  current_status  current_pass
0x2237B000     +               3
#      pos        size  status
0x00000000  0x2237B000  +
0x2237B000  0x02BBA800  -
",
        )
        .unwrap();
        assert_eq!(
            mapfile.header,
            MapfileHeader {
                version: Some("1.23".into()),
                command_line: Some("ddrescue -d -r3 -b 4096 /dev/sdb disk.img disk.map".into()),
                start_time: Some("2018-03-11 20:05:17".into()),
                current_time: Some("2018-03-11 21:40:03".into()),
            }
        );
        assert_eq!(mapfile.status.current_pass(), Some(3));
        assert_eq!(mapfile.block_size, ByteSpan::new(4096));
        assert_eq!(mapfile.map.len(), 2);
    }

    #[test]
    fn test_mapfile_eof() {
        let error = parse_mapfile(
            "# Rescue Logfile.
# current_pos  current_status
0x24F35400     +
#      pos        size  status
0x00000000  0x2237B000  +
0x2237B000  0x02BBA800  -;",
        )
        .unwrap_err();
        assert_eq!(
            error,
            Error::MalformedLine {
                line: 6,
                text: "0x2237B000  0x02BBA800  -;".into(),
                cause: Box::new(Error::InvalidEnumChar { token: "-;".into() }),
            }
        );
    }

    #[test]
    fn test_contiguous_example() {
        let mapfile = parse_mapfile(
            "0x00000000 0x00100000 +\n0x00100000 0x00000200 -\n# comment\n",
        )
        .unwrap();
        assert_eq!(mapfile.map.len(), 2);
        assert_eq!(mapfile.map.start(), ByteOffset::new(0));
        assert_eq!(mapfile.map.size(), ByteSpan::new(0x00100200));
        assert_eq!(
            mapfile
                .map
                .extract(ByteOffset::new(0), ByteSpan::new(0x00100000))
                .blocks(),
            &[block(0, 0x100000, BlockStatus::Rescued)][..]
        );
    }

    #[test]
    fn test_gap_is_rejected() {
        let error =
            parse_mapfile("0x00000000 0x00100000 +\n0x00200000 0x00000200 -\n").unwrap_err();
        assert_eq!(
            error,
            Error::NonContiguousMap {
                previous: block(0, 0x00100000, BlockStatus::Rescued),
                next: block(0x00200000, 0x200, BlockStatus::BadSector),
            }
        );
    }

    #[test]
    fn test_malformed_line() {
        let error = parse_mapfile("# header\n0x0 +\nabc def ghi\n").unwrap_err();
        match error {
            Error::MalformedLine { line, text, .. } => {
                assert_eq!(line, 3);
                assert_eq!(text, "abc def ghi");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_token_count() {
        assert_eq!(
            parse_mapfile("0x0 0x200 + 1").unwrap_err(),
            Error::MalformedLine {
                line: 1,
                text: "0x0 0x200 + 1".into(),
                cause: Box::new(Error::TokenCount { count: 4 }),
            }
        );
        assert_eq!(
            parse_mapfile("0x0").unwrap_err(),
            Error::MalformedLine {
                line: 1,
                text: "0x0".into(),
                cause: Box::new(Error::TokenCount { count: 1 }),
            }
        );
    }

    #[test]
    fn test_duplicate_status_line() {
        assert_eq!(
            parse_mapfile("0x0 ?\n0x200 *\n").unwrap_err(),
            Error::DuplicateStatusLine {
                line: 2,
                text: "0x200 *".into()
            }
        );
        assert_eq!(
            parse_mapfile("0x0 ? 1\n0x0 0x200 ?\n0x200 - 2\n").unwrap_err(),
            Error::DuplicateStatusLine {
                line: 3,
                text: "0x200 - 2".into()
            }
        );
    }

    #[test]
    fn test_status_grammar_falls_through_to_block() {
        // "1" is not an operation character, so this is a block line.
        let mapfile = parse_mapfile("0 1 -\n").unwrap();
        assert_eq!(mapfile.map.blocks(), &[block(0, 1, BlockStatus::BadSector)][..]);

        // Once a status is set, a block line with operation-like fields still parses.
        let mapfile = parse_mapfile("0x0 - 1\n0x0 0x10 -\n").unwrap();
        assert_eq!(mapfile.status.current_operation(), RescueOperation::Retrying);
        assert_eq!(mapfile.map.len(), 1);
    }

    #[test]
    fn test_invalid_pass_is_reported() {
        assert_eq!(
            parse_mapfile("0x0 + 0\n").unwrap_err(),
            Error::MalformedLine {
                line: 1,
                text: "0x0 + 0".into(),
                cause: Box::new(Error::InvalidPass { token: "0".into() }),
            }
        );
    }

    #[test]
    fn test_invalid_blocks() {
        assert_eq!(
            parse_mapfile("0x100 0x0 +\n").unwrap_err(),
            Error::MalformedLine {
                line: 1,
                text: "0x100 0x0 +".into(),
                cause: Box::new(Error::NonPositiveLength {
                    block_start: ByteOffset::new(0x100)
                }),
            }
        );
        assert_eq!(
            parse_mapfile("0x7FFFFFFFFFFFFFFF 0x10 +\n").unwrap_err(),
            Error::MalformedLine {
                line: 1,
                text: "0x7FFFFFFFFFFFFFFF 0x10 +".into(),
                cause: Box::new(Error::OffsetOverflow),
            }
        );
        assert_eq!(
            parse_mapfile("0x0 0x10 F\n").unwrap_err(),
            Error::MalformedLine {
                line: 1,
                text: "0x0 0x10 F".into(),
                cause: Box::new(Error::InvalidEnumChar { token: "F".into() }),
            }
        );
    }

    #[test]
    fn test_block_size_option() {
        assert_eq!(block_size_option("ddrescue -b 2048 in out map"), Some("2048"));
        assert_eq!(block_size_option("ddrescue -b2048 in out map"), Some("2048"));
        assert_eq!(block_size_option("ddrescue --block-size=4096 in out"), Some("4096"));
        assert_eq!(block_size_option("ddrescue --sector-size=4096 in out"), Some("4096"));
        assert_eq!(block_size_option("ddrescue --block-size 1024 in out"), Some("1024"));
        assert_eq!(block_size_option("ddrescue -d -r3 in out map"), None);
        assert_eq!(block_size_option("ddrescue -b"), None);
    }

    #[test]
    fn test_unparseable_block_size_is_ignored() {
        let mapfile = parse_mapfile("# Command line: ddrescue -b xyz in out map\n").unwrap();
        assert_eq!(mapfile.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(
            mapfile.header.command_line.as_deref(),
            Some("ddrescue -b xyz in out map")
        );
    }

    #[test]
    fn test_parse_lines() {
        let lines = vec!["0x0 ? 1", "0x0 0x400 ?", "0x400 0x400 +"];
        let mapfile = parse_lines(lines).unwrap();
        assert_eq!(mapfile.status.current_operation(), RescueOperation::Copying);
        assert_eq!(mapfile.map.size(), ByteSpan::new(0x800));
        assert_eq!("0x0 ? 1\n".parse::<Mapfile>().map(|m| m.map.len()), Ok(0));
    }
}
