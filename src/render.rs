use std::io::{self, Write};

use ddrescue_mapfile::{
    BlockStatus, ByteSpan, HeatMap, Mapfile, RescueMap, RescueTotals, Square, SquareColor,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Style {
    /// Two spaces per square on a 24-bit background color.
    Ansi,
    /// One status character per square.
    Plain,
}

fn percent(part: ByteSpan, whole: ByteSpan) -> f64 {
    if whole.is_zero() {
        return 0.0;
    }
    100.0 * part.get() as f64 / whole.get() as f64
}

pub fn totals<W: Write>(out: &mut W, totals: &RescueTotals) -> io::Result<()> {
    let whole = totals.total();
    for &status in BlockStatus::ALL.iter() {
        let size = totals.get(status);
        writeln!(
            out,
            "  {} {:<28} {:>18}  {:6.2}%",
            status,
            status.description(),
            size.to_string(),
            percent(size, whole)
        )?;
    }
    if !totals.unknown().is_zero() {
        writeln!(
            out,
            "    {:<28} {:>18}  {:6.2}%",
            "unknown",
            totals.unknown().to_string(),
            percent(totals.unknown(), whole)
        )?;
    }
    Ok(())
}

pub fn summary<W: Write>(out: &mut W, mapfile: &Mapfile) -> io::Result<()> {
    let header = &mapfile.header;
    if let Some(version) = &header.version {
        writeln!(out, "ddrescue version: {}", version)?;
    }
    if let Some(command_line) = &header.command_line {
        writeln!(out, "command line:     {}", command_line)?;
    }
    if let Some(time) = &header.start_time {
        writeln!(out, "start time:       {}", time)?;
    }
    if let Some(time) = &header.current_time {
        writeln!(out, "current time:     {}", time)?;
    }

    let status = &mapfile.status;
    if status.is_set() {
        write!(
            out,
            "operation:        {} ({}) at {}",
            status.current_operation().description(),
            status.current_operation(),
            status.current_position()
        )?;
        match status.current_pass() {
            Some(pass) => writeln!(out, ", pass {}", pass)?,
            None => writeln!(out)?,
        }
    } else {
        writeln!(out, "operation:        no status line")?;
    }

    let map = &mapfile.map;
    if map.is_empty() {
        return writeln!(out, "rescue domain:    no data yet");
    }
    if let Some(block) = map.block_at(status.current_position()) {
        writeln!(out, "current block:    {}", block)?;
    }
    writeln!(
        out,
        "rescue domain:    {} to {} ({} bytes, {} blocks, {} errors)",
        map.start(),
        map.end(),
        map.size(),
        map.len(),
        map.error_count()
    )?;
    totals(out, &RescueTotals::from(map))
}

pub fn blocks<W: Write>(out: &mut W, map: &RescueMap) -> io::Result<()> {
    writeln!(out, "#      pos        size  status")?;
    write!(out, "{}", map)
}

fn cell(square: &Square, active: bool, style: Style) -> String {
    let color = if active {
        SquareColor::ACTIVE
    } else {
        square.color
    };
    match style {
        Style::Ansi if color.is_transparent() => "  ".to_owned(),
        Style::Ansi => format!(
            "\x1b[48;2;{};{};{}m  \x1b[0m",
            color.red, color.green, color.blue
        ),
        Style::Plain if active => "@".to_owned(),
        Style::Plain => match square.totals.dominant_status() {
            Some(status) => status.to_string(),
            None if square.totals.unknown().is_zero() => ".".to_owned(),
            None => "~".to_owned(),
        },
    }
}

pub fn heat_map<W: Write>(
    out: &mut W,
    heat: &HeatMap<'_>,
    active: Option<usize>,
    style: Style,
) -> io::Result<()> {
    let squares: Vec<Square> = heat.squares().collect();
    for row in squares.chunks(heat.columns()) {
        let line: String = row
            .iter()
            .map(|square| cell(square, Some(square.index) == active, style))
            .collect();
        writeln!(out, "{}", line)?;
    }
    match heat.sectors_per_square() {
        Ok(sectors) => writeln!(
            out,
            "{} x {} squares of {} sectors ({} bytes each)",
            heat.columns(),
            heat.rows(),
            sectors,
            heat.square_size()
        ),
        Err(_) => writeln!(out, "{} x {} squares", heat.columns(), heat.rows()),
    }
}

pub fn square<W: Write>(out: &mut W, map: &RescueMap, square: &Square) -> io::Result<()> {
    writeln!(
        out,
        "square {}: {} + {} color {}",
        square.index, square.start, square.size, square.color
    )?;
    totals(out, &square.totals)?;
    blocks(out, &map.extract(square.start, square.size))
}
