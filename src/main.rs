mod render;

use std::fs;
use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use clap::{value_t, App, Arg};
use ddrescue_mapfile::{ByteSpan, HeatMap, MapfileDocument};
use render::Style;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_logging(verbosity: u64) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let m = App::new("ddrescue_view")
        .version("0.1")
        .about("Show the progress of a GNU ddrescue run from its mapfile.")
        .author("Ruben Lapauw")
        .arg(
            Arg::with_name("mapfile")
                .help("Which mapfile to show")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("columns")
                .short("c")
                .long("columns")
                .help("Number of squares per row")
                .takes_value(true)
                .default_value("64"),
        )
        .arg(
            Arg::with_name("rows")
                .short("r")
                .long("rows")
                .help("Number of rows")
                .takes_value(true)
                .default_value("16"),
        )
        .arg(
            Arg::with_name("sector-size")
                .short("s")
                .long("sector-size")
                .help("Sector size, instead of the one on the mapfile command line")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("inspect")
                .short("i")
                .long("inspect")
                .help("Print the blocks and totals of one square")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("blocks")
                .short("b")
                .long("blocks")
                .help("List every block of the map"),
        )
        .arg(
            Arg::with_name("no-color")
                .long("no-color")
                .help("Print one status character per square instead of colors"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Log parsing details to stderr"),
        )
        .get_matches();

    init_logging(m.occurrences_of("verbose"));

    let path = m.value_of("mapfile").context("no mapfile given")?;
    let columns = value_t!(m, "columns", usize)?;
    let rows = value_t!(m, "rows", usize)?;
    let sector_size = if m.is_present("sector-size") {
        Some(value_t!(m, "sector-size", ByteSpan)?)
    } else {
        None
    };
    let inspect = if m.is_present("inspect") {
        Some(value_t!(m, "inspect", usize)?)
    } else {
        None
    };
    let style = if m.is_present("no-color") {
        Style::Plain
    } else {
        Style::Ansi
    };

    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read mapfile {}", path))?;
    let mut document = MapfileDocument::new();
    let mapfile = document
        .open_text(&text)
        .with_context(|| format!("failed to parse mapfile {}", path))?;

    let sector_size = sector_size.unwrap_or(mapfile.block_size);
    let heat = HeatMap::new(&mapfile.map, columns, rows, sector_size)
        .with_context(|| format!("cannot lay out {} x {} squares", columns, rows))?;
    let active = if mapfile.status.is_set() {
        heat.square_at(mapfile.status.current_position())
    } else {
        None
    };
    debug!(path, ?active, "rendering mapfile");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render::summary(&mut out, mapfile)?;
    if m.is_present("blocks") {
        render::blocks(&mut out, &mapfile.map)?;
    }
    render::heat_map(&mut out, &heat, active, style)?;
    if let Some(index) = inspect {
        let square = heat.square(index).ok_or_else(|| {
            anyhow!(
                "square {} is outside the {} squares of the grid",
                index,
                heat.len()
            )
        })?;
        render::square(&mut out, &mapfile.map, &square)?;
    }
    out.flush()?;
    Ok(())
}
