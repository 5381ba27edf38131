use tracing::debug;

use crate::data::Mapfile;
use crate::error::Result;
use crate::parse::parse_mapfile;

/// Holds the open mapfile. A failed `open_text` keeps the previous one.
#[derive(Debug, Default)]
pub struct MapfileDocument {
    mapfile: Option<Mapfile>,
}

impl MapfileDocument {
    pub fn new() -> MapfileDocument {
        MapfileDocument::default()
    }

    pub fn open_text(&mut self, text: &str) -> Result<&Mapfile> {
        let mapfile = parse_mapfile(text)?;
        debug!(
            replaced = self.mapfile.is_some(),
            blocks = mapfile.map.len(),
            "opened mapfile"
        );
        Ok(self.mapfile.insert(mapfile))
    }

    pub fn mapfile(&self) -> Option<&Mapfile> {
        self.mapfile.as_ref()
    }

    pub fn close(&mut self) -> Option<Mapfile> {
        self.mapfile.take()
    }
}
