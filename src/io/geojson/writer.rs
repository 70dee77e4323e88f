use geojson::FeatureCollection;
use std::io::{BufWriter, Write};

use crate::error::Result;
use crate::io::esri::Attributes;

/// Write a FeatureCollection as GeoJSON
///
/// Note: Coordinates are written in whatever spatial reference the service returned them in
pub fn write_geojson<W: Write>(collection: &FeatureCollection, writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer(&mut writer, collection)?;
    writer.flush()?;
    Ok(())
}

/// Write the flat records of a table layer as a JSON array
pub fn write_records<W: Write>(records: &[Attributes], writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}
