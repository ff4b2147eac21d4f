//! Tab-separated rendering of resolved rate rows.

use anyhow::Result;
use std::io::Write;

/// Writes the rows of a fully resolved batch. Rows may differ in width
/// because only some providers report a delta column.
pub fn write_rows<W: Write>(out: W, rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(out);

    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
