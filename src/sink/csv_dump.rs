use chrono::{ DateTime, Local };
use log::info;
use std::fs;
use std::path::{ Path, PathBuf };

use super::SinkError;
use crate::models::outcome::{ OutcomeRow, HEADER };

/// Writes one cycle's rows into `<dir>/<HH-MM-SS>.csv`, `;` separated.
pub fn write_csv(
    dir: &Path,
    rows: &[OutcomeRow],
    at: DateTime<Local>
) -> Result<PathBuf, SinkError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(at.format("%H-%M-%S.csv").to_string());

    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(&path)?;
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;

    info!("Data successfully saved to {}. Total rows: {}.", path.display(), rows.len());
    Ok(path)
}
