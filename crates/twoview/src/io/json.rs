use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use super::TableError;

/// Write a value as pretty-printed JSON.
///
/// # Arguments
///
/// * `path` - The path of the output file.
/// * `value` - Any serializable result, such as a [`crate::pair::PairSummary`].
pub fn write_json(path: impl AsRef<Path>, value: &impl Serialize) -> Result<(), TableError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Read a value, such as a [`crate::pair::PairConfig`], from a JSON file.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, TableError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
