//! Traits for reading and writing the documents handled by reswsync.

use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Cursor, Write},
    path::Path,
};

use crate::error::Error;

/// A trait for parsing a document from, and writing it back to, one file.
///
/// # Example
///
/// ```rust,no_run
/// use reswsync::traits::Parser;
/// let document = reswsync::formats::ResourceDocument::read_from("Strings/en-US/Resources.resw")?;
/// document.write_to("Resources.copy.resw")?;
/// Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub trait Parser {
    /// Parse from any reader.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>
    where
        Self: Sized;

    /// Parse from file path.
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Write to file path.
    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Parse from a string.
    fn from_str(s: &str) -> Result<Self, Error>
    where
        Self: Sized,
    {
        Self::from_reader(Cursor::new(s))
    }
}

/// Reads a whole reader into a string, failing on invalid UTF-8.
pub(crate) fn read_to_string<R: BufRead>(mut reader: R) -> Result<String, Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}
