//! Compression contract (spec.md §6): detect by filename extension, wrap
//! and unwrap a byte stream accordingly. Grounded on the corpus's own use
//! of `flate2`/`zstd` for gzip/zstd framing (enrichment: the teacher has
//! no compression concern of its own, so these crates are adopted from
//! the wider pack — see DESIGN.md).

use std::io::{Read, Write};

use crate::error::PipeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Zstd,
    Lz4,
}

impl Compression {
    /// Detects compression by filename suffix; anything unrecognized is
    /// `None`.
    pub fn detect(filename: &str) -> Self {
        if filename.ends_with(".gz") {
            Compression::Gzip
        } else if filename.ends_with(".zst") {
            Compression::Zstd
        } else if filename.ends_with(".lz4") {
            Compression::Lz4
        } else {
            Compression::None
        }
    }

    /// Appends this variant's extension to `name`; `None` leaves it
    /// unchanged.
    pub fn with_extension(&self, name: &str) -> String {
        match self {
            Compression::None => name.to_string(),
            Compression::Gzip => format!("{name}.gz"),
            Compression::Zstd => format!("{name}.zst"),
            Compression::Lz4 => format!("{name}.lz4"),
        }
    }

    pub fn wrap_writer<'a>(
        &self,
        writer: Box<dyn Write + Send + 'a>,
    ) -> Result<Box<dyn Write + Send + 'a>, PipeError> {
        match self {
            Compression::None => Ok(writer),
            Compression::Gzip => Ok(Box::new(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            ))),
            Compression::Zstd => Ok(Box::new(
                zstd::stream::Encoder::new(writer, 0)
                    .map_err(|e| PipeError::io_with_cause("zstd encoder init failed", e))?
                    .auto_finish(),
            )),
            Compression::Lz4 => Ok(Box::new(lz4_flex::frame::FrameEncoder::new(writer).auto_finish())),
        }
    }

    pub fn wrap_reader<'a>(
        &self,
        reader: Box<dyn Read + Send + 'a>,
    ) -> Result<Box<dyn Read + Send + 'a>, PipeError> {
        match self {
            Compression::None => Ok(reader),
            Compression::Gzip => Ok(Box::new(flate2::read::GzDecoder::new(reader))),
            Compression::Zstd => Ok(Box::new(
                zstd::stream::Decoder::new(reader)
                    .map_err(|e| PipeError::io_with_cause("zstd decoder init failed", e))?,
            )),
            Compression::Lz4 => Ok(Box::new(lz4_flex::frame::FrameDecoder::new(reader))),
        }
    }
}
