//! Writing rendered images to disk.
//!
//! `.ppm` paths get a plain-text P3 file; any other extension is handed to
//! the `image` crate.

use crate::renderer::ImageBuffer;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while saving an image.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image encoding error: {0}")]
    Encode(#[from] image::ImageError),
}

pub type OutputResult<T> = Result<T, OutputError>;

/// Append `.ppm` to paths without an extension.
pub fn with_default_extension(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension("ppm")
    }
}

/// Write `image` as a plain PPM (P3): header, then one `R G B` line per
/// pixel starting at the top row.
pub fn write_ppm<W: Write>(image: &ImageBuffer, mut writer: W) -> io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width(), image.height())?;
    writeln!(writer, "255")?;

    for rgb in image.to_rgb8().chunks_exact(3) {
        writeln!(writer, "{} {} {}", rgb[0], rgb[1], rgb[2])?;
    }

    writer.flush()
}

/// How an [`OutputSink`] encodes the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Ppm,
    Encoded(image::ImageFormat),
}

/// An opened output file, acquired before rendering starts.
///
/// Creating the sink resolves the format from the extension, creates
/// missing parent directories and creates the file, so a bad path fails
/// before any work is spent on the image.
pub struct OutputSink {
    path: PathBuf,
    format: OutputFormat,
    writer: BufWriter<File>,
}

impl OutputSink {
    pub fn create(path: impl AsRef<Path>) -> OutputResult<Self> {
        let path = path.as_ref();

        let is_ppm = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"));
        let format = if is_ppm {
            OutputFormat::Ppm
        } else {
            OutputFormat::Encoded(image::ImageFormat::from_path(path)?)
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| OutputError::Create {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = File::create(path).map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Opened {} as {:?}", path.display(), format);
        Ok(Self {
            path: path.to_path_buf(),
            format,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encode `buffer` into the file and flush it.
    pub fn write(mut self, buffer: &ImageBuffer) -> OutputResult<()> {
        match self.format {
            OutputFormat::Ppm => write_ppm(buffer, &mut self.writer)?,
            OutputFormat::Encoded(format) => {
                image::write_buffer_with_format(
                    &mut self.writer,
                    &buffer.to_rgb8(),
                    buffer.width(),
                    buffer.height(),
                    image::ColorType::Rgb8,
                    format,
                )?;
                self.writer.flush()?;
            }
        }

        log::info!(
            "Saved {}x{} image to {}",
            buffer.width(),
            buffer.height(),
            self.path.display()
        );
        Ok(())
    }
}

/// Save `buffer` to `path`, creating missing parent directories.
///
/// The format follows the extension.
pub fn save_image(buffer: &ImageBuffer, path: impl AsRef<Path>) -> OutputResult<()> {
    OutputSink::create(path)?.write(buffer)
}
