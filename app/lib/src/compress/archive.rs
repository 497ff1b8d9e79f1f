//! Staging of output files and the final tar archive.
//!
//! Column files and metadata are first written to a temporary directory,
//! then bundled in write order into `{out_name}.tar.{kernel}`.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tempfile::TempDir;

use super::columnar::ColumnFile;
use crate::config::Kernel;
use crate::error::{LogzipError, Result};

const ZSTD_LEVEL: i32 = 19;

/// Where staged files live until they are archived.
#[derive(Debug)]
enum StagingDir {
    Kept(PathBuf),
    Temp(TempDir),
}

/// Files written so far, in write order.
#[derive(Debug)]
pub struct Staging {
    dir: StagingDir,
    files: Vec<PathBuf>,
    names: HashSet<String>,
    bytes: u64,
}

impl Staging {
    /// Stage into `tmp_dir` when given (created if missing), otherwise into a
    /// fresh temporary directory inside `out_dir` that is removed on drop.
    pub fn new(tmp_dir: Option<&Path>, out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)?;
        let dir = match tmp_dir {
            Some(path) => {
                fs::create_dir_all(path)?;
                StagingDir::Kept(path.to_path_buf())
            }
            None => StagingDir::Temp(tempfile::Builder::new().prefix(".logzip-").tempdir_in(out_dir)?),
        };
        Ok(Self {
            dir,
            files: Vec::new(),
            names: HashSet::new(),
            bytes: 0,
        })
    }

    /// The staging directory.
    pub fn path(&self) -> &Path {
        match &self.dir {
            StagingDir::Kept(path) => path,
            StagingDir::Temp(dir) => dir.path(),
        }
    }

    /// Staged files in write order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Total size of the staged files.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Write raw bytes under `name`.
    ///
    /// Each name may be written once; a second write is an error instead of
    /// an overwrite.
    pub fn write_bytes(&mut self, name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.path().join(name);
        if !self.names.insert(name.to_string()) {
            return Err(LogzipError::Archive {
                path: path.display().to_string(),
                message: format!("duplicate entry '{}'", name),
            });
        }
        fs::write(&path, data)?;
        self.bytes += data.len() as u64;
        self.files.push(path.clone());
        Ok(path)
    }

    /// Write a column as `{name}.csv`.
    pub fn write_column(&mut self, column: &ColumnFile) -> Result<PathBuf> {
        self.write_bytes(&column.file_name(), column.render().as_bytes())
    }

    /// Write a value as JSON under `name`.
    pub fn write_json<T: Serialize>(&mut self, name: &str, value: &T) -> Result<PathBuf> {
        let data = serde_json::to_vec(value)?;
        self.write_bytes(name, &data)
    }

    /// Bundle the staged files into `dest`, returning the archive size.
    pub fn pack(&self, kernel: Kernel, dest: &Path) -> Result<u64> {
        write_archive(kernel, &self.files, dest)?;
        let size = fs::metadata(dest)?.len();
        log::info!(
            "Packed {} file(s) into {} ({} bytes)",
            self.files.len(),
            dest.display(),
            size
        );
        Ok(size)
    }
}

fn append_files<W: Write>(builder: &mut tar::Builder<W>, files: &[PathBuf]) -> Result<()> {
    for path in files {
        let name = path
            .file_name()
            .ok_or_else(|| LogzipError::Archive {
                path: path.display().to_string(),
                message: "staged path has no file name".to_string(),
            })?;
        builder.append_path_with_name(path, name)?;
    }
    Ok(())
}

/// Write `files` into a tar archive at `dest` compressed with `kernel`.
pub fn write_archive(kernel: Kernel, files: &[PathBuf], dest: &Path) -> Result<()> {
    let file = File::create(dest)?;
    match kernel {
        Kernel::Gz => {
            let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
            append_files(&mut builder, files)?;
            builder.into_inner()?.finish()?;
        }
        Kernel::Bz2 => {
            let mut builder = tar::Builder::new(BzEncoder::new(file, bzip2::Compression::best()));
            append_files(&mut builder, files)?;
            builder.into_inner()?.finish()?;
        }
        Kernel::Zst => {
            let mut builder = tar::Builder::new(zstd::Encoder::new(file, ZSTD_LEVEL)?);
            append_files(&mut builder, files)?;
            builder.into_inner()?.finish()?;
        }
        Kernel::Lzma => {
            let mut builder = tar::Builder::new(Vec::new());
            append_files(&mut builder, files)?;
            let tarball = builder.into_inner()?;
            let mut writer = BufWriter::new(file);
            lzma_rs::lzma_compress(&mut Cursor::new(tarball), &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

/// A file stored in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File name inside the archive.
    pub name: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    /// Contents as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

fn read_entries<R: Read>(mut archive: tar::Archive<R>) -> Result<Vec<ArchiveEntry>> {
    let mut out = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        out.push(ArchiveEntry { name, data });
    }
    Ok(out)
}

/// Read every entry of an archive written by [`write_archive`].
///
/// The kernel is taken from the file extension.
pub fn read_archive(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let kernel = Kernel::from_path(path).ok_or_else(|| LogzipError::Archive {
        path: path.display().to_string(),
        message: "unrecognized archive extension".to_string(),
    })?;
    let file = File::open(path)?;
    let entries = match kernel {
        Kernel::Gz => read_entries(tar::Archive::new(GzDecoder::new(file)))?,
        Kernel::Bz2 => read_entries(tar::Archive::new(BzDecoder::new(file)))?,
        Kernel::Zst => read_entries(tar::Archive::new(zstd::Decoder::new(file)?))?,
        Kernel::Lzma => {
            let mut tarball = Vec::new();
            lzma_rs::lzma_decompress(&mut BufReader::new(file), &mut tarball).map_err(|e| {
                LogzipError::Archive {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            })?;
            read_entries(tar::Archive::new(Cursor::new(tarball)))?
        }
    };
    log::debug!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}
