//! # Binary Metadata Reader

use crate::{ElfError, FILE_HEADER_SIZE, FileHeader, SegmentTable};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::path::{Path, PathBuf};

/// An opened executable: its validated header, its program-header table and
/// the file it came from.
///
/// The file stays open for the image's lifetime so pages can be mapped from
/// it on demand. Dropping the image closes the descriptor.
#[derive(Debug)]
pub struct BinaryImage {
    path: PathBuf,
    file: File,
    header: FileHeader,
    segments: SegmentTable,
}

impl BinaryImage {
    /// Open `path` and read its metadata.
    ///
    /// Nothing is kept on failure: the file and any partially read table are
    /// released before the error is returned.
    ///
    /// # Errors
    /// See [`read_metadata`]; additionally [`ElfError::Open`] if the file
    /// cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ElfError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|source| ElfError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let (header, segments) = read_metadata(&mut file)?;
        info!(
            "Opened {}: entry={} segments={}",
            path.display(),
            header.entry,
            segments.len()
        );

        for (index, seg) in segments.loadable() {
            debug!("LOAD #{index}: {seg}");
            if !seg.is_page_aligned() {
                warn!("LOAD #{index} is not page-aligned; its pages may not be mappable");
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            header,
            segments,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn header(&self) -> &FileHeader {
        &self.header
    }

    #[must_use]
    pub const fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    #[must_use]
    pub const fn file(&self) -> &File {
        &self.file
    }
}

impl AsFd for BinaryImage {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for BinaryImage {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

/// Read the file header from the start of `reader`, then the program-header
/// table at the offset it names.
///
/// # Errors
/// - [`ElfError::TruncatedHeader`] / [`ElfError::TruncatedSegmentTable`] on short reads,
/// - [`ElfError::OutOfMemory`] if the table buffer cannot be allocated,
/// - any header or table validation error,
/// - [`ElfError::Read`] on I/O failure.
pub fn read_metadata<R: Read + Seek>(reader: &mut R) -> Result<(FileHeader, SegmentTable), ElfError> {
    let mut raw_header = [0u8; FILE_HEADER_SIZE];
    reader.seek(SeekFrom::Start(0))?;
    let read = read_fully(reader, &mut raw_header)?;
    if read != FILE_HEADER_SIZE {
        return Err(ElfError::TruncatedHeader { read });
    }
    let header = FileHeader::parse(&raw_header)?;

    let expected = header.segment_table_len();
    let mut raw_table = Vec::new();
    raw_table
        .try_reserve_exact(expected)
        .map_err(|_| ElfError::OutOfMemory)?;
    raw_table.resize(expected, 0);

    reader.seek(SeekFrom::Start(header.segment_table_offset))?;
    let read = read_fully(reader, &mut raw_table)?;
    if read != expected {
        return Err(ElfError::TruncatedSegmentTable { expected, read });
    }

    let segments = SegmentTable::parse(&raw_table)?;
    Ok((header, segments))
}

/// Like `read_exact`, but reports how much was read when hitting end of file.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
