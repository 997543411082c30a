// src/readers/utentreader.rs

//! Implements a [`UtentReader`],
//! the driver of deriving [`Utent`s] from a user-accounting database
//! file (a [utmp format] file).
//!
//! The reader owns the open file handle and the read cursor. The handle
//! is acquired lazily (first `next_entry()`/`rewind()` call, or an
//! explicit [`open`]) and released exactly once, by [`close`] or by the
//! instance going out of scope, whichever happens first.
//!
//! [`UtentReader`]: self::UtentReader
//! [`Utent`s]: crate::data::utent::Utent
//! [utmp format]: https://en.wikipedia.org/wiki/Utmp
//! [`open`]: self::UtentReader#method.open
//! [`close`]: self::UtentReader#method.close

use crate::de_wrn;
use crate::common::{
    Count,
    FPath,
    File,
    FileOffset,
    FileOpenOptions,
    ResultS3,
};
use crate::data::datetime::{
    DateTimeL,
    DateTimeLOpt,
    FixedOffset,
};
use crate::data::utent::{
    buffer_to_utent,
    Utent,
    UtentLayout,
    ENTRY_SZ_MAX,
    UTENT_FILENAME_LOCAL,
    UTENT_LAYOUT_LOCAL,
};
use crate::readers::helpers::{fpath_to_path, path_filesz};

use std::fmt;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};
use ::thiserror::Error;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UtentReader
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Lifecycle state of a [`UtentReader`].
///
/// `Unopened → Open → Closed`. No transition leaves `Closed`
/// automatically; an explicit [`open`], a lazy open, or a [`rename`]
/// re-acquires the handle.
///
/// [`UtentReader`]: self::UtentReader
/// [`open`]: self::UtentReader#method.open
/// [`rename`]: self::UtentReader#method.rename
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReaderState {
    Unopened,
    Open,
    Closed,
}

impl fmt::Display for ReaderState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        match self {
            ReaderState::Unopened => write!(f, "Unopened"),
            ReaderState::Open => write!(f, "Open"),
            ReaderState::Closed => write!(f, "Closed"),
        }
    }
}

/// An error reading the user-accounting database.
///
/// Every file I/O failure surfaces as one of these at the operation that
/// triggered it; nothing is retried or swallowed internally. End of file
/// is not an error (it is [`ResultS3::Done`]).
///
/// [`ResultS3::Done`]: crate::common::ResultS3#variant.Done
#[derive(Debug, Error)]
pub enum UtentReadError {
    #[error("no such file {path:?}")]
    NotFound { path: FPath },
    #[error("permission denied opening {path:?}")]
    PermissionDenied { path: FPath },
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: FPath,
        #[source]
        source: std::io::Error,
    },
    /// A non-zero read shorter than one record: the file is truncated
    /// mid-record or was written with a different record layout. Never
    /// silently skipped or padded.
    #[error("corrupt record at file offset {fileoffset}: read {read} bytes of expected {expected}")]
    CorruptRecord {
        fileoffset: FileOffset,
        read: usize,
        expected: usize,
    },
    #[error("operation {op:?} invalid while reader is {state}")]
    InvalidState {
        op: &'static str,
        state: ReaderState,
    },
}

/// [`UtentReader::next_entry`] result.
///
/// [`UtentReader::next_entry`]: self::UtentReader#method.next_entry
pub type ResultNextUtent = ResultS3<Utent, UtentReadError>;

/// A reader of one user-accounting database file.
///
/// Construct, then repeatedly call [`next_entry`] until
/// [`ResultS3::Done`]; optionally [`rewind`] to restart the traversal;
/// [`close`] when done (or let the instance going out of scope close it).
/// [`rename`] retargets the reader between uses.
///
/// A `UtentReader` is single-threaded state: the handle and cursor are
/// mutable with no internal locking. Distinct instances over the same
/// file are independent (each holds its own descriptor and cursor).
///
/// _XXX: not a rust "Reader"; does not implement trait [`Read`]._
///
/// [`next_entry`]: self::UtentReader#method.next_entry
/// [`rewind`]: self::UtentReader#method.rewind
/// [`close`]: self::UtentReader#method.close
/// [`rename`]: self::UtentReader#method.rename
/// [`ResultS3::Done`]: crate::common::ResultS3#variant.Done
/// [`Read`]: std::io::Read
pub struct UtentReader {
    /// Target file path.
    path: FPath,
    /// Timezone offset for the derived per-record datetime.
    tz_offset: FixedOffset,
    /// Record layout the target file is interpreted with.
    layout: UtentLayout,
    /// The open handle, `Some` only in state `Open`.
    file: Option<File>,
    state: ReaderState,
    /// Offset of the next record to read.
    fileoffset: FileOffset,
    /// Latched on a zero-byte read; cleared by `rewind` and `rename`.
    /// While latched, `next_entry` performs no I/O.
    eof_seen: bool,
    /// `Count` of `Utent`s processed.
    entries_processed: Count,
    /// First (soonest) processed datetime.
    ///
    /// Intended for `summary()`.
    dt_first: DateTimeLOpt,
    /// Last (latest) processed datetime.
    ///
    /// Intended for `summary()`.
    dt_last: DateTimeLOpt,
    /// The first [`UtentReadError`], if any, as a `String`.
    /// Set by [`set_error`].
    ///
    /// [`UtentReadError`]: self::UtentReadError
    /// [`set_error`]: self::UtentReader#method.set_error
    error: Option<String>,
}

impl fmt::Debug for UtentReader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("UtentReader")
            .field("Path", &self.path)
            .field("State", &self.state)
            .field("FileOffset", &self.fileoffset)
            .field("Entries", &self.entries_processed)
            .field("tz_offset", &self.tz_offset)
            .field("Error?", &self.error)
            .finish()
    }
}

/// Statistics about a `UtentReader`, for calls to
/// [`UtentReader::summary`].
///
/// [`UtentReader::summary`]: self::UtentReader#method.summary
#[allow(non_snake_case)]
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct SummaryUtentReader {
    /// `UtentReader::entries_processed`
    pub utentreader_utents_processed: Count,
    /// datetime soonest processed (not necessarily reflective of entire file)
    pub utentreader_datetime_first: DateTimeLOpt,
    /// datetime latest processed (not necessarily reflective of entire file)
    pub utentreader_datetime_last: DateTimeLOpt,
    /// first error encountered, if any
    pub utentreader_error: Option<String>,
}

/// Fill `buffer` from `file`, retrying interrupted reads, stopping at
/// end of file. Returns the byte count actually read, `0..=buffer.len()`.
fn read_one_block(
    file: &mut File,
    buffer: &mut [u8],
) -> std::io::Result<usize> {
    let mut nread: usize = 0;
    while nread < buffer.len() {
        match file.read(&mut buffer[nread..]) {
            Ok(0) => break,
            Ok(n) => nread += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }

    Ok(nread)
}

/// Implement the UtentReader.
impl UtentReader {
    /// Create a new `UtentReader` for the build target's record layout.
    ///
    /// `filename` overrides the target path. When it does not name an
    /// existing, non-empty file the override is silently ignored and the
    /// canonical path [`UTENT_FILENAME_LOCAL`] remains in effect
    /// (legacy-compatible behavior; a warning is printed in debug
    /// builds). Callers that need loud failure can [`rename`] +
    /// [`open`] and observe the typed error.
    ///
    /// No handle is acquired here; see [`open`].
    ///
    /// [`UTENT_FILENAME_LOCAL`]: crate::data::utent::UTENT_FILENAME_LOCAL
    /// [`rename`]: self::UtentReader#method.rename
    /// [`open`]: self::UtentReader#method.open
    pub fn new(
        filename: Option<FPath>,
        tz_offset: FixedOffset,
    ) -> UtentReader {
        defñ!("({:?}, {:?})", filename, tz_offset);
        let path: FPath = match filename {
            Some(path_) if Self::filename_override_ok(&path_) => path_,
            Some(_path) => {
                de_wrn!(
                    "filename {:?} is not an existing non-empty file; using {:?}",
                    _path, UTENT_FILENAME_LOCAL,
                );
                FPath::from(UTENT_FILENAME_LOCAL)
            }
            None => FPath::from(UTENT_FILENAME_LOCAL),
        };

        UtentReader {
            path,
            tz_offset,
            layout: UTENT_LAYOUT_LOCAL,
            file: None,
            state: ReaderState::Unopened,
            fileoffset: 0,
            eof_seen: false,
            entries_processed: 0,
            dt_first: DateTimeLOpt::None,
            dt_last: DateTimeLOpt::None,
            error: None,
        }
    }

    /// Create a new `UtentReader` with an explicit record layout.
    ///
    /// For reading accounting files copied from a different platform.
    /// Same path-override behavior as [`new`].
    ///
    /// [`new`]: UtentReader::new
    pub fn with_layout(
        filename: Option<FPath>,
        tz_offset: FixedOffset,
        layout: UtentLayout,
    ) -> UtentReader {
        let mut utentreader = UtentReader::new(filename, tz_offset);
        utentreader.layout = layout;

        utentreader
    }

    /// Does `path` name an existing, non-empty regular file?
    fn filename_override_ok(path: &FPath) -> bool {
        let path_std = fpath_to_path(path);
        match path_filesz(path_std) {
            Some(filesz) if filesz > 0 => path_std.is_file(),
            _ => false,
        }
    }

    /// The current target file path.
    #[inline(always)]
    pub const fn path(&self) -> &FPath {
        &self.path
    }

    /// The current lifecycle state.
    #[inline(always)]
    pub const fn state(&self) -> ReaderState {
        self.state
    }

    /// The record layout the target file is interpreted with.
    #[inline(always)]
    pub const fn layout(&self) -> UtentLayout {
        self.layout
    }

    /// Record size in bytes; also the read stride.
    #[inline(always)]
    pub const fn entry_sz(&self) -> usize {
        self.layout.entry_sz()
    }

    /// Offset of the next record to read.
    #[inline(always)]
    pub const fn fileoffset(&self) -> FileOffset {
        self.fileoffset
    }

    /// `Count` of `Utent`s processed by this `UtentReader`
    /// (i.e. `self.entries_processed`).
    #[inline(always)]
    pub const fn count_entries_processed(&self) -> Count {
        self.entries_processed
    }

    /// The raw file descriptor of the open handle.
    ///
    /// Only intended to aid testing (verifying single release).
    #[cfg(all(test, unix))]
    pub(crate) fn raw_fd(&self) -> Option<std::os::unix::io::RawFd> {
        use std::os::unix::io::AsRawFd;
        self.file
            .as_ref()
            .map(|file| file.as_raw_fd())
    }

    /// Record the first error; keep it for `summary()`.
    fn set_error(
        &mut self,
        error: &UtentReadError,
    ) {
        defñ!("{:?}", error);
        if let Some(ref _err) = self.error {
            de_wrn!("skip overwrite of previous Error {:?} with Error ({:?})", _err, error);
            return;
        }
        self.error = Some(error.to_string());
    }

    /// Map the OS error from opening `path` to a typed
    /// [`UtentReadError`].
    fn map_open_error(
        path: &FPath,
        err: std::io::Error,
    ) -> UtentReadError {
        match err.kind() {
            ErrorKind::NotFound => UtentReadError::NotFound { path: path.clone() },
            ErrorKind::PermissionDenied => UtentReadError::PermissionDenied { path: path.clone() },
            _ => UtentReadError::Io {
                path: path.clone(),
                source: err,
            },
        }
    }

    /// Open the target path read-only. Idempotent: a no-op while a
    /// handle is already held.
    ///
    /// From state `Closed` this re-acquires a fresh handle with the
    /// cursor at the first record.
    pub fn open(&mut self) -> Result<(), UtentReadError> {
        defn!("({:?})", self.path);
        if self.file.is_some() {
            defx!("already open; no-op");
            return Ok(());
        }
        let mut open_options = FileOpenOptions::new();
        defo!("open_options.read(true).open({:?})", self.path);
        let file: File = match open_options
            .read(true)
            .open(fpath_to_path(&self.path))
        {
            Ok(val) => val,
            Err(err) => {
                let err_ = Self::map_open_error(&self.path, err);
                self.set_error(&err_);
                defx!("return {:?}", err_);
                return Err(err_);
            }
        };
        self.file = Some(file);
        self.state = ReaderState::Open;
        self.fileoffset = 0;
        self.eof_seen = false;
        defx!();

        Ok(())
    }

    /// Reset the cursor to the first record. Opens the target first if
    /// no handle is held (mirroring the lazy open of [`next_entry`]).
    ///
    /// [`next_entry`]: self::UtentReader#method.next_entry
    pub fn rewind(&mut self) -> Result<(), UtentReadError> {
        defn!();
        if self.file.is_none() {
            self.open()?;
        }
        let seek_result = match self.file.as_mut() {
            Some(file) => file.seek(SeekFrom::Start(0)),
            None => {
                // `open` just succeeded
                let err = UtentReadError::InvalidState {
                    op: "rewind",
                    state: self.state,
                };
                defx!("return {:?}", err);
                return Err(err);
            }
        };
        match seek_result {
            Ok(_) => {}
            Err(err) => {
                let err_ = UtentReadError::Io {
                    path: self.path.clone(),
                    source: err,
                };
                self.set_error(&err_);
                defx!("return {:?}", err_);
                return Err(err_);
            }
        }
        self.fileoffset = 0;
        self.eof_seen = false;
        defx!();

        Ok(())
    }

    /// Read the record at the cursor, advancing the cursor by one record
    /// size.
    ///
    /// Opens the target first if no handle is held, so callers need not
    /// call [`open`] before iterating.
    ///
    /// Returns [`Found`] with one [`Utent`] per successful read.
    /// Returns [`Done`] on end of file (a zero-byte read); once end of
    /// file is reached, subsequent calls return `Done` without any I/O
    /// until a [`rewind`].
    /// A non-zero read shorter than one record returns
    /// [`CorruptRecord`] identifying the byte count actually read.
    ///
    /// [`open`]: self::UtentReader#method.open
    /// [`rewind`]: self::UtentReader#method.rewind
    /// [`Found`]: crate::common::ResultS3#variant.Found
    /// [`Done`]: crate::common::ResultS3#variant.Done
    /// [`Utent`]: crate::data::utent::Utent
    /// [`CorruptRecord`]: self::UtentReadError#variant.CorruptRecord
    pub fn next_entry(&mut self) -> ResultNextUtent {
        defn!("@{}", self.fileoffset);
        if self.eof_seen {
            defx!("EOF already seen; return Done");
            return ResultNextUtent::Done;
        }
        if self.file.is_none() {
            defo!("lazy open");
            if let Err(err) = self.open() {
                defx!("return Err({:?})", err);
                return ResultNextUtent::Err(err);
            }
        }

        let sz: usize = self.layout.entry_sz();
        let mut buffer: [u8; ENTRY_SZ_MAX] = [0; ENTRY_SZ_MAX];
        let read_result: std::io::Result<usize> = match self.file.as_mut() {
            Some(file) => read_one_block(file, &mut buffer[..sz]),
            None => {
                // `open` just succeeded
                let err = UtentReadError::InvalidState {
                    op: "next_entry",
                    state: self.state,
                };
                defx!("return Err({:?})", err);
                return ResultNextUtent::Err(err);
            }
        };
        let nread: usize = match read_result {
            Ok(val) => val,
            Err(err) => {
                let err_ = UtentReadError::Io {
                    path: self.path.clone(),
                    source: err,
                };
                self.set_error(&err_);
                defx!("return Err({:?})", err_);
                return ResultNextUtent::Err(err_);
            }
        };
        if nread == 0 {
            self.eof_seen = true;
            defx!("zero bytes read; return Done");
            return ResultNextUtent::Done;
        }
        if nread != sz {
            let err_ = UtentReadError::CorruptRecord {
                fileoffset: self.fileoffset,
                read: nread,
                expected: sz,
            };
            self.set_error(&err_);
            defx!("return Err({:?})", err_);
            return ResultNextUtent::Err(err_);
        }

        let utent: Utent = match buffer_to_utent(
            self.fileoffset,
            &self.tz_offset,
            &buffer[..sz],
            self.layout,
        ) {
            Some(val) => val,
            None => {
                // a full-size block always decodes; keep this typed anyway
                let err_ = UtentReadError::CorruptRecord {
                    fileoffset: self.fileoffset,
                    read: nread,
                    expected: sz,
                };
                self.set_error(&err_);
                defx!("return Err({:?})", err_);
                return ResultNextUtent::Err(err_);
            }
        };
        self.fileoffset += sz as FileOffset;
        self.entries_processed += 1;
        self.dt_first_last_update(utent.dt());
        defx!("return Found(fileoffset {})", utent.fileoffset_begin());

        ResultNextUtent::Found(utent)
    }

    /// Release the underlying handle. Idempotent: safe to call multiple
    /// times and safe on an already-closed instance.
    ///
    /// Also invoked on `drop`; `Option::take` makes explicit-then-
    /// automatic invocation release the handle exactly once.
    pub fn close(&mut self) {
        defñ!("({:?})", self.path);
        if let Some(file) = self.file.take() {
            drop(file);
        }
        self.state = ReaderState::Closed;
    }

    /// Replace the target file path.
    ///
    /// Fails with [`InvalidState`] while a handle is open; callers must
    /// [`close`] first. (The legacy behavior of renaming mid-read was
    /// platform-dependent and effectively undefined; rejecting it is a
    /// deliberate tightening.)
    ///
    /// The path is set as given, without the existence probe of [`new`];
    /// a bad path surfaces as a typed error at the next open. The cursor
    /// and EOF latch are reset and the state returns to `Unopened` so
    /// the next operation lazily opens the new target.
    ///
    /// [`InvalidState`]: self::UtentReadError#variant.InvalidState
    /// [`close`]: self::UtentReader#method.close
    /// [`new`]: UtentReader::new
    pub fn rename(
        &mut self,
        filename: FPath,
    ) -> Result<(), UtentReadError> {
        defn!("({:?})", filename);
        if self.state == ReaderState::Open {
            let err = UtentReadError::InvalidState {
                op: "rename",
                state: self.state,
            };
            defx!("return Err({:?})", err);
            return Err(err);
        }
        self.path = filename;
        self.state = ReaderState::Unopened;
        self.fileoffset = 0;
        self.eof_seen = false;
        defx!();

        Ok(())
    }

    /// Update the two statistic `DateTimeL` of
    /// `self.dt_first` and `self.dt_last`.
    fn dt_first_last_update(
        &mut self,
        datetime: &DateTimeL,
    ) {
        defñ!("({:?})", datetime);
        match self.dt_first {
            Some(dt_first_) => {
                if &dt_first_ > datetime {
                    self.dt_first = Some(*datetime);
                }
            }
            None => {
                self.dt_first = Some(*datetime);
            }
        }
        match self.dt_last {
            Some(dt_last_) => {
                if &dt_last_ < datetime {
                    self.dt_last = Some(*datetime);
                }
            }
            None => {
                self.dt_last = Some(*datetime);
            }
        }
    }

    /// Return an up-to-date [`SummaryUtentReader`] instance for this
    /// `UtentReader`.
    ///
    /// [`SummaryUtentReader`]: SummaryUtentReader
    pub fn summary(&self) -> SummaryUtentReader {
        let utentreader_utents_processed: Count = self.entries_processed;
        let utentreader_datetime_first = self.dt_first;
        let utentreader_datetime_last = self.dt_last;
        let utentreader_error: Option<String> = self.error.clone();

        SummaryUtentReader {
            utentreader_utents_processed,
            utentreader_datetime_first,
            utentreader_datetime_last,
            utentreader_error,
        }
    }
}

impl Drop for UtentReader {
    /// Guaranteed release of the handle on every exit path, including
    /// error unwinding. A prior explicit [`close`] makes this a no-op.
    ///
    /// [`close`]: self::UtentReader#method.close
    fn drop(&mut self) {
        defñ!("UtentReader.drop({:?})", self.path);
        self.close();
    }
}
