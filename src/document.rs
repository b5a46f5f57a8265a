use crate::encoding::Encoding;
use crate::error::EditError;
use std::fs;
use std::io::Write;
use std::ops::Range;
use std::path::Path;

/// In-memory line buffer for one file.
///
/// Each line keeps its own terminator (`\n` or `\r\n`); only the last line
/// may lack one. The buffer is built fresh for every call and dropped after
/// it is flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    encoding: Encoding,
    line_ending: LineEnding,
}

/// Terminator the engine uses when it has to add one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Majority terminator of `text`; ties and terminator-free text use `\n`.
    pub fn detect(text: &str) -> Self {
        let total = text.matches('\n').count();
        let crlf = text.matches("\r\n").count();
        if crlf * 2 > total {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// How a buffer is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushOptions {
    /// Write through a temp file in the same directory and rename over the target
    pub atomic: bool,
    /// Bump mtime after writing so watchers notice the change
    pub touch_mtime: bool,
}

impl Default for FlushOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            touch_mtime: true,
        }
    }
}

impl Document {
    pub fn from_text(text: &str, encoding: Encoding) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
            encoding,
            line_ending: LineEnding::detect(text),
        }
    }

    /// Read and decode `path`.
    pub fn load(path: &Path, encoding: Encoding) -> Result<Self, EditError> {
        let bytes = fs::read(path).map_err(|source| EditError::io(path, source))?;
        let text = encoding
            .decode(&bytes)
            .map_err(|source| EditError::Encoding {
                path: path.to_path_buf(),
                encoding,
                source,
            })?;
        Ok(Self::from_text(&text, encoding))
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Concatenated text of the lines at `indices` (zero-based, end-exclusive).
    pub fn slice(&self, indices: Range<usize>) -> String {
        self.lines[indices].concat()
    }

    pub fn last_line(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Split caller content into lines, adding this document's terminator
    /// if the content does not already end with one. Empty content becomes
    /// a single blank line.
    pub fn normalize_block(&self, content: &str) -> Vec<String> {
        let mut block = content.to_string();
        if !block.ends_with('\n') {
            block.push_str(self.line_ending.as_str());
        }
        block.split_inclusive('\n').map(str::to_string).collect()
    }

    pub fn splice(&mut self, indices: Range<usize>, replacement: Vec<String>) {
        self.lines.splice(indices, replacement);
    }

    pub fn insert_lines(&mut self, index: usize, lines: Vec<String>) {
        self.lines.splice(index..index, lines);
    }

    /// Give the last line a terminator if it lacks one.
    pub fn terminate_last_line(&mut self) {
        let ending = self.line_ending.as_str();
        if let Some(last) = self.lines.last_mut() {
            if !last.ends_with('\n') {
                last.push_str(ending);
            }
        }
    }

    /// Append lines at the end, terminating the current last line first.
    pub fn append_lines(&mut self, lines: Vec<String>) {
        self.terminate_last_line();
        self.lines.extend(lines);
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }

    /// Encode the buffer and write it to `path`.
    pub fn flush(&self, path: &Path, options: FlushOptions) -> Result<(), EditError> {
        let bytes = self
            .encoding
            .encode(&self.to_text())
            .map_err(|source| EditError::Encoding {
                path: path.to_path_buf(),
                encoding: self.encoding,
                source,
            })?;
        write_file(path, &bytes, options)
    }
}

pub(crate) fn write_file(
    path: &Path,
    content: &[u8],
    options: FlushOptions,
) -> Result<(), EditError> {
    if options.atomic {
        atomic_write(path, content).map_err(|source| EditError::io(path, source))?;
    } else {
        fs::write(path, content).map_err(|source| EditError::io(path, source))?;
    }

    if options.touch_mtime {
        filetime::set_file_mtime(path, filetime::FileTime::now())
            .map_err(|source| EditError::io(path, source))?;
    }
    Ok(())
}

/// Write a file that must not exist yet. A file that appears between the
/// caller's check and this write is reported as `AlreadyExists`, never replaced.
pub(crate) fn create_new_file(
    path: &Path,
    content: &[u8],
    options: FlushOptions,
) -> Result<(), EditError> {
    let created = if options.atomic {
        atomic_create(path, content)
    } else {
        exclusive_create(path, content)
    };
    created.map_err(|source| match source.kind() {
        std::io::ErrorKind::AlreadyExists => EditError::AlreadyExists {
            path: path.to_path_buf(),
        },
        _ => EditError::io(path, source),
    })?;

    if options.touch_mtime {
        filetime::set_file_mtime(path, filetime::FileTime::now())
            .map_err(|source| EditError::io(path, source))?;
    }
    Ok(())
}

fn parent_dir(path: &Path) -> std::io::Result<&Path> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent),
        _ => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        )),
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Symlinks are followed so the link itself survives, and permissions of an
/// existing target carry over to the replacement.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let path = target.as_path();

    let mut temp = tempfile::NamedTempFile::new_in(parent_dir(path)?)?;
    temp.write_all(content)?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Same as [`atomic_write`] but the final link fails if `path` exists.
fn atomic_create(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut temp = tempfile::NamedTempFile::new_in(parent_dir(path)?)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist_noclobber(path).map_err(|e| e.error)?;
    Ok(())
}

fn exclusive_create(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(content)?;
    file.sync_all()
}
