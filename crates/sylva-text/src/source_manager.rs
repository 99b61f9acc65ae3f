// src/source_manager.rs
//
// The buffer store for a compilation: loads files, assigns in-memory text,
// allocates macro-expansion buffers, and answers every location query the
// rest of the pipeline has (line/column, file name, include parent, macro
// provenance, document order).
//
// The manager may be shared across parser threads. One readers-writer lock
// guards the buffer table, the path cache, and the include directory lists;
// buffer text is immutable once loaded and is handed out behind an Arc, so
// readers touch it without any lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::OnceLock;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::location::{BufferId, SourceLocation, SourceRange};

/// Immutable contents of one loaded file or in-memory buffer.
#[derive(Debug)]
pub struct FileData {
    name: String,
    directory: Option<PathBuf>,
    text: String,
    line_offsets: OnceLock<Vec<usize>>,
}

impl FileData {
    fn new(name: String, directory: Option<PathBuf>, text: String) -> Self {
        FileData {
            name,
            directory,
            text,
            line_offsets: OnceLock::new(),
        }
    }

    /// The name the buffer was loaded under (proximate path or synthetic name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full text of the buffer.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offsets of each line start, computed on first use.
    /// CRLF and LFCR pairs count as a single terminator.
    fn line_offsets(&self) -> &[usize] {
        self.line_offsets.get_or_init(|| {
            let bytes = self.text.as_bytes();
            let mut offsets = vec![0];
            let mut i = 0;
            while i < bytes.len() {
                let b = bytes[i];
                if b == b'\n' || b == b'\r' {
                    if i + 1 < bytes.len() {
                        let next = bytes[i + 1];
                        if (next == b'\n' || next == b'\r') && next != b {
                            i += 1;
                        }
                    }
                    i += 1;
                    offsets.push(i);
                } else {
                    i += 1;
                }
            }
            offsets
        })
    }
}

/// A buffer handle: the id plus a reference to the text.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    pub id: BufferId,
    pub data: Arc<FileData>,
}

impl SourceBuffer {
    pub fn text(&self) -> &str {
        self.data.text()
    }
}

/// A `line` directive encountered in a file: remaps reported line numbers
/// and file names from the directive onward.
#[derive(Debug, Clone)]
struct LineDirective {
    name: String,
    /// Raw (physical) line number on which the directive itself sits.
    line_in_file: usize,
    /// The line number the directive establishes.
    line_of_directive: usize,
    #[allow(dead_code)]
    level: u8,
}

#[derive(Debug)]
struct FileInfo {
    data: Arc<FileData>,
    included_from: SourceLocation,
    /// Sorted by `line_in_file`; directives arrive in document order during
    /// preprocessing so appends preserve the order.
    line_directives: Vec<LineDirective>,
}

#[derive(Debug)]
struct ExpansionInfo {
    original_loc: SourceLocation,
    expansion_range: SourceRange,
    macro_name: Option<String>,
    is_macro_arg: bool,
}

#[derive(Debug)]
enum BufferEntry {
    File(FileInfo),
    Expansion(ExpansionInfo),
}

#[derive(Default)]
struct Inner {
    buffers: Vec<BufferEntry>,
    /// Canonical path -> file data; `None` remembers a failed read so we
    /// don't retry it for every include candidate.
    lookup_cache: FxHashMap<PathBuf, Option<Arc<FileData>>>,
    /// In-memory buffers assigned by name, searched as a last resort by
    /// `read_header`.
    text_lookup: FxHashMap<String, Arc<FileData>>,
    system_dirs: Vec<PathBuf>,
    user_dirs: Vec<PathBuf>,
    unnamed_count: usize,
}

/// Owns all source buffers for one or more compilations and decodes
/// `SourceLocation`s against them.
pub struct SourceManager {
    inner: RwLock<Inner>,
}

impl Default for SourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceManager {
    pub fn new() -> Self {
        let mut inner = Inner::default();
        // Dummy entry so that real buffer ids start at 1; id 0 stays invalid.
        inner.buffers.push(BufferEntry::File(FileInfo {
            data: Arc::new(FileData::new(String::new(), None, String::new())),
            included_from: SourceLocation::NONE,
            line_directives: Vec::new(),
        }));
        SourceManager {
            inner: RwLock::new(inner),
        }
    }

    pub fn add_system_directory(&self, path: impl Into<PathBuf>) {
        self.inner.write().system_dirs.push(path.into());
    }

    pub fn add_user_directory(&self, path: impl Into<PathBuf>) {
        self.inner.write().user_dirs.push(path.into());
    }

    /// Reads a file from disk, canonicalizing and caching by canonical path.
    /// Returns `None` on read failure, non-UTF-8 content, or a path that
    /// cannot be canonicalized; the failure is cached too.
    pub fn read_source(&self, path: impl AsRef<Path>) -> Option<SourceBuffer> {
        self.open_cached(path.as_ref(), SourceLocation::NONE)
    }

    /// Resolves an include path: system includes search the system
    /// directories only; user includes search the including file's
    /// directory, then the user directories, then in-memory buffers.
    pub fn read_header(
        &self,
        path: &str,
        included_from: SourceLocation,
        is_system: bool,
    ) -> Option<SourceBuffer> {
        if path.is_empty() {
            return None;
        }

        let p = Path::new(path);
        if p.is_absolute() {
            return self.open_cached(p, included_from);
        }

        if is_system {
            let dirs = self.inner.read().system_dirs.clone();
            for dir in &dirs {
                if let Some(buf) = self.open_cached(&dir.join(p), included_from) {
                    return Some(buf);
                }
            }
            return None;
        }

        // Relative to the including file first.
        let including_dir = self
            .file_info(included_from.buffer(), |info| info.data.directory.clone())
            .flatten();
        if let Some(dir) = including_dir {
            if let Some(buf) = self.open_cached(&dir.join(p), included_from) {
                return Some(buf);
            }
        }

        let dirs = self.inner.read().user_dirs.clone();
        for dir in &dirs {
            if let Some(buf) = self.open_cached(&dir.join(p), included_from) {
                return Some(buf);
            }
        }

        // Last resort: user-assigned in-memory buffers.
        let mut inner = self.inner.write();
        if let Some(data) = inner.text_lookup.get(path).cloned() {
            return Some(Self::create_file_entry(&mut inner, data, included_from));
        }

        None
    }

    /// Creates a named in-memory buffer. An empty `path` gets a synthetic
    /// `<unnamed_bufferN>` name.
    pub fn assign_text(
        &self,
        path: &str,
        text: impl Into<String>,
        included_from: SourceLocation,
    ) -> SourceBuffer {
        let mut inner = self.inner.write();
        let name = if path.is_empty() {
            let n = inner.unnamed_count;
            inner.unnamed_count += 1;
            format!("<unnamed_buffer{n}>")
        } else {
            path.to_string()
        };

        let data = Arc::new(FileData::new(name.clone(), None, text.into()));
        inner.text_lookup.insert(name, data.clone());
        Self::create_file_entry(&mut inner, data, included_from)
    }

    /// Allocates an expansion buffer for tokens produced by a macro body.
    /// The returned location is offset 0 of the new buffer; token locations
    /// within the expansion are formed by adding the token's offset inside
    /// the macro body.
    pub fn create_expansion_loc(
        &self,
        original_loc: SourceLocation,
        expansion_range: SourceRange,
        macro_name: impl Into<Option<String>>,
    ) -> SourceLocation {
        self.push_expansion(ExpansionInfo {
            original_loc,
            expansion_range,
            macro_name: macro_name.into(),
            is_macro_arg: false,
        })
    }

    /// Allocates an expansion buffer for tokens that came from a macro
    /// argument; their provenance traces back to the argument site in user
    /// code rather than into the macro body.
    pub fn create_macro_arg_loc(
        &self,
        original_loc: SourceLocation,
        expansion_range: SourceRange,
    ) -> SourceLocation {
        self.push_expansion(ExpansionInfo {
            original_loc,
            expansion_range,
            macro_name: None,
            is_macro_arg: true,
        })
    }

    fn push_expansion(&self, info: ExpansionInfo) -> SourceLocation {
        let mut inner = self.inner.write();
        let id = BufferId::new(inner.buffers.len() as u32);
        inner.buffers.push(BufferEntry::Expansion(info));
        SourceLocation::new(id, 0)
    }

    /// Registers a `line` directive. Reported line numbers at or after the
    /// directive become `line_num + (raw_line - directive_raw_line) - 1`,
    /// and the reported file name becomes `name` when non-empty.
    pub fn add_line_directive(
        &self,
        location: SourceLocation,
        line_num: usize,
        name: &str,
        level: u8,
    ) {
        let file_loc = self.get_fully_expanded_loc(location);
        let Some(raw_line) = self.raw_line_number(file_loc) else {
            return;
        };

        let mut inner = self.inner.write();
        if let Some(BufferEntry::File(info)) =
            inner.buffers.get_mut(file_loc.buffer().index() as usize)
        {
            info.line_directives.push(LineDirective {
                name: name.to_string(),
                line_in_file: raw_line,
                line_of_directive: line_num,
                level,
            });
        }
    }

    /// The 1-based line number of a location, after `line` remapping.
    /// Macro locations report the line of their fully-expanded form.
    pub fn get_line_number(&self, location: SourceLocation) -> Option<usize> {
        let file_loc = self.get_fully_expanded_loc(location);
        let raw_line = self.raw_line_number(file_loc)?;

        let inner = self.inner.read();
        match inner.buffers.get(file_loc.buffer().index() as usize) {
            Some(BufferEntry::File(info)) => match previous_line_directive(info, raw_line) {
                Some(dir) => Some(dir.line_of_directive + (raw_line - dir.line_in_file) - 1),
                None => Some(raw_line),
            },
            _ => None,
        }
    }

    /// The 1-based column of a location, counting bytes from the most
    /// recent line terminator.
    pub fn get_column_number(&self, location: SourceLocation) -> Option<usize> {
        let data = self.file_data(location.buffer())?;
        let bytes = data.text.as_bytes();
        let offset = location.offset().min(bytes.len());
        let mut line_start = offset;
        while line_start > 0 {
            let b = bytes[line_start - 1];
            if b == b'\n' || b == b'\r' {
                break;
            }
            line_start -= 1;
        }
        Some(offset - line_start + 1)
    }

    /// The file name to report for a location: the nearest preceding `line`
    /// directive's name if one names a file, otherwise the buffer's own name.
    pub fn get_file_name(&self, location: SourceLocation) -> Option<String> {
        let file_loc = self.get_fully_expanded_loc(location);

        let has_directives = self
            .file_info(file_loc.buffer(), |info| !info.line_directives.is_empty())
            .unwrap_or(false);
        if !has_directives {
            return self.get_raw_file_name(file_loc.buffer());
        }

        let raw_line = self.raw_line_number(file_loc)?;
        let inner = self.inner.read();
        match inner.buffers.get(file_loc.buffer().index() as usize) {
            Some(BufferEntry::File(info)) => match previous_line_directive(info, raw_line) {
                Some(dir) if !dir.name.is_empty() => Some(dir.name.clone()),
                _ => Some(info.data.name.clone()),
            },
            _ => None,
        }
    }

    /// The buffer's own name, ignoring `line` directives.
    pub fn get_raw_file_name(&self, buffer: BufferId) -> Option<String> {
        self.file_info(buffer, |info| info.data.name.clone())
    }

    /// The location of the `include` that brought this buffer in, if any.
    pub fn get_included_from(&self, buffer: BufferId) -> SourceLocation {
        self.file_info(buffer, |info| info.included_from)
            .unwrap_or(SourceLocation::NONE)
    }

    /// The name of the macro whose expansion produced this location, if any.
    /// Argument expansions are walked up to the enclosing macro expansion.
    pub fn get_macro_name(&self, mut location: SourceLocation) -> Option<String> {
        while self.is_macro_arg_loc(location) {
            location = self.get_expansion_loc(location);
        }
        if !location.is_valid() {
            return None;
        }
        let inner = self.inner.read();
        match inner.buffers.get(location.buffer().index() as usize) {
            Some(BufferEntry::Expansion(info)) => info.macro_name.clone(),
            _ => None,
        }
    }

    pub fn is_file_loc(&self, location: SourceLocation) -> bool {
        location.is_valid()
            && self
                .file_info(location.buffer(), |_| ())
                .is_some()
    }

    pub fn is_macro_loc(&self, location: SourceLocation) -> bool {
        if !location.is_valid() {
            return false;
        }
        let inner = self.inner.read();
        matches!(
            inner.buffers.get(location.buffer().index() as usize),
            Some(BufferEntry::Expansion(_))
        )
    }

    pub fn is_macro_arg_loc(&self, location: SourceLocation) -> bool {
        if !location.is_valid() {
            return false;
        }
        let inner = self.inner.read();
        matches!(
            inner.buffers.get(location.buffer().index() as usize),
            Some(BufferEntry::Expansion(info)) if info.is_macro_arg
        )
    }

    pub fn is_included_file_loc(&self, location: SourceLocation) -> bool {
        self.get_included_from(location.buffer()).is_valid()
    }

    /// Whether the location came through any preprocessing step (macro
    /// expansion or file inclusion).
    pub fn is_preprocessed_loc(&self, location: SourceLocation) -> bool {
        self.is_macro_loc(location) || self.is_included_file_loc(location)
    }

    /// The start of the range where this macro location was expanded.
    pub fn get_expansion_loc(&self, location: SourceLocation) -> SourceLocation {
        self.get_expansion_range(location).start
    }

    pub fn get_expansion_range(&self, location: SourceLocation) -> SourceRange {
        if !location.is_valid() {
            return SourceRange::NONE;
        }
        let inner = self.inner.read();
        match inner.buffers.get(location.buffer().index() as usize) {
            Some(BufferEntry::Expansion(info)) => info.expansion_range,
            _ => SourceRange::NONE,
        }
    }

    /// The location inside the macro definition (or argument text) that
    /// this expansion location corresponds to.
    pub fn get_original_loc(&self, location: SourceLocation) -> SourceLocation {
        if !location.is_valid() {
            return SourceLocation::NONE;
        }
        let inner = self.inner.read();
        match inner.buffers.get(location.buffer().index() as usize) {
            Some(BufferEntry::Expansion(info)) => info.original_loc + location.offset(),
            _ => SourceLocation::NONE,
        }
    }

    /// Unwinds macro provenance all the way back to the original
    /// definition text.
    pub fn get_fully_original_loc(&self, mut location: SourceLocation) -> SourceLocation {
        while self.is_macro_loc(location) {
            location = self.get_original_loc(location);
        }
        location
    }

    /// Unwinds macro provenance forward to the file location where the
    /// outermost expansion happened. Argument locations unwind through the
    /// argument text back to the use site.
    pub fn get_fully_expanded_loc(&self, mut location: SourceLocation) -> SourceLocation {
        while self.is_macro_loc(location) {
            if self.is_macro_arg_loc(location) {
                location = self.get_original_loc(location);
            } else {
                location = self.get_expansion_loc(location);
            }
        }
        location
    }

    /// The full text of a file buffer.
    pub fn get_source(&self, buffer: BufferId) -> Option<Arc<FileData>> {
        self.file_data(buffer)
    }

    /// Document order across include and expansion boundaries: walks both
    /// locations up their provenance chains to a common ancestor buffer and
    /// compares offsets there.
    pub fn is_before_in_compilation_unit(
        &self,
        mut left: SourceLocation,
        mut right: SourceLocation,
    ) -> bool {
        if left.buffer() == right.buffer() {
            return left.offset() < right.offset();
        }

        let move_up = |loc: &mut SourceLocation| -> bool {
            if loc.is_valid() && !self.is_file_loc(*loc) {
                *loc = self.get_expansion_loc(*loc);
                false
            } else {
                let included = self.get_included_from(loc.buffer());
                if !included.is_valid() {
                    return true;
                }
                *loc = included;
                false
            }
        };

        // Record left's whole chain, then walk right up until we land in it.
        let mut left_chain: FxHashMap<BufferId, usize> = FxHashMap::default();
        loop {
            left_chain.entry(left.buffer()).or_insert(left.offset());
            if left.buffer() == right.buffer() || move_up(&mut left) {
                break;
            }
        }

        while !left_chain.contains_key(&right.buffer()) {
            if move_up(&mut right) {
                break;
            }
        }

        if let Some(&offset) = left_chain.get(&right.buffer()) {
            left = SourceLocation::new(right.buffer(), offset);
        }

        debug_assert_eq!(left.buffer(), right.buffer());
        left.offset() < right.offset()
    }

    fn raw_line_number(&self, location: SourceLocation) -> Option<usize> {
        let data = self.file_data(location.buffer())?;
        let offsets = data.line_offsets();
        let offset = location.offset();
        // Number of line starts at or before the offset = the 1-based line.
        match offsets.binary_search(&offset) {
            Ok(idx) => Some(idx + 1),
            Err(idx) => Some(idx),
        }
    }

    fn file_data(&self, buffer: BufferId) -> Option<Arc<FileData>> {
        self.file_info(buffer, |info| info.data.clone())
    }

    fn file_info<R>(&self, buffer: BufferId, f: impl FnOnce(&FileInfo) -> R) -> Option<R> {
        if !buffer.is_valid() {
            return None;
        }
        let inner = self.inner.read();
        match inner.buffers.get(buffer.index() as usize) {
            Some(BufferEntry::File(info)) => Some(f(info)),
            _ => None,
        }
    }

    fn open_cached(&self, path: &Path, included_from: SourceLocation) -> Option<SourceBuffer> {
        let abs = match path.canonicalize() {
            Ok(p) => p,
            Err(_) => return None,
        };

        {
            let mut inner = self.inner.write();
            if let Some(cached) = inner.lookup_cache.get(&abs).cloned() {
                return cached.map(|data| Self::create_file_entry(&mut inner, data, included_from));
            }
        }

        let text = match std::fs::read(&abs).ok().and_then(|b| String::from_utf8(b).ok()) {
            Some(t) => t,
            None => {
                tracing::debug!(path = %abs.display(), "failed to read source file");
                self.inner.write().lookup_cache.insert(abs, None);
                return None;
            }
        };

        let name = path.to_string_lossy().into_owned();
        let directory = abs.parent().map(Path::to_path_buf);
        let data = Arc::new(FileData::new(name, directory, text));

        let mut inner = self.inner.write();
        inner.lookup_cache.insert(abs, Some(data.clone()));
        Some(Self::create_file_entry(&mut inner, data, included_from))
    }

    fn create_file_entry(
        inner: &mut Inner,
        data: Arc<FileData>,
        included_from: SourceLocation,
    ) -> SourceBuffer {
        let id = BufferId::new(inner.buffers.len() as u32);
        inner.buffers.push(BufferEntry::File(FileInfo {
            data: data.clone(),
            included_from,
            line_directives: Vec::new(),
        }));
        SourceBuffer { id, data }
    }
}

/// The nearest directive strictly before `raw_line`, if any.
fn previous_line_directive(info: &FileInfo, raw_line: usize) -> Option<&LineDirective> {
    let idx = info
        .line_directives
        .partition_point(|d| d.line_in_file < raw_line);
    if idx == 0 {
        None
    } else {
        Some(&info.line_directives[idx - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with(text: &str) -> (SourceManager, SourceBuffer) {
        let sm = SourceManager::new();
        let buf = sm.assign_text("test.sv", text, SourceLocation::NONE);
        (sm, buf)
    }

    #[test]
    fn assign_text_allocates_dense_ids() {
        let sm = SourceManager::new();
        let a = sm.assign_text("", "one", SourceLocation::NONE);
        let b = sm.assign_text("", "two", SourceLocation::NONE);
        assert_eq!(a.id.index(), 1);
        assert_eq!(b.id.index(), 2);
        assert!(sm.get_raw_file_name(a.id).unwrap().starts_with("<unnamed_buffer"));
    }

    #[test]
    fn line_and_column_numbers() {
        let (sm, buf) = manager_with("module m;\n  wire w;\nendmodule\n");
        let loc = SourceLocation::new(buf.id, 12); // 'w' of "wire"
        assert_eq!(sm.get_line_number(loc), Some(2));
        assert_eq!(sm.get_column_number(loc), Some(3));

        let first = SourceLocation::new(buf.id, 0);
        assert_eq!(sm.get_line_number(first), Some(1));
        assert_eq!(sm.get_column_number(first), Some(1));
    }

    #[test]
    fn crlf_counts_as_one_terminator() {
        let (sm, buf) = manager_with("a\r\nb\nc");
        assert_eq!(sm.get_line_number(SourceLocation::new(buf.id, 3)), Some(2)); // 'b'
        assert_eq!(sm.get_line_number(SourceLocation::new(buf.id, 5)), Some(3)); // 'c'
    }

    #[test]
    fn line_directive_remaps() {
        let (sm, buf) = manager_with("line1\nline2\nline3\nline4\n");
        // Directive sits on physical line 2, establishing line 100.
        sm.add_line_directive(SourceLocation::new(buf.id, 6), 100, "other.sv", 0);

        // Physical line 3 reports 100 + (3 - 2) - 1 = 100.
        let loc = SourceLocation::new(buf.id, 12);
        assert_eq!(sm.get_line_number(loc), Some(100));
        assert_eq!(sm.get_file_name(loc).as_deref(), Some("other.sv"));

        // Locations before the directive are untouched.
        let before = SourceLocation::new(buf.id, 0);
        assert_eq!(sm.get_line_number(before), Some(1));
        assert_eq!(sm.get_file_name(before).as_deref(), Some("test.sv"));
    }

    #[test]
    fn expansion_provenance() {
        let (sm, buf) = manager_with("`FOO here");
        let use_site = SourceLocation::new(buf.id, 0);
        let range = SourceRange::new(use_site, use_site + 4usize);
        let def_loc = SourceLocation::new(buf.id, 5);

        let exp = sm.create_expansion_loc(def_loc, range, Some("FOO".to_string()));
        assert!(sm.is_macro_loc(exp));
        assert!(!sm.is_macro_arg_loc(exp));
        assert!(sm.is_preprocessed_loc(exp));
        assert_eq!(sm.get_macro_name(exp).as_deref(), Some("FOO"));
        assert_eq!(sm.get_expansion_loc(exp), use_site);
        assert_eq!(sm.get_original_loc(exp + 2usize), def_loc + 2usize);
        assert_eq!(sm.get_fully_expanded_loc(exp + 2usize), use_site);
        assert_eq!(sm.get_fully_original_loc(exp + 2usize), def_loc + 2usize);
    }

    #[test]
    fn document_order_across_expansion() {
        let (sm, buf) = manager_with("some text with a macro in it");
        let a = SourceLocation::new(buf.id, 3);
        let use_site = SourceLocation::new(buf.id, 10);
        let exp = sm.create_expansion_loc(
            SourceLocation::new(buf.id, 20),
            SourceRange::new(use_site, use_site + 5usize),
            Some("M".to_string()),
        );
        let b = SourceLocation::new(buf.id, 15);

        assert!(sm.is_before_in_compilation_unit(a, exp));
        assert!(!sm.is_before_in_compilation_unit(exp, a));
        assert!(sm.is_before_in_compilation_unit(exp, b));

        // Same buffer fast path.
        assert!(sm.is_before_in_compilation_unit(a, b));
    }

    #[test]
    fn document_order_across_include() {
        let sm = SourceManager::new();
        let outer = sm.assign_text("outer.sv", "`include \"inner.sv\"\nmore", SourceLocation::NONE);
        let inc_loc = SourceLocation::new(outer.id, 0);
        let inner = sm.assign_text("inner.sv", "included text", inc_loc);

        let in_inner = SourceLocation::new(inner.id, 4);
        let after = SourceLocation::new(outer.id, 20);
        assert!(sm.is_before_in_compilation_unit(in_inner, after));
        assert!(!sm.is_before_in_compilation_unit(after, in_inner));
    }

    #[test]
    fn read_header_finds_assigned_text() {
        let sm = SourceManager::new();
        sm.assign_text("defs.svh", "`define W 8", SourceLocation::NONE);
        let outer = sm.assign_text("top.sv", "`include \"defs.svh\"", SourceLocation::NONE);

        let inc = sm.read_header("defs.svh", SourceLocation::new(outer.id, 0), false);
        assert!(inc.is_some());
        assert_eq!(inc.unwrap().text(), "`define W 8");

        assert!(sm.read_header("missing.svh", SourceLocation::new(outer.id, 0), false).is_none());
    }

    #[test]
    fn missing_file_is_none() {
        let sm = SourceManager::new();
        assert!(sm.read_source("/nonexistent/definitely/not/here.sv").is_none());
    }
}
