use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::input::LineInput;
use crate::log::{EventLog, Identity};
use crate::policy::PolicyFlag;
use crate::{Result, StoreError};

/// Construction-time settings for a [`LineStore`].
///
/// Policy flags are applied before the initial load, so `unique` dedupes the file
/// as it is read and `sorted` orders it afterwards.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub path: Option<String>,
    pub logging: bool,
    pub unique: PolicyFlag,
    pub sorted: bool,
    pub line_separator: String,
    pub identity: Option<Identity>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            path: None,
            logging: true,
            unique: PolicyFlag::Disabled,
            sorted: false,
            line_separator: "\n".to_string(),
            identity: None,
        }
    }
}

impl StoreOptions {
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn logging(mut self, enabled: bool) -> Self {
        self.logging = enabled;
        self
    }

    pub fn unique(mut self, unique: impl Into<PolicyFlag>) -> Self {
        self.unique = unique.into();
        self
    }

    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn line_separator(mut self, sep: impl Into<String>) -> Self {
        self.line_separator = sep.into();
        self
    }

    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// The lines of one file, held in memory with uniqueness, sort and dirty state.
#[derive(Debug, Clone)]
pub struct LineStore {
    lines: Vec<String>,
    source_path: Option<String>,
    unique: PolicyFlag,
    sorted: bool,
    dirty: bool,
    created_at: DateTime<Utc>,
    line_separator: String,
    log: EventLog,
}

impl Default for LineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LineStore {
    /// An empty store with no backing file.
    pub fn new() -> Self {
        Self::build(StoreOptions::default())
    }

    /// A store loaded from `path`.
    pub fn open(path: &str) -> Result<Self> {
        Self::with_options(StoreOptions::default().path(path))
    }

    /// A store built from `opts`, loading `opts.path` when set.
    ///
    /// Load failures propagate; no partially built store is returned.
    pub fn with_options(opts: StoreOptions) -> Result<Self> {
        let path = opts.path.clone();
        let mut store = Self::build(opts);
        if let Some(path) = path {
            store.load(&path)?;
        }
        Ok(store)
    }

    fn build(opts: StoreOptions) -> Self {
        let identity = opts.identity.unwrap_or_else(Identity::detect);
        let mut log = EventLog::new(identity, opts.logging);
        log.record(format!("init(path={:?})", opts.path));
        Self {
            lines: Vec::new(),
            source_path: None,
            unique: opts.unique,
            sorted: opts.sorted,
            dirty: false,
            created_at: Utc::now(),
            line_separator: opts.line_separator,
            log,
        }
    }

    /// Read `path` line by line and append to the current contents.
    ///
    /// Only trailing `\r`/`\n` are stripped. With `unique` on, lines already held
    /// are skipped. Does not touch the dirty flag.
    pub fn load(&mut self, path: &str) -> Result<()> {
        let path = path.trim();
        let unique = self.unique.resolve("unique")?;
        self.log.record(format!("Read-only opening {path}"));

        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        let mut reader = BufReader::new(file);
        let mut seen: HashSet<String> = if unique {
            self.lines.iter().cloned().collect()
        } else {
            HashSet::new()
        };
        let mut read = Vec::new();
        let mut buf = String::new();
        loop {
            buf.clear();
            let n = reader
                .read_line(&mut buf)
                .map_err(|e| StoreError::io(path, e))?;
            if n == 0 {
                break;
            }
            let line = buf.trim_end_matches(['\r', '\n']);
            if unique {
                if seen.contains(line) {
                    continue;
                }
                seen.insert(line.to_string());
            }
            read.push(line.to_string());
        }

        // nothing is kept from a read that failed partway
        self.lines.extend(read);
        self.source_path = Some(path.to_string());
        if self.sorted {
            self.sort_lines(|a, b| a.cmp(b), false);
        }
        tracing::debug!(path, lines = self.lines.len(), "loaded");
        self.log.record(format!("Read {} lines", self.lines.len()));
        Ok(())
    }

    /// Whole-line membership. Returns the stored line so callers can chain on it.
    pub fn contains(&self, line: &str) -> Option<&str> {
        self.lines.iter().find(|l| *l == line).map(String::as_str)
    }

    /// Append a line or lines. Returns whether anything was added.
    ///
    /// With `unique` on, entries already present (including ones added earlier in
    /// the same call) are skipped.
    pub fn add(&mut self, input: impl Into<LineInput>) -> Result<bool> {
        let input = input.into();
        self.log.record(format!(
            "Append {input:?} to {}; unique={}",
            self.path_for_log(),
            self.unique
        ));
        let Some(entries) = input.into_entries() else {
            return Ok(false);
        };
        let unique = self.unique.resolve("unique")?;

        let mut changed = false;
        for entry in entries {
            if unique && self.lines.contains(&entry) {
                continue;
            }
            self.lines.push(entry);
            changed = true;
        }
        self.after_mutation(changed);
        Ok(changed)
    }

    /// Alias for [`LineStore::add`].
    pub fn append(&mut self, input: impl Into<LineInput>) -> Result<bool> {
        self.add(input)
    }

    /// Remove every occurrence of each given line. Returns whether anything was removed.
    pub fn remove(&mut self, input: impl Into<LineInput>) -> bool {
        let input = input.into();
        self.log
            .record(format!("rm({}, {input:?})", self.path_for_log()));
        let Some(entries) = input.into_entries() else {
            return false;
        };

        let mut changed = false;
        for entry in entries {
            let mut index = 0;
            let mut positions = Vec::new();
            self.lines.retain(|l| {
                let keep = *l != entry;
                if !keep {
                    // position at the moment of removal, after earlier ones are gone
                    let removed = positions.len();
                    positions.push(index - removed);
                }
                index += 1;
                keep
            });
            if positions.is_empty() {
                self.log
                    .record(format!("{entry:?} not found in {}", self.path_for_log()));
                continue;
            }
            for pos in positions {
                self.log.record(format!(
                    "Removed {entry:?} from position {pos} of {}",
                    self.path_for_log()
                ));
            }
            changed = true;
        }
        self.after_mutation(changed);
        changed
    }

    /// Alias for [`LineStore::remove`].
    pub fn subtract(&mut self, input: impl Into<LineInput>) -> bool {
        self.remove(input)
    }

    /// Lines containing `needle` as a literal substring, in order.
    pub fn search(&self, needle: &str) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.contains(needle))
            .map(String::as_str)
            .collect()
    }

    /// Lines in which `pattern` matches anywhere, in order.
    pub fn search_regex(&self, pattern: &str) -> Result<Vec<&str>> {
        let re = Regex::new(pattern)?;
        Ok(self
            .lines
            .iter()
            .filter(|l| re.is_match(l))
            .map(String::as_str)
            .collect())
    }

    /// Rewrite every line equal to one of `old` into `new`, in place.
    ///
    /// Returns whether any line was rewritten by this call. An `old` entry equal to
    /// `new` rewrites nothing. With `unique` on, a match is dropped instead when
    /// `new` is already present.
    pub fn replace(&mut self, old: impl Into<LineInput>, new: &str) -> bool {
        let old = old.into();
        self.log.record(format!(
            "Replace {old:?} with {new:?} in {}",
            self.path_for_log()
        ));
        let Some(entries) = old.into_entries() else {
            return false;
        };

        let unique = self.unique == PolicyFlag::Enabled;
        let mut changed = false;
        for entry in entries {
            if entry == new {
                self.log
                    .record(format!("{entry:?} is its own replacement, skipped"));
                continue;
            }
            let mut present = unique && self.lines.iter().any(|l| l == new);
            let mut index = 0;
            let mut hits = Vec::new();
            let mut dropped = Vec::new();
            self.lines.retain_mut(|line| {
                let at = index - dropped.len();
                index += 1;
                if *line != entry {
                    return true;
                }
                if present {
                    dropped.push(at);
                    return false;
                }
                *line = new.to_string();
                hits.push(at);
                present = unique;
                true
            });
            if hits.is_empty() && dropped.is_empty() {
                self.log
                    .record(format!("{entry:?} not in {}", self.path_for_log()));
                continue;
            }
            for index in hits {
                self.log.record(format!(
                    "Replaced {entry:?} with {new:?} at line {index} of {}",
                    self.path_for_log()
                ));
            }
            for index in dropped {
                self.log.record(format!(
                    "Dropped {entry:?} at line {index} of {}, {new:?} already present",
                    self.path_for_log()
                ));
            }
            changed = true;
        }
        self.after_mutation(changed);
        changed
    }

    /// Write every line followed by the line separator, truncating the file.
    ///
    /// Writes even when nothing changed, so a drifted file on disk can be restored.
    pub fn persist(&mut self) -> Result<()> {
        let path = self.source_path.clone().ok_or(StoreError::NoSourcePath)?;
        self.log.record(format!("Writing {path}"));

        let file = File::create(&path).map_err(|e| StoreError::io(&path, e))?;
        let mut w = BufWriter::new(file);
        for line in &self.lines {
            w.write_all(line.as_bytes())
                .and_then(|_| w.write_all(self.line_separator.as_bytes()))
                .map_err(|e| StoreError::io(&path, e))?;
        }
        w.flush().map_err(|e| StoreError::io(&path, e))?;

        self.dirty = false;
        tracing::debug!(path = %path, lines = self.lines.len(), "persisted");
        Ok(())
    }

    /// Alias for [`LineStore::persist`].
    pub fn save(&mut self) -> Result<()> {
        self.persist()
    }

    /// Sort lexicographically, regardless of the `sorted` policy. Does not dirty the store.
    pub fn sort_now(&mut self, reverse: bool) {
        self.sort_lines(|a, b| a.cmp(b), reverse);
    }

    /// Sort with a caller-supplied comparator.
    pub fn sort_by<F>(&mut self, compare: F, reverse: bool)
    where
        F: FnMut(&str, &str) -> Ordering,
    {
        self.sort_lines(compare, reverse);
    }

    fn sort_lines<F>(&mut self, mut compare: F, reverse: bool)
    where
        F: FnMut(&str, &str) -> Ordering,
    {
        if reverse {
            self.lines.sort_by(|a, b| compare(b.as_str(), a.as_str()));
        } else {
            self.lines.sort_by(|a, b| compare(a.as_str(), b.as_str()));
        }
        self.log.record("Contents sorted");
    }

    fn after_mutation(&mut self, changed: bool) {
        if !changed {
            return;
        }
        self.dirty = true;
        if self.sorted {
            self.sort_lines(|a, b| a.cmp(b), false);
        }
    }

    fn path_for_log(&self) -> &str {
        self.source_path.as_deref().unwrap_or("<memory>")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Point the store at another file for the next persist. Leaves the dirty flag alone.
    pub fn set_source_path(&mut self, path: impl Into<String>) {
        let path = path.into().trim().to_string();
        self.log.record(format!("Source path set to {path}"));
        self.source_path = Some(path);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn line_separator(&self) -> &str {
        &self.line_separator
    }

    pub fn set_line_separator(&mut self, sep: impl Into<String>) {
        self.line_separator = sep.into();
    }

    pub fn unique(&self) -> &PolicyFlag {
        &self.unique
    }

    /// Set the `unique` policy. Not validated here; see [`PolicyFlag`].
    pub fn set_unique(&mut self, unique: impl Into<PolicyFlag>) {
        self.unique = unique.into();
    }

    pub fn is_sorted_policy(&self) -> bool {
        self.sorted
    }

    /// Set the `sorted` policy. Takes effect at the next mutation.
    pub fn set_sorted(&mut self, sorted: bool) {
        self.sorted = sorted;
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn render_log(&self) -> &str {
        self.log.render()
    }
}

impl fmt::Display for LineStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

impl<'a> IntoIterator for &'a LineStore {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
