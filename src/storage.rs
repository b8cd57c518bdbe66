use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Datelike;
use log::{debug, error, info, trace, warn};
use regex::Regex;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{is_blank, Config, NoteError, Result, SearchHit, StampPattern, Timestamp};

/// File extension of note files.
const NOTE_EXTENSION: &str = "md";

/// Storage of notes keyed by timestamp.
///
/// `entries` returns timestamps in ascending order.
pub trait NoteRepository {
    /// Timestamps of all notes selected by `pattern`.
    fn entries(&self, pattern: &StampPattern) -> Result<Vec<Timestamp>>;

    fn exists(&self, timestamp: &Timestamp) -> bool;

    /// Stores a new note. Fails with `DuplicateTimestamp` or `EmptyText`.
    fn create(&self, timestamp: &Timestamp, lines: &[String]) -> Result<()>;

    /// Reads the text of a note. Fails with `MissingTimestamp`.
    fn read(&self, timestamp: &Timestamp) -> Result<Vec<String>>;

    /// Replaces the text of a note and returns the timestamp it is now
    /// stored under.
    fn update(&self, timestamp: &Timestamp, lines: &[String], keep_timestamp: bool)
        -> Result<Timestamp>;

    /// Removes a note. Fails with `MissingTimestamp`.
    fn delete(&self, timestamp: &Timestamp) -> Result<()>;

    /// Lines matching `regex` in notes selected by `pattern`, newest note
    /// first and lines in file order.
    fn search(&self, regex: &Regex, pattern: &StampPattern) -> Result<Vec<SearchHit>> {
        let mut stamps = self.entries(pattern)?;
        stamps.reverse();

        let mut hits = Vec::new();
        for timestamp in stamps {
            for (index, line) in self.read(&timestamp)?.into_iter().enumerate() {
                if regex.is_match(&line) {
                    hits.push(SearchHit {
                        timestamp,
                        line_number: index + 1,
                        text: line,
                    });
                }
            }
        }
        Ok(hits)
    }
}

/// Repository storing each note as `<root>/YYYY/MM/<timestamp>.md`.
#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    /// Directory holding the year directories
    root: PathBuf,
}

impl FileSystemRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Opens the repository described by the configuration. Directories
    /// are created on the first write.
    pub fn open(config: &Config) -> Self {
        Self::new(config.repository_path())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensures the repository directory exists.
    pub fn initialize(&self) -> Result<()> {
        if !self.root.exists() {
            debug!(
                "Repository directory does not exist, creating: {}",
                self.root.display()
            );
            fs::create_dir_all(&self.root).map_err(|e| {
                error!("Failed to create repository directory: {}", e);
                NoteError::DirectoryError {
                    path: self.root.clone(),
                }
            })?;
        }
        Ok(())
    }

    /// Helper method to get the file path for a note
    pub fn note_path(&self, timestamp: &Timestamp) -> PathBuf {
        let (year, month) = timestamp.path_components();
        self.root
            .join(year)
            .join(month)
            .join(format!("{}.{}", timestamp, NOTE_EXTENSION))
    }

    /// Narrowest directory that can hold every note selected by `pattern`.
    fn walk_root(&self, pattern: &StampPattern) -> PathBuf {
        let year_month = |year: i32, month: u32| {
            self.root
                .join(format!("{:04}", year))
                .join(format!("{:02}", month))
        };

        match pattern {
            StampPattern::Any | StampPattern::MonthDay { .. } => self.root.clone(),
            StampPattern::Year(year) => self.root.join(format!("{:04}", year)),
            StampPattern::YearMonth { year, month } => year_month(*year, *month),
            StampPattern::Date(_) | StampPattern::Instant(_) | StampPattern::Exact(_) => {
                match pattern.date_portion() {
                    Some(date) => year_month(date.year(), date.month()),
                    None => self.root.clone(),
                }
            }
        }
    }

    /// Writes the note text using a temporary file persisted into place.
    fn write_note(&self, timestamp: &Timestamp, lines: &[String]) -> Result<()> {
        let file_path = self.note_path(timestamp);
        debug!("File path for note: {}", file_path.display());

        // Ensure the parent directory exists
        let dir = match file_path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => self.root.clone(),
        };
        if !dir.exists() {
            debug!("Creating parent directory: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                NoteError::DirectoryError { path: dir.clone() }
            })?;
        }

        let mut temp_file = NamedTempFile::new_in(&dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NoteError::Io(e)
        })?;

        trace!("Writing {} lines to temporary file", lines.len());
        for line in lines {
            writeln!(temp_file, "{}", line)?;
        }
        temp_file.flush()?;

        temp_file.persist(&file_path).map_err(|e| {
            error!(
                "Failed to persist file {}: {}",
                file_path.display(),
                e.error
            );
            NoteError::Io(e.error)
        })?;

        Ok(())
    }

    fn remove_note_file(&self, timestamp: &Timestamp) -> Result<()> {
        let file_path = self.note_path(timestamp);
        debug!("Deleting note file: {}", file_path.display());
        fs::remove_file(&file_path).map_err(|e| {
            error!("Failed to delete note file {}: {}", file_path.display(), e);
            NoteError::Io(e)
        })?;

        if let Some(parent) = file_path.parent() {
            self.cleanup_empty_directory(parent);
        }
        Ok(())
    }

    /// Removes `dir_path` when empty, then its parents up to the root.
    fn cleanup_empty_directory(&self, dir_path: &Path) {
        if !dir_path.exists() || dir_path == self.root || !dir_path.starts_with(&self.root) {
            return;
        }

        match fs::read_dir(dir_path) {
            Ok(mut entries) => {
                if entries.next().is_none() {
                    debug!("Removing empty directory: {}", dir_path.display());
                    match fs::remove_dir(dir_path) {
                        Ok(_) => {
                            if let Some(parent) = dir_path.parent() {
                                self.cleanup_empty_directory(parent);
                            }
                        }
                        Err(e) => warn!(
                            "Failed to remove empty directory {}: {}",
                            dir_path.display(),
                            e
                        ),
                    }
                }
            }
            Err(e) => warn!("Failed to read directory {}: {}", dir_path.display(), e),
        }
    }
}

impl NoteRepository for FileSystemRepository {
    fn entries(&self, pattern: &StampPattern) -> Result<Vec<Timestamp>> {
        let walk_root = self.walk_root(pattern);
        if !walk_root.exists() {
            trace!("Nothing stored under {}", walk_root.display());
            return Ok(Vec::new());
        }

        let mut stamps = Vec::new();
        for entry in WalkDir::new(&walk_root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != NOTE_EXTENSION) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match Timestamp::parse(stem) {
                Ok(stamp) if pattern.matches(&stamp) => stamps.push(stamp),
                Ok(_) => {}
                Err(_) => trace!("Skipping non-note file: {}", path.display()),
            }
        }

        stamps.sort();
        stamps.dedup();
        debug!("Found {} entries for pattern '{}'", stamps.len(), pattern);
        Ok(stamps)
    }

    fn exists(&self, timestamp: &Timestamp) -> bool {
        self.note_path(timestamp).is_file()
    }

    fn create(&self, timestamp: &Timestamp, lines: &[String]) -> Result<()> {
        info!("Creating note: {}", timestamp);

        if is_blank(lines) {
            return Err(NoteError::EmptyText);
        }
        if self.exists(timestamp) {
            debug!("A note already exists at {}", timestamp);
            return Err(NoteError::DuplicateTimestamp {
                timestamp: *timestamp,
            });
        }

        self.write_note(timestamp, lines)?;
        info!("Note created successfully: {}", timestamp);
        Ok(())
    }

    fn read(&self, timestamp: &Timestamp) -> Result<Vec<String>> {
        debug!("Reading note: {}", timestamp);
        let file_path = self.note_path(timestamp);
        if !file_path.is_file() {
            return Err(NoteError::MissingTimestamp {
                timestamp: *timestamp,
            });
        }

        let content = fs::read_to_string(&file_path).map_err(|e| {
            error!("Failed to open note file {}: {}", file_path.display(), e);
            NoteError::Io(e)
        })?;
        Ok(content.lines().map(str::to_string).collect())
    }

    fn update(
        &self,
        timestamp: &Timestamp,
        lines: &[String],
        keep_timestamp: bool,
    ) -> Result<Timestamp> {
        info!("Updating note: {}", timestamp);

        let current = self.read(timestamp)?;
        if is_blank(lines) {
            return Err(NoteError::EmptyText);
        }
        if current == lines {
            debug!("Text of {} is unchanged", timestamp);
            return Ok(*timestamp);
        }

        let new_stamp = if keep_timestamp {
            *timestamp
        } else {
            Timestamp::now()
        };

        if new_stamp == *timestamp {
            self.write_note(timestamp, lines)?;
        } else {
            if self.exists(&new_stamp) {
                return Err(NoteError::DuplicateTimestamp {
                    timestamp: new_stamp,
                });
            }
            self.write_note(&new_stamp, lines)?;
            if let Err(e) = self.remove_note_file(timestamp) {
                warn!("Rolling back {}: old note {} could not be removed", new_stamp, timestamp);
                self.remove_note_file(&new_stamp)?;
                return Err(e);
            }
        }

        info!("Note {} stored as {}", timestamp, new_stamp);
        Ok(new_stamp)
    }

    fn delete(&self, timestamp: &Timestamp) -> Result<()> {
        info!("Deleting note: {}", timestamp);
        if !self.exists(timestamp) {
            debug!("Cannot delete note {}: not found", timestamp);
            return Err(NoteError::MissingTimestamp {
                timestamp: *timestamp,
            });
        }

        self.remove_note_file(timestamp)?;
        info!("Note {} successfully deleted", timestamp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn stamp(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn text(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    fn repository() -> (TempDir, FileSystemRepository) {
        let temp = TempDir::new().unwrap();
        let repository = FileSystemRepository::new(temp.path().join("notes"));
        repository.initialize().unwrap();
        (temp, repository)
    }

    #[test]
    fn test_create_and_read_use_year_month_layout() {
        let (_temp, repo) = repository();
        let t = stamp("20201030090000_005");
        repo.create(&t, &text(&["# apple", "an apple a day"])).unwrap();

        let path = repo.root().join("2020").join("10").join("20201030090000_005.md");
        assert!(path.is_file());
        assert_eq!(fs::read_to_string(path).unwrap(), "# apple\nan apple a day\n");
        assert_eq!(repo.read(&t).unwrap(), text(&["# apple", "an apple a day"]));
    }

    #[test]
    fn test_create_rejects_duplicates_and_empty_text() {
        let (_temp, repo) = repository();
        let t = stamp("20201030090000");
        repo.create(&t, &text(&["first"])).unwrap();

        assert!(matches!(
            repo.create(&t, &text(&["second"])),
            Err(NoteError::DuplicateTimestamp { .. })
        ));
        assert!(matches!(
            repo.create(&stamp("20201030090001"), &text(&["", "  "])),
            Err(NoteError::EmptyText)
        ));
        assert!(!repo.exists(&stamp("20201030090001")));
    }

    #[test]
    fn test_read_missing_note() {
        let (_temp, repo) = repository();
        match repo.read(&stamp("20201030090000")) {
            Err(NoteError::MissingTimestamp { timestamp }) => {
                assert_eq!(timestamp.to_string(), "20201030090000")
            }
            other => panic!("expected MissingTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_entries_filters_by_pattern() {
        let (_temp, repo) = repository();
        for s in [
            "20191030120000",
            "20201030090000",
            "20201030180000_005",
            "20201031090000",
            "20200930090000",
        ] {
            repo.create(&stamp(s), &text(&[s])).unwrap();
        }
        fs::write(repo.root().join("2020").join("10").join("README.md"), "x").unwrap();
        fs::write(repo.root().join("2020").join("10").join("20201001000000.txt"), "x").unwrap();

        let names = |pattern: &str| -> Vec<String> {
            repo.entries(&StampPattern::parse(pattern).unwrap())
                .unwrap()
                .iter()
                .map(Timestamp::to_string)
                .collect()
        };

        assert_eq!(names("").len(), 5);
        assert_eq!(
            names("2020"),
            vec![
                "20200930090000",
                "20201030090000",
                "20201030180000_005",
                "20201031090000"
            ]
        );
        assert_eq!(names("202010").len(), 3);
        assert_eq!(names("20201030"), vec!["20201030090000", "20201030180000_005"]);
        assert_eq!(names("1030"), vec!["20191030120000", "20201030090000", "20201030180000_005"]);
        assert_eq!(names("20201030180000"), vec!["20201030180000_005"]);
        assert_eq!(names("20201030180000_005"), vec!["20201030180000_005"]);
        assert!(names("20201030180000_006").is_empty());
        assert!(names("2018").is_empty());
    }

    #[test]
    fn test_update_keeps_or_renews_timestamp() {
        let (_temp, repo) = repository();
        let t = stamp("20201030090000");
        repo.create(&t, &text(&["before"])).unwrap();

        assert_eq!(repo.update(&t, &text(&["before"]), false).unwrap(), t);

        let kept = repo.update(&t, &text(&["kept"]), true).unwrap();
        assert_eq!(kept, t);
        assert_eq!(repo.read(&t).unwrap(), text(&["kept"]));

        let renewed = repo.update(&t, &text(&["after"]), false).unwrap();
        assert_ne!(renewed, t);
        assert!(!repo.exists(&t));
        assert_eq!(repo.read(&renewed).unwrap(), text(&["after"]));
    }

    #[test]
    fn test_update_errors() {
        let (_temp, repo) = repository();
        let t = stamp("20201030090000");
        assert!(matches!(
            repo.update(&t, &text(&["x"]), true),
            Err(NoteError::MissingTimestamp { .. })
        ));
        repo.create(&t, &text(&["x"])).unwrap();
        assert!(matches!(
            repo.update(&t, &[], true),
            Err(NoteError::EmptyText)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_update_rolls_back_when_old_note_cannot_be_removed() {
        use std::os::unix::fs::PermissionsExt;

        let (_temp, repo) = repository();
        let t = stamp("20190101000000");
        repo.create(&t, &text(&["before"])).unwrap();

        let month_dir = repo.root().join("2019").join("01");
        fs::set_permissions(&month_dir, fs::Permissions::from_mode(0o555)).unwrap();
        // Permissions are not enforced for privileged users.
        let writable = month_dir.join("writable");
        if fs::write(&writable, "").is_ok() {
            fs::remove_file(&writable).unwrap();
            fs::set_permissions(&month_dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = repo.update(&t, &text(&["after"]), false);
        fs::set_permissions(&month_dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(NoteError::Io(_))));
        assert_eq!(repo.entries(&StampPattern::Any).unwrap(), vec![t]);
        assert_eq!(repo.read(&t).unwrap(), text(&["before"]));
    }

    #[test]
    fn test_delete_cleans_up_directories() {
        let (_temp, repo) = repository();
        let t = stamp("20201030090000");
        repo.create(&t, &text(&["bye"])).unwrap();
        repo.delete(&t).unwrap();

        assert!(!repo.exists(&t));
        assert!(!repo.root().join("2020").exists());
        assert!(repo.root().exists());
        assert!(matches!(
            repo.delete(&t),
            Err(NoteError::MissingTimestamp { .. })
        ));
    }

    #[test]
    fn test_search_reports_line_numbers() {
        let (_temp, repo) = repository();
        repo.create(&stamp("20201012005000"), &text(&["# fruits", "apple", "banana"]))
            .unwrap();
        repo.create(&stamp("20201012005001"), &text(&["pineapple juice"]))
            .unwrap();
        repo.create(&stamp("20191012005000"), &text(&["apple pie"]))
            .unwrap();

        let regex = Regex::new("apple").unwrap();
        let hits: Vec<String> = repo
            .search(&regex, &StampPattern::parse("2020").unwrap())
            .unwrap()
            .iter()
            .map(SearchHit::to_string)
            .collect();
        assert_eq!(
            hits,
            vec!["20201012005001:1:pineapple juice", "20201012005000:2:apple"]
        );

        let all = repo.search(&regex, &StampPattern::Any).unwrap();
        assert_eq!(all.len(), 3);
    }
}
