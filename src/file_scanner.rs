use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::file_classifier;
use crate::month_key::{month_key_for_dir, MonthKey};
use crate::reporter::Reporter;

/// Images per month, months in ascending key order, paths sorted by full path string
pub type MonthGroups = BTreeMap<MonthKey, Vec<PathBuf>>;

/// Walks a directory tree and groups supported images by the first
/// `YYYY-MM` segment of their directory path.
pub struct FileScanner<'a> {
    root: PathBuf,
    reporter: &'a dyn Reporter,
}

impl<'a> FileScanner<'a> {
    pub fn new(root: impl Into<PathBuf>, reporter: &'a dyn Reporter) -> Self {
        Self {
            root: root.into(),
            reporter,
        }
    }

    pub fn scan(&self) -> MonthGroups {
        let mut groups = MonthGroups::new();

        self.reporter.scan_started(&self.root);
        self.walk_directory(&self.root, &mut groups);

        for images in groups.values_mut() {
            images.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        }

        groups
    }

    /// Recursively walk a directory. Unreadable directories are skipped.
    fn walk_directory(&self, dir: &Path, groups: &mut MonthGroups) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                self.reporter.directory_skipped(dir, &e);
                return;
            }
        };

        let month = month_key_for_dir(dir);
        if let Some(month) = &month {
            groups.entry(month.clone()).or_default();
        }

        let mut subdirs = Vec::new();

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                subdirs.push(path);
                continue;
            }

            // Symlinked directories are listed but not descended into
            if file_type.is_symlink() && fs::metadata(&path).is_ok_and(|m| m.is_dir()) {
                continue;
            }

            if let Some(month) = &month {
                if file_classifier::is_supported_image(&path) {
                    groups.entry(month.clone()).or_default().push(path);
                }
            }
        }

        for subdir in subdirs {
            self.walk_directory(&subdir, groups);
        }
    }
}

/// Scans `root` and returns its images grouped by month
pub fn collect_by_month(root: &Path, reporter: &dyn Reporter) -> MonthGroups {
    FileScanner::new(root, reporter).scan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::LogReporter;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = File::create(path).unwrap();
        file.write_all(b"fake image content").unwrap();
    }

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scanner_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let groups = collect_by_month(temp_dir.path(), &LogReporter);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_groups_by_month_and_sorts_by_path() {
        // GIVEN: Two day folders under one month
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("2024/2024-01/2024-01-02/p3.gif"));
        touch(&root.join("2024/2024-01/2024-01-01/p2.png"));
        touch(&root.join("2024/2024-01/2024-01-01/p1.jpg"));

        // WHEN: Scanning
        let groups = collect_by_month(root, &LogReporter);

        // THEN: One month, images in full-path order
        assert_eq!(groups.len(), 1);
        let images = &groups[&key("2024-01")];
        assert_eq!(names(images), vec!["p1.jpg", "p2.png", "p3.gif"]);
    }

    #[test]
    fn test_unsupported_files_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("2023-05/a.jpg"));
        touch(&root.join("2023-05/notes.txt"));
        touch(&root.join("2023-05/clip.mp4"));

        let groups = collect_by_month(root, &LogReporter);

        assert_eq!(names(&groups[&key("2023-05")]), vec!["a.jpg"]);
    }

    #[test]
    fn test_files_without_month_ancestor_are_excluded() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("misc/loose.jpg"));
        touch(&root.join("top.jpg"));
        touch(&root.join("2022/2022-07/beach.jpg"));

        let groups = collect_by_month(root, &LogReporter);

        assert_eq!(groups.len(), 1);
        let all: Vec<String> = groups.values().flat_map(|v| names(v)).collect();
        assert_eq!(all, vec!["beach.jpg"]);
    }

    #[test]
    fn test_deeply_nested_files_use_outermost_month_segment() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("2021-03/2021-03-10/raw/deep/IMG_1.CR2"));

        let groups = collect_by_month(root, &LogReporter);

        let keys: Vec<&str> = groups.keys().map(MonthKey::as_str).collect();
        assert_eq!(keys, vec!["2021-03"]);
        assert_eq!(names(&groups[&key("2021-03")]), vec!["IMG_1.CR2"]);
    }

    #[test]
    fn test_months_iterate_in_ascending_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("2024/2024-02/b.jpg"));
        touch(&root.join("2023/2023-12/c.jpg"));
        touch(&root.join("2024/2024-01/a.jpg"));

        let groups = collect_by_month(root, &LogReporter);

        let keys: Vec<&str> = groups.keys().map(MonthKey::as_str).collect();
        assert_eq!(keys, vec!["2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn test_month_directory_without_images_yields_empty_group() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("2020-01/readme.txt"));

        let groups = collect_by_month(root, &LogReporter);

        assert!(groups[&key("2020-01")].is_empty());
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let groups = collect_by_month(&temp_dir.path().join("missing"), &LogReporter);
        assert!(groups.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped_and_siblings_scanned() {
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Mutex;

        #[derive(Default)]
        struct SkipRecorder(Mutex<Vec<PathBuf>>);

        impl Reporter for SkipRecorder {
            fn directory_skipped(&self, dir: &Path, _reason: &std::io::Error) {
                self.0.lock().unwrap().push(dir.to_path_buf());
            }
        }

        // GIVEN: A locked month directory next to a readable one
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("2024-01/visible.jpg"));
        touch(&root.join("2024-02/hidden.jpg"));
        let locked = root.join("2024-02");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not stop a privileged user
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        // WHEN: Scanning
        let reporter = SkipRecorder::default();
        let groups = collect_by_month(root, &reporter);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // THEN: The locked directory is reported, the sibling is still grouped
        assert_eq!(*reporter.0.lock().unwrap(), vec![locked]);
        assert_eq!(names(&groups[&key("2024-01")]), vec!["visible.jpg"]);
        assert!(!groups.contains_key(&key("2024-02")));
    }
}
