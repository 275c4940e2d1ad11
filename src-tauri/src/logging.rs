use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{runtime_paths, BACKEND_LOG_FILE, DESKTOP_LOG_FILE};

// Best effort: a shell that cannot write its log file keeps running.
pub(crate) fn append_line(path: &Path, line: &str) {
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let _ = writeln!(file, "[{timestamp}] {line}");
}

pub(crate) fn resolve_log_path(log_dir: Option<PathBuf>, file_name: &str) -> PathBuf {
    log_dir.unwrap_or_else(|| PathBuf::from(".")).join(file_name)
}

pub(crate) fn append_desktop_log(line: &str) {
    append_line(
        &resolve_log_path(runtime_paths::log_dir(), DESKTOP_LOG_FILE),
        line,
    );
}

// Child-process output goes to its own file.
pub(crate) fn append_backend_log(line: &str) {
    append_line(
        &resolve_log_path(runtime_paths::log_dir(), BACKEND_LOG_FILE),
        line,
    );
}

pub(crate) fn append_startup_log(line: &str) {
    append_desktop_log(&format!("[startup] {line}"));
}

pub(crate) fn append_shutdown_log(line: &str) {
    append_desktop_log(&format!("[shutdown] {line}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_line_creates_directories_and_timestamps_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("shell.log");

        append_line(&path, "first entry");
        append_line(&path, "second entry");

        let contents = std::fs::read_to_string(&path).expect("log file readable");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("first entry"));
        assert!(lines[1].ends_with("second entry"));
    }

    #[test]
    fn resolve_log_path_falls_back_to_current_directory() {
        let path = resolve_log_path(None, "desktop.log");
        assert_eq!(path, PathBuf::from(".").join("desktop.log"));
    }
}
