//! Append-only chat history persisted as a plain text file
//!
//! Every chat event becomes exactly one line. Appends from concurrent
//! connections are funnelled through a single writer lock and each line goes
//! out in one write call, so lines never interleave and an interrupted write
//! can lose at most the line in flight. Reads bypass the lock.

use crate::utils::{friendly_now, single_line};
use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// A single chat event as written to the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLogEntry {
    pub timestamp: String,
    pub user: String,
    pub message: String,
}

impl ChatLogEntry {
    /// Stamps the entry with the current wall-clock time
    pub fn now(user: &str, message: &str) -> Self {
        Self {
            timestamp: friendly_now(),
            user: user.to_string(),
            message: message.to_string(),
        }
    }

    /// Flattens the entry to `"{timestamp} - {user}: {message}\n"`
    pub fn to_line(&self) -> String {
        format!(
            "{} - {}: {}\n",
            single_line(&self.timestamp),
            single_line(&self.user),
            single_line(&self.message)
        )
    }
}

pub struct ChatLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ChatLog {
    /// Opens nothing yet; the file is created on the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one line and flushes it before returning
    pub async fn append(&self, entry: &ChatLogEntry) -> io::Result<()> {
        let line = entry.to_line();

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!("Appended chat entry from {} to {}", entry.user, self.path.display());
        Ok(())
    }

    /// Returns the whole log verbatim, or an empty string if it was never written
    pub async fn read_all(&self) -> io::Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn entry(user: &str, message: &str) -> ChatLogEntry {
        ChatLogEntry {
            timestamp: "Monday, October 19, 2026 at 02:05 PM".to_string(),
            user: user.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_entry_line_format() {
        assert_eq!(
            entry("ana", "hello").to_line(),
            "Monday, October 19, 2026 at 02:05 PM - ana: hello\n"
        );
    }

    #[test]
    fn test_entry_line_strips_line_breaks() {
        let line = entry("a\nb", "multi\r\nline").to_line();
        assert_eq!(line.matches('\n').count(), 1);
        assert!(line.ends_with("a b: multi  line\n"));
    }

    #[tokio::test]
    async fn test_read_all_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let log = ChatLog::new(dir.path().join("never_written.txt"));
        assert_eq!(log.read_all().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_append_then_read_all() {
        let dir = tempdir().unwrap();
        let log = ChatLog::new(dir.path().join("chat.txt"));

        log.append(&entry("ana", "first")).await.unwrap();
        log.append(&entry("bob", "second")).await.unwrap();

        let contents = log.read_all().await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("ana: first"));
        assert!(lines[1].ends_with("bob: second"));
    }

    #[tokio::test]
    async fn test_append_preserves_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.txt");
        tokio::fs::write(&path, "older entry\n").await.unwrap();

        let log = ChatLog::new(&path);
        log.append(&entry("ana", "newer")).await.unwrap();

        let contents = log.read_all().await.unwrap();
        assert!(contents.starts_with("older entry\n"));
        assert!(contents.ends_with("ana: newer\n"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempdir().unwrap();
        let log = Arc::new(ChatLog::new(dir.path().join("chat.txt")));

        let mut tasks = Vec::new();
        for writer in 0..8 {
            let log = Arc::clone(&log);
            tasks.push(tokio::spawn(async move {
                for n in 0..25 {
                    let message = format!("message {} {}", n, "x".repeat(200));
                    log.append(&entry(&format!("user{}", writer), &message)).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let contents = log.read_all().await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 8 * 25);
        for line in lines {
            assert!(line.starts_with("Monday, October 19, 2026 at 02:05 PM - user"));
            assert!(line.ends_with(&"x".repeat(200)));
        }
    }

    #[tokio::test]
    async fn test_append_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let log = ChatLog::new(dir.path().join("no_such_dir").join("chat.txt"));
        assert!(log.append(&entry("ana", "lost")).await.is_err());
    }
}
