use crate::error::Result;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

// One JSON-encoded message per line. Every enqueue and dequeue holds `lock`
// for its whole load-modify-store sequence.
#[derive(Debug)]
pub struct MessageHandler {
    message_store_path: PathBuf,
    lock: Mutex<()>,
}

impl MessageHandler {
    pub fn new(message_store_path: impl Into<PathBuf>) -> MessageHandler {
        MessageHandler {
            message_store_path: message_store_path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn message_store_path(&self) -> &Path {
        &self.message_store_path
    }

    pub async fn push_message(&self, data: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut line = serde_json::to_string(data)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.message_store_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        log::debug!(
            "Message appended to {}",
            self.message_store_path.display()
        );

        Ok(())
    }

    pub async fn pull_message(&self) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;

        let mut messages = self.load_messages().await?;
        if messages.is_empty() {
            return Ok(None);
        }

        let head = messages.remove(0);
        self.save_messages(&messages).await?;

        Ok(Some(head))
    }

    pub async fn len(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        Ok(self.load_messages().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    async fn load_messages(&self) -> Result<Vec<String>> {
        let contents = match fs::read_to_string(&self.message_store_path).await {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "No message file at {}, starting fresh",
                    self.message_store_path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut messages = Vec::new();
        for line in contents.lines().filter(|line| !line.trim().is_empty()) {
            messages.push(serde_json::from_str(line)?);
        }

        Ok(messages)
    }

    async fn save_messages(&self, messages: &[String]) -> Result<()> {
        let mut contents = String::new();
        for message in messages {
            contents.push_str(&serde_json::to_string(message)?);
            contents.push('\n');
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, contents).await?;
        fs::rename(&tmp_path, &self.message_store_path).await?;

        log::debug!(
            "Rewrote {} with {} remaining messages",
            self.message_store_path.display(),
            messages.len()
        );

        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .message_store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.message_store_path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempdir::TempDir;

    fn new_store(tmp_dir: &TempDir) -> MessageHandler {
        MessageHandler::new(tmp_dir.path().join("messages.txt"))
    }

    #[tokio::test]
    async fn it_pushes_messages() {
        let tmp_dir = TempDir::new("messages").unwrap();
        let store = new_store(&tmp_dir);

        store.push_message("test1").await.unwrap();
        store.push_message("test2").await.unwrap();

        let contents = std::fs::read_to_string(store.message_store_path()).unwrap();
        assert_eq!(contents, "\"test1\"\n\"test2\"\n");
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn it_pulls_messages_in_fifo_order() {
        let tmp_dir = TempDir::new("messages").unwrap();
        let store = new_store(&tmp_dir);

        for m in ["test1", "test2", "test3"] {
            store.push_message(m).await.unwrap();
        }

        assert_eq!(store.pull_message().await.unwrap().unwrap(), "test1");
        assert_eq!(store.pull_message().await.unwrap().unwrap(), "test2");
        assert_eq!(store.pull_message().await.unwrap().unwrap(), "test3");
        assert!(store.pull_message().await.unwrap().is_none());

        let contents = std::fs::read_to_string(store.message_store_path()).unwrap();
        assert_eq!(contents, "");
    }

    #[tokio::test]
    async fn it_treats_missing_file_as_empty() {
        let tmp_dir = TempDir::new("messages").unwrap();
        let store = new_store(&tmp_dir);

        assert!(store.pull_message().await.unwrap().is_none());
        assert!(store.is_empty().await.unwrap());
        assert!(!store.message_store_path().exists());
    }

    #[tokio::test]
    async fn it_keeps_multiline_messages_on_one_line() {
        let tmp_dir = TempDir::new("messages").unwrap();
        let store = new_store(&tmp_dir);

        store.push_message("line one\nline two").await.unwrap();
        store.push_message("C:\\temp\\new\r\n").await.unwrap();
        store.push_message("after").await.unwrap();

        let contents = std::fs::read_to_string(store.message_store_path()).unwrap();
        assert_eq!(contents.lines().count(), 3);

        assert_eq!(
            store.pull_message().await.unwrap().unwrap(),
            "line one\nline two"
        );
        assert_eq!(
            store.pull_message().await.unwrap().unwrap(),
            "C:\\temp\\new\r\n"
        );
        assert_eq!(store.pull_message().await.unwrap().unwrap(), "after");
    }

    #[tokio::test]
    async fn it_reads_messages_left_by_a_previous_run() {
        let tmp_dir = TempDir::new("messages").unwrap();
        let path = tmp_dir.path().join("messages.txt");
        std::fs::write(&path, "\"first\"\n\n\"second\"\n").unwrap();

        let store = MessageHandler::new(&path);

        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(store.pull_message().await.unwrap().unwrap(), "first");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\"second\"\n");
    }

    #[tokio::test]
    async fn it_reports_corrupt_lines_without_losing_the_queue() {
        let tmp_dir = TempDir::new("messages").unwrap();
        let path = tmp_dir.path().join("messages.txt");
        std::fs::write(&path, "\"ok\"\nnot json\n").unwrap();

        let store = MessageHandler::new(&path);

        assert!(matches!(store.pull_message().await, Err(Error::Decode(_))));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "\"ok\"\nnot json\n"
        );
    }

    #[tokio::test]
    async fn it_surfaces_storage_failures() {
        let tmp_dir = TempDir::new("messages").unwrap();
        // a directory cannot be opened as the message file
        let store = MessageHandler::new(tmp_dir.path());

        assert!(matches!(store.push_message("test1").await, Err(Error::Store(_))));
        assert!(matches!(store.pull_message().await, Err(Error::Store(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn it_never_delivers_a_message_twice() {
        let tmp_dir = TempDir::new("messages").unwrap();
        let store = Arc::new(new_store(&tmp_dir));

        let initial = 20;
        let extra_enqueues = 10;
        let dequeues = 40;

        for i in 0..initial {
            store.push_message(&format!("initial-{i}")).await.unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..extra_enqueues {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.push_message(&format!("extra-{i}")).await.unwrap();
                None
            }));
        }
        for _ in 0..dequeues {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(
                async move { store.pull_message().await.unwrap() },
            ));
        }

        let mut delivered = Vec::new();
        for handle in handles {
            if let Some(m) = handle.await.unwrap() {
                delivered.push(m);
            }
        }

        let remaining = store.len().await.unwrap();
        let unique: HashSet<&String> = delivered.iter().collect();

        assert_eq!(unique.len(), delivered.len());
        assert_eq!(delivered.len() + remaining, initial + extra_enqueues);
        assert!(delivered.len() >= initial);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn it_delivers_exactly_min_of_dequeues_and_total() {
        let tmp_dir = TempDir::new("messages").unwrap();
        let store = Arc::new(new_store(&tmp_dir));

        for i in 0..5 {
            store.push_message(&format!("m{i}")).await.unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..12 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.pull_message().await }));
        }

        let mut delivered = HashSet::new();
        for handle in handles {
            if let Some(m) = handle.await.unwrap().unwrap() {
                assert!(delivered.insert(m));
            }
        }

        assert_eq!(delivered.len(), 5);
        assert!(store.is_empty().await.unwrap());
    }
}
