use crate::models::{AppConfig, Post, PostHistory};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Persists a finished post. Called once per dispatch, after aggregation.
pub trait PostRecorder {
    fn record(&self, post: &Post) -> Result<()>;
}

#[derive(Clone)]
pub struct StorageManager {
    data_dir: String,
    posts_file: String,
}

impl StorageManager {
    pub fn new(data_dir: String, posts_file: String) -> Self {
        Self {
            data_dir,
            posts_file,
        }
    }

    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create data directory {}", self.data_dir))?;
        log::debug!("Storage initialized in directory: {}", self.data_dir);
        Ok(())
    }

    fn posts_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.posts_file)
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.posts_path().into_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }

    pub fn load_posts(&self) -> Result<PostHistory> {
        let file_path = self.posts_path();

        if !file_path.exists() {
            log::info!("Posts file doesn't exist, starting with an empty history");
            return Ok(PostHistory::new());
        }

        let content = fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;
        let history: PostHistory = match serde_json::from_str(&content) {
            Ok(history) => history,
            Err(e) => {
                // The next save overwrites the file, keep what was there.
                let backup = self.backup_path();
                fs::copy(&file_path, &backup)
                    .with_context(|| format!("Failed to back up {}", file_path.display()))?;
                log::warn!(
                    "Failed to parse posts file ({}), moved aside to {} and starting with an empty history",
                    e,
                    backup.display()
                );
                PostHistory::new()
            }
        };

        log::debug!("Loaded {} posts from storage", history.posts.len());
        Ok(history)
    }

    pub fn save_posts(&self, history: &PostHistory) -> Result<()> {
        let file_path = self.posts_path();
        let content = serde_json::to_string_pretty(history)?;
        fs::write(&file_path, content)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;
        log::debug!("Saved {} posts to storage", history.posts.len());
        Ok(())
    }

    pub fn load_config_from_file(file_path: &str) -> Result<AppConfig> {
        if !Path::new(file_path).exists() {
            log::warn!(
                "Config file {} doesn't exist, creating default config",
                file_path
            );
            let default_config = AppConfig::default();
            Self::save_config_to_file(&default_config, file_path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", file_path))?;
        log::info!("Loaded configuration from: {}", file_path);
        Ok(config)
    }

    pub fn save_config_to_file(config: &AppConfig, file_path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(config)?;
        fs::write(file_path, content)?;
        log::info!("Saved configuration to: {}", file_path);
        Ok(())
    }
}

impl PostRecorder for StorageManager {
    fn record(&self, post: &Post) -> Result<()> {
        let mut history = self.load_posts()?;
        history.push(post.clone());
        self.save_posts(&history)?;
        log::info!("Recorded post {} with status {}", post.id, post.status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostStatus;

    fn storage(dir: &tempfile::TempDir) -> StorageManager {
        let storage = StorageManager::new(
            dir.path().join("data").to_string_lossy().to_string(),
            "posts.json".to_string(),
        );
        storage.init().unwrap();
        storage
    }

    #[test]
    fn records_accumulate_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);

        assert!(storage.load_posts().unwrap().posts.is_empty());

        let first = Post::draft("one".to_string(), "discord".to_string(), None);
        let second = Post::draft("two".to_string(), "reddit".to_string(), None);
        storage.record(&first).unwrap();
        storage.record(&second).unwrap();

        let history = storage.load_posts().unwrap();
        assert_eq!(history.posts, vec![first, second]);
        assert_eq!(history.count_by_status(PostStatus::Draft), 2);
    }

    #[test]
    fn corrupt_posts_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        fs::write(storage.posts_path(), "not json").unwrap();

        assert!(storage.load_posts().unwrap().posts.is_empty());
    }

    #[test]
    fn corrupt_posts_file_survives_next_record() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir);
        fs::write(storage.posts_path(), "{ half a history").unwrap();

        let post = Post::draft("fresh".to_string(), "discord".to_string(), None);
        storage.record(&post).unwrap();

        assert_eq!(storage.load_posts().unwrap().posts, vec![post]);
        assert_eq!(
            fs::read_to_string(storage.backup_path()).unwrap(),
            "{ half a history"
        );
        assert!(storage
            .backup_path()
            .to_string_lossy()
            .ends_with("posts.json.bak"));
    }

    #[test]
    fn missing_config_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let path = path.to_str().unwrap();

        let config = StorageManager::load_config_from_file(path).unwrap();
        assert_eq!(config.storage.posts_file, "posts.json");
        assert!(Path::new(path).exists());

        let reloaded = StorageManager::load_config_from_file(path).unwrap();
        assert_eq!(reloaded.http.timeout_seconds, config.http.timeout_seconds);
    }
}
