use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use aeloria_game::GameStorage;

/// Directory-backed save storage: one `<key>.json` file per save name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, save_name: &str) -> PathBuf {
        self.root.join(format!("{save_name}.json"))
    }
}

impl GameStorage for FileStorage {
    type Error = io::Error;

    fn save_game(&self, save_name: &str, payload: &str) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(save_name);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, payload)?;
        fs::rename(staging, path)
    }

    fn load_game(&self, save_name: &str) -> Result<Option<String>, Self::Error> {
        match fs::read_to_string(self.path_for(save_name)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
        match fs::remove_file(self.path_for(save_name)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "aeloria-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn write_read_delete_cycle() {
        let storage = FileStorage::new(temp_root("cycle"));
        assert_eq!(storage.load_game("slot").unwrap(), None);
        storage.save_game("slot", "{\"a\":1}").unwrap();
        assert_eq!(storage.load_game("slot").unwrap().as_deref(), Some("{\"a\":1}"));
        storage.delete_save("slot").unwrap();
        assert_eq!(storage.load_game("slot").unwrap(), None);
        storage.delete_save("slot").unwrap();
        let _ = fs::remove_dir_all(storage.root());
    }
}
