use base64::{ engine::general_purpose::STANDARD, Engine as _ };
use log::{ info, warn };
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{ KeyValueStore, StorageError };

pub const DEFAULT_AVATAR: &str = "/static/images/avatar/default.jpg";

/// Storage key for a user's avatar. Falls back to the display name when the
/// user has no id.
pub fn avatar_key(user_id: Option<&str>, user_name: &str) -> String {
    match user_id {
        Some(id) if !id.is_empty() => format!("avatar_{}", id),
        _ => format!("avatar_{}", user_name),
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub struct AvatarStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl AvatarStore {
    pub fn new(store: Arc<dyn KeyValueStore>, user_id: Option<&str>, user_name: &str) -> Self {
        Self { store, key: avatar_key(user_id, user_name) }
    }

    pub fn load(&self) -> String {
        self.store.get(&self.key).unwrap_or_else(|| DEFAULT_AVATAR.to_string())
    }

    /// Reads an image file and stores it as a data URL. A failed write is
    /// logged and the new image is still returned for display.
    pub fn save_from_file(&self, path: impl AsRef<Path>) -> Result<String, StorageError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let data_url = to_data_url(mime_for(path), &bytes);
        match self.store.set(&self.key, &data_url) {
            Ok(()) => info!("Avatar updated from {} ({} bytes)", path.display(), bytes.len()),
            Err(e) => warn!("Avatar not persisted: {}", e),
        }
        Ok(data_url)
    }
}
