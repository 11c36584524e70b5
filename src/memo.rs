use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;

/// Injected persistence for the memo pad. The pad itself never touches the
/// filesystem directly.
#[derive(Debug, Clone)]
pub struct MemoStore {
    path: PathBuf,
}

impl MemoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved memo text. A missing file is an empty memo, not an
    /// error.
    pub fn load(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }

    pub fn save(&self, text: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Plain-text memo content shown on the memo surface, autosaved on a fixed
/// cadence through the ambient scheduler.
#[derive(Debug)]
pub struct MemoPad {
    text: String,
    saved_text: String,
    store: MemoStore,
}

impl MemoPad {
    pub fn load(store: MemoStore) -> Self {
        let text = match store.load() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("failed to load memo from {:?}: {e}", store.path());
                String::new()
            }
        };
        Self {
            saved_text: text.clone(),
            text,
            store,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Mutable buffer for the text widget to edit in place.
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.text != self.saved_text
    }

    /// Write the buffer out if it changed since the last save. Returns
    /// whether a write happened.
    pub fn autosave(&mut self) -> Result<bool> {
        if !self.is_dirty() {
            return Ok(false);
        }
        self.store.save(&self.text)?;
        self.saved_text = self.text.clone();
        tracing::debug!("memo autosaved at {}", Local::now().format("%H:%M:%S"));
        Ok(true)
    }

    /// Final save on the way out; errors are surfaced to the caller so the
    /// shutdown path can log them.
    pub fn save_now(&mut self) -> Result<()> {
        self.store.save(&self.text)?;
        self.saved_text = self.text.clone();
        Ok(())
    }
}
