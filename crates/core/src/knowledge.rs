//! Knowledge documents: persona, training guidelines, and goals.
//!
//! Three plain-text files in one directory, read wholesale on every turn:
//!
//! 1. **Persona**: `personality.txt` (tone and character of the coach)
//! 2. **Training bible**: `training_bible.txt` (evidence-based guidelines)
//! 3. **Goals**: `goals.txt` (what the user is working towards)
//!
//! Absence heals itself: a missing directory or file is created empty and
//! reads as an empty string. I/O failures are logged and also read as empty.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Well-known knowledge file names.
pub const PERSONA_FILE: &str = "personality.txt";
pub const TRAINING_BIBLE_FILE: &str = "training_bible.txt";
pub const GOALS_FILE: &str = "goals.txt";

/// The three knowledge documents, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocs {
    pub persona: String,
    pub training_bible: String,
    pub goals: String,
}

impl KnowledgeDocs {
    /// Load all three documents from `dir`, creating whatever is missing.
    pub fn load(dir: &Path) -> Self {
        if !dir.is_dir() {
            match std::fs::create_dir_all(dir) {
                Ok(()) => debug!(dir = %dir.display(), "Created knowledge directory"),
                Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to create knowledge directory"),
            }
        }

        Self {
            persona: Self::read_or_create(dir, PERSONA_FILE),
            training_bible: Self::read_or_create(dir, TRAINING_BIBLE_FILE),
            goals: Self::read_or_create(dir, GOALS_FILE),
        }
    }

    fn read_or_create(dir: &Path, filename: &str) -> String {
        let path = dir.join(filename);
        match std::fs::read_to_string(&path) {
            Ok(content) => content.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Err(e) = std::fs::write(&path, "") {
                    warn!(file = %path.display(), error = %e, "Failed to create knowledge placeholder");
                } else {
                    debug!(file = %path.display(), "Created empty knowledge placeholder");
                }
                String::new()
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to read knowledge file");
                String::new()
            }
        }
    }

    /// Whether every document is empty.
    pub fn is_empty(&self) -> bool {
        self.persona.is_empty() && self.training_bible.is_empty() && self.goals.is_empty()
    }
}
