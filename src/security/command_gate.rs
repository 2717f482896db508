//! Filter for command lines produced by `cmd` plugins.
//!
//! The check is a plain substring match against a small denylist. It catches
//! the obvious cases (`sudo ...`, `rm -rf ...`) and also rejects harmless
//! commands that merely contain those letters (`npm run format`). It is a
//! tripwire, not a security boundary: the child process runs with the user's
//! full privileges once it is allowed.

use serde::{Deserialize, Serialize};

/// Substrings that make a command suspicious.
pub const DEFAULT_DENYLIST: &[&str] = &["sudo", "rm"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandGate {
    /// Accept every command.
    pub unrestricted: bool,
    pub denylist: Vec<String>,
}

impl Default for CommandGate {
    fn default() -> Self {
        Self::new(false)
    }
}

impl CommandGate {
    pub fn new(unrestricted: bool) -> Self {
        Self {
            unrestricted,
            denylist: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        if self.unrestricted {
            return true;
        }
        !self.denylist.iter().any(|word| command.contains(word.as_str()))
    }

    /// First denylisted substring found in `command`.
    pub fn offending_word(&self, command: &str) -> Option<&str> {
        self.denylist
            .iter()
            .map(String::as_str)
            .find(|word| command.contains(word))
    }
}
