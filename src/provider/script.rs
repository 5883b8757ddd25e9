//! Replays a recorded session from a JSON-lines script.
//!
//! Blank lines and lines starting with `#` are skipped. Anything else must
//! parse as a [`HostEvent`]; the first line that doesn't aborts the load.

use std::fmt;
use std::fs;
use std::path::Path;

use log::info;

use crate::host::event::HostEvent;

#[derive(Debug)]
pub enum ScriptError {
    Io(std::io::Error),
    /// `line` is 1-based.
    Parse { line: usize, source: serde_json::Error },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Io(e) => write!(f, "script I/O error: {e}"),
            ScriptError::Parse { line, source } => {
                write!(f, "script parse error on line {line}: {source}")
            }
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScriptError::Io(e) => Some(e),
            ScriptError::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScriptProvider {
    events: Vec<HostEvent>,
}

impl ScriptProvider {
    pub fn from_path(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path).map_err(ScriptError::Io)?;
        let provider = Self::parse(&contents)?;
        info!(
            "Loaded {} events from {}",
            provider.events.len(),
            path.display()
        );
        Ok(provider)
    }

    pub fn parse(contents: &str) -> Result<Self, ScriptError> {
        let mut events = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let event = serde_json::from_str(line).map_err(|source| ScriptError::Parse {
                line: idx + 1,
                source,
            })?;
            events.push(event);
        }
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl IntoIterator for ScriptProvider {
    type Item = HostEvent;
    type IntoIter = std::vec::IntoIter<HostEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
