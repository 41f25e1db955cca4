//! `KEY=VALUE` settings files as written by the bundled hosts.
//!
//! Lines are kept verbatim, terminators included, so that a file which is
//! loaded and saved without edits comes back byte for byte and a patch only
//! touches the line it rewrites. `\n` and `\r\n` endings may be mixed. Blank
//! lines and `#` comments are allowed.

use std::{fs, io, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsBlob {
    /// Each line with its own terminator; the last may have none.
    lines: Vec<String>,
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn entry(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    line.split_once('=').map(|(k, v)| (k.trim(), v.trim()))
}

impl SettingsBlob {
    /// Parse settings text. Any non-comment line without `=` is rejected with
    /// its 1-based line number.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut lines = Vec::new();
        for (i, line) in text.split_inclusive('\n').enumerate() {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') && !line.contains('=') {
                return Err(format!("line {}: expected KEY=VALUE, found {:?}", i + 1, trimmed));
            }
            lines.push(line.to_string());
        }
        Ok(Self { lines })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            lines: pairs.into_iter().map(|(k, v)| format!("{}={}\n", k, v)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .filter_map(|l| entry(l))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Rewrite the first line whose key is `key`, keeping that line's
    /// terminator. Returns `false` and leaves the blob untouched when no line
    /// has that key.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let pos = self
            .lines
            .iter()
            .position(|l| entry(l).map(|(k, _)| k == key).unwrap_or(false));
        match pos {
            Some(i) => {
                let ending = line_ending(&self.lines[i]);
                self.lines[i] = format!("{}={}{}", key, value, ending);
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|l| entry(l))
    }

    pub fn render(&self) -> String {
        self.lines.concat()
    }

    pub fn read(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())
    }
}

/// Apply a single field edit to the settings file at `path` in place.
pub fn patch_file(path: &Path, key: &str, value: &str) -> io::Result<bool> {
    let mut blob = SettingsBlob::read(path)?;
    if !blob.set(key, value) {
        return Ok(false);
    }
    blob.write(path)?;
    Ok(true)
}
