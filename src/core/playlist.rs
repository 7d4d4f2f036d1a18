use crate::domain::model::Channel;
use crate::domain::ports::Storage;
use crate::utils::error::{EpgError, Result};
use regex::Regex;

/// Extracts channel records from `#EXTINF` lines of an M3U playlist.
pub struct PlaylistParser {
    id: Regex,
    logo: Regex,
    group: Regex,
}

impl PlaylistParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| EpgError::ProcessingError {
                message: format!("invalid playlist pattern {}: {}", pattern, e),
            })
        };

        Ok(Self {
            id: compile(r#"tvg-id="([^"]+)""#)?,
            logo: compile(r#"tvg-logo="([^"]+)""#)?,
            group: compile(r#"group-title="([^"]*)""#)?,
        })
    }

    pub fn parse(&self, content: &str) -> Vec<Channel> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("#EXTINF"))
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    pub fn parse_line(&self, line: &str) -> Option<Channel> {
        let id = capture(&self.id, line)?;

        Some(Channel {
            id,
            name: display_name(line).unwrap_or_else(|| "Unknown".to_string()),
            logo: capture(&self.logo, line),
            group: capture(&self.group, line),
        })
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Text after the first comma that is not inside a quoted attribute.
fn display_name(line: &str) -> Option<String> {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                let name = line[idx + 1..].trim();
                return (!name.is_empty()).then(|| name.to_string());
            }
            _ => {}
        }
    }
    None
}

/// Reads and parses the playlist; a missing file aborts the run.
pub async fn load_playlist<S: Storage>(storage: &S, path: &str) -> Result<Vec<Channel>> {
    let bytes = match storage.read_file(path).await {
        Ok(bytes) => bytes,
        Err(EpgError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(EpgError::PlaylistNotFound {
                path: path.to_string(),
            })
        }
        Err(e) => return Err(e),
    };

    let content = String::from_utf8_lossy(&bytes);
    let channels = PlaylistParser::new()?.parse(&content);
    tracing::info!("✅ Loaded {} channels from {}", channels.len(), path);
    Ok(channels)
}
