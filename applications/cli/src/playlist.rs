/// Playlist files
///
/// JSON and TOML playlists hold an `items` list of `{ title, url }` tables
/// (optionally with `id` and `position` for a saved queue). Extended M3U is
/// read line by line, taking titles from `#EXTINF`.
use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tapedeck_playback::{AudioItem, AudioOrigin};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Playlist {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub items: Vec<AudioItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistFormat {
    Json,
    Toml,
    M3u,
}

impl PlaylistFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(PlaylistFormat::Json),
            "toml" => Ok(PlaylistFormat::Toml),
            "m3u" | "m3u8" => Ok(PlaylistFormat::M3u),
            _ => Err(CliError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl Playlist {
    /// Read a playlist file
    ///
    /// Relative local paths are resolved against the playlist's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let format = PlaylistFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        let mut playlist = Self::parse(&text, format)?;

        if playlist.name.is_none() {
            playlist.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        if let Some(base) = path.parent() {
            playlist.resolve_relative(base);
        }

        tracing::debug!(
            path = %path.display(),
            items = playlist.items.len(),
            "Playlist loaded"
        );
        Ok(playlist)
    }

    /// Parse playlist text in a known format
    pub fn parse(text: &str, format: PlaylistFormat) -> Result<Self> {
        match format {
            PlaylistFormat::Json => {
                serde_json::from_str(text).map_err(|e| CliError::Playlist(e.to_string()))
            }
            PlaylistFormat::Toml => {
                toml::from_str(text).map_err(|e| CliError::Playlist(e.to_string()))
            }
            PlaylistFormat::M3u => Ok(Self::parse_m3u(text)),
        }
    }

    fn parse_m3u(text: &str) -> Self {
        let mut items = Vec::new();
        let mut pending_title: Option<String> = None;

        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            if let Some(info) = line.strip_prefix("#EXTINF:") {
                // #EXTINF:<seconds>,<title>
                pending_title = info
                    .split_once(',')
                    .map(|(_, title)| title.trim().to_string())
                    .filter(|title| !title.is_empty());
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            let title = pending_title.take().unwrap_or_else(|| title_from_locator(line));
            items.push(AudioItem::new(title, line));
        }

        Self { name: None, items }
    }

    fn resolve_relative(&mut self, base: &Path) {
        for item in &mut self.items {
            if item.origin() != AudioOrigin::File || item.url.starts_with("file://") {
                continue;
            }
            let path = Path::new(&item.url);
            if path.is_relative() {
                item.url = base.join(path).to_string_lossy().into_owned();
            }
        }
    }
}

/// File name without extension, or the locator itself
fn title_from_locator(locator: &str) -> String {
    let name = locator.rsplit(['/', '\\']).next().unwrap_or(locator);
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    if stem.is_empty() {
        locator.to_string()
    } else {
        stem.to_string()
    }
}
