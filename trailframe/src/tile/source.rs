//! Remote tile sources.

use std::fmt;

use super::{HttpClient, TileError};
use crate::coord::TileKey;

/// A slippy-map tile server URL with `$x`, `$y` and `$z` placeholders.
///
/// ```
/// use trailframe::coord::TileKey;
/// use trailframe::tile::UrlTemplate;
///
/// let t = UrlTemplate::parse("https://tiles.example.com/$z/$x/$y.png").unwrap();
/// assert_eq!(t.url(&TileKey::new(3, 5, 4)), "https://tiles.example.com/4/3/5.png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub fn parse(template: impl Into<String>) -> Result<Self, TileError> {
        let template = template.into();
        for placeholder in ["$x", "$y", "$z"] {
            if !template.contains(placeholder) {
                return Err(TileError::InvalidTemplate {
                    reason: format!("missing {}", placeholder),
                    template,
                });
            }
        }
        Ok(Self { template })
    }

    /// Substitutes the key's decimal coordinates into the template.
    pub fn url(&self, key: &TileKey) -> String {
        self.template
            .replace("$x", &key.x.to_string())
            .replace("$y", &key.y.to_string())
            .replace("$z", &key.zoom.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Anything that can produce the encoded image bytes of a tile.
pub trait TileSource: Send + Sync {
    /// Fetches the encoded image (PNG, JPEG, ...) for `key`.
    fn fetch(&self, key: &TileKey) -> Result<Vec<u8>, TileError>;

    /// Human-readable name used in logs.
    fn name(&self) -> &str;
}

/// Tile source that downloads from a templated HTTP URL.
pub struct HttpTileSource<C: HttpClient> {
    client: C,
    template: UrlTemplate,
}

impl<C: HttpClient> HttpTileSource<C> {
    pub fn new(client: C, template: UrlTemplate) -> Self {
        Self { client, template }
    }

    pub fn template(&self) -> &UrlTemplate {
        &self.template
    }
}

impl<C: HttpClient> TileSource for HttpTileSource<C> {
    fn fetch(&self, key: &TileKey) -> Result<Vec<u8>, TileError> {
        let url = self.template.url(key);
        tracing::debug!(%url, "Downloading tile");
        self.client.get(&url)
    }

    fn name(&self) -> &str {
        self.template.as_str()
    }
}
