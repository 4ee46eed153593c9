use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static MAGNET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^magnet:\?xt=urn:btih:([a-fA-F0-9]{40,64})").unwrap());

/// A magnet link
///
/// Only links carrying a hex-encoded btih hash (40 to 64 digits) are accepted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct MagnetLink(String);

impl MagnetLink {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The info hash, lowercased.
    pub fn info_hash(&self) -> String {
        MAGNET_PATTERN
            .captures(&self.0)
            .and_then(|captures| captures.get(1))
            .map(|hash| hash.as_str().to_ascii_lowercase())
            .unwrap_or_default()
    }
}

impl FromStr for MagnetLink {
    type Err = InvalidMagnet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if MAGNET_PATTERN.is_match(s) {
            Ok(MagnetLink(s.into()))
        } else {
            Err(InvalidMagnet(s.into()))
        }
    }
}

impl TryFrom<String> for MagnetLink {
    type Error = InvalidMagnet;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MagnetLink> for String {
    fn from(link: MagnetLink) -> Self {
        link.0
    }
}

impl fmt::Display for MagnetLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Error)]
#[error("invalid magnet link: {0}")]
pub struct InvalidMagnet(String);

#[cfg(test)]
mod tests {
    use super::MagnetLink;

    #[test]
    fn accepts_forty_hex_digits() {
        let link = "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567";
        assert!(link.parse::<MagnetLink>().is_ok());
    }

    #[test]
    fn accepts_trailing_parameters() {
        let link = "magnet:?xt=urn:btih:0123456789ABCDEF0123456789ABCDEF01234567&dn=Inception&tr=udp%3A%2F%2Fopen.tracker";
        let magnet: MagnetLink = link.parse().unwrap();
        assert_eq!(magnet.info_hash(), "0123456789abcdef0123456789abcdef01234567");
    }

    #[test]
    fn rejects_bad_hashes() {
        static CASES: &[&str] = &[
            "magnet:?xt=urn:btih:zz",
            "magnet:?xt=urn:btih:0123456789abcdef",
            "http://example.com/file.torrent",
            "",
        ];

        for &case in CASES {
            assert!(dbg!(case.parse::<MagnetLink>()).is_err());
        }
    }

    #[test]
    fn deserialization_validates() {
        let good = r#""magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567""#;
        assert!(serde_json::from_str::<MagnetLink>(good).is_ok());
        assert!(serde_json::from_str::<MagnetLink>(r#""magnet:?xt=urn:btih:zz""#).is_err());
    }
}
