//! Share links.
//!
//! A share link points at the web client and carries everything a recipient
//! needs in the URL fragment, which browsers never send to the server:
//!
//! ```text
//! <base>/#/<tag>/<id>[/<key>]
//! ```
//!
//! | tag | payload | key in link |
//! |-----|---------|-------------|
//! | `s` | text    | yes         |
//! | `c` | text    | no (manual) |
//! | `f` | file    | yes         |
//! | `d` | file    | no (manual) |

use url::Url;

use crate::ProtoError;

/// The four link variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// Text secret, key embedded
    Share,
    /// Text secret, manual key
    ManualKey,
    /// File secret, key embedded
    File,
    /// File secret, manual key
    FileManualKey,
}

impl LinkKind {
    /// Select the variant for a payload type and key mode.
    pub fn new(file: bool, manual_key: bool) -> Self {
        match (file, manual_key) {
            (false, false) => Self::Share,
            (false, true) => Self::ManualKey,
            (true, false) => Self::File,
            (true, true) => Self::FileManualKey,
        }
    }

    /// Single-letter fragment tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Share => "s",
            Self::ManualKey => "c",
            Self::File => "f",
            Self::FileManualKey => "d",
        }
    }

    /// Variant for a fragment tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "s" => Some(Self::Share),
            "c" => Some(Self::ManualKey),
            "f" => Some(Self::File),
            "d" => Some(Self::FileManualKey),
            _ => None,
        }
    }

    /// Whether the payload is a file.
    pub fn is_file(self) -> bool {
        matches!(self, Self::File | Self::FileManualKey)
    }

    /// Whether the key is kept out of the link.
    pub fn is_manual_key(self) -> bool {
        matches!(self, Self::ManualKey | Self::FileManualKey)
    }
}

/// What a share link refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareReference {
    /// Secret id as it appears in the link
    pub id: String,
    /// Decryption key, empty when not part of the link
    pub key: String,
    /// Payload is a file
    pub file: bool,
    /// Key must be obtained out of band
    pub manual_key: bool,
}

impl ShareReference {
    /// Variant of this reference.
    pub fn kind(&self) -> LinkKind {
        LinkKind::new(self.file, self.manual_key)
    }
}

/// Build the share link for a stored secret.
///
/// A trailing slash on `base_url` is dropped. `key` is appended only when
/// `manual_key` is false.
pub fn secret_url(base_url: &str, id: &str, key: &str, file: bool, manual_key: bool) -> String {
    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    let tag = LinkKind::new(file, manual_key).tag();
    if manual_key {
        format!("{base}/#/{tag}/{id}")
    } else {
        format!("{base}/#/{tag}/{id}/{key}")
    }
}

/// Parse a share link.
///
/// Surrounding whitespace is ignored. The fragment must be `/<tag>/<id>` or
/// `/<tag>/<id>/<key>`.
pub fn parse_url(link: &str) -> Result<ShareReference, ProtoError> {
    let trimmed = link.trim();
    let url = Url::parse(trimmed).map_err(|err| ProtoError::InvalidUrl(err.to_string()))?;
    let unexpected = || ProtoError::InvalidUrlKind(trimmed.to_string());

    let segments: Vec<&str> = url.fragment().unwrap_or_default().split('/').collect();
    let (tag, id, key) = match segments.as_slice() {
        ["", tag, id] => (*tag, *id, ""),
        ["", tag, id, key] => (*tag, *id, *key),
        _ => return Err(unexpected()),
    };
    let kind = LinkKind::from_tag(tag).ok_or_else(unexpected)?;

    Ok(ShareReference {
        id: id.to_string(),
        key: key.to_string(),
        file: kind.is_file(),
        manual_key: kind.is_manual_key(),
    })
}
