//! Token authentication for websocket upgrades.
//!
//! ARCHITECTURE
//! ============
//! The client passes its token in the upgrade URL (`?token=`). The server
//! never stores raw tokens: the users file lists SHA-256 digests and lookups
//! hash the presented token first.
//!
//! TRADE-OFFS
//! ==========
//! Guest mode admits any non-empty token and derives a stable identity from
//! its digest. It is meant for local pairing sessions, so it is off unless
//! `COLLAB_ALLOW_GUESTS` is set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

const DEFAULT_COLOR: &str = "#d94b4b";

/// Presence colors handed out to users without a configured color.
const PALETTE: &[&str] = &[
    "#e06c75", "#61afef", "#98c379", "#c678dd", "#e5c07b", "#56b6c2", "#d19a66", "#be5046", "#7f848e", "#f472b6",
];

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to read users file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid users file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("user {0}: token_sha256 must be 64 hex characters")]
    InvalidDigest(String),
    #[error("user {0}: token digest already assigned to another user")]
    DuplicateToken(String),
}

/// Authenticated user attached to a websocket connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    id: String,
    #[serde(default)]
    email: String,
    name: String,
    #[serde(default)]
    color: Option<String>,
    token_sha256: String,
}

/// Token digest → identity lookup.
#[derive(Debug, Default)]
pub struct TokenStore {
    by_digest: HashMap<String, Identity>,
    allow_guests: bool,
}

impl TokenStore {
    #[must_use]
    pub fn new(allow_guests: bool) -> Self {
        Self { by_digest: HashMap::new(), allow_guests }
    }

    /// Load users from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Read`] if the file cannot be read, otherwise any
    /// error from [`TokenStore::from_yaml`].
    pub fn load(path: &Path, allow_guests: bool) -> Result<Self, AuthError> {
        let text =
            std::fs::read_to_string(path).map_err(|source| AuthError::Read { path: path.to_path_buf(), source })?;
        Self::from_yaml(&text, allow_guests)
    }

    /// Parse users from YAML text:
    ///
    /// ```yaml
    /// users:
    ///   - id: u1
    ///     email: ada@example.com
    ///     name: Ada
    ///     color: "#ff8800"
    ///     token_sha256: <64 hex chars>
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Parse`] for malformed YAML,
    /// [`AuthError::InvalidDigest`] for a digest that is not 64 hex chars,
    /// and [`AuthError::DuplicateToken`] when two users share a digest.
    pub fn from_yaml(text: &str, allow_guests: bool) -> Result<Self, AuthError> {
        let file: UsersFile = serde_yaml::from_str(text)?;
        let mut store = Self::new(allow_guests);
        for entry in file.users {
            let digest = entry.token_sha256.trim().to_ascii_lowercase();
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(AuthError::InvalidDigest(entry.id));
            }
            if store.by_digest.contains_key(&digest) {
                return Err(AuthError::DuplicateToken(entry.id));
            }
            let color = match entry.color.as_deref() {
                Some(raw) => normalize_hex_color(raw, &color_for(&entry.id)),
                None => color_for(&entry.id),
            };
            store.by_digest.insert(
                digest,
                Identity { user_id: entry.id, email: entry.email, name: entry.name, color },
            );
        }
        Ok(store)
    }

    /// Register an identity for a raw token.
    #[cfg(test)]
    pub fn insert_token(&mut self, token: &str, identity: Identity) {
        self.by_digest.insert(hash_token(token), identity);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_digest.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_digest.is_empty()
    }

    /// Resolve a presented token. Unknown tokens become guests when enabled.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<Identity> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        let digest = hash_token(token);
        if let Some(identity) = self.by_digest.get(&digest) {
            return Some(identity.clone());
        }
        if !self.allow_guests {
            return None;
        }
        let user_id = format!("guest-{}", &digest[..12]);
        let name = format!("Guest {}", digest[..4].to_ascii_uppercase());
        let color = color_for(&user_id);
        Some(Identity { user_id, email: String::new(), name, color })
    }
}

/// SHA-256 hex digest of a token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let bytes = hasher.finalize();
    bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
}

/// Stable palette color for a user id.
#[must_use]
pub fn color_for(user_id: &str) -> String {
    let hash = user_id
        .bytes()
        .fold(0_u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    let idx = usize::try_from(hash).unwrap_or(0) % PALETTE.len();
    PALETTE[idx].to_owned()
}

/// Parse `#RGB` or `#RRGGBB` values into RGB channels.
fn parse_hex_rgb(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some((r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Normalize a color to canonical lowercase `#rrggbb`.
#[must_use]
pub fn normalize_hex_color(value: &str, fallback: &str) -> String {
    let fallback_rgb = parse_hex_rgb(fallback)
        .or_else(|| parse_hex_rgb(DEFAULT_COLOR))
        .unwrap_or((217, 75, 75));
    let (r, g, b) = parse_hex_rgb(value).unwrap_or(fallback_rgb);
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
