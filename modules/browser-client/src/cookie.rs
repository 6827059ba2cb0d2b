use chromiumoxide::cdp::browser_protocol::network::{Cookie, CookieParam, TimeSinceEpoch};
use serde::{Deserialize, Serialize};

use crate::error::{BrowserError, Result};

/// A browser cookie in the JSON shape written by common automation tools
/// (camelCase keys, `expires` in seconds since epoch, `-1` for session cookies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub session: bool,
}

fn default_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

impl SessionCookie {
    pub fn is_session(&self) -> bool {
        self.session || self.expires <= 0.0
    }

    pub(crate) fn to_param(&self) -> Result<CookieParam> {
        let mut builder = CookieParam::builder()
            .name(self.name.clone())
            .value(self.value.clone())
            .domain(self.domain.clone())
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);
        if !self.is_session() {
            builder = builder.expires(TimeSinceEpoch::new(self.expires));
        }
        builder
            .build()
            .map_err(|e| BrowserError::Protocol(format!("invalid cookie {}: {e}", self.name)))
    }
}

impl From<Cookie> for SessionCookie {
    fn from(c: Cookie) -> Self {
        Self {
            name: c.name,
            value: c.value,
            domain: c.domain,
            path: c.path,
            expires: c.expires,
            http_only: c.http_only,
            secure: c.secure,
            session: c.session,
        }
    }
}
