use serde::Serialize;

use super::{resource_url, text_field};
use crate::error::{Result, RtcError};
use crate::xml::{Map, attr};

/// A person known to the server's user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub url: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Member {
    #[must_use]
    pub fn new(url: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            email: email.into(),
            name: None,
        }
    }

    /// Build a member from a user entry of a collection page.
    ///
    /// The email comes from `foaf:mbox` (with the `mailto:` scheme stripped)
    /// or, failing that, `rtc_cm:emailAddress`.
    #[must_use]
    pub fn from_raw(raw: &Map) -> Option<Self> {
        let url = resource_url(raw)?.to_string();
        let email = mbox(raw)
            .or_else(|| text_field(raw, "rtc_cm:emailAddress"))
            .map(|email| email.trim_start_matches("mailto:").to_string())
            .unwrap_or_default();
        let name = text_field(raw, "foaf:name").or_else(|| text_field(raw, "dcterms:title"));
        Some(Self { url, email, name })
    }
}

fn mbox(raw: &Map) -> Option<String> {
    let mbox = raw.get("foaf:mbox")?;
    mbox.as_map()
        .and_then(|m| attr(m, "rdf:resource"))
        .or_else(|| mbox.as_text())
        .map(str::to_string)
}

/// Reject anything that cannot be an email address before it reaches the
/// directory or the network.
///
/// # Errors
///
/// Returns [`RtcError::BadValue`] if `email` has no `@`.
pub fn validate_email(email: &str) -> Result<()> {
    if email.contains('@') {
        Ok(())
    } else {
        Err(RtcError::BadValue(format!(
            "Please specify a valid email address name: {email}"
        )))
    }
}
