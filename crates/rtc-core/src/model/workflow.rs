use serde::Serialize;

use super::{resource_url, text_field};
use crate::xml::Map;

/// A workflow action that moves a work item between states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_state: Option<String>,
}

impl Action {
    #[must_use]
    pub fn from_raw(raw: &Map) -> Option<Self> {
        Some(Self {
            url: resource_url(raw)?.to_string(),
            title: text_field(raw, "dcterms:title").unwrap_or_default(),
            identifier: text_field(raw, "dcterms:identifier"),
            result_state: super::ref_field(raw, "rtc_cm:resultState").map(str::to_string),
        })
    }
}

/// A workflow state a work item can be in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl State {
    #[must_use]
    pub fn from_raw(raw: &Map) -> Option<Self> {
        Some(Self {
            url: resource_url(raw)?.to_string(),
            title: text_field(raw, "dcterms:title").unwrap_or_default(),
            identifier: text_field(raw, "dcterms:identifier"),
            group: text_field(raw, "rtc_cm:group"),
        })
    }
}
