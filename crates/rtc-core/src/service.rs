//! Collaborator interfaces the work-item layer consumes.
//!
//! A [`Service`] bundles the three things a [`crate::workitem::Workitem`]
//! needs from the outside world: a [`Transport`], a [`PersonDirectory`] for
//! turning emails into person URLs, and a [`PagedFetcher`] for listing
//! secondary resources. [`crate::client::RtcClient`] is the stock
//! implementation; tests plug in fakes.

use serde::{Deserialize, Serialize};

use crate::collection;
use crate::error::{Result, RtcError};
use crate::model::Member;
use crate::rdf::{COLLECTION, NEXT_PAGE, TOTAL_COUNT};
use crate::transport::{Headers, Transport};
use crate::xml::{Map, Value};

/// External user directory.
pub trait PersonDirectory {
    /// Resolve an email address to a person resource.
    ///
    /// Implementations must reject an email without `@` with
    /// [`RtcError::BadValue`] before attempting any lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::BadValue`] for an invalid email.
    fn resolve_person(&self, email: &str) -> Result<Member>;
}

/// Secondary resources reachable from a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Comment,
    Subscribers,
    Action,
    State,
}

impl ResourceKind {
    /// Element name of one entry in a collection page of this kind.
    #[must_use]
    pub const fn entry_key(self) -> &'static str {
        match self {
            Self::Comment => "rtc_cm:Comment",
            Self::Subscribers => "rtc_cm:User",
            Self::Action => "rtc_cm:Action",
            Self::State => "rtc_cm:Status",
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Subscribers => "subscribers",
            Self::Action => "action",
            Self::State => "state",
        }
    }
}

/// Query parameters narrowing a paged fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFilter {
    pub workitem_id: Option<String>,
    pub projectarea_id: Option<String>,
    pub customized_attr: Option<String>,
}

impl PageFilter {
    #[must_use]
    pub fn for_workitem(id: impl Into<String>) -> Self {
        Self {
            workitem_id: Some(id.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_workflow(projectarea_id: impl Into<String>, customized_attr: impl Into<String>) -> Self {
        Self {
            projectarea_id: Some(projectarea_id.into()),
            customized_attr: Some(customized_attr.into()),
            ..Self::default()
        }
    }
}

/// External paginated collection fetch.
pub trait PagedFetcher {
    /// Fetch every resource of `kind` matching `filter`, asking the server for
    /// `page_size` entries per round trip. Returns raw entry mappings in
    /// server order; an empty collection is an empty `Vec`.
    fn fetch_page(&self, kind: ResourceKind, filter: &PageFilter, page_size: u32)
    -> Result<Vec<Map>>;
}

/// Everything a work item needs from its environment.
pub trait Service: Transport + PersonDirectory + PagedFetcher {
    /// Headers attached to every request (authentication cookies and the
    /// like). Request-specific headers are layered on top of a copy.
    fn default_headers(&self) -> Headers {
        Headers::new()
    }
}

/// Entries requested per page, by resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSizes {
    #[serde(default = "default_comments")]
    pub comments: u32,
    #[serde(default = "default_subscribers")]
    pub subscribers: u32,
    #[serde(default = "default_actions")]
    pub actions: u32,
    #[serde(default = "default_states")]
    pub states: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            comments: default_comments(),
            subscribers: default_subscribers(),
            actions: default_actions(),
            states: default_states(),
        }
    }
}

impl PageSizes {
    #[must_use]
    pub const fn for_kind(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::Comment => self.comments,
            ResourceKind::Subscribers => self.subscribers,
            ResourceKind::Action => self.actions,
            ResourceKind::State => self.states,
        }
    }
}

const fn default_comments() -> u32 {
    100
}

const fn default_subscribers() -> u32 {
    10
}

const fn default_actions() -> u32 {
    100
}

const fn default_states() -> u32 {
    50
}

/// One page of an `oslc_cm:Collection` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub total: u64,
    pub entries: Vec<Map>,
    pub next: Option<String>,
}

/// The `oslc_cm:totalCount` of a collection document.
///
/// # Errors
///
/// Returns [`RtcError::Malformed`] if the count is missing or not a
/// non-negative integer.
pub fn total_count(document: &Map, url: &str) -> Result<u64> {
    let collection = document
        .get(COLLECTION)
        .and_then(Value::as_map)
        .ok_or_else(|| RtcError::malformed(url, format!("missing {COLLECTION}")))?;
    let raw = collection
        .get(TOTAL_COUNT)
        .and_then(Value::as_text)
        .ok_or_else(|| RtcError::malformed(url, "collection has no totalCount"))?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| RtcError::malformed(url, format!("totalCount {raw:?} is not a count")))
}

/// Split a collection page into its entries and the link to the next page.
///
/// Entries follow the same absent/singleton/plural convention as any other
/// collection property, so they go through [`collection::normalize`].
///
/// # Errors
///
/// Returns [`RtcError::Malformed`] if the page has no collection element
/// or its entries have an unexpected shape.
pub fn read_page(document: &Map, kind: ResourceKind, url: &str) -> Result<Page> {
    let total = total_count(document, url)?;
    let Some(collection) = document.get(COLLECTION).and_then(Value::as_map) else {
        return Err(RtcError::malformed(url, format!("missing {COLLECTION}")));
    };
    let entries = if total == 0 {
        Vec::new()
    } else {
        collection::normalize(collection.get(kind.entry_key()))?
    };
    let next = collection
        .get(NEXT_PAGE)
        .and_then(Value::as_text)
        .filter(|next| !next.is_empty() && *next != url)
        .map(str::to_string);
    Ok(Page {
        total,
        entries,
        next,
    })
}
