//! Stock [`Service`] implementation over any [`Transport`].

use std::collections::HashSet;

use tracing::{debug, error};
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::error::{Result, RtcError};
use crate::model::{Member, validate_email};
use crate::mutation::rdf_headers;
use crate::rdf::take_description;
use crate::service::{
    PageFilter, PageSizes, PagedFetcher, PersonDirectory, ResourceKind, Service, read_page,
};
use crate::transport::{Headers, Request, Response, Transport, TransportError};
use crate::workitem::Workitem;
use crate::xml::{self, Map};

/// Client for one change-management server.
///
/// `base` is the application root, e.g. `https://jazz.example:9443/ccm`;
/// every resource URL is derived from it.
#[derive(Debug, Clone)]
pub struct RtcClient<T> {
    base: Url,
    transport: T,
    headers: Headers,
    paging: PageSizes,
}

impl<T: Transport> RtcClient<T> {
    /// Client for the server application rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::BadValue`] if `base_url` does not parse as a URL.
    pub fn new(base_url: &str, transport: T) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|err| RtcError::BadValue(format!("invalid server url {base_url}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(RtcError::BadValue(format!(
                "invalid server url {base_url}: not a hierarchical URL"
            )));
        }
        Ok(Self {
            base,
            transport,
            headers: Headers::new(),
            paging: PageSizes::default(),
        })
    }

    /// Headers sent with every request, e.g. an authentication cookie.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub const fn with_paging(mut self, paging: PageSizes) -> Self {
        self.paging = paging;
        self
    }

    /// The server root without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn workitem_url(&self, id: &str) -> String {
        format!("{}/oslc/workitems/{id}", self.base_url())
    }

    /// Handle for work item `id` without fetching it.
    ///
    /// Enough for comments and subscribers; workflow lookups need the
    /// description that [`Self::get_workitem`] fetches.
    #[must_use]
    pub fn workitem(&self, id: &str) -> Workitem<'_, Self> {
        Workitem::new(self.workitem_url(id), self)
            .with_identifier(id)
            .with_paging(self.paging)
    }

    /// Fetch work item `id` together with its description.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::NotFound`] if the server has no work item `id`, and
    /// a transport or malformed-response error for other failures.
    pub fn get_workitem(&self, id: &str) -> Result<Workitem<'_, Self>> {
        let url = self.workitem_url(id);
        debug!(%url, "fetching workitem");
        let response = self.get(&url).map_err(|err| {
            if err.is_not_found() {
                error!(id, "workitem does not exist");
                RtcError::NotFound(format!("Workitem {id} does not exist"))
            } else {
                err.into()
            }
        })?;
        let raw = take_description(xml::parse(&response.body)?)
            .ok_or_else(|| RtcError::malformed(&url, "missing rdf:Description"))?;
        Ok(self.workitem(id).with_raw(raw))
    }

    fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.transport
            .send(Request::get(url, rdf_headers(&self.headers)))
    }

    fn collection_url(&self, kind: ResourceKind, filter: &PageFilter, page_size: u32) -> Result<String> {
        let missing = |field: &str| {
            RtcError::BadValue(format!("{} listing needs a {field}", kind.as_str()))
        };
        let path = match kind {
            ResourceKind::Comment | ResourceKind::Subscribers => {
                let id = filter.workitem_id.as_deref().ok_or_else(|| missing("workitem id"))?;
                let property = match kind {
                    ResourceKind::Comment => "rtc_cm:comments",
                    _ => "rtc_cm:subscribers",
                };
                format!("{}/{property}", self.workitem_url(id))
            }
            ResourceKind::Action | ResourceKind::State => {
                let area = filter
                    .projectarea_id
                    .as_deref()
                    .ok_or_else(|| missing("project area"))?;
                let attr = filter
                    .customized_attr
                    .as_deref()
                    .ok_or_else(|| missing("customized attribute"))?;
                let segment = if kind == ResourceKind::Action { "actions" } else { "states" };
                format!("{}/oslc/workflows/{area}/{segment}/{attr}", self.base_url())
            }
        };
        Ok(format!("{path}?oslc_cm.pageSize={page_size}"))
    }
}

impl<T: Transport> Transport for RtcClient<T> {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        self.transport.send(request)
    }
}

impl<T: Transport> PersonDirectory for RtcClient<T> {
    /// Person resources live under `/jts/users/` at the server root, next to
    /// the application the base URL points into; no lookup is made.
    fn resolve_person(&self, email: &str) -> Result<Member> {
        validate_email(email)?;
        let users = self
            .base
            .join("/jts/users/")
            .map_err(|err| RtcError::BadValue(format!("cannot derive user URL: {err}")))?;
        let encoded: String = byte_serialize(email.as_bytes()).collect();
        Ok(Member::new(format!("{users}{encoded}"), email))
    }
}

impl<T: Transport> PagedFetcher for RtcClient<T> {
    fn fetch_page(
        &self,
        kind: ResourceKind,
        filter: &PageFilter,
        page_size: u32,
    ) -> Result<Vec<Map>> {
        let mut url = self.collection_url(kind, filter, page_size)?;
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        loop {
            let response = self.get(&url)?;
            let page = read_page(&xml::parse(&response.body)?, kind, &url)?;
            debug!(%url, kind = kind.as_str(), count = page.entries.len(), total = page.total, "fetched page");
            entries.extend(page.entries);
            seen.insert(url);
            match page.next {
                Some(next) if !seen.contains(&next) => url = next,
                _ => break,
            }
        }
        Ok(entries)
    }
}

impl<T: Transport> Service for RtcClient<T> {
    fn default_headers(&self) -> Headers {
        self.headers.clone()
    }
}
