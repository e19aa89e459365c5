//! A single remote work item and the operations a caller can run on it.
//!
//! [`Workitem`] is a thin handle: an identity (identifier + URL), the last
//! fetched description, and a borrowed [`Service`]. Mutations go through
//! [`crate::mutation`]; listings go through the service's
//! [`crate::service::PagedFetcher`].

use std::fmt;

use tracing::{debug, error};

use crate::error::{Result, RtcError};
use crate::model::{Action, Comment, IntoCommentId, Member, State};
use crate::mutation::{self, MutationOutcome};
use crate::rdf::{CONTEXT_ID, STATE, take_description};
use crate::service::{PageFilter, PageSizes, ResourceKind, Service};
use crate::transport::Request;
use crate::xml::{self, Map, Value, attr};

pub struct Workitem<'c, S: ?Sized> {
    identifier: String,
    url: String,
    raw: Map,
    service: &'c S,
    paging: PageSizes,
}

impl<S: ?Sized> fmt::Debug for Workitem<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workitem")
            .field("identifier", &self.identifier)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl<S: ?Sized> fmt::Display for Workitem<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)
    }
}

fn last_segment(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

impl<'c, S: Service + ?Sized> Workitem<'c, S> {
    /// Handle for the work item at `url`. The identifier defaults to the
    /// URL's final path segment.
    #[must_use]
    pub fn new(url: impl Into<String>, service: &'c S) -> Self {
        let url = url.into();
        Self {
            identifier: last_segment(&url).to_string(),
            url,
            raw: Map::new(),
            service,
            paging: PageSizes::default(),
        }
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Attach an already fetched `rdf:Description` of this work item.
    #[must_use]
    pub fn with_raw(mut self, raw: Map) -> Self {
        self.raw = raw;
        self
    }

    #[must_use]
    pub const fn with_paging(mut self, paging: PageSizes) -> Self {
        self.paging = paging;
        self
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn raw(&self) -> &Map {
        &self.raw
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Append a comment; its id is the comment count seen just before the
    /// write.
    ///
    /// # Errors
    ///
    /// See [`crate::mutation::comment::add_comment`].
    pub fn add_comment(&self, message: &str) -> Result<Comment> {
        mutation::comment::add_comment(self.service, &self.url, message)
    }

    /// Fetch one comment by its position.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::BadValue`] for an id that is not an integer and
    /// [`RtcError::NotFound`] if the server has no such comment.
    pub fn get_comment_by_id(&self, id: impl IntoCommentId) -> Result<Comment> {
        let id = id.into_comment_id()?;
        let url = format!("{}/{id}", mutation::comment::comments_url(&self.url));
        debug!(workitem = %self, %id, "fetching comment");

        let response = match self
            .service
            .send(Request::get(&url, self.service.default_headers()))
        {
            Ok(response) => response,
            Err(err) if err.is_not_found() => {
                error!(workitem = %self, %id, "comment does not exist");
                return Err(RtcError::NotFound(format!("Comment {id} does not exist")));
            }
            Err(err) => return Err(err.into()),
        };

        let raw = take_description(xml::parse(&response.body)?)
            .ok_or_else(|| RtcError::malformed(&url, "missing rdf:Description"))?;
        Ok(Comment::from_raw(id, url, raw))
    }

    /// Every comment, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be fetched or parsed.
    pub fn get_comments(&self) -> Result<Vec<Comment>> {
        let entries = self.fetch(ResourceKind::Comment, &self.workitem_filter())?;
        Ok(entries.into_iter().filter_map(Comment::from_entry).collect())
    }

    // -----------------------------------------------------------------------
    // Subscribers
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// See [`crate::mutation::subscribers::add_subscribers`].
    pub fn add_subscriber(&self, email: &str) -> Result<MutationOutcome> {
        self.add_subscribers(&[email])
    }

    /// # Errors
    ///
    /// See [`crate::mutation::subscribers::add_subscribers`].
    pub fn add_subscribers<E: AsRef<str>>(&self, emails: &[E]) -> Result<MutationOutcome> {
        mutation::subscribers::add_subscribers(self.service, &self.url, emails)
    }

    /// # Errors
    ///
    /// See [`crate::mutation::subscribers::remove_subscribers`].
    pub fn remove_subscriber(&self, email: &str) -> Result<MutationOutcome> {
        self.remove_subscribers(&[email])
    }

    /// # Errors
    ///
    /// See [`crate::mutation::subscribers::remove_subscribers`].
    pub fn remove_subscribers<E: AsRef<str>>(&self, emails: &[E]) -> Result<MutationOutcome> {
        mutation::subscribers::remove_subscribers(self.service, &self.url, emails)
    }

    /// Current subscribers with their emails.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be fetched or parsed.
    pub fn get_subscribers(&self) -> Result<Vec<Member>> {
        let entries = self.fetch(ResourceKind::Subscribers, &self.workitem_filter())?;
        Ok(entries.iter().filter_map(Member::from_raw).collect())
    }

    // -----------------------------------------------------------------------
    // Workflow
    // -----------------------------------------------------------------------

    /// Workflow actions available to this work item.
    ///
    /// # Errors
    ///
    /// Returns an error if the work item was not fetched with its description,
    /// has no project area, or a page cannot be fetched.
    pub fn get_actions(&self) -> Result<Vec<Action>> {
        let entries = self.fetch(ResourceKind::Action, &self.workflow_filter()?)?;
        Ok(entries.iter().filter_map(Action::from_raw).collect())
    }

    /// The action titled exactly `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::BadValue`] for an empty name and
    /// [`RtcError::NotFound`] if no action has that title.
    pub fn get_action(&self, name: &str) -> Result<Action> {
        if name.is_empty() {
            error!(workitem = %self, "action name must not be empty");
            return Err(RtcError::BadValue("Please specify a valid action name".to_string()));
        }
        self.get_actions()?
            .into_iter()
            .find(|action| action.title == name)
            .ok_or_else(|| {
                error!(workitem = %self, name, "no such action");
                RtcError::NotFound(format!("No Action named {name}"))
            })
    }

    /// Workflow states of this work item.
    ///
    /// # Errors
    ///
    /// Returns an error if the work item was not fetched with its description,
    /// has no project area, or a page cannot be fetched.
    pub fn get_states(&self) -> Result<Vec<State>> {
        let entries = self.fetch(ResourceKind::State, &self.workflow_filter()?)?;
        Ok(entries.iter().filter_map(State::from_raw).collect())
    }

    fn fetch(&self, kind: ResourceKind, filter: &PageFilter) -> Result<Vec<Map>> {
        self.service
            .fetch_page(kind, filter, self.paging.for_kind(kind))
    }

    fn workitem_filter(&self) -> PageFilter {
        PageFilter::for_workitem(&self.identifier)
    }

    /// Project area and customized attribute scoping this work item's
    /// workflow, read from its `rtc_cm:contextId` and `rtc_cm:state`.
    fn workflow_filter(&self) -> Result<PageFilter> {
        let state = self
            .raw
            .get(STATE)
            .and_then(Value::as_map)
            .and_then(|state| attr(state, "rdf:resource"))
            .ok_or_else(|| RtcError::malformed(&self.url, format!("work item has no {STATE}")))?;
        let customized_attr = state
            .trim_end_matches('/')
            .rsplit('/')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| RtcError::malformed(&self.url, format!("unexpected state URL {state}")))?;

        let context = self.raw.get(CONTEXT_ID).ok_or_else(|| {
            RtcError::malformed(&self.url, format!("work item has no {CONTEXT_ID}"))
        })?;
        let projectarea_id = context
            .as_map()
            .and_then(|map| attr(map, "rdf:resource"))
            .map(last_segment)
            .or_else(|| context.as_text())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RtcError::malformed(&self.url, format!("empty {CONTEXT_ID}")))?;

        Ok(PageFilter::for_workflow(projectarea_id, customized_attr))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::{Workitem, last_segment};
    use crate::error::{ErrorCode, Result};
    use crate::model::Member;
    use crate::service::{PageFilter, PagedFetcher, PersonDirectory, ResourceKind, Service};
    use crate::transport::{Request, Response, Transport, TransportError};
    use crate::xml::{Map, Value, map_of};

    /// Service that only answers paged fetches, recording the filters.
    #[derive(Default)]
    struct Listing {
        entries: Vec<Map>,
        filters: RefCell<Vec<(ResourceKind, PageFilter, u32)>>,
    }

    impl Transport for Listing {
        fn send(&self, request: Request) -> Result<Response, TransportError> {
            Err(TransportError::Status {
                url: request.url,
                status: 404,
                body: String::new(),
            })
        }
    }

    impl PersonDirectory for Listing {
        fn resolve_person(&self, email: &str) -> Result<Member> {
            Ok(Member::new(format!("https://h/jts/users/{email}"), email))
        }
    }

    impl PagedFetcher for Listing {
        fn fetch_page(
            &self,
            kind: ResourceKind,
            filter: &PageFilter,
            page_size: u32,
        ) -> Result<Vec<Map>> {
            self.filters.borrow_mut().push((kind, filter.clone(), page_size));
            Ok(self.entries.clone())
        }
    }

    impl Service for Listing {}

    fn action(title: &str) -> Map {
        map_of([
            ("@rdf:about", Value::from(format!("https://h/actions/{title}"))),
            ("dcterms:title", Value::from(title)),
        ])
    }

    fn described() -> Map {
        map_of([
            (
                "rtc_cm:state",
                Value::Map(map_of([(
                    "@rdf:resource",
                    "https://h/ccm/oslc/workflows/_pa1/states/bugzillaWorkflow/2",
                )])),
            ),
            ("rtc_cm:contextId", Value::from("_pa1")),
        ])
    }

    #[test]
    fn identifier_defaults_to_last_segment() {
        let service = Listing::default();
        let item = Workitem::new("https://h/ccm/oslc/workitems/161", &service);
        assert_eq!(item.identifier(), "161");
        assert_eq!(item.to_string(), "161");

        let item = item.with_identifier("custom");
        assert_eq!(item.identifier(), "custom");
        assert_eq!(item.url(), "https://h/ccm/oslc/workitems/161");
    }

    #[test]
    fn last_segment_ignores_query_and_trailing_slash() {
        assert_eq!(last_segment("https://h/w/161/"), "161");
        assert_eq!(last_segment("https://h/w/161?oslc.properties=x"), "161");
    }

    #[test]
    fn actions_are_scoped_by_project_area_and_attribute() {
        let service = Listing {
            entries: vec![action("Resolve"), action("Reopen")],
            ..Listing::default()
        };
        let item = Workitem::new("https://h/w/1", &service).with_raw(described());

        let actions = item.get_actions().unwrap();
        assert_eq!(actions.len(), 2);

        let filters = service.filters.borrow();
        let (kind, filter, size) = &filters[0];
        assert_eq!(*kind, ResourceKind::Action);
        assert_eq!(filter.projectarea_id.as_deref(), Some("_pa1"));
        assert_eq!(filter.customized_attr.as_deref(), Some("bugzillaWorkflow"));
        assert_eq!(*size, 100);
    }

    #[test]
    fn get_action_matches_title_exactly() {
        let service = Listing {
            entries: vec![action("Resolve"), action("Reopen")],
            ..Listing::default()
        };
        let item = Workitem::new("https://h/w/1", &service).with_raw(described());

        assert_eq!(item.get_action("Reopen").unwrap().title, "Reopen");
        assert_eq!(
            item.get_action("resolve").unwrap_err().code(),
            ErrorCode::NotFound
        );
        assert_eq!(item.get_action("").unwrap_err().code(), ErrorCode::BadValue);
    }

    #[test]
    fn empty_name_is_rejected_before_fetching() {
        let service = Listing::default();
        let item = Workitem::new("https://h/w/1", &service).with_raw(described());
        assert!(item.get_action("").is_err());
        assert!(service.filters.borrow().is_empty());
    }

    #[test]
    fn workflow_lookup_needs_state_and_context() {
        let service = Listing::default();
        let item = Workitem::new("https://h/w/1", &service);
        assert_eq!(
            item.get_states().unwrap_err().code(),
            ErrorCode::MalformedResponse
        );
        assert!(service.filters.borrow().is_empty());
    }

    #[test]
    fn context_id_may_be_a_resource_reference() {
        let service = Listing::default();
        let mut raw = described();
        raw.insert(
            "rtc_cm:contextId".to_string(),
            Value::Map(map_of([("@rdf:resource", "https://h/ccm/process/project-areas/_pa9")])),
        );
        let item = Workitem::new("https://h/w/1", &service).with_raw(raw);
        item.get_states().unwrap();

        let filters = service.filters.borrow();
        assert_eq!(filters[0].1.projectarea_id.as_deref(), Some("_pa9"));
        assert_eq!(filters[0].2, 50);
    }

    #[test]
    fn missing_comment_is_not_found() {
        let service = Listing::default();
        let item = Workitem::new("https://h/w/1", &service);
        assert_eq!(
            item.get_comment_by_id(4_i64).unwrap_err().code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            item.get_comment_by_id("four").unwrap_err().code(),
            ErrorCode::BadValue
        );
    }
}
