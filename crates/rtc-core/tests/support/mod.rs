//! In-memory OSLC-CM server for integration tests.
//!
//! Serves one work item (`161`) with its subscribers, comments and a small
//! workflow. Every write checks `If-Match` against the current version and
//! every request is recorded so tests can count round trips.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};

use rtc_core::RtcClient;
use rtc_core::collection::{member_url, normalize};
use rtc_core::transport::{Headers, Method, Request, Response, Transport, TransportError};
use rtc_core::xml::{self, Map, Value, get_path};

pub const ORIGIN: &str = "https://jazz.example";
pub const BASE: &str = "https://jazz.example/ccm";
pub const WORKITEM: &str = "https://jazz.example/ccm/oslc/workitems/161";
pub const PROJECT_AREA: &str = "_pa1";
pub const WORKFLOW: &str = "bugzillaWorkflow";

const NAMESPACES: &str = concat!(
    r#"xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" "#,
    r#"xmlns:dcterms="http://purl.org/dc/terms/" "#,
    r#"xmlns:oslc_cm="http://open-services.net/ns/cm#" "#,
    r#"xmlns:foaf="http://xmlns.com/foaf/0.1/""#,
);

/// Person URL the stock client derives for `email`. User resources live
/// at the server root, outside the `/ccm` application.
pub fn person(email: &str) -> String {
    format!("{ORIGIN}/jts/users/{}", email.replace('@', "%40"))
}

pub fn subscribers_url() -> String {
    format!("{WORKITEM}?oslc_cm.properties=rtc_cm:subscribers")
}

pub fn comments_url() -> String {
    format!("{WORKITEM}/rtc_cm:comments")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Markup of a stored description, as the server would emit it.
fn fragment_of(value: &Value) -> String {
    match value {
        Value::Literal(raw) => raw.clone(),
        Value::Text(text) => escape(text),
        Value::Map(map) => map.get(xml::TEXT_KEY).map(fragment_of).unwrap_or_default(),
        Value::Null | Value::List(_) => String::new(),
    }
}

fn status(url: &str, status: u16) -> TransportError {
    TransportError::Status {
        url: url.to_string(),
        status,
        body: String::new(),
    }
}

#[derive(Debug, Default)]
pub struct FakeServer {
    subscribers: RefCell<Vec<String>>,
    /// Comment descriptions as XML literal content.
    comments: RefCell<Vec<String>>,
    version: Cell<u64>,
    requests: RefCell<Vec<Request>>,
    /// Bump the version right after the next GET, as if another client
    /// wrote between our FETCH and WRITE.
    pub race_after_get: Cell<bool>,
    /// Serve representations without an ETag header.
    pub omit_etag: Cell<bool>,
    /// Answer comment creation with an empty body.
    pub blank_create_response: Cell<bool>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscribers(self, urls: &[String]) -> Self {
        self.subscribers.replace(urls.to_vec());
        self
    }

    pub fn with_comments(self, texts: &[&str]) -> Self {
        self.comments
            .replace(texts.iter().map(|t| escape(t)).collect());
        self
    }

    /// Seed comments whose descriptions hold inline XML markup.
    pub fn with_comment_markup(self, fragments: &[&str]) -> Self {
        self.comments
            .replace(fragments.iter().map(|f| (*f).to_string()).collect());
        self
    }

    pub fn client(&self) -> RtcClient<&Self> {
        RtcClient::new(BASE, self).expect("base url is valid")
    }

    pub fn subscribers(&self) -> Vec<String> {
        self.subscribers.borrow().clone()
    }

    /// Stored descriptions, read the way a person wrote them.
    pub fn comments(&self) -> Vec<String> {
        self.comments
            .borrow()
            .iter()
            .map(|f| Value::Literal(f.clone()).plain_text().unwrap_or_default())
            .collect()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn reset_requests(&self) {
        self.requests.borrow_mut().clear();
    }

    /// Body of the most recent request with `method`, parsed.
    pub fn last_body(&self, method: Method) -> Option<Map> {
        let requests = self.requests.borrow();
        let request = requests.iter().rev().find(|r| r.method == method)?;
        xml::parse(request.body.as_deref()?).ok()
    }

    pub fn etag(&self) -> String {
        format!("\"_v{}\"", self.version.get())
    }

    fn bump(&self) {
        self.version.set(self.version.get() + 1);
    }

    fn ok(&self, body: String) -> Response {
        let mut headers = Headers::new();
        if !self.omit_etag.get() {
            headers.set("ETag", self.etag());
        }
        Response {
            status: 200,
            headers,
            body: body.into_bytes(),
        }
    }

    fn check_precondition(&self, request: &Request) -> Result<(), TransportError> {
        match request.headers.get("If-Match") {
            Some(tag) if tag != self.etag() => Err(status(&request.url, 412)),
            _ => Ok(()),
        }
    }

    fn route(&self, request: &Request) -> Result<Response, TransportError> {
        let url = request.url.as_str();
        let comments = comments_url();

        match request.method {
            Method::Get if url == subscribers_url() => Ok(self.ok(self.subscribers_doc())),
            Method::Put if url == subscribers_url() => {
                self.check_precondition(request)?;
                self.store_subscribers(request)?;
                self.bump();
                Ok(self.ok(String::new()))
            }
            Method::Get if url == WORKITEM => Ok(self.ok(workitem_doc())),
            Method::Get if url == comments || url.starts_with(&format!("{comments}?")) => {
                Ok(self.ok(self.comments_doc()))
            }
            Method::Post if url == format!("{comments}/oslc:comment") => {
                self.check_precondition(request)?;
                self.create_comment(request)
            }
            Method::Get if url.starts_with(&format!("{comments}/")) => {
                let id = &url[comments.len() + 1..];
                self.comment_doc(id)
                    .map(|body| self.ok(body))
                    .ok_or_else(|| status(url, 404))
            }
            Method::Get if url.starts_with(&format!("{WORKITEM}/rtc_cm:subscribers?")) => {
                Ok(self.ok(self.users_page()))
            }
            Method::Get if url.starts_with(&workflow_url("actions")) => {
                Ok(self.ok(actions_page(url.contains("page=2"))))
            }
            Method::Get if url.starts_with(&workflow_url("states")) => Ok(self.ok(states_page())),
            _ => Err(status(url, 404)),
        }
    }

    fn subscribers_doc(&self) -> String {
        let subscribers = self.subscribers.borrow();
        if subscribers.is_empty() {
            return format!(
                r#"<rdf:RDF {NAMESPACES}><rdf:Description rdf:about="{WORKITEM}"/></rdf:RDF>"#
            );
        }
        let members: String = subscribers
            .iter()
            .map(|url| format!(r#"<rtc_cm:subscribers rdf:resource="{}"/>"#, escape(url)))
            .collect();
        format!(
            r#"<rdf:RDF {NAMESPACES} xmlns:rtc_cm="http://jazz.net/xmlns/prod/jazz/rtc/cm/1.0/"><rdf:Description rdf:about="{WORKITEM}">{members}</rdf:Description></rdf:RDF>"#
        )
    }

    fn store_subscribers(&self, request: &Request) -> Result<(), TransportError> {
        let bad = || status(&request.url, 400);
        let doc = xml::parse(request.body.as_deref().ok_or_else(bad)?).map_err(|_| bad())?;
        let root = doc.get("rdf:RDF").and_then(Value::as_map).ok_or_else(bad)?;
        let raw = get_path(&doc, &["rdf:RDF", "rdf:Description", "rtc_cm:subscribers"]);
        if raw.is_some() && !root.contains_key("@xmlns:rtc_cm") {
            return Err(bad());
        }
        let members = normalize(raw).map_err(|_| bad())?;
        let urls = members
            .iter()
            .map(|m| member_url(m).map(str::to_string).ok_or_else(bad))
            .collect::<Result<Vec<_>, _>>()?;
        self.subscribers.replace(urls);
        Ok(())
    }

    fn comments_doc(&self) -> String {
        let comments = self.comments.borrow();
        let entries: String = comments
            .iter()
            .enumerate()
            .map(|(i, fragment)| {
                format!(
                    r#"<rtc_cm:Comment rdf:about="{}/{i}"><dcterms:description rdf:parseType="Literal">{fragment}</dcterms:description></rtc_cm:Comment>"#,
                    comments_url(),
                )
            })
            .collect();
        format!(
            r#"<oslc_cm:Collection {NAMESPACES} oslc_cm:totalCount="{}">{entries}</oslc_cm:Collection>"#,
            comments.len()
        )
    }

    fn comment_doc(&self, id: &str) -> Option<String> {
        let index: usize = id.parse().ok()?;
        let comments = self.comments.borrow();
        let fragment = comments.get(index)?;
        Some(format!(
            r#"<rdf:RDF {NAMESPACES}><rdf:Description rdf:about="{}/{index}"><dcterms:description rdf:parseType="Literal">{fragment}</dcterms:description><dcterms:creator rdf:resource="{ORIGIN}/jts/users/admin"/></rdf:Description></rdf:RDF>"#,
            comments_url(),
        ))
    }

    fn create_comment(&self, request: &Request) -> Result<Response, TransportError> {
        let bad = || status(&request.url, 400);
        let doc = xml::parse(request.body.as_deref().ok_or_else(bad)?).map_err(|_| bad())?;
        let description = get_path(&doc, &["rdf:RDF", "rdf:Description"])
            .and_then(Value::as_map)
            .ok_or_else(bad)?;
        let about = description
            .get("@rdf:about")
            .and_then(Value::as_text)
            .ok_or_else(bad)?;
        let fragment = description
            .get("dcterms:description")
            .map(fragment_of)
            .unwrap_or_default();

        let index = self.comments.borrow().len();
        if about != format!("{}/{index}", comments_url()) {
            return Err(status(&request.url, 409));
        }
        self.comments.borrow_mut().push(fragment);
        self.bump();

        if self.blank_create_response.get() {
            return Ok(self.ok(String::new()));
        }
        let body = self
            .comment_doc(&index.to_string())
            .ok_or_else(bad)?;
        Ok(self.ok(body))
    }

    fn users_page(&self) -> String {
        let subscribers = self.subscribers.borrow();
        let entries: String = subscribers
            .iter()
            .map(|url| {
                let email = url.rsplit('/').next().unwrap_or_default().replace("%40", "@");
                format!(
                    r#"<rtc_cm:User rdf:about="{url}"><foaf:mbox rdf:resource="mailto:{email}"/><foaf:name>{email}</foaf:name></rtc_cm:User>"#
                )
            })
            .collect();
        format!(
            r#"<oslc_cm:Collection {NAMESPACES} oslc_cm:totalCount="{}">{entries}</oslc_cm:Collection>"#,
            subscribers.len()
        )
    }
}

impl Transport for FakeServer {
    fn send(&self, request: Request) -> Result<Response, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        let response = self.route(&request);
        if request.method == Method::Get && self.race_after_get.replace(false) {
            self.bump();
        }
        response
    }
}

fn workflow_url(kind: &str) -> String {
    format!("{BASE}/oslc/workflows/{PROJECT_AREA}/{kind}/{WORKFLOW}")
}

fn workitem_doc() -> String {
    format!(
        r#"<rdf:RDF {NAMESPACES} xmlns:rtc_cm="http://jazz.net/xmlns/prod/jazz/rtc/cm/1.0/">
             <rdf:Description rdf:about="{WORKITEM}">
               <dcterms:identifier>161</dcterms:identifier>
               <dcterms:title>Login page rejects valid passwords</dcterms:title>
               <rtc_cm:state rdf:resource="{}/2"/>
               <rtc_cm:contextId>{PROJECT_AREA}</rtc_cm:contextId>
             </rdf:Description>
           </rdf:RDF>"#,
        workflow_url("states")
    )
}

fn action(id: &str, title: &str) -> String {
    format!(
        r#"<rtc_cm:Action rdf:about="{}/{id}"><dcterms:title>{title}</dcterms:title><dcterms:identifier>{id}</dcterms:identifier></rtc_cm:Action>"#,
        workflow_url("actions")
    )
}

fn actions_page(second: bool) -> String {
    if second {
        return format!(
            r#"<oslc_cm:Collection {NAMESPACES} oslc_cm:totalCount="3">{}</oslc_cm:Collection>"#,
            action("reopen", "Reopen")
        );
    }
    format!(
        r#"<oslc_cm:Collection {NAMESPACES} oslc_cm:totalCount="3" oslc_cm:next="{}?page=2">{}{}</oslc_cm:Collection>"#,
        workflow_url("actions"),
        action("resolve", "Resolve"),
        action("verify", "Verify")
    )
}

fn states_page() -> String {
    format!(
        r#"<oslc_cm:Collection {NAMESPACES} oslc_cm:totalCount="1"><rtc_cm:Status rdf:about="{}/2"><dcterms:title>In Progress</dcterms:title><rtc_cm:group>inprogress</rtc_cm:group></rtc_cm:Status></oslc_cm:Collection>"#,
        workflow_url("states")
    )
}
