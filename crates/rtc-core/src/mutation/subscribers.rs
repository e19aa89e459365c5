//! Add and remove work-item subscribers.
//!
//! A call validates every email, resolves them all to person URLs, then runs
//! exactly one FETCH of the subscriber-scoped representation. Each requested
//! member is scanned and applied in caller order against the same in-memory
//! sequence, and at most one conditional PUT goes out at the end. The PUT is
//! skipped only when every requested member was already in the requested
//! state.

use tracing::info;

use super::{MutationOutcome, Snapshot, conditional_headers, fetch, rdf_headers};
use crate::collection::{self, member_ref, position_of};
use crate::error::{Result, RtcError};
use crate::model::{Member, validate_email};
use crate::rdf::{DESCRIPTION_PATH, NS_RTC_CM, SUBSCRIBERS, ensure_namespace};
use crate::service::Service;
use crate::transport::Request;
use crate::xml::{self, Map, get_map_mut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Remove,
}

impl Op {
    const fn verb(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

/// What to do with one requested member, decided by a read-only scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Append,
    Delete(usize),
    Keep,
}

fn decide(op: Op, members: &[Map], url: &str) -> Decision {
    match (op, position_of(members, url)) {
        (Op::Add, None) => Decision::Append,
        (Op::Remove, Some(index)) => Decision::Delete(index),
        (Op::Add, Some(_)) | (Op::Remove, None) => Decision::Keep,
    }
}

/// URL of the representation restricted to the subscribers property.
#[must_use]
pub fn subscribers_url(workitem_url: &str) -> String {
    format!("{workitem_url}?oslc_cm.properties={SUBSCRIBERS}")
}

/// Subscribe every email in `emails` with one FETCH and at most one PUT.
///
/// # Errors
///
/// Returns [`RtcError::BadValue`] before any request if an email is
/// invalid. Fetch and write failures are returned as-is; a concurrent
/// change surfaces as a precondition failure.
pub fn add_subscribers<S, E>(service: &S, workitem_url: &str, emails: &[E]) -> Result<MutationOutcome>
where
    S: Service + ?Sized,
    E: AsRef<str>,
{
    update(service, workitem_url, emails, Op::Add)
}

/// Unsubscribe every email in `emails` with one FETCH and at most one PUT.
///
/// # Errors
///
/// Same as [`add_subscribers`].
pub fn remove_subscribers<S, E>(
    service: &S,
    workitem_url: &str,
    emails: &[E],
) -> Result<MutationOutcome>
where
    S: Service + ?Sized,
    E: AsRef<str>,
{
    update(service, workitem_url, emails, Op::Remove)
}

fn update<S, E>(service: &S, workitem_url: &str, emails: &[E], op: Op) -> Result<MutationOutcome>
where
    S: Service + ?Sized,
    E: AsRef<str>,
{
    for email in emails {
        validate_email(email.as_ref())?;
    }
    if emails.is_empty() {
        info!(workitem = workitem_url, "no subscribers requested to {}", op.verb());
        return Ok(MutationOutcome::default());
    }

    let people = emails
        .iter()
        .map(|email| service.resolve_person(email.as_ref()))
        .collect::<Result<Vec<Member>>>()?;

    let url = subscribers_url(workitem_url);
    let headers = rdf_headers(&service.default_headers());
    let Snapshot { mut document, etag } = fetch(service, &url, &headers)?;

    let outcome = {
        let description = get_map_mut(&mut document, &DESCRIPTION_PATH)
            .ok_or_else(|| RtcError::malformed(&url, "missing rdf:RDF/rdf:Description"))?;
        let mut members = collection::normalize(description.get(SUBSCRIBERS))?;
        let outcome = apply(op, &mut members, people, workitem_url);
        if !outcome.is_noop() {
            collection::store(description, SUBSCRIBERS, members);
        }
        outcome
    };

    if outcome.is_noop() {
        info!(
            workitem = workitem_url,
            "every requested subscriber is already in place; skipping {} write",
            op.verb()
        );
        return Ok(outcome);
    }

    ensure_namespace(&mut document, "rtc_cm", NS_RTC_CM);
    let body = xml::serialize(&document)?;
    let write_headers = conditional_headers(&headers, etag.as_deref(), &url);
    service.send(Request::put(url, write_headers, body))?;

    let emails: Vec<&str> = outcome.changed.iter().map(|m| m.email.as_str()).collect();
    info!(
        workitem = workitem_url,
        ?emails,
        "successfully {} subscribers",
        match op {
            Op::Add => "added",
            Op::Remove => "removed",
        }
    );
    Ok(MutationOutcome {
        written: true,
        ..outcome
    })
}

/// Scan and mutate `members` for each requested person, in order.
///
/// The scan for a person sees the effect of every person before it, so
/// duplicates in the request are harmless: the second occurrence is a no-op.
fn apply(op: Op, members: &mut Vec<Map>, people: Vec<Member>, workitem_url: &str) -> MutationOutcome {
    let mut outcome = MutationOutcome::default();
    for person in people {
        match decide(op, members, &person.url) {
            Decision::Append => {
                members.push(member_ref(&person.url));
                outcome.changed.push(person);
            }
            Decision::Delete(index) => {
                members.remove(index);
                outcome.changed.push(person);
            }
            Decision::Keep => {
                match op {
                    Op::Add => info!(
                        workitem = workitem_url,
                        email = %person.email,
                        "subscriber has already been added; no need to re-add"
                    ),
                    Op::Remove => info!(
                        workitem = workitem_url,
                        email = %person.email,
                        "subscriber has not been added; no need to unsubscribe"
                    ),
                }
                outcome.unchanged.push(person);
            }
        }
    }
    outcome
}
