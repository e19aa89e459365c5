//! OSLC-CM vocabulary used by the work-item layer.

use crate::xml::{Map, Value};

pub const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const NS_RTC_EXT: &str = "http://jazz.net/xmlns/prod/jazz/rtc/ext/1.0/";
pub const NS_RTC_CM: &str = "http://jazz.net/xmlns/prod/jazz/rtc/cm/1.0/";
pub const NS_OSLC_CM: &str = "http://open-services.net/ns/cm#";
pub const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
pub const NS_OSLC_CMX: &str = "http://open-services.net/ns/cm-x#";
pub const NS_OSLC: &str = "http://open-services.net/ns/core#";

pub const RDF_ROOT: &str = "rdf:RDF";
pub const DESCRIPTION: &str = "rdf:Description";
pub const SUBSCRIBERS: &str = "rtc_cm:subscribers";
pub const STATE: &str = "rtc_cm:state";
pub const CONTEXT_ID: &str = "rtc_cm:contextId";

pub const COLLECTION: &str = "oslc_cm:Collection";
pub const TOTAL_COUNT: &str = "@oslc_cm:totalCount";
pub const NEXT_PAGE: &str = "@oslc_cm:next";

pub const COMMENT_TYPE: &str = "http://open-services.net/ns/core#Comment";

/// Path from the document root to the resource description.
pub const DESCRIPTION_PATH: [&str; 2] = [RDF_ROOT, DESCRIPTION];

/// Declare `xmlns:<prefix>` on the `rdf:RDF` root unless already present.
pub fn ensure_namespace(document: &mut Map, prefix: &str, uri: &str) {
    if let Some(root) = document.get_mut(RDF_ROOT).and_then(Value::as_map_mut) {
        let key = format!("@xmlns:{prefix}");
        if !root.contains_key(&key) {
            let position = root.keys().take_while(|k| k.starts_with("@xmlns:")).count();
            root.shift_insert(position, key, Value::Text(uri.to_string()));
        }
    }
}

/// Remove and return the resource description of an RDF document.
///
/// Accepts both `rdf:RDF/rdf:Description` and a bare `rdf:Description` root.
#[must_use]
pub fn take_description(mut document: Map) -> Option<Map> {
    if let Some(Value::Map(mut root)) = document.shift_remove(RDF_ROOT) {
        return match root.shift_remove(DESCRIPTION) {
            Some(Value::Map(description)) => Some(description),
            _ => None,
        };
    }
    match document.shift_remove(DESCRIPTION) {
        Some(Value::Map(description)) => Some(description),
        _ => None,
    }
}
