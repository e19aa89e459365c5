use proptest::prelude::*;
use rtc_core::collection::{denormalize, member_ref, member_url, normalize, store};
use rtc_core::mutation::comment::comment_payload;
use rtc_core::xml::{Map, Value, get_path, map_of, parse, serialize};

fn arb_members() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("https://jazz\\.example/jts/users/[a-z0-9._%]{1,12}", 0..6)
}

fn document_with(urls: &[String]) -> Map {
    let mut description = map_of([("@rdf:about", "https://jazz.example/ccm/oslc/workitems/1")]);
    store(
        &mut description,
        "rtc_cm:subscribers",
        urls.iter().map(|url| member_ref(url)).collect(),
    );
    map_of([(
        "rdf:RDF",
        Value::Map(map_of([
            ("@xmlns:rdf", Value::from("http://www.w3.org/1999/02/22-rdf-syntax-ns#")),
            ("@xmlns:rtc_cm", Value::from("http://jazz.net/xmlns/prod/jazz/rtc/cm/1.0/")),
            ("rdf:Description", Value::Map(description)),
        ])),
    )])
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    /// Members survive normalize → denormalize → XML → parse → normalize in order.
    #[test]
    fn collection_round_trips_through_xml(urls in arb_members()) {
        let bytes = serialize(&document_with(&urls)).expect("serialize");
        let parsed = parse(&bytes).expect("parse");

        let raw = get_path(&parsed, &["rdf:RDF", "rdf:Description", "rtc_cm:subscribers"]);
        let members = normalize(raw).expect("normalize");
        let read: Vec<String> = members
            .iter()
            .filter_map(member_url)
            .map(str::to_string)
            .collect();
        prop_assert_eq!(read, urls);
    }

    /// Wire shape depends only on the member count.
    #[test]
    fn denormalized_shape_follows_count(urls in arb_members()) {
        let members: Vec<Map> = urls.iter().map(|url| member_ref(url)).collect();
        match (urls.len(), denormalize(members.clone())) {
            (0, None) => {}
            (1, Some(Value::Map(member))) => prop_assert_eq!(&member, &members[0]),
            (n, Some(Value::List(items))) if n >= 2 => prop_assert_eq!(items.len(), n),
            (n, shape) => prop_assert!(false, "{} members gave {:?}", n, shape),
        }
    }

    /// normalize(denormalize(xs)) == xs for every sequence.
    #[test]
    fn normalize_inverts_denormalize(urls in arb_members()) {
        let members: Vec<Map> = urls.iter().map(|url| member_ref(url)).collect();
        let wire = denormalize(members.clone());
        prop_assert_eq!(normalize(wire.as_ref()).expect("normalize"), members);
    }

    /// Comment text with markup is carried as text, never as structure, and
    /// keeps its surrounding whitespace.
    #[test]
    fn comment_text_survives_serialization(message in "[ \n\ta-zA-Z0-9<>&\"'/=]{1,40}") {
        let bytes = serialize(&comment_payload("https://h/c/0", &message)).expect("serialize");
        let parsed = parse(&bytes).expect("parse");

        let description = get_path(&parsed, &["rdf:RDF", "rdf:Description"])
            .and_then(Value::as_map)
            .expect("description");
        prop_assert_eq!(description.len(), 3);
        prop_assert_eq!(
            description.get("dcterms:description").and_then(Value::plain_text),
            Some(message)
        );
    }
}
