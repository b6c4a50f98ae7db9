//! Property tests for the native format codec.
//!
//! Any valid format, parsed and re-serialized, parses back to the same
//! kind/direction/size triples.

use proptest::prelude::*;
use sampbridge_primitives::format::{parse, to_format_string};

/// One valid descriptor in its textual form.
fn descriptor_text() -> impl Strategy<Value = String> {
    let size = prop_oneof![
        (0usize..10_000).prop_map(|n| format!("[{}]", n)),
        (1usize..33).prop_map(|k| format!("[*{}]", k)),
    ];
    prop_oneof![
        prop::sample::select(vec!["i", "d", "b", "f", "r", "R", "s"]).prop_map(String::from),
        size.clone().prop_map(|s| format!("s{}", s)),
        (prop::sample::select(vec!['S', 'a', 'A']), size)
            .prop_map(|(letter, s)| format!("{}{}", letter, s)),
    ]
}

fn format_text() -> impl Strategy<Value = String> {
    prop::collection::vec(descriptor_text(), 0..16).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn parse_serialize_parse_is_stable(spec in format_text()) {
        let first = parse(&spec).unwrap();
        let text = to_format_string(&first);
        let second = parse(&text).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn canonical_text_is_a_fixed_point(spec in format_text()) {
        let canonical = to_format_string(&parse(&spec).unwrap());
        let again = to_format_string(&parse(&canonical).unwrap());
        prop_assert_eq!(canonical, again);
    }

    #[test]
    fn descriptor_count_matches_letters(parts in prop::collection::vec(descriptor_text(), 0..16)) {
        let descs = parse(&parts.concat()).unwrap();
        prop_assert_eq!(descs.len(), parts.len());
    }

    #[test]
    fn arbitrary_text_never_panics(spec in "\\PC{0,24}") {
        let _ = parse(&spec);
    }
}
