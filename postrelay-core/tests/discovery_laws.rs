use postrelay_core::{
    extract_id, is_newer, parse_timestamp, Candidate, CandidateFilter, FilterInput, SequenceId,
};

fn post(id: &str, text: &str) -> Candidate {
    Candidate::new(format!("https://x.com/target/status/{}", id), text)
}

#[test]
fn monotonic_ordering_matches_integer_order_past_u64() {
    let pairs = [
        ("18446744073709551616", "18446744073709551615"), // 2^64 vs 2^64 - 1
        ("9007199254740993", "9007199254740992"),
        ("1000", "999"),
        ("1", "0"),
    ];
    for (bigger, smaller) in pairs {
        let a = SequenceId::parse(bigger).unwrap();
        let b = SequenceId::parse(smaller).unwrap();
        assert!(is_newer(&a, Some(&b)), "{} should be newer than {}", bigger, smaller);
        assert!(!is_newer(&b, Some(&a)));
        assert!(!is_newer(&a, Some(&a)));
    }
}

#[test]
fn candidates_without_an_id_never_survive_filtering() {
    let candidates = vec![
        Candidate {
            permalink: None,
            body_text: "Newest and matching".to_string(),
            timestamp: Some("2024-05-01T21:00:00Z".to_string()),
        },
        Candidate::new("https://x.com/target/photo", "matching"),
    ];
    assert!(extract_id(candidates[1].permalink.as_deref()).is_none());

    let input = FilterInput {
        last_seen: None,
        require_window: false,
        reference: parse_timestamp("2024-05-01T22:00:00Z").unwrap(),
    };
    let filter = CandidateFilter::default();
    assert!(filter.filter(&candidates, &input).is_empty());
    assert!(filter.scan_until_seen(&candidates, &input).is_none());
}

#[test]
fn pinned_newest_matching_post_is_still_excluded() {
    let candidates = vec![
        post("900", "Pinned\nlive tonight").with_timestamp("2024-05-01T21:00:00Z"),
        post("800", "固定\nlive tonight").with_timestamp("2024-05-01T21:00:00Z"),
    ];
    let input = FilterInput {
        last_seen: None,
        require_window: true,
        reference: parse_timestamp("2024-05-01T22:00:00Z").unwrap(),
    };
    assert!(CandidateFilter::default().filter(&candidates, &input).is_empty());
}
