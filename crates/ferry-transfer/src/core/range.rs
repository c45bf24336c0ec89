use crate::data::{RangeRequest, RangeSpec, ResponsePlan};

/// Parse a `Range` header value holding a single `bytes=` expression.
///
/// Returns `None` for anything that should be served as full content
/// instead: other units, multiple ranges, malformed numbers and `end < start`.
pub fn parse_range(header: &str) -> Option<RangeRequest> {
    let (unit, set) = header.trim().split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return None;
    }
    if set.contains(',') {
        return None;
    }

    let (first, last) = set.trim().split_once('-')?;
    let (first, last) = (first.trim(), last.trim());

    match (first.is_empty(), last.is_empty()) {
        (true, true) => None,
        (true, false) => Some(RangeRequest::Suffix { len: parse_offset(last)? }),
        (false, true) => Some(RangeRequest::From { start: parse_offset(first)? }),
        (false, false) => {
            let start = parse_offset(first)?;
            let end = parse_offset(last)?;
            (end >= start).then_some(RangeRequest::Bounded { start, end })
        }
    }
}

/// Digits only; `u64::from_str` would also accept a leading `+`.
fn parse_offset(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Decide what to send for content of `total` bytes.
pub fn plan_response(request: Option<RangeRequest>, total: u64) -> ResponsePlan {
    let Some(request) = request else {
        return ResponsePlan::Full { total };
    };
    let Some(last) = total.checked_sub(1) else {
        return ResponsePlan::Unsatisfiable { total };
    };

    let bounds = match request {
        RangeRequest::Bounded { start, end } => (start <= last).then(|| (start, end.min(last))),
        RangeRequest::From { start } => (start <= last).then_some((start, last)),
        RangeRequest::Suffix { len: 0 } => None,
        RangeRequest::Suffix { len } => Some((total.saturating_sub(len), last)),
    };

    match bounds.and_then(|(start, end)| RangeSpec::new(start, end, total)) {
        Some(spec) => ResponsePlan::Partial(spec),
        None => ResponsePlan::Unsatisfiable { total },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(start: u64, end: u64, total: u64) -> ResponsePlan {
        ResponsePlan::Partial(RangeSpec::new(start, end, total).unwrap())
    }

    #[test]
    fn parses_the_three_forms() {
        assert_eq!(parse_range("bytes=0-499"), Some(RangeRequest::Bounded { start: 0, end: 499 }));
        assert_eq!(parse_range("bytes=500-"), Some(RangeRequest::From { start: 500 }));
        assert_eq!(parse_range("bytes=-200"), Some(RangeRequest::Suffix { len: 200 }));
    }

    #[test]
    fn unit_is_case_insensitive_and_whitespace_tolerant() {
        assert_eq!(
            parse_range("  Bytes = 10 - 20 "),
            Some(RangeRequest::Bounded { start: 10, end: 20 })
        );
        assert_eq!(parse_range("BYTES=5-"), Some(RangeRequest::From { start: 5 }));
    }

    #[test]
    fn degrades_on_unsupported_or_malformed_input() {
        for header in [
            "",
            "bytes",
            "bytes=",
            "bytes=-",
            "items=0-5",
            "bytes=0-5,10-15",
            "bytes=abc-def",
            "bytes=+5-10",
            "bytes=10-5",
            "bytes=99999999999999999999-",
            "bytes=1-2-3",
        ] {
            assert_eq!(parse_range(header), None, "{header:?}");
        }
    }

    #[test]
    fn plans_full_without_range() {
        assert_eq!(plan_response(None, 1000), ResponsePlan::Full { total: 1000 });
        assert_eq!(plan_response(None, 0), ResponsePlan::Full { total: 0 });
    }

    #[test]
    fn clamps_and_resolves_ranges() {
        let plan = |h: &str| plan_response(parse_range(h), 1000);

        assert_eq!(plan("bytes=0-"), partial(0, 999, 1000));
        assert_eq!(plan("bytes=0-499"), partial(0, 499, 1000));
        assert_eq!(plan("bytes=900-5000"), partial(900, 999, 1000));
        assert_eq!(plan("bytes=-100"), partial(900, 999, 1000));
        assert_eq!(plan("bytes=-5000"), partial(0, 999, 1000));
        assert_eq!(plan("bytes=999-999"), partial(999, 999, 1000));
    }

    #[test]
    fn unsatisfiable_ranges() {
        let plan = |h: &str| plan_response(parse_range(h), 1000);

        assert_eq!(plan("bytes=1000-"), ResponsePlan::Unsatisfiable { total: 1000 });
        assert_eq!(plan("bytes=1000-2000"), ResponsePlan::Unsatisfiable { total: 1000 });
        assert_eq!(plan("bytes=-0"), ResponsePlan::Unsatisfiable { total: 1000 });
        assert_eq!(
            plan_response(parse_range("bytes=0-"), 0),
            ResponsePlan::Unsatisfiable { total: 0 }
        );
    }

    #[test]
    fn multi_range_is_served_whole() {
        assert_eq!(
            plan_response(parse_range("bytes=0-1,5-6"), 1000),
            ResponsePlan::Full { total: 1000 }
        );
    }
}
