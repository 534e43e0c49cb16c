//! Range header parsing (RFC 7233, single `bytes` range only).

/// A parsed byte range. `end == None` means "through end of file".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: usize,
    pub end: Option<usize>,
}

impl RangeRequest {
    /// Inclusive end position for a file of `file_size` bytes.
    #[inline]
    #[must_use]
    pub fn end_position(&self, file_size: usize) -> usize {
        self.end.unwrap_or_else(|| file_size.saturating_sub(1))
    }
}

/// Outcome of parsing a Range header.
#[derive(Debug)]
pub enum RangeParseResult {
    Valid(RangeRequest),
    /// Start lies beyond the file; respond 416.
    NotSatisfiable,
    /// Absent, malformed, multi-range, or non-bytes unit; serve the full body.
    None,
}

/// Parse a Range header against a file of `file_size` bytes. Accepted forms:
/// `bytes=a-b`, `bytes=a-`, `bytes=-n` (last `n` bytes).
#[must_use]
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };
    // Multi-range is not supported; fall back to the full body.
    if spec.contains(',') {
        return RangeParseResult::None;
    }
    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return parse_suffix(end_str, file_size);
    }

    let Ok(start) = start_str.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        None
    } else {
        match end_str.parse::<usize>() {
            // Ends past the file are clamped, not rejected.
            Ok(e) => Some(e.min(file_size - 1)),
            Err(_) => return RangeParseResult::None,
        }
    };
    if end.is_some_and(|e| start > e) {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(RangeRequest { start, end })
}

/// `bytes=-n`: the last `n` bytes of the file.
fn parse_suffix(suffix_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if suffix == 0 || file_size == 0 {
        return RangeParseResult::NotSatisfiable;
    }
    RangeParseResult::Valid(RangeRequest {
        start: file_size.saturating_sub(suffix),
        end: Some(file_size.saturating_sub(1)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(header: &str, file_size: usize) -> RangeRequest {
        match parse_range_header(Some(header), file_size) {
            RangeParseResult::Valid(r) => r,
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn absent_header() {
        assert!(matches!(
            parse_range_header(None, 100),
            RangeParseResult::None
        ));
    }

    #[test]
    fn standard_range() {
        let r = valid("bytes=0-9", 100);
        assert_eq!((r.start, r.end), (0, Some(9)));
    }

    #[test]
    fn open_ended_range() {
        let r = valid("bytes=50-", 100);
        assert_eq!(r.start, 50);
        assert_eq!(r.end_position(100), 99);
    }

    #[test]
    fn suffix_range() {
        let r = valid("bytes=-20", 100);
        assert_eq!((r.start, r.end), (80, Some(99)));
        // Suffix larger than the file covers the whole file.
        let r = valid("bytes=-500", 100);
        assert_eq!((r.start, r.end), (0, Some(99)));
    }

    #[test]
    fn end_is_clamped_to_file_size() {
        let r = valid("bytes=10-5000", 100);
        assert_eq!((r.start, r.end), (10, Some(99)));
    }

    #[test]
    fn unsatisfiable_start() {
        assert!(matches!(
            parse_range_header(Some("bytes=200-"), 100),
            RangeParseResult::NotSatisfiable
        ));
        assert!(matches!(
            parse_range_header(Some("bytes=-0"), 100),
            RangeParseResult::NotSatisfiable
        ));
    }

    #[test]
    fn malformed_and_multi_range_fall_back_to_full() {
        assert!(matches!(
            parse_range_header(Some("bytes=a-b"), 100),
            RangeParseResult::None
        ));
        assert!(matches!(
            parse_range_header(Some("bytes=0-9,20-29"), 100),
            RangeParseResult::None
        ));
        assert!(matches!(
            parse_range_header(Some("items=0-9"), 100),
            RangeParseResult::None
        ));
    }
}
