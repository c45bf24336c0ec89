/// A parsed `Range: bytes=...` expression, before it is checked against
/// the size of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// `bytes=a-b`, both inclusive.
    Bounded { start: u64, end: u64 },
    /// `bytes=a-`, from `a` to the end.
    From { start: u64 },
    /// `bytes=-n`, the last `n` bytes.
    Suffix { len: u64 },
}

/// A satisfiable byte range of a resource of `total` bytes.
///
/// Always `start <= end < total`, so a range is never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    start: u64,
    end:   u64,
    total: u64,
}

impl RangeSpec {
    /// Returns `None` unless `start <= end < total`.
    pub fn new(start: u64, end: u64, total: u64) -> Option<Self> {
        (start <= end && end < total).then_some(Self { start, end, total })
    }

    pub fn start(&self) -> u64 { self.start }

    /// Last byte offset, inclusive.
    pub fn end(&self) -> u64 { self.end }

    pub fn total(&self) -> u64 { self.total }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 { self.end - self.start + 1 }

    /// The `Content-Range` value for a 206 response.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }

    /// The `Content-Range` value for a 416 response.
    pub fn unsatisfied(total: u64) -> String { format!("bytes */{total}") }
}

/// What the download responder will send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePlan {
    /// 200 with the whole content.
    Full { total: u64 },
    /// 206 with one range.
    Partial(RangeSpec),
    /// 416, no body.
    Unsatisfiable { total: u64 },
}

impl ResponsePlan {
    /// Offset of the first byte to send and how many bytes follow.
    pub fn window(&self) -> Option<(u64, u64)> {
        match self {
            ResponsePlan::Full { total } => Some((0, *total)),
            ResponsePlan::Partial(spec) => Some((spec.start(), spec.len())),
            ResponsePlan::Unsatisfiable { .. } => None,
        }
    }

    pub fn is_partial(&self) -> bool { matches!(self, ResponsePlan::Partial(_)) }
}
