//! Accept header parsing and ranking.
//!
//! Entries are ranked by descending quality; at equal quality a concrete type beats
//! `*`, and at equal type wildcardness a concrete subtype beats `*`. The first available
//! type matched by the highest ranked entry wins.

use std::cmp::Ordering;

/// Wildcard for either half of a media range.
pub const ANY: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    /// The Accept header could not be parsed (client error, 400).
    #[error("bad accept header: {0}")]
    BadRequest(String),
    /// No acceptable representation is available (406).
    #[error("no acceptable media type")]
    NotAcceptable,
}

/// One comma separated segment of an Accept header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptEntry {
    pub kind: String,
    pub subtype: String,
    pub quality: f64,
}

impl AcceptEntry {
    fn matches(&self, kind: &str, subtype: &str) -> bool {
        (self.kind == ANY || self.kind == kind) && (self.subtype == ANY || self.subtype == subtype)
    }

    fn rank(&self, other: &Self) -> Ordering {
        other
            .quality
            .total_cmp(&self.quality)
            .then_with(|| (self.kind == ANY).cmp(&(other.kind == ANY)))
            .then_with(|| (self.subtype == ANY).cmp(&(other.subtype == ANY)))
    }
}

/// Parse an Accept header into its entries, in header order.
pub fn parse_accept(accept: &str) -> Result<Vec<AcceptEntry>, MediaError> {
    accept.split(',').map(parse_entry).collect()
}

fn parse_entry(part: &str) -> Result<AcceptEntry, MediaError> {
    let part = part.trim();
    let (range, quality) = match part.split_once(';') {
        None => (part, 1.0),
        Some((range, param)) => (range.trim(), parse_quality(param.trim())?),
    };
    let (kind, subtype) = range
        .split_once('/')
        .ok_or_else(|| MediaError::BadRequest(format!("missing '/' in {:?}", range)))?;
    if subtype.contains('/') {
        return Err(MediaError::BadRequest(format!(
            "more than one '/' in {:?}",
            range
        )));
    }
    let (kind, subtype) = (kind.trim(), subtype.trim());
    if kind.is_empty() || subtype.is_empty() {
        return Err(MediaError::BadRequest(format!("empty media range {:?}", range)));
    }
    Ok(AcceptEntry {
        kind: kind.to_string(),
        subtype: subtype.to_string(),
        quality,
    })
}

fn parse_quality(param: &str) -> Result<f64, MediaError> {
    let value = param
        .strip_prefix("q=")
        .ok_or_else(|| MediaError::BadRequest(format!("unsupported parameter {:?}", param)))?;
    let q: f64 = value
        .trim()
        .parse()
        .map_err(|_| MediaError::BadRequest(format!("bad quality {:?}", value)))?;
    if !(0.0..=1.0).contains(&q) {
        return Err(MediaError::BadRequest(format!("quality out of range {:?}", value)));
    }
    Ok(q)
}

/// Select a media type from `available` (most preferred first) for the given Accept
/// header. A missing header accepts anything.
pub fn choose<'a, S: AsRef<str>>(
    accept: Option<&str>,
    available: &'a [S],
) -> Result<&'a str, MediaError> {
    let mut entries = parse_accept(accept.unwrap_or("*/*"))?;
    // stable: equally ranked entries keep header order
    entries.sort_by(|a, b| a.rank(b));

    for entry in &entries {
        for candidate in available {
            let candidate = candidate.as_ref();
            let (kind, subtype) = candidate.split_once('/').unwrap_or((candidate, ""));
            if entry.matches(kind, subtype) {
                return Ok(candidate);
            }
        }
    }
    Err(MediaError::NotAcceptable)
}
