//! Timezone normalization.
//!
//! One raw exiftool timestamp becomes up to three renders: a naive render
//! (always, when it parses at all), plus a zone-qualified local render and a
//! UTC instant when an offset is actually known. The offset determination
//! hierarchy: embedded in the value itself, then offset-bearing metadata
//! tags, then an optional assumed default zone. An assumed zone is marked as
//! such and never produces a UTC instant: without calendar-aware DST rules
//! the conversion could land on the wrong instant, so the field stays empty.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::record::{MediaRecord, NormalizedTime};

/// Accepted exiftool layouts: colon- or dash-delimited date, optional
/// numeric offset suffix.
const AWARE_PATTERNS: &[&str] = &["%Y:%m:%d %H:%M:%S%z", "%Y-%m-%d %H:%M:%S%z"];
const NAIVE_PATTERNS: &[&str] = &["%Y:%m:%d %H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Offset-bearing metadata tags, highest priority first.
const OFFSET_TAGS: &[&str] = &["OffsetTimeOriginal", "OffsetTime", "TimeZone", "TimeZoneOffset"];

const NAIVE_ISO: &str = "%Y-%m-%dT%H:%M:%S";
const LOCAL_ISO: &str = "%Y-%m-%dT%H:%M:%S%:z";
const UTC_ISO: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Matches a trailing numeric offset in either spelling: "+02:00" or "+0200".
static TZ_OFFSET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([+-]\d{2}):?(\d{2})$").unwrap());

#[derive(Debug, Clone)]
pub struct TimezoneOptions {
    /// Zone label applied when `assume_if_missing` is set and no offset was
    /// found anywhere.
    pub default_tz: String,
    /// When false, no timezone is ever guessed (court mode).
    pub assume_if_missing: bool,
}

impl Default for TimezoneOptions {
    fn default() -> Self {
        Self {
            default_tz: "Europe/Berlin".to_string(),
            assume_if_missing: true,
        }
    }
}

/// A parsed timestamp that either carried its own offset or did not.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ParsedStamp {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl ParsedStamp {
    /// The local clock reading, with any offset discarded.
    pub(crate) fn naive_local(&self) -> NaiveDateTime {
        match self {
            ParsedStamp::Aware(dt) => dt.naive_local(),
            ParsedStamp::Naive(dt) => *dt,
        }
    }
}

/// Parse a raw exiftool timestamp against the accepted pattern set.
pub(crate) fn parse_exif_datetime(raw: &str) -> Option<ParsedStamp> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // GPS times end in a literal "Z"; rewrite it to an explicit zero offset.
    let mut normalized = trimmed.to_string();
    if normalized.ends_with('Z') {
        normalized.pop();
        normalized.push_str("+0000");
    }

    // Rewrite a trailing "+02:00" to "+0200" so both offset spellings hit
    // the same %z patterns.
    let rewritten = TZ_OFFSET_RE.captures(&normalized).map(|caps| {
        let span = caps.get(0).expect("capture 0 always present");
        format!("{}{}{}", &normalized[..span.start()], &caps[1], &caps[2])
    });
    if let Some(rewritten) = rewritten {
        normalized = rewritten;
    }

    for pattern in AWARE_PATTERNS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, pattern) {
            return Some(ParsedStamp::Aware(dt));
        }
    }
    for pattern in NAIVE_PATTERNS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, pattern) {
            return Some(ParsedStamp::Naive(dt));
        }
    }
    None
}

/// Parse "+02:00", "+0200", or "+02" into an explicit offset plus its
/// normalized spelling. Anything without a leading sign or with non-numeric
/// content is rejected.
fn parse_numeric_offset(raw: &str) -> Option<(FixedOffset, String)> {
    let trimmed = raw.trim();
    let normalized = match TZ_OFFSET_RE.captures(trimmed) {
        Some(caps) => format!("{}{}", &caps[1], &caps[2]),
        None => trimmed.replace(':', ""),
    };

    let (sign, digits) = if let Some(rest) = normalized.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = normalized.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..digits.len().min(2)].parse().ok()?;
    let minutes: i32 = if digits.len() >= 4 {
        digits[2..4].parse().ok()?
    } else {
        0
    };
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
    Some((offset, normalized))
}

/// First populated offset tag, parsed. Only the highest-priority populated
/// tag is considered; if it does not parse, no other tag is consulted.
fn metadata_offset(record: &MediaRecord) -> Option<(FixedOffset, String)> {
    let raw = OFFSET_TAGS.iter().find_map(|tag| record.raw_field(tag))?;
    parse_numeric_offset(raw)
}

/// Normalize one raw timestamp against a record's offset metadata.
///
/// Never fails: an unparsable value yields the all-empty sentinel, and a
/// missing offset degrades to a naive-only result (court mode) or an
/// explicitly marked assumption.
pub fn normalize_time(
    raw: &str,
    record: &MediaRecord,
    options: &TimezoneOptions,
) -> NormalizedTime {
    let parsed = match parse_exif_datetime(raw) {
        Some(parsed) => parsed,
        None => return NormalizedTime::unparsed(),
    };

    match parsed {
        ParsedStamp::Aware(dt) => NormalizedTime {
            naive_iso: dt.naive_local().format(NAIVE_ISO).to_string(),
            local_iso: dt.format(LOCAL_ISO).to_string(),
            utc_iso: dt.with_timezone(&Utc).format(UTC_ISO).to_string(),
            tz_info: "embedded".to_string(),
            tz_assumed: false,
        },
        ParsedStamp::Naive(naive) => {
            let naive_iso = naive.format(NAIVE_ISO).to_string();

            if let Some((offset, tz_info)) = metadata_offset(record) {
                // FixedOffset attachment is always unambiguous.
                if let Some(local) = naive.and_local_timezone(offset).single() {
                    return NormalizedTime {
                        naive_iso,
                        local_iso: local.format(LOCAL_ISO).to_string(),
                        utc_iso: local.with_timezone(&Utc).format(UTC_ISO).to_string(),
                        tz_info,
                        tz_assumed: false,
                    };
                }
            }

            if !options.assume_if_missing {
                return NormalizedTime {
                    naive_iso,
                    local_iso: String::new(),
                    utc_iso: String::new(),
                    tz_info: "unknown".to_string(),
                    tz_assumed: false,
                };
            }

            NormalizedTime {
                local_iso: naive_iso.clone(),
                naive_iso,
                utc_iso: String::new(),
                tz_info: format!("assumed:{}", options.default_tz),
                tz_assumed: true,
            }
        }
    }
}
