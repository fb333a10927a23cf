//! Named string formats
//!
//! A format is a name plus a check function. Regex-backed formats compile
//! once on first use; a regex that fails to compile makes its format reject
//! every value instead of panicking.

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*\.[a-zA-Z]{2,}$")
});

static URL_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://[^\s/?#]+(?:/[^\s?#]*)?(?:\?[^\s#]*)?(?:#\S*)?$")
});

static URI_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:\S*$"));

static UUID_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
});

/// Compiled-size budget for patterns supplied as data
const REGEX_FORMAT_SIZE_LIMIT: usize = 256 * 1024;

static BASE64_PATTERN: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$")
});

fn regex_matches(pattern: &LazyLock<Result<Regex, regex::Error>>, value: &str) -> bool {
    pattern.as_ref().is_ok_and(|regex| regex.is_match(value))
}

fn is_email(value: &str) -> bool {
    regex_matches(&EMAIL_PATTERN, value)
}

fn is_url(value: &str) -> bool {
    regex_matches(&URL_PATTERN, value)
}

fn is_uri(value: &str) -> bool {
    regex_matches(&URI_PATTERN, value)
}

fn is_uuid(value: &str) -> bool {
    regex_matches(&UUID_PATTERN, value)
}

fn is_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn is_time(value: &str) -> bool {
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f").is_ok()
}

fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

fn is_ipv4(value: &str) -> bool {
    value.parse::<Ipv4Addr>().is_ok()
}

fn is_ipv6(value: &str) -> bool {
    value.parse::<Ipv6Addr>().is_ok()
}

fn is_hostname(value: &str) -> bool {
    let value = value.strip_suffix('.').unwrap_or(value);
    !value.is_empty()
        && value.len() <= 253
        && value.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

fn is_json_pointer(value: &str) -> bool {
    if value.is_empty() {
        return true;
    }
    if !value.starts_with('/') {
        return false;
    }
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0' | '1')) {
            return false;
        }
    }
    true
}

fn is_relative_json_pointer(value: &str) -> bool {
    let digits = value.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || (digits > 1 && value.starts_with('0')) {
        return false;
    }
    let rest = &value[digits..];
    rest == "#" || is_json_pointer(rest)
}

// Input values never enter the shared pattern cache
fn is_regex(value: &str) -> bool {
    RegexBuilder::new(value)
        .size_limit(REGEX_FORMAT_SIZE_LIMIT)
        .build()
        .is_ok()
}

fn is_base64(value: &str) -> bool {
    value.len() % 4 == 0 && regex_matches(&BASE64_PATTERN, value)
}

fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A named string format
#[derive(Clone, Copy)]
pub struct NamedFormat {
    name: &'static str,
    check: fn(&str) -> bool,
}

impl NamedFormat {
    /// Format name as used in `format(..)` and on the wire
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Test a string
    #[must_use]
    pub fn check(&self, value: &str) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for NamedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamedFormat({})", self.name)
    }
}

pub const EMAIL: NamedFormat = NamedFormat { name: "email", check: is_email };
pub const URL: NamedFormat = NamedFormat { name: "url", check: is_url };
pub const URI: NamedFormat = NamedFormat { name: "uri", check: is_uri };
pub const UUID: NamedFormat = NamedFormat { name: "uuid", check: is_uuid };
pub const DATE: NamedFormat = NamedFormat { name: "date", check: is_date };
pub const TIME: NamedFormat = NamedFormat { name: "time", check: is_time };
pub const DATE_TIME: NamedFormat = NamedFormat { name: "date-time", check: is_date_time };
pub const IPV4: NamedFormat = NamedFormat { name: "ipv4", check: is_ipv4 };
pub const IPV6: NamedFormat = NamedFormat { name: "ipv6", check: is_ipv6 };
pub const HOSTNAME: NamedFormat = NamedFormat { name: "hostname", check: is_hostname };
pub const JSON_POINTER: NamedFormat = NamedFormat { name: "json-pointer", check: is_json_pointer };
pub const RELATIVE_JSON_POINTER: NamedFormat = NamedFormat {
    name: "relative-json-pointer",
    check: is_relative_json_pointer,
};
pub const REGEX: NamedFormat = NamedFormat { name: "regex", check: is_regex };
pub const BASE64: NamedFormat = NamedFormat { name: "base64", check: is_base64 };
pub const HEX: NamedFormat = NamedFormat { name: "hex", check: is_hex };

const BUILTIN: [NamedFormat; 15] = [
    EMAIL,
    URL,
    URI,
    UUID,
    DATE,
    TIME,
    DATE_TIME,
    IPV4,
    IPV6,
    HOSTNAME,
    JSON_POINTER,
    RELATIVE_JSON_POINTER,
    REGEX,
    BASE64,
    HEX,
];

/// Built-in format by name
#[must_use]
pub fn lookup(name: &str) -> Option<NamedFormat> {
    BUILTIN.iter().find(|format| format.name == name).copied()
}

/// Names of every built-in format
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTIN.iter().map(NamedFormat::name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(name: &str, value: &str) -> bool {
        lookup(name).is_some_and(|format| format.check(value))
    }

    #[test]
    fn test_all_builtins_resolve() {
        for name in names() {
            assert!(lookup(name).is_some(), "missing format {name}");
        }
        assert!(lookup("postcode").is_none());
    }

    #[test]
    fn test_email_and_urls() {
        assert!(check("email", "ada@example.com"));
        assert!(!check("email", "ada@"));
        assert!(!check("email", "not an email"));
        assert!(check("url", "https://example.com/path?q=1#frag"));
        assert!(!check("url", "example.com"));
        assert!(check("uri", "urn:isbn:0451450523"));
        assert!(!check("uri", "no scheme"));
    }

    #[test]
    fn test_dates_and_times() {
        assert!(check("date", "2024-02-29"));
        assert!(!check("date", "2023-02-29"));
        assert!(check("time", "13:45:00"));
        assert!(check("time", "13:45:00.250"));
        assert!(!check("time", "25:00:00"));
        assert!(check("date-time", "2024-01-15T10:30:00Z"));
        assert!(check("date-time", "2024-01-15T10:30:00.5+02:00"));
        assert!(!check("date-time", "2024-01-15 10:30"));
    }

    #[test]
    fn test_network_formats() {
        assert!(check("ipv4", "192.168.0.1"));
        assert!(!check("ipv4", "256.1.1.1"));
        assert!(check("ipv6", "::1"));
        assert!(!check("ipv6", "192.168.0.1"));
        assert!(check("hostname", "api.example.com"));
        assert!(!check("hostname", "-bad.example.com"));
        assert!(!check("hostname", "under_score.com"));
    }

    #[test]
    fn test_pointers() {
        assert!(check("json-pointer", ""));
        assert!(check("json-pointer", "/a~1b/0"));
        assert!(!check("json-pointer", "a/b"));
        assert!(!check("json-pointer", "/a~2"));
        assert!(check("relative-json-pointer", "0#"));
        assert!(check("relative-json-pointer", "1/foo"));
        assert!(!check("relative-json-pointer", "01/foo"));
        assert!(!check("relative-json-pointer", "/foo"));
    }

    #[test]
    fn test_encodings_and_regex() {
        assert!(check("uuid", "123e4567-e89b-12d3-a456-426614174000"));
        assert!(!check("uuid", "123e4567"));
        assert!(check("base64", "aGVsbG8="));
        assert!(!check("base64", "aGVsbG8"));
        assert!(check("hex", "deadBEEF"));
        assert!(!check("hex", "xyz"));
        assert!(check("regex", "^[a-z]+$"));
        assert!(!check("regex", "(unclosed"));
    }

    #[test]
    fn test_regex_format_bypasses_pattern_cache() {
        use crate::cache::PatternCache;

        let source = "^format-only-[0-9]{3}$";
        assert!(check("regex", source));
        assert!(!PatternCache::global().contains(source, ""));

        // Compiles far past the size budget
        assert!(!check("regex", r"(\w{500}){500}"));
    }
}
