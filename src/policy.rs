//! Per-request caching policy selection.
//!
//! A pure decision function: given a request's method, destination type
//! and origin, pick which strategy (if any) handles it and against
//! which bucket. Cross-origin and non-read requests are left to the
//! platform untouched.

use crate::store::BucketKind;

/// What kind of resource a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Font,
    Other,
}

impl Destination {
    /// Parse the CLI/event spelling of a destination. Unknown values
    /// fall through to `Other`, mirroring the exhaustive policy table.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "document" => Destination::Document,
            "script" => Destination::Script,
            "style" | "stylesheet" => Destination::Style,
            "image" => Destination::Image,
            "font" => Destination::Font,
            _ => Destination::Other,
        }
    }
}

/// Outcome of policy selection for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Not ours to handle; pass through to the network untouched.
    Ignore,
    StaleWhileRevalidate(BucketKind),
    CacheFirst(BucketKind),
}

/// Select the caching policy for a request.
///
/// Rules are applied in order; the final arm makes the table exhaustive
/// over every destination.
pub fn select(method: &str, destination: Destination, url: &str, page_origin: &str) -> Policy {
    if !is_same_origin(url, page_origin) {
        return Policy::Ignore;
    }
    if !method.eq_ignore_ascii_case("GET") {
        return Policy::Ignore;
    }
    match destination {
        Destination::Document => Policy::StaleWhileRevalidate(BucketKind::Dynamic),
        Destination::Script | Destination::Style | Destination::Image | Destination::Font => {
            Policy::StaleWhileRevalidate(BucketKind::Runtime)
        }
        Destination::Other => Policy::CacheFirst(BucketKind::Dynamic),
    }
}

/// Compare the scheme://host[:port] prefix of a URL against the page
/// origin. Origins are compared case-insensitively, without trailing
/// slashes.
fn is_same_origin(url: &str, page_origin: &str) -> bool {
    let origin = page_origin.trim_end_matches('/');
    let url = url.trim();
    let prefix = match url.get(..origin.len()) {
        Some(prefix) => prefix,
        None => return false,
    };
    if !prefix.eq_ignore_ascii_case(origin) {
        return false;
    }
    let rest = &url[origin.len()..];
    // "http://host" must be followed by a path boundary, so that
    // "http://host.evil.com" does not pass.
    rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "http://localhost:4173";

    #[test]
    fn test_cross_origin_is_ignored() {
        let policy = select("GET", Destination::Document, "https://cdn.example.com/app.js", ORIGIN);
        assert_eq!(policy, Policy::Ignore);
    }

    #[test]
    fn test_origin_prefix_spoof_is_ignored() {
        let policy = select(
            "GET",
            Destination::Document,
            "http://localhost:4173.evil.com/",
            ORIGIN,
        );
        assert_eq!(policy, Policy::Ignore);
    }

    #[test]
    fn test_non_get_is_ignored() {
        let policy = select("POST", Destination::Document, "http://localhost:4173/api/contact", ORIGIN);
        assert_eq!(policy, Policy::Ignore);
    }

    #[test]
    fn test_document_uses_swr_against_dynamic() {
        let policy = select("GET", Destination::Document, "http://localhost:4173/", ORIGIN);
        assert_eq!(policy, Policy::StaleWhileRevalidate(BucketKind::Dynamic));
    }

    #[test]
    fn test_runtime_assets_use_swr_against_runtime() {
        for dest in [
            Destination::Script,
            Destination::Style,
            Destination::Image,
            Destination::Font,
        ] {
            let policy = select("GET", dest, "http://localhost:4173/assets/x", ORIGIN);
            assert_eq!(policy, Policy::StaleWhileRevalidate(BucketKind::Runtime));
        }
    }

    #[test]
    fn test_other_destinations_use_cache_first() {
        let policy = select("GET", Destination::Other, "http://localhost:4173/site.webmanifest", ORIGIN);
        assert_eq!(policy, Policy::CacheFirst(BucketKind::Dynamic));
    }

    #[test]
    fn test_method_check_is_case_insensitive() {
        let policy = select("get", Destination::Document, "http://localhost:4173/", ORIGIN);
        assert_eq!(policy, Policy::StaleWhileRevalidate(BucketKind::Dynamic));
    }

    #[test]
    fn test_destination_parse() {
        assert_eq!(Destination::parse("document"), Destination::Document);
        assert_eq!(Destination::parse("stylesheet"), Destination::Style);
        assert_eq!(Destination::parse("Font"), Destination::Font);
        assert_eq!(Destination::parse("worker"), Destination::Other);
    }
}
