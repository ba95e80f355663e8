use crate::UrlError;
use url::Url;

/// Tracking query parameters stripped during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "source",
];

/// Normalizes a URL for deduplication
///
/// The same product href shows up on multiple listing pages, sometimes with
/// different casing, trailing slashes, or campaign parameters. Two spellings
/// of the same page must normalize to the same string or the dedup set in
/// the listing walker leaks duplicates downstream.
///
/// Rules applied, in order:
///
/// 1. Parse; reject anything that is not http/https
/// 2. Lowercase the host and strip a leading `www.`
/// 3. Collapse dot segments and duplicate slashes in the path; drop the
///    trailing slash except for the root
/// 4. Drop the fragment
/// 5. Drop tracking query parameters; sort the survivors; drop an empty
///    query entirely
///
/// # Examples
///
/// ```
/// use catwalk::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.com/products/tee/?utm_source=x").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/products/tee");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "only http and https are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) => {
            let mut normalized_host = host.to_lowercase();
            if let Some(stripped) = normalized_host.strip_prefix("www.") {
                normalized_host = stripped.to_string();
            }
            url.set_host(Some(&normalized_host))
                .map_err(|e| UrlError::Malformed(format!("failed to set host: {}", e)))?;
        }
        None => return Err(UrlError::MissingDomain),
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url)
}

/// Collapses dot segments and duplicate slashes, strips trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_host_and_strips_www() {
        let result = normalize_url("https://WWW.Carbon38.COM/Products/Tee").unwrap();
        assert_eq!(result.as_str(), "https://carbon38.com/Products/Tee");
    }

    #[test]
    fn strips_trailing_slash() {
        let result = normalize_url("https://example.com/products/tee/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/products/tee");
    }

    #[test]
    fn keeps_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn strips_fragment() {
        let result = normalize_url("https://example.com/p#reviews").unwrap();
        assert_eq!(result.as_str(), "https://example.com/p");
    }

    #[test]
    fn strips_tracking_params_and_sorts_rest() {
        let result =
            normalize_url("https://example.com/p?variant=2&utm_source=ig&color=red").unwrap();
        assert_eq!(result.as_str(), "https://example.com/p?color=red&variant=2");
    }

    #[test]
    fn drops_empty_query() {
        let result = normalize_url("https://example.com/p?fbclid=abc").unwrap();
        assert_eq!(result.as_str(), "https://example.com/p");
    }

    #[test]
    fn collapses_dot_segments() {
        let result = normalize_url("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result.as_str(), "https://example.com/b/c");
    }

    #[test]
    fn collapses_duplicate_slashes() {
        let result = normalize_url("https://example.com//products///tee").unwrap();
        assert_eq!(result.as_str(), "https://example.com/products/tee");
    }

    #[test]
    fn rejects_non_http_scheme() {
        let result = normalize_url("ftp://example.com/p");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn rejects_malformed() {
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn same_product_two_spellings_normalize_identically() {
        let a = normalize_url("https://www.example.com/products/tee/?utm_campaign=x").unwrap();
        let b = normalize_url("https://example.com/products/tee").unwrap();
        assert_eq!(a, b);
    }
}
