//! Cache key derivation.
//!
//! The worker-to-cache boundary keys objects by the byte concatenation
//! `host ∥ path`: the host exactly as it appeared after stripping the
//! `http://` scheme (with its `:port` if one was given) and the URL path
//! starting with `/`. No further normalization happens — keys are
//! case-sensitive and equal bytes mean equal keys.

/// Builds the cache key for a parsed request.
///
/// A `/` is substituted when the URL carried no path at all.
///
/// # Examples
///
/// ```
/// use webcache_rs::key::cache_key;
///
/// assert_eq!(cache_key("example.org", "/index.html"), "example.org/index.html");
/// assert_eq!(cache_key("example.org:8080", ""), "example.org:8080/");
/// ```
pub fn cache_key(host: &str, path: &str) -> String {
    let mut key = String::with_capacity(host.len() + path.len().max(1));
    key.push_str(host);
    if !path.starts_with('/') {
        key.push('/');
    }
    key.push_str(path);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_path_concatenate() {
        assert_eq!(cache_key("ucla.edu", "/about"), "ucla.edu/about");
    }

    #[test]
    fn test_port_is_part_of_the_key() {
        assert_ne!(cache_key("ucla.edu", "/"), cache_key("ucla.edu:8080", "/"));
    }

    #[test]
    fn test_missing_path_becomes_slash() {
        assert_eq!(cache_key("ucla.edu", ""), "ucla.edu/");
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        assert_ne!(cache_key("UCLA.edu", "/"), cache_key("ucla.edu", "/"));
    }
}
