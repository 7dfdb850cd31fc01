//! Canonical URL generation.

/// Normalise a base path to exactly one leading slash and no trailing slash.
///
/// `""`, `"/"` and `"///"` all normalise to `"/"`.
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

/// Canonical request URL of a method: `{base_path}/{path}`.
///
/// The result has exactly one leading `/` and no empty internal segments.
pub fn method_url(base_path: &str, path: &str) -> String {
    let joined = format!("{}/{}", base_path, path);
    let segments: Vec<&str> = joined.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_path() {
        assert_eq!(normalize_base_path(""), "/");
        assert_eq!(normalize_base_path("/"), "/");
        assert_eq!(normalize_base_path("v1"), "/v1");
        assert_eq!(normalize_base_path("//v1/api//"), "/v1/api");
    }

    #[test]
    fn test_method_url() {
        assert_eq!(method_url("/", "foo"), "/foo");
        assert_eq!(method_url("/v1", "foo/bar"), "/v1/foo/bar");
        assert_eq!(method_url("/v1", "/user/:id"), "/v1/user/:id");
        assert_eq!(method_url("/v1/", "//user//:id"), "/v1/user/:id");
        assert_eq!(method_url("", ""), "/");
    }
}
