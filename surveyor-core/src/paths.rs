//! Utilities for picking resource names and scopes out of provider paths.
//!
//! Cloud references come in many spellings: full HTTPS URLs, partial paths
//! (`projects/p/global/networks/net1`), bare names. These helpers all accept
//! any of them by first reducing a reference to its path segments.

/// Reduce a reference to its resource path: strips an `https://host` prefix
/// plus any query string or fragment.
pub fn resource_path(reference: &str) -> &str {
    let path = match reference.split_once("://") {
        // Drop the authority as well; everything after the first `/` is path.
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => reference,
    };
    path.split(['?', '#']).next().unwrap_or(path)
}

fn segments(reference: &str) -> impl Iterator<Item = &str> {
    resource_path(reference).split('/').filter(|s| !s.is_empty())
}

/// The value immediately following `segment` in the path, if any.
///
/// `extract_path_param("regions", "projects/p/regions/us-east1/subnetworks/s")`
/// yields `us-east1`.
pub fn extract_path_param<'a>(segment: &str, reference: &'a str) -> Option<&'a str> {
    let mut iter = segments(reference);
    while let Some(s) = iter.next() {
        if s == segment {
            return iter.next();
        }
    }
    None
}

/// The final path segment, or the reference itself when it has no slashes.
pub fn last_path_component(reference: &str) -> &str {
    segments(reference).last().unwrap_or("")
}

/// The last `count` values of the alternating `key/value` pairs at the end
/// of a path.
///
/// `projects/P/locations/L/repositories/R/dockerImages/I` with a count of 3
/// yields `[L, R, I]`. Returns `None` when the path does not carry enough
/// pairs, so callers can skip rather than mis-link.
pub fn extract_path_params_with_count(reference: &str, count: usize) -> Option<Vec<&str>> {
    let segs: Vec<&str> = segments(reference).collect();
    if count == 0 || segs.len() < count * 2 {
        return None;
    }
    let mut values = Vec::with_capacity(count);
    let mut idx = segs.len();
    for _ in 0..count {
        values.push(segs[idx - 1]);
        idx -= 2;
    }
    values.reverse();
    Some(values)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strips_scheme_and_host() {
        assert_eq!(
            resource_path("https://compute.googleapis.com/compute/v1/projects/p/global/networks/n"),
            "compute/v1/projects/p/global/networks/n"
        );
        assert_eq!(resource_path("projects/p/zones/z"), "projects/p/zones/z");
    }

    #[test]
    fn extract_param() {
        let url = "https://compute.googleapis.com/compute/v1/projects/p/regions/us-central1/subnetworks/sub1";
        assert_eq!(extract_path_param("projects", url), Some("p"));
        assert_eq!(extract_path_param("regions", url), Some("us-central1"));
        assert_eq!(extract_path_param("zones", url), None);
    }

    #[test]
    fn last_component() {
        assert_eq!(last_path_component("global/networks/net1"), "net1");
        assert_eq!(last_path_component("net1"), "net1");
        assert_eq!(last_path_component(""), "");
        assert_eq!(
            last_path_component("https://host/v1/projects/p/topics/t?alt=json"),
            "t"
        );
    }

    #[test]
    fn params_with_count() {
        let path = "projects/P/locations/L/repositories/R/dockerImages/IMG";
        assert_eq!(
            extract_path_params_with_count(path, 3),
            Some(vec!["L", "R", "IMG"])
        );
        assert_eq!(extract_path_params_with_count(path, 4), Some(vec!["P", "L", "R", "IMG"]));
        assert_eq!(extract_path_params_with_count(path, 5), None);
        assert_eq!(extract_path_params_with_count("justonename", 2), None);
    }
}
