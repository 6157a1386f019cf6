//! Template references
//!
//! A reference is a location optionally suffixed with `#subpath`, e.g.
//! `https://github.com/org/templates.git#python/app`. Local references are
//! plain paths.

use url::Url;

/// Whether `reference` parses as an absolute URL (`scheme:...`)
///
/// Single-letter schemes are rejected so Windows drive letters stay local.
/// scp-style `user@host:path` has no valid scheme and is local too.
#[must_use]
pub fn has_scheme(reference: &str) -> bool {
    Url::parse(reference).is_ok_and(|url| url.scheme().len() > 1)
}

/// Split a reference into `(location, subpath)`
///
/// Network references keep everything before the URL fragment as the
/// location and use the fragment, without slashes at either end, as the
/// subpath. Both are taken from the reference text as written. Local
/// references have an empty location and are entirely subpath.
#[must_use]
pub fn split(reference: &str) -> (String, String) {
    match Url::parse(reference) {
        Ok(url) if url.scheme().len() > 1 => {
            let (location, fragment) = match url.fragment() {
                Some(_) => reference.split_once('#').unwrap_or((reference, "")),
                None => (reference, ""),
            };
            (location.to_string(), fragment.trim_matches('/').to_string())
        }
        _ => (String::new(), reference.to_string()),
    }
}

/// Join `location` and `subpath` back into a recordable reference
///
/// `location#subpath`, with a dangling `#` trimmed when either side is empty.
#[must_use]
pub fn join(location: &str, subpath: &str) -> String {
    format!("{location}#{subpath}").trim_matches('#').to_string()
}

/// Repository name of a location: last path segment without `.git`
#[must_use]
pub fn repository_name(location: &str) -> String {
    let trimmed = location.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("https://github.com/org/t.git"));
        assert!(has_scheme("file:///srv/templates"));
        assert!(has_scheme("git+ssh://host/repo"));
        assert!(!has_scheme("C:\\templates\\app"));
        assert!(!has_scheme("./templates/app"));
        assert!(!has_scheme("templates/app"));
        assert!(!has_scheme("1abc:thing"));
        assert!(!has_scheme("git@github.com:org/t.git"));
        assert!(!has_scheme("https://"));
    }

    #[test]
    fn split_network_reference_uses_fragment() {
        let (location, subpath) = split("https://github.com/org/templates.git#/python/app/");
        assert_eq!(location, "https://github.com/org/templates.git");
        assert_eq!(subpath, "python/app");
    }

    #[test]
    fn split_network_reference_without_fragment() {
        let (location, subpath) = split("https://github.com/org/t.git");
        assert_eq!(location, "https://github.com/org/t.git");
        assert_eq!(subpath, "");
    }

    #[test]
    fn split_keeps_location_as_written() {
        let (location, subpath) = split("HTTPS://GitHub.com/Org/T.git#app");
        assert_eq!(location, "HTTPS://GitHub.com/Org/T.git");
        assert_eq!(subpath, "app");
    }

    #[test]
    fn split_scp_style_reference_is_local() {
        let (location, subpath) = split("git@github.com:org/t.git#app");
        assert_eq!(location, "");
        assert_eq!(subpath, "git@github.com:org/t.git#app");
    }

    #[test]
    fn split_local_reference() {
        let (location, subpath) = split("../templates/app");
        assert_eq!(location, "");
        assert_eq!(subpath, "../templates/app");
    }

    #[test]
    fn join_trims_dangling_separator() {
        assert_eq!(join("https://h/t.git", "app"), "https://h/t.git#app");
        assert_eq!(join("https://h/t.git", ""), "https://h/t.git");
        assert_eq!(join("", "local/app"), "local/app");
    }

    #[test]
    fn repository_names() {
        assert_eq!(repository_name("https://github.com/org/templates.git"), "templates");
        assert_eq!(repository_name("https://bitbucket.org/org/tpl/"), "tpl");
        assert_eq!(repository_name("git@host:org/tpl.git"), "tpl");
        assert_eq!(repository_name("file:///srv/t"), "t");
    }
}
