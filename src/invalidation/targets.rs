//! Content type to page mapping.
//!
//! The shared store's key space cannot be queried by content type, so this
//! table only drives which public URLs are purged at the edge and reported
//! back to the CMS.

/// Pages affected by one content type.
struct ContentRoutes {
    model: &'static str,
    /// Listing and API paths that change whenever any entry changes
    paths: &'static [&'static str],
    /// Per-entry paths; `{slug}` is replaced with the entry slug
    entity_paths: &'static [&'static str],
    /// Site-wide types invalidate every page in the table
    site_wide: bool,
}

const ROUTES: &[ContentRoutes] = &[
    ContentRoutes {
        model: "post",
        paths: &["/", "/blog", "/api/posts", "/rss.xml"],
        entity_paths: &["/blog/{slug}", "/api/posts/{slug}"],
        site_wide: false,
    },
    ContentRoutes {
        model: "page",
        paths: &["/"],
        entity_paths: &["/{slug}"],
        site_wide: false,
    },
    ContentRoutes {
        model: "trip",
        paths: &["/trips", "/api/trips"],
        entity_paths: &["/trips/{slug}"],
        site_wide: false,
    },
    ContentRoutes {
        model: "tick",
        paths: &["/climbing", "/api/ticks"],
        entity_paths: &[],
        site_wide: false,
    },
    ContentRoutes {
        model: "about",
        paths: &["/about", "/api/about"],
        entity_paths: &[],
        site_wide: false,
    },
    ContentRoutes {
        model: "newsletter",
        paths: &["/newsletter"],
        entity_paths: &[],
        site_wide: false,
    },
    ContentRoutes {
        model: "global",
        paths: &[],
        entity_paths: &[],
        site_wide: true,
    },
];

/// Content types the table knows about.
pub fn known_models() -> impl Iterator<Item = &'static str> {
    ROUTES.iter().map(|routes| routes.model)
}

/// Returns the paths to purge for a change to `model`, or `None` when the
/// type has no cached representation.
///
/// Entity paths are included only when a non-empty slug is given. The list
/// keeps table order and holds no duplicates.
pub fn purge_paths(model: &str, slug: Option<&str>) -> Option<Vec<String>> {
    let routes = ROUTES.iter().find(|routes| routes.model == model)?;
    let mut paths = Vec::new();

    if routes.site_wide {
        for other in ROUTES {
            push_all(&mut paths, other.paths.iter().map(|p| p.to_string()));
        }
        return Some(paths);
    }

    push_all(&mut paths, routes.paths.iter().map(|p| p.to_string()));

    if let Some(slug) = slug.map(|s| s.trim().trim_matches('/')).filter(|s| !s.is_empty()) {
        push_all(
            &mut paths,
            routes
                .entity_paths
                .iter()
                .map(|template| template.replace("{slug}", slug)),
        );
    }

    Some(paths)
}

fn push_all(paths: &mut Vec<String>, items: impl Iterator<Item = String>) {
    for item in items {
        if !paths.contains(&item) {
            paths.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_with_slug() {
        let paths = purge_paths("post", Some("trip-report")).unwrap();
        for expected in ["/", "/api/posts", "/blog/trip-report"] {
            assert!(paths.contains(&expected.to_string()), "missing {}", expected);
        }
        assert!(paths.contains(&"/api/posts/trip-report".to_string()));
    }

    #[test]
    fn test_post_without_slug_has_only_type_paths() {
        let paths = purge_paths("post", None).unwrap();
        assert_eq!(paths, vec!["/", "/blog", "/api/posts", "/rss.xml"]);

        let blank = purge_paths("post", Some("  ")).unwrap();
        assert_eq!(blank, paths);
    }

    #[test]
    fn test_slug_is_trimmed() {
        let paths = purge_paths("trip", Some("/bugaboos-2024/")).unwrap();
        assert!(paths.contains(&"/trips/bugaboos-2024".to_string()));
    }

    #[test]
    fn test_type_without_entity_paths_ignores_slug() {
        let paths = purge_paths("tick", Some("whatever")).unwrap();
        assert_eq!(paths, vec!["/climbing", "/api/ticks"]);
    }

    #[test]
    fn test_global_covers_every_page_once() {
        let paths = purge_paths("global", None).unwrap();
        for model in known_models().filter(|m| *m != "global") {
            for path in purge_paths(model, None).unwrap() {
                assert!(paths.contains(&path), "global missing {}", path);
            }
        }
        let mut deduped = paths.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), paths.len());
    }

    #[test]
    fn test_unknown_type() {
        assert!(purge_paths("unknown-type", Some("x")).is_none());
    }
}
