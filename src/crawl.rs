//! Content crawling and page discovery.
//!
//! Walks the content directory for routable template files, pulls each one's
//! `permalink:` frontmatter, and builds the page list the batch driver
//! processes. The batch treats this list as opaque input; nothing downstream
//! assumes how routes were derived.
//!
//! Discovery is deliberately forgiving: unreadable files or directories and
//! files without a permalink are logged and skipped, never fatal. The site
//! index (`/`) is not a content file and is always appended.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One page to measure: where it lives, how to reach it, where its markup
/// goes.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    /// Content file the permalink came from; `None` for the implicit index.
    pub source: Option<PathBuf>,
    /// Normalized route, always `/`-wrapped.
    pub permalink: String,
    /// Output file name: route slashes become hyphens.
    pub page_name: String,
    /// Rendered page URL on the development server.
    pub url: String,
}

const CONTENT_EXTENSIONS: &[&str] = &["html", "njk"];

/// Discover all pages under `content_dir`, plus the site index.
pub fn discover_pages(content_dir: &Path, base_url: &str) -> Vec<PagePlan> {
    let mut pages = Vec::new();

    for entry in WalkDir::new(content_dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("skipping unreadable entry under {}: {err}", content_dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_content_file(entry.path()) {
            continue;
        }
        let content = match fs::read_to_string(entry.path()) {
            Ok(content) => content,
            Err(err) => {
                log::warn!("failed to read {}: {err}", entry.path().display());
                continue;
            }
        };
        let Some(permalink) = extract_permalink(&content) else {
            log::debug!("no permalink in {}", entry.path().display());
            continue;
        };
        pages.push(PagePlan {
            source: Some(entry.path().to_path_buf()),
            page_name: page_name_for(&permalink),
            url: page_url(base_url, &permalink),
            permalink,
        });
    }

    pages.push(PagePlan {
        source: None,
        permalink: "/".to_string(),
        page_name: "index.html".to_string(),
        url: page_url(base_url, "/"),
    });

    pages
}

fn is_content_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            CONTENT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Pull the quoted value of the first `permalink:` frontmatter line.
pub fn extract_permalink(content: &str) -> Option<String> {
    let line = content.lines().find(|line| line.contains("permalink:"))?;
    quoted_value(line).map(normalize_route)
}

/// Wrap a route in leading and trailing slashes.
pub fn normalize_route(route: &str) -> String {
    let mut normalized = route.to_string();
    if !normalized.starts_with('/') {
        normalized.insert(0, '/');
    }
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// Text between the first pair of single or double quotes.
fn quoted_value(line: &str) -> Option<&str> {
    let start = line.find(['"', '\''])?;
    let quote = line[start..].chars().next()?;
    let rest = &line[start + quote.len_utf8()..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

/// `/blog/post/` → `blog-post.html`; the root route maps to `index.html`.
pub fn page_name_for(permalink: &str) -> String {
    let trimmed = permalink.trim_matches('/');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else {
        format!("{}.html", trimmed.replace('/', "-"))
    }
}

fn page_url(base_url: &str, permalink: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), permalink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BASE: &str = "http://localhost:8080";

    #[test]
    fn extracts_double_quoted_permalink() {
        let content = "---\ntitle: About\npermalink: \"/about/\"\n---\n";
        assert_eq!(extract_permalink(content).as_deref(), Some("/about/"));
    }

    #[test]
    fn extracts_single_quoted_permalink() {
        let content = "---\npermalink: '/contact/'\n---\n";
        assert_eq!(extract_permalink(content).as_deref(), Some("/contact/"));
    }

    #[test]
    fn permalink_is_normalized_to_slash_wrapped() {
        let content = "permalink: \"blog/post\"\n";
        assert_eq!(extract_permalink(content).as_deref(), Some("/blog/post/"));
    }

    #[test]
    fn missing_permalink_line_is_none() {
        assert_eq!(extract_permalink("---\ntitle: Nope\n---\n"), None);
    }

    #[test]
    fn unquoted_permalink_is_none() {
        assert_eq!(extract_permalink("permalink: /about/\n"), None);
    }

    #[test]
    fn page_name_replaces_inner_slashes_with_hyphens() {
        assert_eq!(page_name_for("/about/"), "about.html");
        assert_eq!(page_name_for("/blog/post/"), "blog-post.html");
        assert_eq!(page_name_for("/a/b/c/"), "a-b-c.html");
    }

    #[test]
    fn root_route_maps_to_index() {
        assert_eq!(page_name_for("/"), "index.html");
    }

    #[test]
    fn discovers_nested_content_and_appends_index() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("blog")).unwrap();
        std::fs::write(
            tmp.path().join("about.html"),
            "---\npermalink: \"/about/\"\n---\n<main></main>\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("blog/post.njk"),
            "---\npermalink: \"/blog/post/\"\n---\n",
        )
        .unwrap();
        // No permalink: crawled but skipped.
        std::fs::write(tmp.path().join("draft.html"), "<main></main>\n").unwrap();
        // Wrong extension: ignored entirely.
        std::fs::write(tmp.path().join("notes.md"), "permalink: \"/notes/\"\n").unwrap();

        let pages = discover_pages(tmp.path(), BASE);

        let permalinks: Vec<&str> = pages.iter().map(|p| p.permalink.as_str()).collect();
        assert_eq!(permalinks, vec!["/about/", "/blog/post/", "/"]);

        let about = &pages[0];
        assert_eq!(about.page_name, "about.html");
        assert_eq!(about.url, "http://localhost:8080/about/");
        assert!(about.source.is_some());

        let index = pages.last().unwrap();
        assert_eq!(index.page_name, "index.html");
        assert_eq!(index.url, "http://localhost:8080/");
        assert!(index.source.is_none());
    }

    #[test]
    fn empty_content_dir_still_yields_the_index() {
        let tmp = TempDir::new().unwrap();
        let pages = discover_pages(tmp.path(), BASE);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].permalink, "/");
    }

    #[test]
    fn trailing_base_url_slash_does_not_double() {
        let tmp = TempDir::new().unwrap();
        let pages = discover_pages(tmp.path(), "http://localhost:8080/");
        assert_eq!(pages[0].url, "http://localhost:8080/");
    }
}
