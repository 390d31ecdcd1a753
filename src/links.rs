//! Builds the internal links for each page. Links favor the page's own
//! cluster (folder) and add a few links into other clusters so crawlers reach
//! every folder.

use crate::record::PageRecord;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashSet;

/// Which records are linked from a page.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkStrategy {
    /// Random same-folder records, then random other-folder records.
    Cluster,

    /// The previous and next records by index, then random same-folder
    /// records, then random other-folder records.
    Chain,
}

impl Default for LinkStrategy {
    fn default() -> Self {
        LinkStrategy::Cluster
    }
}

/// The internal-linking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPolicy {
    pub strategy: LinkStrategy,

    /// The maximum number of random same-folder links.
    pub same_folder: usize,

    /// The maximum number of random other-folder links.
    pub other_folders: usize,

    /// The heading of the rendered links block.
    pub heading: String,

    /// Whether each link label is wrapped in a card.
    pub decorate: bool,
}

impl LinkPolicy {
    /// Returns the conventional caps for `strategy`: 7 + 2 for
    /// [`LinkStrategy::Cluster`] and 4 + 2 for [`LinkStrategy::Chain`].
    pub fn for_strategy(strategy: LinkStrategy) -> LinkPolicy {
        LinkPolicy {
            strategy,
            same_folder: match strategy {
                LinkStrategy::Cluster => 7,
                LinkStrategy::Chain => 4,
            },
            other_folders: 2,
            heading: "🔗 مقالات ذات صلة".to_owned(),
            decorate: false,
        }
    }

    /// The most links [`related_links`] can return under this policy.
    pub fn max_links(&self) -> usize {
        let chain = match self.strategy {
            LinkStrategy::Cluster => 0,
            LinkStrategy::Chain => 2,
        };
        chain + self.same_folder + self.other_folders
    }
}

impl Default for LinkPolicy {
    fn default() -> Self {
        LinkPolicy::for_strategy(LinkStrategy::Cluster)
    }
}

/// A resolved internal link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link<'a> {
    pub url: String,
    pub label: &'a str,
}

/// Selects the links for `records[index]`.
///
/// The other records are split into those sharing the page's folder and the
/// rest, and both groups are shuffled. Up to `policy.same_folder` records are
/// taken from the first group and up to `policy.other_folders` from the
/// second; under [`LinkStrategy::Chain`] the neighboring records come first.
/// Links are deduplicated by URL, keeping the first occurrence, so the
/// result is in selection order with no URL repeated. Short groups yield
/// fewer links.
pub fn related_links<'a, R: Rng + ?Sized>(
    records: &'a [PageRecord],
    index: usize,
    policy: &LinkPolicy,
    domain: &str,
    rng: &mut R,
) -> Vec<Link<'a>> {
    let current = match records.get(index) {
        Some(record) => record,
        None => return Vec::new(),
    };

    let mut same_folder: Vec<&PageRecord> = Vec::new();
    let mut other_folders: Vec<&PageRecord> = Vec::new();
    for (i, record) in records.iter().enumerate() {
        if i == index {
            continue;
        }
        if record.folder == current.folder {
            same_folder.push(record);
        } else {
            other_folders.push(record);
        }
    }
    same_folder.shuffle(rng);
    other_folders.shuffle(rng);

    let mut selected: Vec<&PageRecord> = Vec::with_capacity(policy.max_links());
    if policy.strategy == LinkStrategy::Chain {
        if let Some(prev) = index.checked_sub(1).and_then(|i| records.get(i)) {
            selected.push(prev);
        }
        if let Some(next) = records.get(index + 1) {
            selected.push(next);
        }
    }
    selected.extend(same_folder.into_iter().take(policy.same_folder));
    selected.extend(other_folders.into_iter().take(policy.other_folders));

    let mut seen: HashSet<String> = HashSet::with_capacity(selected.len());
    selected
        .into_iter()
        .filter_map(|record| {
            let url = record.url(domain);
            if seen.insert(url.clone()) {
                Some(Link {
                    url,
                    label: &record.display_title,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Renders links as an HTML block suitable for the `{{INTERNAL_LINKS}}`
/// placeholder. Values are inserted verbatim.
pub fn render_links(links: &[Link], policy: &LinkPolicy) -> String {
    let mut html = format!(
        "<div class='related-links' style='margin-top:50px;padding:20px;border-top:2px solid #eee'><h3>{}</h3><ul>",
        policy.heading
    );
    for link in links {
        if policy.decorate {
            html.push_str(&format!(
                "<li><a href='{}'><span style='display:block;padding:10px;margin:6px 0;border:1px solid #eee;border-radius:8px'>{}</span></a></li>",
                link.url, link.label
            ));
        } else {
            html.push_str(&format!("<li><a href='{}'>{}</a></li>", link.url, link.label));
        }
    }
    html.push_str("</ul></div>");
    html
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(folder: &str, name: &str) -> PageRecord {
        PageRecord {
            display_title: format!("Title {}", name),
            filename: format!("{}.html", name),
            description: String::new(),
            folder: folder.to_owned(),
            timestamp: String::new(),
            template_id: 0,
        }
    }

    /// 10 records in `a/a`, 5 in `b/b`.
    fn fixture() -> Vec<PageRecord> {
        (0..15)
            .map(|i| record(if i < 10 { "a/a" } else { "b/b" }, &format!("p{}", i)))
            .collect()
    }

    fn assert_unique(links: &[Link]) {
        let urls: HashSet<&String> = links.iter().map(|l| &l.url).collect();
        assert_eq!(links.len(), urls.len());
    }

    #[test]
    fn test_cluster_links() {
        let records = fixture();
        let policy = LinkPolicy::default();
        let mut rng = StdRng::seed_from_u64(17);
        for index in 0..records.len() {
            let links = related_links(&records, index, &policy, "example.com", &mut rng);
            assert_unique(&links);
            assert!(links.len() <= policy.max_links());
            let own = records[index].url("example.com");
            assert!(links.iter().all(|l| l.url != own));

            // Same-folder links come before other-folder links.
            let prefix = format!("https://example.com/{}/", records[index].folder);
            let same = links.iter().take_while(|l| l.url.starts_with(&prefix)).count();
            assert!(links[same..].iter().all(|l| !l.url.starts_with(&prefix)));
            if index < 10 {
                assert_eq!(7, same);
                assert_eq!(9, links.len());
            } else {
                assert_eq!(4, same);
                assert_eq!(6, links.len());
            }
        }
    }

    #[test]
    fn test_chain_links() {
        let records = fixture();
        let policy = LinkPolicy::for_strategy(LinkStrategy::Chain);
        let mut rng = StdRng::seed_from_u64(5);
        let links = related_links(&records, 3, &policy, "example.com", &mut rng);
        assert_unique(&links);
        assert!(links.len() <= 8);
        assert_eq!("https://example.com/a/a/p2.html", links[0].url);
        assert_eq!("https://example.com/a/a/p4.html", links[1].url);
        assert_eq!("Title p2", links[0].label);

        // The chain neighbors may also be drawn as same-folder picks; the
        // duplicates are dropped.
        let same = links
            .iter()
            .filter(|l| l.url.starts_with("https://example.com/a/a/"))
            .count();
        assert!(same >= 4 && same <= 6, "{}", same);
        let other = links.len() - same;
        assert_eq!(2, other);
    }

    #[test]
    fn test_chain_links_at_edges() {
        let records = fixture();
        let policy = LinkPolicy::for_strategy(LinkStrategy::Chain);
        let mut rng = StdRng::seed_from_u64(5);
        let first = related_links(&records, 0, &policy, "example.com", &mut rng);
        assert_eq!("https://example.com/a/a/p1.html", first[0].url);
        let last = related_links(&records, 14, &policy, "example.com", &mut rng);
        assert_eq!("https://example.com/b/b/p13.html", last[0].url);
        assert_unique(&last);
    }

    #[test]
    fn test_duplicate_urls_are_dropped() {
        // Two records with the same folder and filename resolve to the same
        // URL.
        let records = vec![
            record("a/a", "x"),
            record("a/a", "dup"),
            record("a/a", "dup"),
            record("b/b", "y"),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        let links = related_links(&records, 0, &LinkPolicy::default(), "example.com", &mut rng);
        assert_eq!(2, links.len());
        assert_unique(&links);
        assert_eq!("https://example.com/a/a/dup.html", links[0].url);
        assert_eq!("https://example.com/b/b/y.html", links[1].url);
    }

    #[test]
    fn test_single_record_has_no_links() {
        let records = vec![record("a/a", "only")];
        let mut rng = StdRng::seed_from_u64(0);
        assert!(related_links(&records, 0, &LinkPolicy::default(), "x.org", &mut rng).is_empty());
        assert!(related_links(&records, 3, &LinkPolicy::default(), "x.org", &mut rng).is_empty());
    }

    #[test]
    fn test_render_links() {
        let links = vec![
            Link {
                url: "https://example.com/a/a/one.html".to_owned(),
                label: "One",
            },
            Link {
                url: "https://example.com/b/b/two.html".to_owned(),
                label: "Two",
            },
        ];
        let html = render_links(&links, &LinkPolicy::default());
        assert!(html.starts_with("<div class='related-links'"));
        assert!(html.contains("<h3>🔗 مقالات ذات صلة</h3>"));
        assert!(html.contains("<li><a href='https://example.com/a/a/one.html'>One</a></li>"));
        assert!(html.contains("<li><a href='https://example.com/b/b/two.html'>Two</a></li>"));
        assert!(html.ends_with("</ul></div>"));

        let mut decorated = LinkPolicy::default();
        decorated.decorate = true;
        let html = render_links(&links, &decorated);
        assert!(html.contains("<a href='https://example.com/a/a/one.html'><span"));
        assert!(html.contains(">One</span></a>"));
    }
}
