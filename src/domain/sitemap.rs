//! Sitemap tree and its targeted mutations.

use super::validation::{IssueSeverity, ValidationReport};
use crate::error::{PageError, PageResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use uuid::Uuid;

/// Accepted page priorities, lowest to highest
const PRIORITY_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// Nesting depth past which validation suggests flattening
const MAX_RECOMMENDED_DEPTH: usize = 3;

fn path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^/[A-Za-z0-9\-._~/]*$").expect("static path pattern"))
}

/// How often a page is expected to change, as used in XML sitemaps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Always,
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// 1 (lowest) to 10 (highest)
    pub priority: u8,
    #[serde(default)]
    pub changefreq: ChangeFrequency,
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<Page>,
}

impl Page {
    pub fn new(id: impl Into<String>, title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            path: path.into(),
            parent_id: None,
            priority: 5,
            changefreq: ChangeFrequency::default(),
            order: 1,
            description: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Page>) -> Self {
        self.children = children;
        self
    }

    /// Number of nodes in the subtree rooted here, including this page
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Page::subtree_size).sum::<usize>()
    }

    fn contains(&self, id: &str) -> bool {
        self.id == id || self.children.iter().any(|c| c.contains(id))
    }
}

/// Partial update for a page. `None` fields are left untouched; structural
/// fields (id, parent, children) change only through add/remove/move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub path: Option<String>,
    pub priority: Option<u8>,
    pub changefreq: Option<ChangeFrequency>,
    pub order: Option<u32>,
    pub description: Option<String>,
}

/// The generated sitemap: a forest of root pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapStructure {
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl SitemapStructure {
    pub fn new(pages: Vec<Page>) -> Self {
        let mut sitemap = Self {
            pages,
            base_url: None,
            generated_at: None,
        };
        sitemap.normalize_parents();
        sitemap
    }

    pub fn page_count(&self) -> usize {
        self.pages.iter().map(Page::subtree_size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// All pages in depth-first pre-order
    pub fn pages_depth_first(&self) -> Vec<&Page> {
        fn walk<'a>(pages: &'a [Page], out: &mut Vec<&'a Page>) {
            for page in pages {
                out.push(page);
                walk(&page.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.pages, &mut out);
        out
    }

    pub fn find_page(&self, id: &str) -> Option<&Page> {
        fn find<'a>(pages: &'a [Page], id: &str) -> Option<&'a Page> {
            pages
                .iter()
                .find_map(|p| if p.id == id { Some(p) } else { find(&p.children, id) })
        }
        find(&self.pages, id)
    }

    fn find_page_mut(&mut self, id: &str) -> Option<&mut Page> {
        fn find<'a>(pages: &'a mut [Page], id: &str) -> Option<&'a mut Page> {
            for page in pages.iter_mut() {
                if page.id == id {
                    return Some(page);
                }
                if let Some(found) = find(&mut page.children, id) {
                    return Some(found);
                }
            }
            None
        }
        find(&mut self.pages, id)
    }

    /// Fail on the first page id that appears twice. Lookups by id assume
    /// uniqueness, so trees from outside are checked before they are adopted.
    pub fn ensure_unique_ids(&self) -> PageResult<()> {
        let mut seen = HashSet::new();
        match self
            .pages_depth_first()
            .into_iter()
            .find(|p| !seen.insert(p.id.as_str()))
        {
            Some(page) => Err(PageError::DuplicateId(page.id.clone())),
            None => Ok(()),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find_page(id).is_some()
    }

    /// Rewrite every `parent_id` to match the tree structure
    pub fn normalize_parents(&mut self) {
        fn fix(pages: &mut [Page], parent: Option<&str>) {
            for page in pages.iter_mut() {
                page.parent_id = parent.map(str::to_string);
                let id = page.id.clone();
                fix(&mut page.children, Some(&id));
            }
        }
        fix(&mut self.pages, None);
    }

    /// Merge `update` into the page with the given id
    pub fn update_page(&mut self, id: &str, update: PageUpdate) -> PageResult<()> {
        if let Some(priority) = update.priority.filter(|p| !PRIORITY_RANGE.contains(p)) {
            return Err(PageError::InvalidPriority(priority));
        }
        let page = self
            .find_page_mut(id)
            .ok_or_else(|| PageError::NotFound(id.to_string()))?;

        if let Some(title) = update.title {
            page.title = title;
        }
        if let Some(path) = update.path {
            page.path = path;
        }
        if let Some(priority) = update.priority {
            page.priority = priority;
        }
        if let Some(changefreq) = update.changefreq {
            page.changefreq = changefreq;
        }
        if let Some(order) = update.order {
            page.order = order;
        }
        if let Some(description) = update.description {
            page.description = Some(description);
        }
        Ok(())
    }

    /// Add a placeholder page under `parent_id` (or at root). Returns the new id.
    pub fn add_page(&mut self, parent_id: Option<&str>) -> PageResult<String> {
        let number = self.page_count() + 1;
        let id = format!("page-{}", Uuid::new_v4().simple());
        let slug = format!("new-page-{}", number);

        let (siblings, path) = match parent_id {
            Some(parent_id) => {
                let parent = self
                    .find_page_mut(parent_id)
                    .ok_or_else(|| PageError::NotFound(parent_id.to_string()))?;
                let path = format!("{}/{}", parent.path.trim_end_matches('/'), slug);
                (&mut parent.children, path)
            }
            None => (&mut self.pages, format!("/{}", slug)),
        };

        let mut page = Page::new(id.clone(), format!("New Page {}", number), path);
        page.parent_id = parent_id.map(str::to_string);
        page.order = number as u32;
        siblings.push(page);

        Ok(id)
    }

    /// Remove the page and its whole subtree. Children are not reparented.
    pub fn remove_page(&mut self, id: &str) -> PageResult<Page> {
        detach(&mut self.pages, id).ok_or_else(|| PageError::NotFound(id.to_string()))
    }

    /// Move a page under a new parent (or to root).
    ///
    /// `new_order` is a 1-based position among the new siblings; sibling
    /// `order` values are renumbered afterwards. Without it the page is
    /// appended. The target is checked before anything is detached.
    pub fn move_page(
        &mut self,
        id: &str,
        new_parent_id: Option<&str>,
        new_order: Option<u32>,
    ) -> PageResult<()> {
        let node = self
            .find_page(id)
            .ok_or_else(|| PageError::NotFound(id.to_string()))?;

        if let Some(parent_id) = new_parent_id {
            if node.contains(parent_id) {
                return Err(PageError::WouldCreateCycle(id.to_string()));
            }
            if !self.contains(parent_id) {
                return Err(PageError::NotFound(parent_id.to_string()));
            }
        }

        let mut page = detach(&mut self.pages, id).ok_or_else(|| PageError::NotFound(id.to_string()))?;
        page.parent_id = new_parent_id.map(str::to_string);

        let siblings = match new_parent_id {
            Some(parent_id) => match self.find_page_mut(parent_id) {
                Some(parent) => &mut parent.children,
                None => return Err(PageError::NotFound(parent_id.to_string())),
            },
            None => &mut self.pages,
        };

        let index = new_order
            .map(|o| (o.max(1) as usize - 1).min(siblings.len()))
            .unwrap_or(siblings.len());
        siblings.insert(index, page);
        for (i, sibling) in siblings.iter_mut().enumerate() {
            sibling.order = i as u32 + 1;
        }

        Ok(())
    }

    /// Check structural and content rules
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.pages.is_empty() {
            report.push(
                IssueSeverity::Error,
                "EMPTY_SITEMAP",
                "Sitemap has no pages",
                None,
            );
            return report;
        }

        let mut seen_ids = HashSet::new();
        let mut paths: HashMap<&str, &str> = HashMap::new();
        let mut has_home = false;

        let mut stack: Vec<(&Page, Option<&str>, usize)> =
            self.pages.iter().rev().map(|p| (p, None, 1)).collect();

        while let Some((page, parent, depth)) = stack.pop() {
            let pid = Some(page.id.as_str());

            if !seen_ids.insert(page.id.as_str()) {
                report.push(
                    IssueSeverity::Error,
                    "DUPLICATE_PAGE_ID",
                    format!("Page id '{}' is used more than once", page.id),
                    pid,
                );
            }

            if page.parent_id.as_deref() != parent {
                report.push(
                    IssueSeverity::Error,
                    "INVALID_PARENT",
                    format!(
                        "Page '{}' declares parent {:?} but sits under {:?}",
                        page.id, page.parent_id, parent
                    ),
                    pid,
                );
            }

            if page.title.trim().is_empty() {
                report.push(
                    IssueSeverity::Error,
                    "MISSING_TITLE",
                    format!("Page '{}' has no title", page.id),
                    pid,
                );
            }

            if !path_pattern().is_match(&page.path) {
                report.push(
                    IssueSeverity::Error,
                    "INVALID_PATH",
                    format!("Page '{}' has malformed path '{}'", page.id, page.path),
                    pid,
                );
            } else if let Some(other) = paths.insert(page.path.as_str(), page.id.as_str()) {
                report.push(
                    IssueSeverity::Warning,
                    "DUPLICATE_PATH",
                    format!("Path '{}' is shared with page '{}'", page.path, other),
                    pid,
                );
            }
            if page.path == "/" {
                has_home = true;
            }

            if !PRIORITY_RANGE.contains(&page.priority) {
                report.push(
                    IssueSeverity::Warning,
                    "INVALID_PRIORITY",
                    format!(
                        "Page '{}' priority {} is outside 1-10",
                        page.id, page.priority
                    ),
                    pid,
                );
            }

            if depth > MAX_RECOMMENDED_DEPTH {
                report.push(
                    IssueSeverity::Info,
                    "DEEP_NESTING",
                    format!("Page '{}' is nested {} levels deep", page.id, depth),
                    pid,
                );
            }

            for child in page.children.iter().rev() {
                stack.push((child, Some(page.id.as_str()), depth + 1));
            }
        }

        if !has_home {
            report.push(
                IssueSeverity::Warning,
                "MISSING_HOME_PAGE",
                "No page has the root path '/'",
                None,
            );
        }

        report
    }
}

/// Depth-first search-and-splice
fn detach(pages: &mut Vec<Page>, id: &str) -> Option<Page> {
    if let Some(index) = pages.iter().position(|p| p.id == id) {
        return Some(pages.remove(index));
    }
    pages
        .iter_mut()
        .find_map(|page| detach(&mut page.children, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sitemap() -> SitemapStructure {
        SitemapStructure::new(vec![
            Page::new("home", "Home", "/"),
            Page::new("about", "About", "/about").with_children(vec![
                Page::new("team", "Team", "/about/team")
                    .with_children(vec![Page::new("jobs", "Jobs", "/about/team/jobs")]),
                Page::new("history", "History", "/about/history"),
            ]),
            Page::new("contact", "Contact", "/contact"),
        ])
    }

    #[test]
    fn test_new_normalizes_parents() {
        let sitemap = sample_sitemap();
        assert_eq!(sitemap.page_count(), 6);
        assert_eq!(
            sitemap.find_page("jobs").unwrap().parent_id.as_deref(),
            Some("team")
        );
        assert_eq!(sitemap.find_page("home").unwrap().parent_id, None);
    }

    #[test]
    fn test_update_page_merges() {
        let mut sitemap = sample_sitemap();
        sitemap
            .update_page(
                "team",
                PageUpdate {
                    title: Some("Our Team".to_string()),
                    priority: Some(8),
                    ..Default::default()
                },
            )
            .unwrap();

        let team = sitemap.find_page("team").unwrap();
        assert_eq!(team.title, "Our Team");
        assert_eq!(team.priority, 8);
        assert_eq!(team.path, "/about/team");
    }

    #[test]
    fn test_update_page_rejects_out_of_range_priority() {
        let mut sitemap = sample_sitemap();
        let before = sitemap.clone();
        let err = sitemap
            .update_page(
                "team",
                PageUpdate {
                    title: Some("Our Team".to_string()),
                    priority: Some(11),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, PageError::InvalidPriority(11));
        assert_eq!(sitemap, before);
        assert!(sitemap
            .update_page("team", PageUpdate { priority: Some(0), ..Default::default() })
            .is_err());
    }

    #[test]
    fn test_ensure_unique_ids() {
        let mut sitemap = sample_sitemap();
        assert!(sitemap.ensure_unique_ids().is_ok());

        sitemap.pages[2].children.push(Page::new("team", "Team again", "/contact/team"));
        assert_eq!(
            sitemap.ensure_unique_ids(),
            Err(PageError::DuplicateId("team".to_string()))
        );
    }

    #[test]
    fn test_update_missing_page_is_not_found() {
        let mut sitemap = sample_sitemap();
        let before = sitemap.clone();
        let err = sitemap.update_page("nope", PageUpdate::default()).unwrap_err();
        assert_eq!(err, PageError::NotFound("nope".to_string()));
        assert_eq!(sitemap, before);
    }

    #[test]
    fn test_add_page_under_parent() {
        let mut sitemap = sample_sitemap();
        let id = sitemap.add_page(Some("about")).unwrap();

        let page = sitemap.find_page(&id).unwrap();
        assert_eq!(page.order, 7);
        assert_eq!(page.parent_id.as_deref(), Some("about"));
        assert_eq!(page.path, "/about/new-page-7");
        assert_eq!(sitemap.find_page("about").unwrap().children.len(), 3);
    }

    #[test]
    fn test_add_page_at_root_and_unknown_parent() {
        let mut sitemap = sample_sitemap();
        let id = sitemap.add_page(None).unwrap();
        assert_eq!(sitemap.pages.last().unwrap().id, id);
        assert_eq!(sitemap.find_page(&id).unwrap().path, "/new-page-7");

        assert!(matches!(
            sitemap.add_page(Some("ghost")),
            Err(PageError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_page_removes_subtree() {
        let mut sitemap = sample_sitemap();
        let removed = sitemap.remove_page("about").unwrap();
        assert_eq!(removed.subtree_size(), 4);
        assert_eq!(sitemap.page_count(), 2);
        assert!(!sitemap.contains("team"));
        assert!(!sitemap.contains("jobs"));
    }

    #[test]
    fn test_move_page_to_new_parent() {
        let mut sitemap = sample_sitemap();
        sitemap.move_page("team", Some("contact"), None).unwrap();

        assert_eq!(sitemap.page_count(), 6);
        let contact = sitemap.find_page("contact").unwrap();
        assert_eq!(contact.children[0].id, "team");
        assert_eq!(contact.children[0].children[0].id, "jobs");
        assert_eq!(
            sitemap.find_page("team").unwrap().parent_id.as_deref(),
            Some("contact")
        );
        assert!(sitemap.validate().is_valid());
    }

    #[test]
    fn test_move_page_reorders_siblings() {
        let mut sitemap = sample_sitemap();
        sitemap.move_page("contact", None, Some(1)).unwrap();

        let ids: Vec<_> = sitemap.pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["contact", "home", "about"]);
        let orders: Vec<_> = sitemap.pages.iter().map(|p| p.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_move_into_own_subtree_is_rejected() {
        let mut sitemap = sample_sitemap();
        let before = sitemap.clone();
        assert_eq!(
            sitemap.move_page("about", Some("jobs"), None),
            Err(PageError::WouldCreateCycle("about".to_string()))
        );
        assert_eq!(
            sitemap.move_page("about", Some("about"), None),
            Err(PageError::WouldCreateCycle("about".to_string()))
        );
        assert_eq!(sitemap, before);
    }

    #[test]
    fn test_move_to_unknown_parent_loses_nothing() {
        let mut sitemap = sample_sitemap();
        assert!(sitemap.move_page("team", Some("ghost"), None).is_err());
        assert_eq!(sitemap.page_count(), 6);
        assert!(sitemap.contains("team"));
    }

    #[test]
    fn test_validate_sample_is_valid() {
        let report = sample_sitemap().validate();
        assert!(report.is_valid());
        assert!(!report.has_code("MISSING_HOME_PAGE"));
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut sitemap = sample_sitemap();
        sitemap.pages.push(Page::new("home", "", "no-slash"));
        sitemap.pages[0].priority = 0;
        sitemap.pages[1].children[0].parent_id = Some("ghost".to_string());

        let report = sitemap.validate();
        assert!(!report.is_valid());
        assert!(report.has_code("DUPLICATE_PAGE_ID"));
        assert!(report.has_code("MISSING_TITLE"));
        assert!(report.has_code("INVALID_PATH"));
        assert!(report.has_code("INVALID_PRIORITY"));
        assert!(report.has_code("INVALID_PARENT"));
    }

    #[test]
    fn test_validate_empty_sitemap() {
        let report = SitemapStructure::default().validate();
        assert!(report.has_code("EMPTY_SITEMAP"));
        assert!(!report.is_valid());
    }
}
