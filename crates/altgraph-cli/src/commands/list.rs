//! List command implementation.

use crate::cli::ListArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use altgraph_domain::is_valid_ip;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_refresh::RefreshCoordinator;
use altgraph_store::IdentityStore;
use serde::Serialize;

/// Identities per page
pub const PAGE_SIZE: usize = 20;

/// One listed identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    /// Stored key
    pub identity: String,
    /// Size of its group
    pub alts: usize,
    /// IPs carried by its group
    pub ips: usize,
}

/// One page of tracked identities
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPage {
    /// 1-based page number
    pub page: usize,
    /// Number of pages
    pub total_pages: usize,
    /// Number of listed identities across all pages
    pub total: usize,
    /// Identities on this page
    pub entries: Vec<ListEntry>,
}

/// Page `page` of the store's identities, sorted, IP-shaped keys excluded
///
/// An empty store has an empty first page. Any other page past the end is
/// not found.
pub fn paginate(store: &IdentityStore, page: usize, per_page: usize) -> Result<ListPage> {
    if page == 0 {
        return Err(CliError::InvalidInput("pages start at 1".to_string()));
    }
    let per_page = per_page.max(1);

    let identities: Vec<(&String, usize, usize)> = store
        .iter()
        .filter(|(identity, _)| !is_valid_ip(identity))
        .map(|(identity, record)| (identity, record.alts.len(), record.ips.len()))
        .collect();
    let total = identities.len();
    let total_pages = total.div_ceil(per_page);

    if page > total_pages.max(1) {
        return Err(CliError::NotFound(format!("page {} (of {})", page, total_pages)));
    }

    let entries = identities
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .map(|(identity, alts, ips)| ListEntry {
            identity: identity.clone(),
            alts,
            ips,
        })
        .collect();

    Ok(ListPage {
        page,
        total_pages,
        total,
        entries,
    })
}

/// Execute the list command.
pub async fn execute_list<F, G>(
    args: ListArgs,
    coordinator: &RefreshCoordinator<F, G>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    let store = coordinator.snapshot().await;
    let page = paginate(&store, args.page, PAGE_SIZE)?;
    println!("{}", formatter.format_listing(&page)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use altgraph_domain::GroupRecord;
    use chrono::Utc;

    fn store_with(names: &[&str]) -> IdentityStore {
        let mut store = IdentityStore::in_memory();
        for name in names {
            store.insert(*name, GroupRecord::singleton(name, Utc::now()));
        }
        store
    }

    #[test]
    fn test_pages_are_sorted_and_sized() {
        let names: Vec<String> = (0..45).map(|i| format!("user{:02}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let store = store_with(&refs);

        let first = paginate(&store, 1, PAGE_SIZE).unwrap();
        assert_eq!(first.total, 45);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.entries.len(), 20);
        assert_eq!(first.entries[0].identity, "user00");

        let last = paginate(&store, 3, PAGE_SIZE).unwrap();
        assert_eq!(last.entries.len(), 5);
        assert_eq!(last.entries[4].identity, "user44");

        assert!(matches!(paginate(&store, 4, PAGE_SIZE), Err(CliError::NotFound(_))));
    }

    #[test]
    fn test_ip_keys_excluded() {
        let store = store_with(&["alice", "1.2.3.4", "2001:db8::1", "bob"]);
        let page = paginate(&store, 1, PAGE_SIZE).unwrap();
        let names: Vec<&str> = page.entries.iter().map(|e| e.identity.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_empty_store_has_empty_first_page() {
        let page = paginate(&IdentityStore::in_memory(), 1, PAGE_SIZE).unwrap();
        assert!(page.entries.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(paginate(&IdentityStore::in_memory(), 2, PAGE_SIZE).is_err());
    }

    #[test]
    fn test_page_zero_rejected() {
        assert!(matches!(
            paginate(&IdentityStore::in_memory(), 0, PAGE_SIZE),
            Err(CliError::InvalidInput(_))
        ));
    }
}
