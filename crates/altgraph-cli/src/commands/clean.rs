//! Clean command implementation.

use crate::cli::CleanArgs;
use crate::error::Result;
use crate::output::Formatter;
use altgraph_domain::traits::{FeedSource, GeoLookup};
use altgraph_refresh::RefreshCoordinator;
use altgraph_resolver::{prune_lone_entries, relocate_ip_identities};
use chrono::Utc;

/// Execute the clean command.
///
/// Without `--ips`, deletes identities that are alone in their group and
/// carry no IPs. With `--ips`, moves identities that are IP addresses into
/// their groups' IP sets. Either way the snapshot is saved if anything
/// changed.
pub async fn execute_clean<F, G>(
    args: CleanArgs,
    coordinator: &RefreshCoordinator<F, G>,
    formatter: &Formatter,
) -> Result<()>
where
    F: FeedSource + Send + Sync,
    G: GeoLookup + Send + Sync,
{
    if args.ips {
        let timestamp = Utc::now();
        let outcome = coordinator
            .maintain(|store| relocate_ip_identities(store, timestamp))
            .await?;
        if outcome.ips_moved == 0 && outcome.records_removed == 0 {
            println!("{}", formatter.success("No IP-shaped identities to relocate."));
        } else {
            println!(
                "{}",
                formatter.success(&format!(
                    "Moved {} IPs in {} groups; removed {} IP entries.",
                    outcome.ips_moved, outcome.groups, outcome.records_removed
                ))
            );
        }
    } else {
        let removed = coordinator.maintain(prune_lone_entries).await?;
        if removed == 0 {
            println!("{}", formatter.success("No empty entries to clean."));
        } else {
            println!(
                "{}",
                formatter.success(&format!("Cleaned {} lone/empty entries.", removed))
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::coordinator;
    use crate::config::OutputFormat;

    #[tokio::test]
    async fn test_clean_lone_entries() {
        let coordinator = coordinator(&[("1.2.3.4", &["alice", "bob"]), ("hwid-9", &["loner"])]);
        coordinator.refresh().await.unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);

        execute_clean(CleanArgs { ips: false }, &coordinator, &formatter)
            .await
            .unwrap();

        assert!(coordinator.lookup("loner").await.is_none());
        assert!(coordinator.lookup("alice").await.is_some());
    }

    #[tokio::test]
    async fn test_clean_ips() {
        let coordinator = coordinator(&[("hwid-1", &["alice", "9.9.9.9"])]);
        coordinator.refresh().await.unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);

        execute_clean(CleanArgs { ips: true }, &coordinator, &formatter)
            .await
            .unwrap();

        let store = coordinator.snapshot().await;
        let alice = store.get("alice").unwrap();
        assert!(!alice.alts.contains("9.9.9.9"));
        assert!(alice.ips.contains("9.9.9.9"));
        assert!(!store.contains("9.9.9.9"));
        assert!(store.closure_violations().is_empty());
    }
}
