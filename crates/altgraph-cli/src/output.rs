//! Output formatting for the CLI.

use crate::commands::list::ListPage;
use crate::config::OutputFormat;
use crate::error::Result;
use altgraph_domain::{GeoInfo, GroupRecord, OverrideRule};
use altgraph_refresh::RefreshReport;
use altgraph_store::{format_timestamp, StoreStats};
use colored::*;
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Alt names shown per line in a lookup
pub const ALTS_PER_LINE: usize = 3;

/// ISP/org keywords that identify a VPN provider, checked in order
const VPN_PROVIDERS: &[(&str, &str)] = &[
    ("mullvad", "Mullvad"),
    ("proton", "Proton"),
    ("protonvpn", "Proton"),
    ("proton ag", "Proton"),
    ("nordvpn", "NordVPN"),
    ("expressvpn", "ExpressVPN"),
    ("surfshark", "Surfshark"),
    ("cyberghost", "CyberGhost"),
    ("privateinternetaccess", "PIA"),
    ("pia", "PIA"),
    ("private internet access", "PIA"),
    ("ipvanish", "IPVanish"),
    ("tunnelbear", "TunnelBear"),
    ("windscribe", "Windscribe"),
    ("hide.me", "Hide.me"),
    ("vypr", "VyprVPN"),
    ("vyprvpn", "VyprVPN"),
    ("purevpn", "PureVPN"),
    ("hotspot shield", "Hotspot Shield"),
    ("zenmate", "ZenMate"),
    ("astrill", "Astrill"),
    ("ivpn", "IVPN"),
    ("perfect privacy", "Perfect Privacy"),
    ("azirevpn", "AzireVPN"),
];

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The selected output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format one identity's group.
    ///
    /// `geo` holds cached geolocation for whichever of the group's IPs have it.
    pub fn format_group(
        &self,
        identity: &str,
        record: &GroupRecord,
        geo: &BTreeMap<String, GeoInfo>,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_group_json(identity, record, geo),
            OutputFormat::Table => Ok(self.format_group_text(identity, record, geo)),
            OutputFormat::Quiet => Ok(record.alts.iter().cloned().collect::<Vec<_>>().join("\n")),
        }
    }

    fn format_group_json(
        &self,
        identity: &str,
        record: &GroupRecord,
        geo: &BTreeMap<String, GeoInfo>,
    ) -> Result<String> {
        let ips: Vec<serde_json::Value> = record
            .ips
            .iter()
            .map(|ip| match geo.get(ip) {
                Some(info) => serde_json::json!({
                    "ip": ip,
                    "country_code": info.country_code,
                    "region": info.display_region(),
                    "vpn_provider": detect_vpn_provider(
                        info.isp.as_deref().unwrap_or_default(),
                        info.org.as_deref().unwrap_or_default(),
                    ),
                    "proxy": info.proxy,
                    "hosting": info.hosting,
                }),
                None => serde_json::json!({ "ip": ip }),
            })
            .collect();

        let value = serde_json::json!({
            "identity": identity,
            "alts": record.alts,
            "ips": ips,
            "first_seen": record.first_seen.as_ref().map(format_timestamp),
            "last_updated": record.last_updated.as_ref().map(format_timestamp),
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_group_text(
        &self,
        identity: &str,
        record: &GroupRecord,
        geo: &BTreeMap<String, GeoInfo>,
    ) -> String {
        let alts: Vec<String> = record.alts.iter().map(|alt| format_alt_name(alt)).collect();
        let mut lines = vec![self.colorize(
            &format!("{} has {} alts:", format_alt_name(identity), alts.len()),
            "cyan",
        )];
        lines.extend(
            format_alts_grid(&alts, ALTS_PER_LINE)
                .into_iter()
                .map(|line| format!("  {}", line)),
        );

        if !record.ips.is_empty() {
            lines.push(self.colorize(&format!("On {} IPs:", record.ips.len()), "cyan"));
            for ip in &record.ips {
                lines.push(format!("  {}", format_ip_with_geo(ip, geo.get(ip))));
            }
        }

        if let Some(first_seen) = &record.first_seen {
            lines.push(format!("First seen: {}", format_timestamp(first_seen)));
        }
        if let Some(last_updated) = &record.last_updated {
            lines.push(format!("Last updated: {}", format_timestamp(last_updated)));
        }
        lines.join("\n")
    }

    /// Format store statistics.
    pub fn format_stats(
        &self,
        stats: &StoreStats,
        geo_records: usize,
        closure_violations: usize,
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "identities": stats.identities,
                "groups": stats.groups,
                "distinct_ips": stats.distinct_ips,
                "largest_group": stats.largest_group,
                "geo_records": geo_records,
                "closure_violations": closure_violations,
            }))?),
            OutputFormat::Quiet => Ok(stats.identities.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Metric", "Value"]);
                builder.push_record(["Identities".to_string(), stats.identities.to_string()]);
                builder.push_record(["Groups".to_string(), stats.groups.to_string()]);
                builder.push_record(["Distinct IPs".to_string(), stats.distinct_ips.to_string()]);
                builder.push_record(["Largest group".to_string(), stats.largest_group.to_string()]);
                builder.push_record(["Cached geo records".to_string(), geo_records.to_string()]);
                builder.push_record(["Closure violations".to_string(), closure_violations.to_string()]);

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format one page of the identity listing.
    pub fn format_listing(&self, page: &ListPage) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
            OutputFormat::Quiet => Ok(page
                .entries
                .iter()
                .map(|entry| entry.identity.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if page.entries.is_empty() {
                    return Ok(self.colorize("No identities tracked.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Identity", "Alts", "IPs"]);
                for entry in &page.entries {
                    builder.push_record([
                        format_alt_name(&entry.identity),
                        entry.alts.to_string(),
                        entry.ips.to_string(),
                    ]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));

                let mut output = format!(
                    "Tracked identities (page {}/{}):\n{}",
                    page.page, page.total_pages, table
                );
                if page.page < page.total_pages {
                    output.push('\n');
                    output.push_str(&self.info(&format!(
                        "Use `altgraph list {}` for the next page.",
                        page.page + 1
                    )));
                }
                Ok(output)
            }
        }
    }

    /// Format override rules.
    pub fn format_overrides(&self, rules: &[OverrideRule]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let json_rules: Vec<serde_json::Value> = rules
                    .iter()
                    .map(|rule| {
                        serde_json::json!({
                            "main": rule.main,
                            "alts": rule.final_alts(),
                            "ips": rule.ips_pinned.then_some(&rule.pinned_ips),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json_rules)?)
            }
            OutputFormat::Quiet => Ok(rules
                .iter()
                .map(|rule| rule.main.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if rules.is_empty() {
                    return Ok(self.colorize("No override rules loaded.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Main", "Alts", "IPs"]);
                for rule in rules {
                    let alts = rule.final_alts().into_iter().collect::<Vec<_>>().join(", ");
                    let ips = if !rule.ips_pinned {
                        "inherited".to_string()
                    } else if rule.pinned_ips.is_empty() {
                        "(none)".to_string()
                    } else {
                        rule.pinned_ips.iter().cloned().collect::<Vec<_>>().join(", ")
                    };
                    builder.push_record([rule.main.clone(), alts, ips]);
                }
                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a refresh report.
    pub fn format_report(&self, report: &RefreshReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Quiet => Ok(report.group_updates.to_string()),
            OutputFormat::Table => Ok(self.success(&report.summary())),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Display form of a raw username
///
/// `...name` is shown as `name`, `.ASWname` as `ASWname (Web)` and any other
/// `.name` as `name (Cracked)`.
pub fn format_alt_name(name: &str) -> String {
    if let Some(rest) = name.strip_prefix("...") {
        return rest.to_string();
    }
    match name.strip_prefix('.') {
        Some(rest) if rest.starts_with("ASW") => format!("{} (Web)", rest),
        Some(rest) => format!("{} (Cracked)", rest),
        None => name.to_string(),
    }
}

/// Lay names out `per_line` to a line
pub fn format_alts_grid(alts: &[String], per_line: usize) -> Vec<String> {
    alts.chunks(per_line.max(1))
        .map(|chunk| chunk.join(", "))
        .collect()
}

/// VPN provider named by an ISP or organization string, if any
pub fn detect_vpn_provider(isp: &str, org: &str) -> Option<&'static str> {
    let haystack = format!("{} {}", isp, org).to_lowercase();
    VPN_PROVIDERS
        .iter()
        .find(|(keyword, _)| haystack.contains(keyword))
        .map(|(_, provider)| *provider)
}

/// One IP with its cached geolocation
///
/// `[DE] 1.2.3.4 | Berlin (Mullvad) (VPS)`
pub fn format_ip_with_geo(ip: &str, geo: Option<&GeoInfo>) -> String {
    let Some(geo) = geo else {
        return ip.to_string();
    };

    let code = geo
        .country_code
        .as_deref()
        .filter(|code| !code.is_empty())
        .unwrap_or("??");

    let mut parts: Vec<String> = Vec::new();
    if let Some(region) = geo.display_region() {
        parts.push(region.to_string());
    }
    match detect_vpn_provider(
        geo.isp.as_deref().unwrap_or_default(),
        geo.org.as_deref().unwrap_or_default(),
    ) {
        Some(provider) => parts.push(format!("({})", provider)),
        None if geo.proxy => parts.push("(Proxy)".to_string()),
        None => {}
    }
    if geo.hosting {
        parts.push("(VPS)".to_string());
    }

    if parts.is_empty() {
        format!("[{}] {}", code, ip)
    } else {
        format!("[{}] {} | {}", code, ip, parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::list::ListEntry;
    use chrono::{TimeZone, Utc};

    fn record() -> GroupRecord {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        GroupRecord::new(
            ["alice", "bob", ".carol", "dave"].iter().map(|s| s.to_string()).collect(),
            ["1.2.3.4", "5.6.7.8"].iter().map(|s| s.to_string()).collect(),
            Some(ts),
            Some(ts),
        )
    }

    fn berlin_mullvad() -> GeoInfo {
        GeoInfo {
            country_code: Some("DE".into()),
            region_name: Some("Berlin".into()),
            isp: Some("Mullvad VPN AB".into()),
            proxy: true,
            hosting: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_format_alt_name() {
        assert_eq!(format_alt_name("...ghost"), "ghost");
        assert_eq!(format_alt_name(".ASWsteve"), "ASWsteve (Web)");
        assert_eq!(format_alt_name(".steve"), "steve (Cracked)");
        assert_eq!(format_alt_name("steve"), "steve");
    }

    #[test]
    fn test_alts_grid() {
        let alts: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_alts_grid(&alts, 3), vec!["a, b, c", "d"]);
        assert!(format_alts_grid(&[], 3).is_empty());
    }

    #[test]
    fn test_detect_vpn_provider() {
        assert_eq!(detect_vpn_provider("Mullvad VPN AB", ""), Some("Mullvad"));
        assert_eq!(detect_vpn_provider("", "Proton AG"), Some("Proton"));
        assert_eq!(detect_vpn_provider("Deutsche Telekom", "DTAG"), None);
    }

    #[test]
    fn test_ip_line() {
        assert_eq!(
            format_ip_with_geo("1.2.3.4", Some(&berlin_mullvad())),
            "[DE] 1.2.3.4 | Berlin (Mullvad) (VPS)"
        );
        let proxy = GeoInfo {
            country_code: Some("US".into()),
            proxy: true,
            ..Default::default()
        };
        assert_eq!(format_ip_with_geo("5.6.7.8", Some(&proxy)), "[US] 5.6.7.8 | (Proxy)");
        assert_eq!(format_ip_with_geo("9.9.9.9", Some(&GeoInfo::default())), "[??] 9.9.9.9");
        assert_eq!(format_ip_with_geo("9.9.9.9", None), "9.9.9.9");
    }

    #[test]
    fn test_group_text() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let geo = BTreeMap::from([("1.2.3.4".to_string(), berlin_mullvad())]);
        let output = formatter.format_group("alice", &record(), &geo).unwrap();

        assert!(output.starts_with("alice has 4 alts:"));
        assert!(output.contains("carol (Cracked), alice, bob"));
        assert!(output.contains("On 2 IPs:"));
        assert!(output.contains("[DE] 1.2.3.4 | Berlin (Mullvad) (VPS)"));
        assert!(output.contains("  5.6.7.8"));
        assert!(output.contains("First seen: 2024-05-01T12:00:00Z"));
    }

    #[test]
    fn test_group_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let geo = BTreeMap::from([("1.2.3.4".to_string(), berlin_mullvad())]);
        let output = formatter.format_group("alice", &record(), &geo).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["identity"], "alice");
        assert_eq!(value["alts"].as_array().unwrap().len(), 4);
        assert_eq!(value["ips"][0]["vpn_provider"], "Mullvad");
        assert!(value["ips"][1].get("country_code").is_none());
    }

    #[test]
    fn test_group_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_group("alice", &record(), &BTreeMap::new()).unwrap();
        assert_eq!(output.lines().count(), 4);
    }

    #[test]
    fn test_stats_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let stats = StoreStats {
            identities: 4,
            groups: 2,
            distinct_ips: 3,
            largest_group: 3,
        };
        let output = formatter.format_stats(&stats, 7, 0).unwrap();
        assert!(output.contains("Distinct IPs"));
        assert!(output.contains("Cached geo records"));
    }

    #[test]
    fn test_listing_next_page_hint() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let page = ListPage {
            page: 1,
            total_pages: 2,
            total: 21,
            entries: vec![ListEntry {
                identity: ".ASWsteve".into(),
                alts: 2,
                ips: 1,
            }],
        };
        let output = formatter.format_listing(&page).unwrap();
        assert!(output.contains("page 1/2"));
        assert!(output.contains("ASWsteve (Web)"));
        assert!(output.contains("altgraph list 2"));
    }

    #[test]
    fn test_overrides_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let rules = vec![
            OverrideRule::new("eve", ["mallory"]),
            OverrideRule::new("p1", ["p2"]).with_pinned_ips(Vec::<String>::new()),
        ];
        let output = formatter.format_overrides(&rules).unwrap();
        assert!(output.contains("inherited"));
        assert!(output.contains("(none)"));
        assert!(output.contains("eve, mallory"));

        let empty = formatter.format_overrides(&[]).unwrap();
        assert!(empty.contains("No override rules loaded"));
    }

    #[test]
    fn test_report_formats() {
        let report = RefreshReport {
            group_updates: 5,
            persisted: true,
            ..Default::default()
        };
        let quiet = Formatter::new(OutputFormat::Quiet, false);
        assert_eq!(quiet.format_report(&report).unwrap(), "5");

        let json = Formatter::new(OutputFormat::Json, false);
        let value: serde_json::Value =
            serde_json::from_str(&json.format_report(&report).unwrap()).unwrap();
        assert_eq!(value["group_updates"], 5);
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
