//! Dashboard statistics command handler

use std::collections::BTreeMap;

use crate::config::Config;
use crate::db::Store;
use crate::services::DashboardService;

fn print_breakdown(label: &str, counts: &BTreeMap<String, i64>) {
    if counts.is_empty() {
        return;
    }
    let parts: Vec<String> = counts.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    println!("  {label}: {}", parts.join(", "));
}

pub async fn cmd_stats(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let summary = DashboardService::new(store).summary().await?;

    println!("Dashboard");
    println!("{:-<60}", "");
    println!("Users:     {}", summary.users);
    println!();

    println!(
        "Incidents: {} ({} active)",
        summary.incidents.total, summary.incidents.active
    );
    print_breakdown("Severity", &summary.incidents.by_severity);
    print_breakdown("Status", &summary.incidents.by_status);
    println!();

    println!(
        "Datasets:  {} in {} categories ({:.2} GB)",
        summary.datasets.total, summary.datasets.categories, summary.datasets.total_size_gb
    );
    print_breakdown("Category", &summary.datasets.by_category);
    println!();

    println!(
        "Tickets:   {} ({} open)",
        summary.tickets.total, summary.tickets.open
    );
    print_breakdown("Priority", &summary.tickets.by_priority);
    print_breakdown("Status", &summary.tickets.by_status);

    Ok(())
}
