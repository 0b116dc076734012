//! Listing commands for incidents, datasets and tickets

use crate::config::Config;
use crate::db::{DatasetFilter, IncidentFilter, Store, TicketFilter};
use crate::models::{DomainRecord, Level, Status};

fn level_marker(level: Level) -> &'static str {
    match level {
        Level::Critical => "🔴",
        Level::High => "🟠",
        Level::Medium => "🟡",
        Level::Low => "🟢",
    }
}

fn id_label(id: Option<i64>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

pub async fn cmd_list_incidents(
    config: &Config,
    status: Option<&str>,
    severity: Option<&str>,
) -> anyhow::Result<()> {
    let filter = IncidentFilter {
        status: status.map(str::parse::<Status>).transpose()?,
        severity: severity.map(str::parse::<Level>).transpose()?,
    };

    let store = Store::new(&config.general.database_path).await?;
    let incidents = store.incidents().list(filter).await?;

    if incidents.is_empty() {
        println!("No incidents found.");
        return Ok(());
    }

    println!("Security Incidents ({} total)", incidents.len());
    println!("{:-<70}", "");

    for incident in incidents {
        println!(
            "{} #{} {} [{}]",
            level_marker(incident.severity()),
            id_label(incident.id()),
            incident.title(),
            incident.status()
        );
        println!(
            "  Severity: {} | Date: {} | Reported by: {}",
            incident.severity(),
            incident.date(),
            incident.reported_by()
        );
    }

    Ok(())
}

pub async fn cmd_list_datasets(
    config: &Config,
    category: Option<&str>,
    min_size_mb: Option<f64>,
) -> anyhow::Result<()> {
    if min_size_mb.is_some_and(|mb| !mb.is_finite() || mb < 0.0) {
        anyhow::bail!("--min-size-mb must be a non-negative number");
    }
    let filter = DatasetFilter {
        category: category.map(str::to_string),
        min_size_mb,
    };

    let store = Store::new(&config.general.database_path).await?;
    let datasets = store.datasets().list(filter).await?;

    if datasets.is_empty() {
        println!("No datasets found.");
        return Ok(());
    }

    println!("Datasets ({} total)", datasets.len());
    println!("{:-<70}", "");

    for dataset in datasets {
        println!("• #{} {}", id_label(dataset.id()), dataset.name());
        println!(
            "  Category: {} | Source: {} | Size: {:.2} MB",
            dataset.category(),
            dataset.source(),
            dataset.calculate_size_mb()
        );
    }

    Ok(())
}

pub async fn cmd_list_tickets(
    config: &Config,
    status: Option<&str>,
    priority: Option<&str>,
) -> anyhow::Result<()> {
    let filter = TicketFilter {
        status: status.map(str::parse::<Status>).transpose()?,
        priority: priority.map(str::parse::<Level>).transpose()?,
    };

    let store = Store::new(&config.general.database_path).await?;
    let tickets = store.tickets().list(filter).await?;

    if tickets.is_empty() {
        println!("No tickets found.");
        return Ok(());
    }

    println!("IT Tickets ({} total)", tickets.len());
    println!("{:-<70}", "");

    for ticket in tickets {
        let assignee = if ticket.assigned_to().is_empty() {
            "unassigned"
        } else {
            ticket.assigned_to()
        };
        println!(
            "{} #{} {} [{}]",
            level_marker(ticket.priority()),
            id_label(ticket.id()),
            ticket.title(),
            ticket.status()
        );
        println!(
            "  Priority: {} | Created: {} | Assigned to: {}",
            ticket.priority(),
            ticket.created_date(),
            assignee
        );
    }

    println!();
    println!("Legend: 🔴 Critical | 🟠 High | 🟡 Medium | 🟢 Low");

    Ok(())
}
