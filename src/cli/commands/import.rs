//! Bulk CSV import command

use std::path::Path;

use crate::config::Config;
use crate::db::Store;
use crate::services::{CsvImporter, ImportReport};

fn print_report(label: &str, report: Option<ImportReport>) {
    match report {
        Some(r) => println!("  {label:<10} {} imported, {} skipped", r.imported, r.skipped),
        None => println!("  {label:<10} file not found"),
    }
}

pub async fn cmd_import(config: &Config, dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }

    let store = Store::new(&config.general.database_path).await?;
    let summary = CsvImporter::new(store).import_dir(dir).await?;

    println!("Import from {}", dir.display());
    print_report("incidents", summary.incidents);
    print_report("datasets", summary.datasets);
    print_report("tickets", summary.tickets);

    Ok(())
}
