use std::fmt::Write as _;
use std::path::PathBuf;

use clap::Args;

use crate::commands::{load_snapshot, CommandResult};

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog TOML file; the built-in demo catalog when omitted.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

pub fn run(args: &CatalogArgs) -> CommandResult {
    let snapshot = match load_snapshot(args.catalog.as_deref()) {
        Ok(snapshot) => snapshot,
        Err(error) => {
            return CommandResult::failure("catalog", "catalog", format!("{error:#}"), 4);
        }
    };

    let mut output = String::new();
    for entry in snapshot.entries() {
        let _ = writeln!(
            output,
            "{:<24} {:<28} {:<12} {:<12} {} keyword(s), {} variable(s)",
            entry.catalog_row,
            entry.service_name,
            match entry.pricing_model {
                fieldquote_core::PricingModel::PerUnit => "per_unit",
                fieldquote_core::PricingModel::FlatPerJob => "flat_per_job",
            },
            entry.unit.label(),
            entry.keywords.len(),
            entry.variable_categories.len(),
        );
    }
    let _ = write!(
        output,
        "catalog: {} service(s), generation {}",
        snapshot.entries().len(),
        snapshot.generation,
    );
    CommandResult { exit_code: 0, output }
}
