use std::path::Path;

use anyhow::Result;
use console::style;

use namescrape_core::RuleRegistry;

use super::load_registry;

pub fn run_list(rules: Option<&Path>) -> Result<()> {
    let (registry, origin) = load_registry(rules)?;

    if registry.is_empty() {
        eprintln!("{} No sources configured in {origin}", style("○").dim());
        return Ok(());
    }

    for id in registry.source_ids() {
        for role in registry.roles_of(id) {
            let source = registry.source(id, role)?;
            println!(
                "{id}\t{role}\t{}\t{}",
                source.rule.structural_mode,
                source.document_count()
            );
        }
    }

    Ok(())
}

/// Loading already validates; this only reports.
pub fn run_check(rules: Option<&Path>) -> Result<()> {
    let (registry, origin) = load_registry(rules)?;

    let (rule_count, document_count) = rule_counts(&registry);

    eprintln!("{} Rules OK: {origin}", style("●").green());
    eprintln!("  Sources: {}", registry.sources.len());
    eprintln!("  Rules: {rule_count}");
    eprintln!("  Documents: {document_count}");

    Ok(())
}

/// `(rules, documents)` across every source and role.
fn rule_counts(registry: &RuleRegistry) -> (usize, usize) {
    registry
        .sources
        .values()
        .flat_map(|source| source.roles.values())
        .fold((0, 0), |(rules, documents), config| {
            (rules + 1, documents + config.documents.len())
        })
}
