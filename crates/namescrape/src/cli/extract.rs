use std::path::Path;

use anyhow::{bail, Context, Result};
use console::style;
use serde::Serialize;
use tracing::{info, warn};

use namescrape_core::{
    classify_names, ClassificationCache, DocumentStatus, EntityRole, Error, ExtractionPipeline,
    ExtractionResult, Gender, GenderizeClassifier, NormalizedName,
};

use super::{load_registry, OutputFormat};

#[derive(Debug, Serialize)]
struct Row<'a> {
    role: EntityRole,
    source: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<Gender>,
}

pub async fn run(
    roles: &[String],
    rules: Option<&Path>,
    sources: &[String],
    classify: bool,
    format: OutputFormat,
) -> Result<()> {
    // Every role is checked before anything is fetched.
    let roles = roles
        .iter()
        .map(|r| r.parse::<EntityRole>())
        .collect::<Result<Vec<_>, _>>()?;

    let (registry, origin) = load_registry(rules)?;
    info!(%origin, sources = registry.sources.len(), "loaded rules");

    for id in sources {
        if !registry.sources.contains_key(id) {
            bail!(Error::UnknownSource(id.clone()));
        }
    }

    let pipeline = ExtractionPipeline::from_registry(registry)?;

    let mut results = Vec::with_capacity(roles.len());
    for role in roles {
        let result = if sources.is_empty() {
            pipeline.run(role).await
        } else {
            extract_selected(&pipeline, sources, role).await?
        };
        print_summary(&result);
        results.push(result);
    }

    let genders = if classify {
        Some(classify_results(&results).await?)
    } else {
        None
    };

    let rows = collect_rows(&results, genders.as_deref());
    match format {
        OutputFormat::Tsv => print_tsv(&rows, classify),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
    }

    Ok(())
}

async fn extract_selected(
    pipeline: &ExtractionPipeline,
    sources: &[String],
    role: EntityRole,
) -> Result<ExtractionResult> {
    let mut merged = ExtractionResult::new(role);

    for id in sources {
        match pipeline.extract_source(id, role).await {
            Ok(result) => merged.merge(result),
            Err(Error::NoRuleForRole { source_id, role }) => {
                warn!(source = %source_id, %role, "source has no rule for role, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(merged)
}

/// One gender list per result, aligned with `ExtractionResult::pairs`.
async fn classify_results(results: &[ExtractionResult]) -> Result<Vec<Vec<Gender>>> {
    let classifier = GenderizeClassifier::new()?;
    let mut cache = ClassificationCache::new();
    let mut all = Vec::with_capacity(results.len());

    for result in results {
        let names: Vec<NormalizedName> = result.pairs().map(|(_, name)| name.clone()).collect();
        let genders = classify_names(&classifier, &mut cache, &names)
            .await
            .context("gender classification failed")?;
        all.push(genders);
    }

    Ok(all)
}

fn collect_rows<'a>(
    results: &'a [ExtractionResult],
    genders: Option<&[Vec<Gender>]>,
) -> Vec<Row<'a>> {
    let mut rows = Vec::new();

    for (i, result) in results.iter().enumerate() {
        let per_name = genders.and_then(|g| g.get(i));
        for (j, (source, name)) in result.pairs().enumerate() {
            rows.push(Row {
                role: result.role,
                source,
                name: name.as_str(),
                gender: per_name.and_then(|g| g.get(j).copied()),
            });
        }
    }

    rows
}

fn print_tsv(rows: &[Row<'_>], with_gender: bool) {
    if with_gender {
        println!("role\tsource\tname\tgender");
    } else {
        println!("role\tsource\tname");
    }

    for row in rows {
        if with_gender {
            let gender = row.gender.unwrap_or(Gender::Unknown);
            println!("{}\t{}\t{}\t{gender}", row.role, row.source, row.name);
        } else {
            println!("{}\t{}\t{}", row.role, row.source, row.name);
        }
    }
}

fn print_summary(result: &ExtractionResult) {
    for (source, names) in &result.names {
        let (succeeded, attempted) = result.document_counts(source);
        let marker = if succeeded == attempted {
            style("●").green()
        } else {
            style("●").yellow()
        };
        eprintln!(
            "{marker} {}/{}: {} names ({succeeded}/{attempted} documents)",
            result.role,
            style(source).bold(),
            names.len()
        );
    }

    for report in result.failed_documents() {
        if let DocumentStatus::Failed { stage, error } = &report.status {
            eprintln!(
                "  {} {} failed while {stage}: {error}",
                style("✗").red(),
                report.url
            );
        }
    }
}
