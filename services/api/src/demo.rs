use crate::infra::{load_survey, parse_variant, InMemoryDraftStore, InMemoryResponseRepository};
use clap::Args;
use lpc_survey::config::{AppConfig, SurveyConfig};
use lpc_survey::error::AppError;
use lpc_survey::workflows::survey::selection::{format_dollars, FUNDING_CEILING};
use lpc_survey::workflows::survey::{
    Answer, DraftStore, FieldSpec, FieldValue, FileDraftStore, Project, ProjectCatalog, ProjectId,
    Rating, ScoringVariant, SurveyIntakeService, SurveyWizard, Transition, WizardError,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// Scoring variant to describe (defaults to SURVEY_VARIANT)
    #[arg(long, value_parser = parse_variant)]
    pub(crate) variant: Option<String>,
    /// Load the slate from a CSV or JSON file instead of the built-in Brockport slate
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Emit the catalog as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Reviewer name recorded on the submission
    #[arg(long, default_value = "Demo Reviewer")]
    pub(crate) reviewer: String,
    /// Scoring variant to evaluate with (defaults to SURVEY_VARIANT)
    #[arg(long, value_parser = parse_variant)]
    pub(crate) variant: Option<String>,
    /// Load the slate from a CSV or JSON file instead of the built-in Brockport slate
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Project ids the reviewer recuses from (repeatable)
    #[arg(long = "recuse")]
    pub(crate) recuse: Vec<u32>,
    /// Back drafts up under this directory (defaults to SURVEY_DRAFT_DIR)
    #[arg(long, conflicts_with = "in_memory_drafts")]
    pub(crate) draft_dir: Option<PathBuf>,
    /// Keep drafts in memory so nothing is written to disk
    #[arg(long)]
    pub(crate) in_memory_drafts: bool,
}

/// Environment settings with the command-line overrides applied.
fn survey_config(
    variant: Option<String>,
    catalog: Option<PathBuf>,
) -> Result<SurveyConfig, AppError> {
    let mut survey = AppConfig::load()?.survey;
    if let Some(variant) = variant {
        survey.variant = variant;
        survey.variant_path = None;
    }
    if catalog.is_some() {
        survey.catalog_path = catalog;
    }
    Ok(survey)
}

/// Directory the demo backs drafts up to, or `None` to keep them in memory.
fn draft_location(
    draft_dir: Option<PathBuf>,
    in_memory: bool,
    survey: &SurveyConfig,
) -> Option<PathBuf> {
    if in_memory {
        return None;
    }
    Some(draft_dir.unwrap_or_else(|| survey.draft_dir.clone()))
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let CatalogArgs {
        variant,
        catalog,
        json,
    } = args;
    let (catalog, variant) = load_survey(&survey_config(variant, catalog)?)?;

    if json {
        let payload = serde_json::json!({
            "variant": variant,
            "projects": catalog.projects(),
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => println!("Catalog unavailable as JSON: {err}"),
        }
        return Ok(());
    }

    println!(
        "{} projects | variant {} (max score {}, High >= {}, Medium >= {})",
        catalog.len(),
        variant.name,
        variant.max_score(),
        variant.cutoffs.high,
        variant.cutoffs.medium
    );
    for project in catalog.projects() {
        render_project(project);
    }

    println!("\nChecklists:");
    for group in &variant.checklist_groups {
        println!(
            "  - {} ({} statements + \"does not align\")",
            group.label,
            group.statement_count()
        );
    }
    println!("Ratings: {}", field_labels(&variant.rating_fields));
    if !variant.priority_fields.is_empty() {
        println!("Priorities: {}", field_labels(&variant.priority_fields));
    }

    Ok(())
}

fn render_project(project: &Project) {
    println!(
        "{:>3}. {} | {} | request {} of {}",
        project.id,
        project.title,
        project.location,
        format_dollars(project.funding_request),
        format_dollars(project.total_cost)
    );
    for option in &project.options {
        println!(
            "       option {}: {} (request {} of {})",
            option.key,
            option.label,
            format_dollars(option.funding_request),
            format_dollars(option.total_cost)
        );
    }
}

fn field_labels(fields: &[FieldSpec]) -> String {
    fields
        .iter()
        .map(|field| field.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        reviewer,
        variant,
        catalog,
        recuse,
        draft_dir,
        in_memory_drafts,
    } = args;
    let survey = survey_config(variant, catalog)?;
    let (catalog, variant) = load_survey(&survey)?;

    let location = draft_location(draft_dir, in_memory_drafts, &survey);
    let drafts: Arc<dyn DraftStore> = match location {
        Some(dir) => Arc::new(FileDraftStore::new(dir, &reviewer)),
        None => Arc::new(InMemoryDraftStore::default()),
    };

    println!(
        "LPC project survey demo ({} projects, variant {})",
        catalog.len(),
        variant.name
    );

    let mut wizard = SurveyWizard::new(catalog.clone(), variant.clone()).with_drafts(drafts);
    if wizard.resume() {
        println!("- Resumed a saved draft for {}", wizard.reviewer_name());
    }
    if let Err(err) = wizard
        .set_reviewer_name(&reviewer)
        .and_then(|()| wizard.request(Transition::Start))
    {
        println!("  Could not start the survey: {err}");
        return Ok(());
    }

    while let Some(project) = wizard.current_project().cloned() {
        let outcome = if recuse.contains(&project.id.0) {
            wizard
                .request_recusal(project.id, true)
                .and_then(|_| wizard.confirm())
                .map(|_| "recused".to_string())
        } else {
            evaluate(&mut wizard, &project, &variant)
                .and_then(|()| wizard.request(Transition::Next))
                .map(|_| {
                    format!(
                        "score {} ({})",
                        wizard.score(project.id).unwrap_or(0),
                        wizard
                            .category(project.id)
                            .map(|category| category.label())
                            .unwrap_or("Low")
                    )
                })
        };

        match outcome {
            Ok(summary) => println!("- Project {}: {} -> {summary}", project.id, project.title),
            Err(err) => {
                println!("  Evaluation of project {} stopped: {err}", project.id);
                return Ok(());
            }
        }
    }

    choose_projects(&mut wizard, &catalog);
    println!(
        "\nSelected total {} ({:?})",
        format_dollars(wizard.total()),
        wizard.range_status()
    );

    let repository = Arc::new(InMemoryResponseRepository::default());
    let intake = SurveyIntakeService::new(repository);
    match wizard.submit(&intake) {
        Ok(receipt) => {
            println!(
                "- Submitted as {} (reference {})",
                receipt.id.0, receipt.submission_id
            );
            match intake.responses() {
                Ok(responses) => match serde_json::to_string_pretty(&responses) {
                    Ok(json) => println!("  Stored responses:\n{json}"),
                    Err(err) => println!("  Stored responses unavailable: {err}"),
                },
                Err(err) => println!("  Stored responses unavailable: {err}"),
            }
        }
        Err(err) => println!("  Submission refused: {err}"),
    }

    Ok(())
}

/// Deterministic answers that vary with the project so the ranking is not flat.
fn evaluate(
    wizard: &mut SurveyWizard,
    project: &Project,
    variant: &ScoringVariant,
) -> Result<(), WizardError> {
    let seed = project.id.0 as usize;
    for group in &variant.checklist_groups {
        let picks = 1 + seed % group.sentinel.max(1);
        for index in 0..picks.min(group.sentinel) {
            wizard.toggle_checklist_option(project.id, &group.key, index, true)?;
        }
    }

    let ratings = [Rating::High, Rating::Medium, Rating::Low];
    for (offset, field) in variant.rating_fields.iter().enumerate() {
        let rating = ratings[(seed + offset) % ratings.len()];
        wizard.set_evaluation_field(project.id, &field.key, FieldValue::Rating(Some(rating)))?;
    }
    for (offset, field) in variant.priority_fields.iter().enumerate() {
        let answer = if (seed + offset) % 2 == 0 {
            Answer::Yes
        } else {
            Answer::No
        };
        wizard.set_evaluation_field(project.id, &field.key, FieldValue::Priority(Some(answer)))?;
    }
    Ok(())
}

/// Greedy pick by score that stops once the total is inside the funding window.
fn choose_projects(wizard: &mut SurveyWizard, catalog: &ProjectCatalog) {
    let ranked: Vec<ProjectId> = wizard
        .ranked_projects()
        .into_iter()
        .map(|project| project.id)
        .collect();

    for id in ranked {
        if wizard.in_range() {
            break;
        }
        let Some(project) = catalog.get(id) else {
            continue;
        };
        let recused = wizard.evaluation(id).map_or(false, |evaluation| evaluation.recused);
        if recused {
            continue;
        }

        let amount = project
            .options
            .first()
            .map_or(project.funding_request, |option| option.funding_request);
        if wizard.total() + amount > FUNDING_CEILING {
            continue;
        }

        if wizard.set_selection(id, true).is_err() {
            continue;
        }
        if let Some(option) = project.options.first() {
            if wizard.set_option(id, &option.key).is_err() {
                let _ = wizard.set_selection(id, false);
                continue;
            }
        }
        println!(
            "- Fund project {} ({}) -> running total {}",
            id,
            format_dollars(amount),
            format_dollars(wizard.total())
        );
    }
}
