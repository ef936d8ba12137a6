//! Admin command-line interface

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;

use crate::model::Language;
use crate::service::SurveyService;
use crate::store::Store;
use crate::{export, seed};

#[derive(Parser)]
#[command(name = "anket")]
#[command(about = "Admin tooling for the bilingual customer survey platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the demo surveys
    Seed,
    /// List all surveys
    List,
    /// Show a survey's question tree
    Show {
        /// Survey identifier
        survey_id: String,
        /// Language to display (tr or en)
        #[arg(short, long, default_value = "tr")]
        lang: String,
    },
    /// Delete a survey and all of its responses
    Delete {
        /// Survey identifier
        survey_id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// List the responses recorded for a survey
    Responses {
        /// Survey identifier
        survey_id: String,
    },
    /// Export a survey's responses to an XLSX file
    Export {
        /// Survey identifier
        survey_id: String,
        /// Output file path
        #[arg(short, long, default_value = "responses.xlsx")]
        output: String,
        /// Language for question headers (tr or en)
        #[arg(short, long, default_value = "tr")]
        lang: String,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    let store = Store::open_default().await?;
    let service = SurveyService::with_default_gate(store);

    match cli.command {
        Commands::Seed => seed_command(&service).await,
        Commands::List => list_command(&service).await,
        Commands::Show { survey_id, lang } => {
            show_command(&service, &survey_id, Language::parse_str(&lang)).await
        }
        Commands::Delete { survey_id, force } => delete_command(&service, &survey_id, force).await,
        Commands::Responses { survey_id } => responses_command(&service, &survey_id).await,
        Commands::Export {
            survey_id,
            output,
            lang,
        } => export_command(&service, &survey_id, &output, Language::parse_str(&lang)).await,
    }
}

async fn seed_command(service: &SurveyService) -> Result<()> {
    let ids = seed::seed(service).await?;
    for id in ids {
        println!("{} Created survey {}", "✓".bright_green().bold(), id.bright_green());
    }
    Ok(())
}

async fn list_command(service: &SurveyService) -> Result<()> {
    let summaries = service.list_surveys().await?;
    if summaries.is_empty() {
        println!("No surveys yet. Run {} to create demo data.", "anket seed".bold());
        return Ok(());
    }

    for summary in summaries {
        println!(
            "{}  {} / {}  [{}]  {} questions, {} responses",
            summary.id.bright_cyan(),
            summary.title_tr.bold(),
            summary.title_en,
            summary.survey_type.as_str(),
            summary.question_count,
            summary.response_count
        );
    }
    Ok(())
}

async fn show_command(service: &SurveyService, survey_id: &str, language: Language) -> Result<()> {
    let view = service.load_survey_for_respondent(survey_id, language).await?;

    println!("{} [{}]", view.title.bold(), view.survey_type.as_str());
    for question in &view.questions {
        let marker = if question.required { "*".bright_red().to_string() } else { " ".into() };
        println!(
            "  {}. {}{} ({})",
            question.order,
            question.text,
            marker,
            question.question_type.as_str()
        );
        if let Some(description) = &question.description {
            println!("     {}", description.dimmed());
        }
        for option in &question.options {
            println!("     - {}", option);
        }
    }
    Ok(())
}

async fn delete_command(service: &SurveyService, survey_id: &str, force: bool) -> Result<()> {
    let record = service.get_survey(survey_id).await?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete survey '{}' and all of its responses?",
                record.snapshot.title_tr
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    service.delete_survey(survey_id).await?;
    println!("{} Deleted survey {}", "✓".bright_green().bold(), survey_id);
    Ok(())
}

async fn responses_command(service: &SurveyService, survey_id: &str) -> Result<()> {
    let responses = service.list_responses(survey_id).await?;
    if responses.is_empty() {
        println!("No responses recorded for this survey yet");
        return Ok(());
    }

    for response in responses {
        println!(
            "{}  {}  {} <{}>  {} answers",
            response.id.bright_cyan(),
            response.created_at.format("%Y-%m-%d %H:%M"),
            response.customer_info.full_name.bold(),
            response.customer_info.company_name,
            response.answers.len()
        );
    }
    Ok(())
}

async fn export_command(
    service: &SurveyService,
    survey_id: &str,
    output: &str,
    language: Language,
) -> Result<()> {
    let record = service.get_survey(survey_id).await?;
    let responses = service.list_responses(survey_id).await?;

    export::export_to_file(
        output,
        record.snapshot.title(language),
        &record.snapshot.questions,
        &responses,
        language,
    )?;

    println!(
        "{} Exported {} to {}",
        "✓".bright_green().bold(),
        survey_id,
        output.bold()
    );
    Ok(())
}
