use crate::infra::{build_components, completion_config, parse_answer};
use clap::Args;
use mindcheck::error::AppError;
use mindcheck::evaluation::{
    Answer, EvaluationRecord, EvaluationSubmission, QuestionCatalog, UserId,
};

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Answer as QUESTION_ID=VALUE with VALUE between 1 and 5; repeat per question
    #[arg(long = "answer", value_name = "ID=VALUE", value_parser = parse_answer, required = true)]
    pub(crate) answers: Vec<Answer>,
    /// Skip the completion provider and use the deterministic scorer only
    #[arg(long)]
    pub(crate) offline: bool,
    /// Print the stored evaluation as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the completion provider and use the deterministic scorer only
    #[arg(long)]
    pub(crate) offline: bool,
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        answers,
        offline,
        json,
    } = args;

    let components = build_components(&completion_config(offline)?)?;
    let record = components
        .evaluations
        .submit(
            UserId(0),
            EvaluationSubmission {
                answers,
                notes: None,
            },
        )
        .await?;

    if json {
        let rendered = serde_json::to_string_pretty(&record)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        render_record(&record);
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let components = build_components(&completion_config(args.offline)?)?;
    let catalog = QuestionCatalog::standard();

    println!("Mental-health evaluation demo");
    println!(
        "Questionnaire: {} questions, provider {}",
        catalog.len(),
        components.assistant.provider_name()
    );
    for question in catalog.questions() {
        println!(
            "  {:>2}. [w{}] {}",
            question.id.0, question.weight, question.text
        );
    }

    for (user, label, value) in [(1, "Low severity", 1), (2, "Moderate", 3), (3, "High", 5)] {
        let submission = EvaluationSubmission {
            answers: catalog
                .questions()
                .iter()
                .map(|question| Answer {
                    question_id: question.id,
                    value,
                })
                .collect(),
            notes: Some(format!("{label} sample respondent")),
        };

        println!("\n{label} respondent (every answer {value})");
        match components.evaluations.submit(UserId(user), submission).await {
            Ok(record) => render_record(&record),
            Err(err) => println!("  Submission rejected: {err}"),
        }
    }

    Ok(())
}

fn render_record(record: &EvaluationRecord) {
    let weighted: u32 = record
        .answers
        .iter()
        .map(|answer| answer.weighted_score)
        .sum();

    println!(
        "- Evaluation {} -> {} (score {}, source {:?})",
        record.id.0,
        record.result.state.label().to_uppercase(),
        record.result.score,
        record.source
    );
    println!(
        "  {} answers, weighted total {}",
        record.answers.len(),
        weighted
    );
    println!("  Observations: {}", record.result.observations);
    println!("  Recommendations:");
    for item in &record.result.recommendations {
        println!("    - {item}");
    }
}
