//! Subcommand handlers

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use codeloom_core::ai::AiClient;
use codeloom_core::schema::{
    CorrectionMode, Corrector, SchemaApplier, SchemaPipeline, SqlDialect, SqliteExecutor,
};
use codeloom_core::tools::{coding_tools, StdinAnswers};
use codeloom_core::{AppConfig, CodingAgent, CompletionService, ToolFailurePolicy};

use crate::{AgentArgs, SchemaArgs};

fn completion_service(config: &AppConfig) -> Result<Arc<dyn CompletionService>> {
    let client = AiClient::new(config.client_config()).context("Failed to build AI client")?;
    Ok(Arc::new(client))
}

pub async fn run_agent(config: &AppConfig, args: AgentArgs) -> Result<()> {
    let task = match (args.task, args.task_file) {
        (Some(task), _) => task,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read task file {}", path.display()))?,
        (None, None) => anyhow::bail!("either --task or --task-file is required"),
    };
    let workspace = args
        .workspace
        .canonicalize()
        .with_context(|| format!("Workspace {} does not exist", args.workspace.display()))?;

    let mut agent_config = config.agent_config();
    if args.report_tool_errors {
        agent_config.tool_failure = ToolFailurePolicy::Report;
    }
    if args.run_command {
        agent_config.run_completion_command = true;
    }
    if let Some(max_steps) = args.max_steps {
        agent_config.max_steps = max_steps;
    }

    let registry = coding_tools(Arc::new(StdinAnswers))?;
    let agent = CodingAgent::new(completion_service(config)?, Arc::new(registry), agent_config)?;

    info!(workspace = %workspace.display(), "Running agent");
    let outcome = agent.run(task, workspace).await?;

    println!("{}", outcome.summary);
    if let Some(command) = &outcome.command {
        println!("\nSuggested command: {}", command);
    }
    if let Some(output) = &outcome.command_output {
        println!("{}", output);
    }
    Ok(())
}

pub async fn run_schema(config: &AppConfig, args: SchemaArgs) -> Result<()> {
    let diagram = tokio::fs::read_to_string(&args.diagram)
        .await
        .with_context(|| format!("Failed to read diagram {}", args.diagram.display()))?;

    let mut schema_config = config.schema.clone();
    if args.database.is_some() {
        schema_config.database_name = args.database;
    }
    if args.parallel {
        schema_config.parallel_generation = true;
    }
    if args.operator {
        schema_config.correction_mode = CorrectionMode::Operator;
    }
    // Generated DDL has to run on the database it is applied to
    if args.apply_sqlite.is_some() {
        schema_config.dialect = SqlDialect::Sqlite;
    }

    let service = completion_service(config)?;
    let pipeline = SchemaPipeline::new(service.clone(), &schema_config)?;
    let result = pipeline.run(diagram).await?;

    schema_config
        .script_writer()
        .write_to(&result, &args.out)
        .await?;

    let report = match &args.apply_sqlite {
        Some(db_path) => {
            let corrector = match schema_config.correction_mode {
                CorrectionMode::Model => Corrector::Model(service),
                CorrectionMode::Operator => Corrector::Operator(Arc::new(StdinAnswers)),
            };
            let executor = SqliteExecutor::open(db_path)?;
            let mut applier = SchemaApplier::new(executor, corrector, schema_config.max_fix_attempts);
            Some(applier.apply_result(&result).await)
        }
        None => None,
    };

    if args.json {
        let output = serde_json::json!({
            "result": result,
            "apply": report,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "Diagram {:?}: {} CREATE, {} ALTER statements written to {}",
        result.validation_status,
        result.create_statements.len(),
        result.alter_statements.len(),
        args.out.display()
    );
    if let Some(issues) = &result.errors {
        println!("Corrected issues:\n{}", issues.join("\n"));
    }
    if let Some(report) = report {
        println!(
            "Applied {}, corrected {}, abandoned {}",
            report.applied(),
            report.corrected(),
            report.abandoned()
        );
    }
    Ok(())
}
