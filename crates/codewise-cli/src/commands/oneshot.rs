//! Single-request commands. Results go to stdout as pretty JSON.

use anyhow::{Context, Result};
use codewise_application::AssistantUseCase;
use colored::Colorize;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub async fn analyze(assistant: &AssistantUseCase, token: &str, file: &Path) -> Result<()> {
    let code = read_source(file)?;
    let result = assistant.analyze(token, &code).await?;
    print_json(&result)
}

pub async fn generate_test(assistant: &AssistantUseCase, token: &str, file: &Path) -> Result<()> {
    let code = read_source(file)?;
    let result = assistant.generate_test(token, &code).await?;
    print_json(&result)
}

pub async fn explain_test(assistant: &AssistantUseCase, token: &str, file: &Path) -> Result<()> {
    let test_code = read_source(file)?;
    let result = assistant.explain_test(token, &test_code).await?;
    print_json(&result)
}

/// Prints whatever the pipeline produced, then fails if any stage failed.
pub async fn pipeline(assistant: &AssistantUseCase, token: &str, file: &Path) -> Result<()> {
    let code = read_source(file)?;
    match assistant.full_pipeline(token, &code).await {
        Ok(result) => print_json(&result),
        Err(err) => {
            if let Some(partial) = &err.partial {
                eprintln!("{}", "Pipeline stopped early; partial result:".yellow());
                print_json(partial)?;
            }
            Err(err.into())
        }
    }
}

pub async fn history(assistant: &AssistantUseCase, token: &str) -> Result<()> {
    let history = assistant.history(token).await?;
    print_json(&history)
}

fn read_source(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
