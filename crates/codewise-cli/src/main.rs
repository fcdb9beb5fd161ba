use anyhow::Result;
use clap::{Parser, Subcommand};
use codewise_core::config::DEFAULT_CLI_USER;
use codewise_infrastructure::ConfigService;
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser, Debug)]
#[command(name = "codewise")]
#[command(about = "Codewise - LLM code analysis, pytest generation and chat", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/codewise/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Identity token, raw or as "Bearer <token>"
    #[arg(long, global = true, default_value = DEFAULT_CLI_USER)]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Analyze code for optimality, readability and best practices
    Analyze {
        #[arg(long)]
        file: PathBuf,
    },
    /// Generate a pytest unit test for the code
    GenerateTest {
        #[arg(long)]
        file: PathBuf,
    },
    /// Explain a pytest file to a beginner
    ExplainTest {
        #[arg(long)]
        file: PathBuf,
    },
    /// Analyze, then generate and explain a test if the code is optimal
    Pipeline {
        #[arg(long)]
        file: PathBuf,
    },
    /// Interactive chat with session memory
    Chat,
    /// Print the chat history of the current identity.
    ///
    /// Sessions live in process memory, so a standalone invocation starts
    /// empty. Use `/history` inside `chat` to see the running conversation.
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let config = config_service.get_config()?;
    logging::init_logging(&config.logging);

    let assistant = commands::context::build_assistant(&config)?;
    let token = cli.token.as_str();

    match cli.command {
        Commands::Analyze { file } => commands::oneshot::analyze(&assistant, token, &file).await?,
        Commands::GenerateTest { file } => {
            commands::oneshot::generate_test(&assistant, token, &file).await?
        }
        Commands::ExplainTest { file } => {
            commands::oneshot::explain_test(&assistant, token, &file).await?
        }
        Commands::Pipeline { file } => commands::oneshot::pipeline(&assistant, token, &file).await?,
        Commands::Chat => {
            let request_timeout = commands::context::request_timeout(&config);
            commands::repl::run(&assistant, token, request_timeout).await?
        }
        Commands::History => commands::oneshot::history(&assistant, token).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_defaults_to_cli_user() {
        let cli = Cli::try_parse_from(["codewise", "chat"]).unwrap();
        assert_eq!(cli.token, "cli_user");
        assert_eq!(cli.command, Commands::Chat);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "codewise",
            "pipeline",
            "--file",
            "example.py",
            "--token",
            "Bearer alice",
            "--config",
            "/tmp/codewise.toml",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Pipeline {
                file: PathBuf::from("example.py")
            }
        );
        assert_eq!(cli.token, "Bearer alice");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/codewise.toml")));
    }

    #[test]
    fn test_history_help_notes_process_scope() {
        use clap::CommandFactory;

        let mut cmd = Cli::command();
        let help = cmd
            .find_subcommand_mut("history")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains("process memory"));
        assert!(help.contains("/history"));
    }

    #[test]
    fn test_kebab_case_subcommands() {
        let cli = Cli::try_parse_from(["codewise", "generate-test", "--file", "f.py"]).unwrap();
        assert!(matches!(cli.command, Commands::GenerateTest { .. }));
        assert!(Cli::try_parse_from(["codewise", "analyze"]).is_err());
    }
}
