pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use slidesmith_core::document::MutationPolicy;

#[derive(Debug, Parser)]
#[command(
    name = "slidesmith",
    about = "Slidesmith chat client",
    long_about = "Talk to a running slidesmith-server, inspect and maintain the local \
                  conversation snapshot, and apply accepted proposals to the deck.",
    after_help = "Examples:\n  slidesmith chat \"Suggest an outline for a kickoff deck\"\n  \
                  slidesmith chat --auto-apply \"Tighten slide 2\"\n  slidesmith apply\n  \
                  slidesmith reset --theme corp"
)]
pub struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:3001", help = "Chat server base URL")]
    server: String,
    #[arg(long, default_value = "conversation.json", help = "Conversation snapshot path")]
    file: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Send one chat turn and stream the reply")]
    Chat {
        #[arg(required = true, help = "The user message; multiple words are joined")]
        message: Vec<String>,
        #[arg(long, help = "Apply mutation proposals to the deck automatically")]
        auto_apply: bool,
    },
    #[command(about = "Print the conversation history and current deck")]
    Show,
    #[command(about = "Reset the conversation snapshot to an empty deck")]
    Reset {
        #[arg(long, help = "Theme to carry into the fresh conversation")]
        theme: Option<String>,
    },
    #[command(about = "Apply the most recent applicable proposal from history to the deck")]
    Apply,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { message, auto_apply } => {
            let policy =
                if auto_apply { MutationPolicy::AutoApply } else { MutationPolicy::Manual };
            commands::chat::run(&cli.server, &cli.file, &message.join(" "), policy).await
        }
        Command::Show => commands::show::run(&cli.file),
        Command::Reset { theme } => commands::reset::run(&cli.file, theme),
        Command::Apply => commands::apply::run(&cli.file),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
