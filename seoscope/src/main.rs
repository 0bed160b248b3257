use colored::Colorize;
use seoscope::commands::command_argument_builder;
use seoscope::handlers::{handle_analyze, handle_audit, handle_init, init_tracing, print_banner};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    init_tracing(chosen_command.get_flag("verbose"));

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let result = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handle_init(primary_command),
        Some(("analyze", primary_command)) => handle_analyze(primary_command).await,
        Some(("audit", primary_command)) => handle_audit(primary_command).await,
        // No subcommand provided, just show the banner
        None => return ExitCode::SUCCESS,
        _ => unreachable!("clap should ensure we don't get here"),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
