use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("seoscope")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("seoscope")
        .styles(CLAP_STYLING)
        .about("Keyword research and content suggestions from search results and a site audit")
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Enable debug logging on stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Writes a default config.toml on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Directory to store the seoscope configuration")
                        .default_value("~/.config/seoscope/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrite an existing config file without asking.")
                        .required(false),
                ),
        )
        .subcommand(
            command!("analyze")
                .about(
                    "Search a keyword, audit an optional site and produce analysis, strategy and \
                summary reports",
                )
                .arg(
                    arg!(-k --"keyword" <KEYWORD>)
                        .required(false)
                        .help("Focus keyword or topic (prompted for when omitted)"),
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("Website to audit (title, meta description, h1-h3)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, markdown, json")
                        .value_parser(["text", "markdown", "md", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--"strict")
                        .required(false)
                        .help("Abort on the first search, audit or stage failure")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"tui")
                        .required(false)
                        .help("Browse the result in a tabbed terminal viewer")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("Config file or directory (default: ~/.config/seoscope/config.toml)"),
                ),
        )
        .subcommand(
            command!("audit")
                .about("Fetch a single page and print its title, meta description and headings")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page to audit"),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("Config file or directory (default: ~/.config/seoscope/config.toml)"),
                ),
        )
}
