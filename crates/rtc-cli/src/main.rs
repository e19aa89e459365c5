#![forbid(unsafe_code)]

mod cmd;
mod http;
mod output;

use clap::{Parser, Subcommand};
use http::UreqTransport;
use output::{CliError, OutputMode, render_error};
use rtc_core::config::resolve_config;
use rtc_core::{ErrorCode, RtcClient};
use std::env;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "rtc",
    author,
    version,
    about = "rtc: comments, subscribers and workflow for OSLC-CM work items",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Server base URL, e.g. https://jazz.example/ccm (overrides RTC_URL).
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Comments",
        about = "Add or show a comment",
        after_help = "EXAMPLES:\n    # Append a comment\n    rtc comment add 161 \"Fixed in build 42\"\n\n    # Show the third comment\n    rtc comment show 161 2 --json"
    )]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Comments",
        about = "List all comments on a work item",
        after_help = "EXAMPLES:\n    # List comments\n    rtc comments 161"
    )]
    Comments(cmd::comment::CommentsArgs),

    #[command(
        next_help_heading = "Subscribers",
        about = "Subscribe people to a work item",
        long_about = "Add one or more people to a work item's subscriber list. \
                      People already subscribed are left untouched and no write \
                      is made when nothing changes.",
        after_help = "EXAMPLES:\n    # Subscribe two people\n    rtc subscribe 161 alice@example.com bob@example.com"
    )]
    Subscribe(cmd::subscriber::SubscribeArgs),

    #[command(
        next_help_heading = "Subscribers",
        about = "Unsubscribe people from a work item",
        after_help = "EXAMPLES:\n    # Remove one person\n    rtc unsubscribe 161 alice@example.com"
    )]
    Unsubscribe(cmd::subscriber::SubscribeArgs),

    #[command(
        next_help_heading = "Subscribers",
        about = "List a work item's subscribers",
        after_help = "EXAMPLES:\n    # List subscribers as JSON\n    rtc subscribers 161 --json"
    )]
    Subscribers(cmd::subscriber::SubscribersArgs),

    #[command(
        next_help_heading = "Workflow",
        about = "List workflow actions available to a work item",
        after_help = "EXAMPLES:\n    # List actions\n    rtc actions 161"
    )]
    Actions(cmd::workflow::WorkflowArgs),

    #[command(
        next_help_heading = "Workflow",
        about = "Look up one workflow action by title",
        after_help = "EXAMPLES:\n    # Find the Resolve action\n    rtc action 161 Resolve"
    )]
    Action(cmd::workflow::ActionArgs),

    #[command(
        next_help_heading = "Workflow",
        about = "List workflow states of a work item",
        after_help = "EXAMPLES:\n    # List states\n    rtc states 161"
    )]
    States(cmd::workflow::WorkflowArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RTC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "rtc=debug,info"
        } else {
            "rtc=info,warn"
        })
    });

    let format = env::var("RTC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let fallback = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let effective = match resolve_config(cli.url.as_deref(), cli.json) {
        Ok(effective) => effective,
        Err(e) => {
            render_error(
                fallback,
                &CliError::with_details(
                    format!("{e:#}"),
                    "Fix or remove the config file",
                    ErrorCode::ConfigParseError.code(),
                ),
            )?;
            return Err(e);
        }
    };
    let output = OutputMode::from_name(&effective.resolved_output).unwrap_or(fallback);

    let Some(url) = effective.url else {
        render_error(
            output,
            &CliError::with_details(
                "no server URL configured",
                "Pass --url, set RTC_URL, or add `url` under [server] in the config file",
                ErrorCode::BadValue.code(),
            ),
        )?;
        anyhow::bail!("no server URL configured");
    };
    debug!(%url, "resolved server");

    let server = &effective.config.server;
    let transport = UreqTransport::new(Duration::from_secs(server.timeout_secs));
    let client = RtcClient::new(&url, transport)
        .map_err(|e| cmd::fail(output, e))?
        .with_headers(server.default_headers())
        .with_paging(effective.config.paging);

    match cli.command {
        Commands::Comment(ref args) => cmd::comment::run_comment(args, &client, output),
        Commands::Comments(ref args) => cmd::comment::run_comments(args, &client, output),
        Commands::Subscribe(ref args) => cmd::subscriber::run_subscribe(args, &client, output),
        Commands::Unsubscribe(ref args) => {
            cmd::subscriber::run_unsubscribe(args, &client, output)
        }
        Commands::Subscribers(ref args) => {
            cmd::subscriber::run_subscribers(args, &client, output)
        }
        Commands::Actions(ref args) => cmd::workflow::run_actions(args, &client, output),
        Commands::Action(ref args) => cmd::workflow::run_action(args, &client, output),
        Commands::States(ref args) => cmd::workflow::run_states(args, &client, output),
    }
}
