//! Sinaliza - interpreter workflow for sign-language translation of web pages
//!
//! Terminal front end over the workflow library: site registration for
//! administrators and an interactive session for interpreters.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sinaliza::cli::{Args, Commands};
use sinaliza::config::Config;
use sinaliza::console::{self, SessionCommand};
use sinaliza::forms::{SearchField, TranslationField};
use sinaliza::passage::{SearchCriteria, SearchScope};
use sinaliza::notice::Notice;
use sinaliza::service::{PassageService, PassageServiceFactory};
use sinaliza::site;
use sinaliza::workflow::WorkflowController;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("sinaliza.toml").exists() {
                info!("Found sinaliza.toml in current directory, loading...");
                Config::from_file("sinaliza.toml")?
            } else {
                Config::default()
            }
        }
    };

    if let Some(endpoint) = args.endpoint {
        config.service.endpoint = endpoint;
    }

    match args.command {
        Commands::Check => {
            let service = PassageServiceFactory::create_service(config.service.clone())?;
            let pb = spinner(format!("Contacting {}...", config.service.endpoint));
            let result = service.check_availability().await;
            pb.finish_and_clear();
            match result {
                Ok(()) => println!("Passage service at {} is available", config.service.endpoint),
                Err(e) => {
                    println!("{}", console::render_notice(&Notice::from_error(&e)));
                    return Err(e.into());
                }
            }
        }
        Commands::RegisterSite { url } => {
            let registry = PassageServiceFactory::create_registry(config.service.clone())?;
            let pb = spinner("Registering site...".to_string());
            let result = site::register_site(registry.as_ref(), &url).await;
            pb.finish_and_clear();
            match result {
                Ok(registered) => match registered.site_id {
                    Some(site_id) => println!("Site registered successfully! ID: {}", site_id),
                    None => println!("Site registered successfully!"),
                },
                Err(e) => {
                    println!("{}", console::render_notice(&Notice::from_error(&e)));
                    return Err(e.into());
                }
            }
        }
        Commands::Search { site_id, all } => {
            let service = PassageServiceFactory::create_service(config.service.clone())?;
            let controller = WorkflowController::new(service, config.workflow.clone());
            let criteria = SearchCriteria::parse(&site_id, scope_for(all));

            run_search(&controller, criteria).await;
            println!("{}", console::render_list(&controller.state()));
        }
        Commands::Interpret { site_id, all, interpreter_id } => {
            let service = PassageServiceFactory::create_service(config.service.clone())?;
            let controller = WorkflowController::new(service, config.workflow.clone());
            if let Some(id) = interpreter_id {
                controller.update_translation_form(TranslationField::InterpreterId, &id);
            }
            controller.update_search_form(SearchField::SiteId, &site_id);
            controller.update_search_form(SearchField::Scope, scope_for(all).as_str());

            info!("Starting interpreter session {}", controller.session_id());
            interactive_session(&controller).await?;
        }
    }

    Ok(())
}

fn scope_for(all: bool) -> SearchScope {
    if all { SearchScope::All } else { SearchScope::Single }
}

async fn run_search(controller: &WorkflowController, criteria: SearchCriteria) {
    let pb = spinner("Searching passages...".to_string());
    // Failures are reported through the controller notice.
    let _ = controller.search(criteria).await;
    pb.finish_and_clear();
    print_notice(controller);
}

async fn interactive_session(controller: &WorkflowController) -> Result<()> {
    let criteria = controller.search_form().criteria();
    run_search(controller, criteria).await;
    print_overview(controller);
    println!("{}", console::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_prompt(controller);
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match SessionCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        match command {
            SessionCommand::Quit => break,
            SessionCommand::Help => println!("{}", console::HELP),
            SessionCommand::List => println!("{}", console::render_list(&controller.state())),
            SessionCommand::Show => print_selected(controller),
            SessionCommand::Select(index) => {
                if index < controller.batch().len() {
                    controller.select(index);
                    print_selected(controller);
                } else {
                    println!("No passage #{} in the current batch", index + 1);
                }
            }
            SessionCommand::Next => {
                if controller.select_next() {
                    print_selected(controller);
                } else {
                    println!("Already at the last passage");
                }
            }
            SessionCommand::Interpreter(id) => {
                controller.update_translation_form(TranslationField::InterpreterId, &id);
                println!("Interpreter id set to {}", id);
            }
            SessionCommand::Submit(video_url) => {
                controller.update_translation_form(TranslationField::VideoUrl, &video_url);
                let pb = spinner("Registering video...".to_string());
                let result = controller.submit_translation(controller.translation_form()).await;
                pb.finish_and_clear();
                print_notice(controller);
                if let Err(e) = result {
                    warn!("Submission failed: {}", e);
                } else {
                    print_selected(controller);
                }
            }
            SessionCommand::Search { site_id, scope } => {
                controller.update_search_form(SearchField::SiteId, &site_id);
                if let Some(scope) = scope {
                    controller.update_search_form(SearchField::Scope, scope.as_str());
                }
                let criteria = controller.search_form().criteria();
                run_search(controller, criteria).await;
                print_overview(controller);
            }
        }
    }

    info!(
        "Session {} finished: {} translated, {} pending",
        controller.session_id(),
        controller.translated_count(),
        controller.pending_count()
    );
    Ok(())
}

fn print_notice(controller: &WorkflowController) {
    if let Some(notice) = controller.take_notice() {
        println!("{}", console::render_notice(&notice));
    }
}

fn print_overview(controller: &WorkflowController) {
    let state = controller.state();
    if state.batch.is_empty() {
        return;
    }
    println!("{}", console::render_list(&state));
    print_selected(controller);
}

fn print_selected(controller: &WorkflowController) {
    if let Some(passage) = controller.selected() {
        println!("\n{}\n", console::render_passage(&passage));
    }
}

fn print_prompt(controller: &WorkflowController) {
    let form = controller.translation_form();
    let interpreter = if form.interpreter_id.is_empty() { "?" } else { form.interpreter_id.as_str() };
    match controller.selected() {
        Some(passage) => println!(
            "interpreter {} | passage #{} of {} >",
            interpreter,
            passage.index + 1,
            controller.batch().len()
        ),
        None => println!("interpreter {} | no batch >", interpreter),
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".sinaliza").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "sinaliza.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("sinaliza.log").display());

    Ok(())
}
