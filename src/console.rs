//! Terminal rendering and command parsing for the interactive interpreter session.

use crate::notice::{Notice, Severity};
use crate::passage::{Passage, SearchScope, SiteInfo};
use crate::workflow::WorkflowState;

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    List,
    Show,
    /// Zero-based index; typed by the user as a 1-based number
    Select(usize),
    Next,
    Submit(String),
    Interpreter(String),
    Search { site_id: String, scope: Option<SearchScope> },
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Err("empty command".to_string());
        };
        let rest: Vec<&str> = parts.collect();

        match command.to_lowercase().as_str() {
            "list" | "ls" => Ok(Self::List),
            "show" => Ok(Self::Show),
            "next" | "n" => Ok(Self::Next),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            "select" | "s" => {
                let number = rest
                    .first()
                    .and_then(|n| n.parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| "usage: select <passage number>".to_string())?;
                Ok(Self::Select(number - 1))
            }
            "submit" => match rest.as_slice() {
                [url] => Ok(Self::Submit(url.to_string())),
                _ => Err("usage: submit <video url>".to_string()),
            },
            "interpreter" => match rest.as_slice() {
                [id] => Ok(Self::Interpreter(id.to_string())),
                _ => Err("usage: interpreter <id>".to_string()),
            },
            "search" => {
                let mut site_id = String::new();
                let mut scope = None;
                for arg in rest {
                    match SearchScope::parse(arg) {
                        Some(parsed) => scope = Some(parsed),
                        None => site_id = arg.to_string(),
                    }
                }
                Ok(Self::Search { site_id, scope })
            }
            other => Err(format!("unknown command '{}', type 'help'", other)),
        }
    }
}

pub const HELP: &str = "\
Commands:
  list                 list passages in the current batch
  show                 show the selected passage
  select <n>           select passage number n
  next                 select the following passage
  submit <video url>   register the video for the selected passage
  interpreter <id>     set the interpreter id
  search [site] [all|single]
                       fetch a new batch
  help                 show this help
  quit                 leave the session";

pub fn render_notice(notice: &Notice) -> String {
    let marker = match notice.severity {
        Severity::Success => "ok",
        Severity::Info => "info",
        Severity::Warning => "warn",
        Severity::Error => "error",
    };
    format!("[{}] {}", marker, notice.message)
}

pub fn render_site(site: &SiteInfo) -> String {
    format!("Site {}: {}", site.site_id, site.site_url)
}

pub fn render_list(state: &WorkflowState) -> String {
    if state.batch.is_empty() {
        return "No passages loaded.".to_string();
    }

    let mut lines = Vec::with_capacity(state.batch.len() + 2);
    if let Some(site) = &state.site_info {
        lines.push(render_site(site));
    }
    lines.push(format!(
        "Passages found: {} ({} pending)",
        state.batch.len(),
        state.pending_count()
    ));
    for passage in &state.batch {
        let cursor = if passage.index == state.selected_index { ">" } else { " " };
        lines.push(format!(
            "{} #{:<3} ID {:<8} [{}] {}",
            cursor,
            passage.index + 1,
            passage.passage_id,
            passage.status.label(),
            passage.preview(PREVIEW_CHARS).replace('\n', " ")
        ));
    }
    lines.join("\n")
}

pub fn render_passage(passage: &Passage) -> String {
    let mut out = format!(
        "Passage #{} - ID: {} [{}]\n",
        passage.index + 1,
        passage.passage_id,
        passage.status.label()
    );
    if let Some(snapshot) = &passage.snapshot_name {
        out.push_str(&format!("Snapshot: {}\n", snapshot));
    }
    out.push_str("Content:\n");
    out.push_str(&passage.content);
    if passage.is_translated() {
        out.push_str("\n(This passage has already been translated.)");
    }
    out
}
