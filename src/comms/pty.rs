//! Console channel: reads lines from stdin, routes them, prints the reply.
//!
//! Lines starting with `/` are commands (`/history`, `/reset`, `/help`);
//! everything else goes to [`ChatRouter::route`]. Runs until the shutdown
//! token is cancelled or stdin closes.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chat::{ChatReply, ChatRouter, HistoryReply};
use crate::error::AppError;

const HELP: &str = "\
commands:
  /history   show the conversation so far
  /reset     clear the conversation
  /help      this text
anything else is sent to the chat router";

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    History,
    Reset,
    Help,
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_line(line: &str) -> Line<'_> {
    match line {
        "/history" => Line::History,
        "/reset" => Line::Reset,
        "/help" => Line::Help,
        cmd if cmd.starts_with('/') => Line::Unknown(cmd),
        text => Line::Message(text),
    }
}

pub async fn run_console(chat: Arc<ChatRouter>, shutdown: CancellationToken) -> Result<(), AppError> {
    info!("console channel started");
    println!("─────────────────────────────────");
    println!(" QueryGenie console  (/help, Ctrl-C to quit)");
    println!("─────────────────────────────────");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!("console channel shutting down");
                break;
            }

            line = lines.next_line() => {
                let input = match line {
                    Err(e) => {
                        warn!("console read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("console stdin closed");
                        break;
                    }
                    Ok(Some(input)) => input,
                };
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }
                debug!(%input, "console received line");

                let out = match parse_line(input) {
                    Line::History => render_history(&chat.history().await),
                    Line::Reset => chat.reset().await.message,
                    Line::Help => HELP.to_string(),
                    Line::Unknown(cmd) => format!("unknown command {cmd}; try /help"),
                    Line::Message(text) => render_reply(&chat.route(text).await),
                };
                println!("{out}");
            }
        }
    }

    Ok(())
}

fn render_reply(reply: &ChatReply) -> String {
    match reply {
        ChatReply::Success(resp) => match (&resp.api_response, &resp.api_source) {
            (Some(record), Some(source)) => {
                let body = serde_json::to_string_pretty(record)
                    .unwrap_or_else(|e| format!("<unprintable record: {e}>"));
                format!("[{source}]\n{body}")
            }
            _ => resp.ai_response.clone(),
        },
        ChatReply::Error(err) => format!("error ({}): {}", err.kind, err.message),
    }
}

fn render_history(reply: &HistoryReply) -> String {
    match reply {
        HistoryReply::Found { conversation_history, .. } => conversation_history
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n"),
        HistoryReply::Empty { message, .. } => message.clone(),
    }
}
