//! Interactive terminal chat

use std::io::{BufRead, Write};

use anyhow::{anyhow, Context, Result};
use fingenie_core::{ChatSession, ExpenseCategory, Language, ResponseResolver};
use tracing::debug;

use super::{format_reply, parse_language};

const HELP: &str = "Commands:
  /expense <amount> <category>   Log an expense (food, travel, utilities, ...)
  /export                        Print this conversation as JSON
  /help                          Show this help
  /quit                          Leave the chat";

/// Run a chat session over the given input and output.
///
/// Returns the session when input ends or `/quit` is entered.
pub fn cmd_chat<R: BufRead, W: Write>(
    resolver: &ResponseResolver,
    language: &str,
    input: R,
    mut output: W,
) -> Result<ChatSession> {
    let language = parse_language(language)?;
    let mut session = ChatSession::new("terminal");

    writeln!(output, "🧞 FinGenie Bharat ({})", language.label())?;
    writeln!(output, "   Ask about FDs, SIPs, taxes or government schemes. /help for commands.")?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_whitespace().next().unwrap_or_default() {
            "/quit" | "/exit" => break,
            "/help" => writeln!(output, "{}", HELP)?,
            "/export" => {
                writeln!(output, "{}", serde_json::to_string_pretty(&session.transcript())?)?
            }
            "/expense" => match log_expense(resolver, &mut session, line) {
                Ok(reply) => writeln!(output, "\n{}\n", reply)?,
                Err(e) => writeln!(output, "❌ {}", e)?,
            },
            _ => {
                let reply = answer(resolver, &mut session, line, language)?;
                writeln!(output, "\n{}\n", reply)?;
            }
        }
    }

    debug!(messages = session.messages().len(), "Chat ended");
    Ok(session)
}

fn answer(
    resolver: &ResponseResolver,
    session: &mut ChatSession,
    text: &str,
    language: Language,
) -> Result<String> {
    session.begin_user_turn(text)?;
    let resolved = resolver.resolve_localized(text, language);
    let rendered = format_reply(resolver, &resolved);
    session.complete_turn(resolved)?;
    Ok(rendered)
}

fn log_expense(resolver: &ResponseResolver, session: &mut ChatSession, line: &str) -> Result<String> {
    let mut parts = line.split_whitespace().skip(1);
    let usage = || anyhow!("Usage: /expense <amount> <category>");

    let amount: u64 = parts
        .next()
        .ok_or_else(usage)?
        .trim_start_matches('₹')
        .replace(',', "")
        .parse()
        .map_err(|_| usage())?;
    let category: ExpenseCategory = parts
        .next()
        .ok_or_else(usage)?
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let (_, record) = session.begin_expense_turn(amount, category)?;
    let month_total = resolver.monthly_baseline() + session.expense_total() + record.amount;
    let resolved = resolver.confirm_expense(&record, month_total);
    let rendered = format_reply(resolver, &resolved);
    session.complete_turn(resolved)?;
    Ok(rendered)
}
