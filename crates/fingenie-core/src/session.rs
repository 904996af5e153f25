//! Chat session state
//!
//! A session is an append-only message log plus a loading flag. At most one
//! assistant reply is in flight at a time:
//!
//! ```text
//! Idle --begin_user_turn / begin_expense_turn--> AwaitingReply
//! AwaitingReply --complete_turn--> Idle   (appends one assistant message)
//! AwaitingReply --abandon_turn-->  Idle   (upstream failure, nothing appended)
//! ```
//!
//! Sessions live in memory only.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::{
    ExpenseCategory, ExpenseRecord, Message, ResolvedResponse, ResponseMetadata, Sender,
};

/// Longest title shown in the session list
const MAX_TITLE_CHARS: usize = 40;

/// In-memory conversation with a single in-flight reply
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    title: Option<String>,
    created_at: DateTime<Utc>,
    messages: Vec<Message>,
    awaiting_reply: bool,
    next_seq: u64,
    expenses: Vec<ExpenseRecord>,
}

/// Snapshot for export
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            created_at: Utc::now(),
            messages: Vec::new(),
            awaiting_reply: false,
            next_seq: 0,
            expenses: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// First user message, truncated; "New Chat" until one arrives
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("New Chat")
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True while a reply is pending; submissions are rejected until it lands
    pub fn is_loading(&self) -> bool {
        self.awaiting_reply
    }

    /// Expenses logged in this session, in order
    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    pub fn expense_total(&self) -> u64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Append a user message and start waiting for the reply
    pub fn begin_user_turn(&mut self, content: &str) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        self.ensure_idle()?;

        if self.title.is_none() {
            self.title = Some(truncate_title(content.trim()));
        }
        let message = self.push(Sender::User, content.to_string(), None);
        self.awaiting_reply = true;
        Ok(message)
    }

    /// Append a synthesized user message for a form-logged expense
    pub fn begin_expense_turn(
        &mut self,
        amount: u64,
        category: ExpenseCategory,
    ) -> Result<(Message, ExpenseRecord)> {
        if amount == 0 {
            return Err(Error::InvalidData("Expense amount must be positive".into()));
        }
        self.ensure_idle()?;

        let content = format!("Spent ₹{} on {}", amount, category);
        if self.title.is_none() {
            self.title = Some(content.clone());
        }
        let record = ExpenseRecord {
            amount,
            category,
            description: content.clone(),
        };
        let message = self.push(Sender::User, content, None);
        self.awaiting_reply = true;
        Ok((message, record))
    }

    /// Append the assistant reply for the pending turn
    pub fn complete_turn(&mut self, response: ResolvedResponse) -> Result<Message> {
        if !self.awaiting_reply {
            return Err(Error::NoPendingTurn);
        }
        if let Some(ResponseMetadata::Expense(record)) = &response.metadata {
            self.expenses.push(record.clone());
        }
        let message = self.push(
            Sender::Assistant,
            response.response_text,
            response.metadata,
        );
        self.awaiting_reply = false;
        Ok(message)
    }

    /// Drop the pending turn without a reply
    pub fn abandon_turn(&mut self) {
        self.awaiting_reply = false;
    }

    pub fn transcript(&self) -> Transcript {
        Transcript {
            id: self.id.clone(),
            title: self.title().to_string(),
            created_at: self.created_at,
            messages: self.messages.clone(),
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.awaiting_reply {
            Err(Error::ReplyPending)
        } else {
            Ok(())
        }
    }

    fn push(
        &mut self,
        sender: Sender,
        content: String,
        metadata: Option<ResponseMetadata>,
    ) -> Message {
        let id = format!("msg_{}_{:04}", Utc::now().timestamp_millis(), self.next_seq);
        self.next_seq += 1;
        let message = Message::new(id, sender, content, metadata);
        self.messages.push(message.clone());
        message
    }
}

fn truncate_title(content: &str) -> String {
    if content.chars().count() <= MAX_TITLE_CHARS {
        content.to_string()
    } else {
        let head: String = content.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{}...", head.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::ResponseResolver;

    #[test]
    fn test_user_turn_then_reply() {
        let mut session = ChatSession::new("s1");
        let user = session.begin_user_turn("What is SIP?").unwrap();
        assert_eq!(user.sender, Sender::User);
        assert!(session.is_loading());

        let reply = session
            .complete_turn(ResolvedResponse::text("SIP is..."))
            .unwrap();
        assert_eq!(reply.sender, Sender::Assistant);
        assert!(!session.is_loading());
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.title(), "What is SIP?");
    }

    #[test]
    fn test_second_submit_rejected_while_pending() {
        let mut session = ChatSession::new("s1");
        session.begin_user_turn("What is SIP?").unwrap();

        let err = session.begin_user_turn("And PPF?").unwrap_err();
        assert!(matches!(err, Error::ReplyPending));
        let err = session
            .begin_expense_turn(100, ExpenseCategory::Food)
            .unwrap_err();
        assert!(matches!(err, Error::ReplyPending));
        assert_eq!(session.messages().len(), 1);

        session
            .complete_turn(ResolvedResponse::text("SIP is..."))
            .unwrap();
        session.begin_user_turn("And PPF?").unwrap();
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut session = ChatSession::new("s1");
        assert!(matches!(session.begin_user_turn(""), Err(Error::EmptyInput)));
        assert!(matches!(
            session.begin_user_turn("  \n\t "),
            Err(Error::EmptyInput)
        ));
        assert!(!session.is_loading());
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_complete_without_pending_turn() {
        let mut session = ChatSession::new("s1");
        let err = session
            .complete_turn(ResolvedResponse::text("orphan"))
            .unwrap_err();
        assert!(matches!(err, Error::NoPendingTurn));
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_abandon_turn_appends_nothing() {
        let mut session = ChatSession::new("s1");
        session.begin_user_turn("hello").unwrap();
        session.abandon_turn();
        assert!(!session.is_loading());
        assert_eq!(session.messages().len(), 1);
        session.begin_user_turn("hello again").unwrap();
    }

    #[test]
    fn test_message_ids_unique() {
        let mut session = ChatSession::new("s1");
        for i in 0..20 {
            session.begin_user_turn(&format!("message {}", i)).unwrap();
            session
                .complete_turn(ResolvedResponse::text("ok"))
                .unwrap();
        }
        let mut ids: Vec<&str> = session.messages().iter().map(|m| m.id.as_str()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_expense_form_flow() {
        let resolver = ResponseResolver::embedded().unwrap();
        let mut session = ChatSession::new("s1");

        let (user, record) = session
            .begin_expense_turn(400, ExpenseCategory::Food)
            .unwrap();
        assert_eq!(user.content, "Spent ₹400 on Food");
        assert_eq!(record.amount, 400);

        let total = resolver.monthly_baseline() + session.expense_total() + record.amount;
        let reply = session
            .complete_turn(resolver.confirm_expense(&record, total))
            .unwrap();
        assert!(reply.content.contains("₹2900"));
        assert_eq!(session.expense_total(), 400);
    }

    #[test]
    fn test_zero_expense_rejected() {
        let mut session = ChatSession::new("s1");
        assert!(matches!(
            session.begin_expense_turn(0, ExpenseCategory::Food),
            Err(Error::InvalidData(_))
        ));
        assert!(!session.is_loading());
    }

    #[test]
    fn test_chat_expense_recorded_from_reply_metadata() {
        let resolver = ResponseResolver::embedded().unwrap();
        let mut session = ChatSession::new("s1");
        session.begin_user_turn("spent ₹500 on travel").unwrap();
        session
            .complete_turn(resolver.resolve("spent ₹500 on travel"))
            .unwrap();
        assert_eq!(session.expense_total(), 500);
        assert_eq!(session.expenses()[0].category, ExpenseCategory::Travel);
    }

    #[test]
    fn test_long_title_truncated() {
        let mut session = ChatSession::new("s1");
        assert_eq!(session.title(), "New Chat");
        session
            .begin_user_turn("How should I split my salary between SIP, PPF and an emergency fund?")
            .unwrap();
        assert!(session.title().ends_with("..."));
        assert!(session.title().chars().count() <= MAX_TITLE_CHARS);
    }

    #[test]
    fn test_transcript_snapshot() {
        let mut session = ChatSession::new("s1");
        session.begin_user_turn("What is FD?").unwrap();
        session
            .complete_turn(ResolvedResponse::text("A Fixed Deposit..."))
            .unwrap();
        let transcript = session.transcript();
        assert_eq!(transcript.id, "s1");
        assert_eq!(transcript.title, "What is FD?");
        assert_eq!(transcript.messages.len(), 2);
        let json = serde_json::to_value(&transcript).unwrap();
        assert_eq!(json["messages"][1]["sender"], "assistant");
    }
}
