//! Rule-based response resolver
//!
//! Turns free-text user input into a canned reply by walking a single ordered
//! rule table. Precedence is fixed, first match wins:
//!
//! 1. Term lookup: whole-word, case-insensitive match against financial terms
//! 2. Expense extraction: marker word plus the first integer-like amount
//! 3. Topic keywords: substring match against ordered keyword sets
//! 4. Fallback: capability summary with no metadata
//!
//! Overlapping keywords (e.g. "tax" and "scheme" in one message) resolve by
//! table order, not by intent.
//!
//! The resolver is pure: the same input always produces the same output.
//! Callers must not pass empty or whitespace-only input.

pub mod config;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    AlertNotice, ExpenseCategory, ExpenseRecord, Language, ResolvedResponse, ResponseMetadata,
    SchemeEntry, SchemeGroup, SchemeSuggestion, TermEntry,
};

pub use config::{
    default_config_path, load_config, ExpenseConfig, ResponderConfig, TopicConfig, TopicMetadata,
};

/// First integer-like token, optionally prefixed by ₹ or Rs. Thousands separators allowed.
const AMOUNT_PATTERN: &str = r"(?i)(?:₹\s*|\brs\.?\s*)?([0-9]+(?:,[0-9]+)*)";

/// How a rule decides whether it applies
#[derive(Debug)]
enum Matcher {
    /// Any of the term's spellings as a whole word
    WholeWord(Regex),
    /// A marker word plus an extractable amount
    ExpenseIntent { markers: Vec<String>, amount: Regex },
    /// Any keyword as a substring of the lowercased input
    ContainsAny(Vec<String>),
}

/// What a matcher found
enum Hit {
    Plain,
    Expense(ExpenseRecord),
}

impl Matcher {
    fn test(&self, input: &str, lower: &str) -> Option<Hit> {
        match self {
            Matcher::WholeWord(re) => re.is_match(input).then_some(Hit::Plain),
            Matcher::ExpenseIntent { markers, amount } => {
                if !markers.iter().any(|m| lower.contains(m.as_str())) {
                    return None;
                }
                extract_expense(input, lower, amount).map(Hit::Expense)
            }
            Matcher::ContainsAny(keywords) => keywords
                .iter()
                .any(|k| lower.contains(k.as_str()))
                .then_some(Hit::Plain),
        }
    }
}

/// How a rule answers once matched
#[derive(Debug)]
enum Action {
    /// Explain the term at this index of the term list
    Explain(usize),
    /// Confirm an extracted expense using this template
    LogExpense(String),
    Canned {
        response: String,
        metadata: Option<ResponseMetadata>,
    },
}

#[derive(Debug)]
struct Rule {
    name: String,
    matcher: Matcher,
    action: Action,
}

/// Ordered rule table compiled from a [`ResponderConfig`]
#[derive(Debug)]
pub struct ResponseResolver {
    rules: Vec<Rule>,
    terms: Vec<TermEntry>,
    /// Lowercased spellings of sensitive terms, by term index
    sensitive: Vec<(usize, Vec<String>)>,
    schemes: Vec<SchemeEntry>,
    fallback: String,
    fallback_translations: HashMap<String, String>,
    form_confirmation: String,
    monthly_baseline: u64,
    config_path: Option<PathBuf>,
}

impl ResponseResolver {
    /// Create a resolver from the override file if present, else the embedded table
    pub fn new() -> Result<Self> {
        let mut resolver = Self::from_config(load_config(None)?)?;
        resolver.config_path = default_config_path();
        Ok(resolver)
    }

    /// Create a resolver from a specific config file
    pub fn with_config_path(path: &Path) -> Result<Self> {
        let mut resolver = Self::from_config(load_config(Some(path))?)?;
        resolver.config_path = Some(path.to_path_buf());
        Ok(resolver)
    }

    /// Create a resolver from the embedded table only
    pub fn embedded() -> Result<Self> {
        Self::from_config(ResponderConfig::embedded()?)
    }

    /// Compile a rule table
    pub fn from_config(config: ResponderConfig) -> Result<Self> {
        config.validate()?;

        let mut rules = Vec::with_capacity(config.terms.len() + config.topics.len() + 1);
        let mut sensitive = Vec::new();

        for (index, entry) in config.terms.iter().enumerate() {
            let re = whole_word_regex(&entry.term, &entry.aliases)?;
            if entry.sensitive {
                let spellings = std::iter::once(&entry.term)
                    .chain(entry.aliases.iter())
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                sensitive.push((index, spellings));
            }
            rules.push(Rule {
                name: format!("term:{}", entry.term),
                matcher: Matcher::WholeWord(re),
                action: Action::Explain(index),
            });
        }

        rules.push(Rule {
            name: "expense".to_string(),
            matcher: Matcher::ExpenseIntent {
                markers: config
                    .expense
                    .markers
                    .iter()
                    .map(|m| m.trim().to_lowercase())
                    .collect(),
                amount: Regex::new(AMOUNT_PATTERN)?,
            },
            action: Action::LogExpense(config.expense.confirmation.clone()),
        });

        for topic in &config.topics {
            let metadata = match topic.metadata {
                Some(TopicMetadata::Scheme) => Some(ResponseMetadata::Scheme(SchemeSuggestion {
                    names: topic.suggested_schemes.clone(),
                })),
                Some(TopicMetadata::Alert) => Some(ResponseMetadata::Alert(AlertNotice {
                    term: topic.name.clone(),
                    note: topic.alert_note.clone().unwrap_or_default(),
                })),
                None => None,
            };
            rules.push(Rule {
                name: format!("topic:{}", topic.name),
                matcher: Matcher::ContainsAny(
                    topic
                        .keywords
                        .iter()
                        .map(|k| k.trim().to_lowercase())
                        .collect(),
                ),
                action: Action::Canned {
                    response: topic.response.clone(),
                    metadata,
                },
            });
        }

        Ok(Self {
            rules,
            terms: config.terms,
            sensitive,
            schemes: config.schemes,
            fallback: config.fallback,
            fallback_translations: config.fallback_translations,
            form_confirmation: config.expense.form_confirmation,
            monthly_baseline: config.monthly_baseline,
            config_path: None,
        })
    }

    /// Resolve input to an English reply
    pub fn resolve(&self, input: &str) -> ResolvedResponse {
        self.resolve_localized(input, Language::English)
    }

    /// Resolve input, preferring term and fallback text in `language`
    pub fn resolve_localized(&self, input: &str, language: Language) -> ResolvedResponse {
        let lower = input.to_lowercase();

        for rule in &self.rules {
            let Some(hit) = rule.matcher.test(input, &lower) else {
                continue;
            };
            debug!(rule = %rule.name, "Responder rule matched");

            return match (&rule.action, hit) {
                (Action::Explain(index), _) => self.explain(*index, &lower, language),
                (Action::LogExpense(template), Hit::Expense(record)) => {
                    let text = render(
                        template,
                        &[
                            ("amount", record.amount.to_string()),
                            ("category", record.category.to_string()),
                        ],
                    );
                    ResolvedResponse::with_metadata(text, ResponseMetadata::Expense(record))
                }
                (Action::Canned { response, metadata }, _) => self.with_sensitive_alert(
                    ResolvedResponse {
                        response_text: response.clone(),
                        metadata: metadata.clone(),
                    },
                    &lower,
                ),
                // Expense matchers only yield expense hits
                (Action::LogExpense(_), Hit::Plain) => continue,
            };
        }

        debug!("No responder rule matched, using fallback");
        let text = self
            .fallback_translations
            .get(language.code())
            .unwrap_or(&self.fallback);
        self.with_sensitive_alert(ResolvedResponse::text(text.clone()), &lower)
    }

    fn explain(&self, index: usize, lower: &str, language: Language) -> ResolvedResponse {
        let entry = &self.terms[index];
        let text = entry.explanation_in(language).to_string();

        // The matched term itself wins; otherwise any sensitive term in the input
        let alert_term = if entry.sensitive {
            Some(entry)
        } else {
            self.sensitive_in(lower)
        };

        match alert_term {
            Some(term) => ResolvedResponse::with_metadata(text, alert_for(term)),
            None => ResolvedResponse::text(text),
        }
    }

    /// First sensitive term appearing anywhere in the input, plurals included
    fn sensitive_in(&self, lower: &str) -> Option<&TermEntry> {
        self.sensitive
            .iter()
            .find(|(_, spellings)| spellings.iter().any(|s| lower.contains(s.as_str())))
            .map(|(i, _)| &self.terms[*i])
    }

    /// Sensitive terms take over plain and scheme answers. Expense metadata stays.
    fn with_sensitive_alert(
        &self,
        mut response: ResolvedResponse,
        lower: &str,
    ) -> ResolvedResponse {
        if matches!(response.metadata, None | Some(ResponseMetadata::Scheme(_))) {
            if let Some(term) = self.sensitive_in(lower) {
                response.metadata = Some(alert_for(term));
            }
        }
        response
    }

    /// Confirmation for an expense logged through the expense form
    pub fn confirm_expense(&self, record: &ExpenseRecord, month_total: u64) -> ResolvedResponse {
        let text = render(
            &self.form_confirmation,
            &[
                ("amount", record.amount.to_string()),
                ("category", record.category.to_string()),
                ("total", month_total.to_string()),
            ],
        );
        ResolvedResponse::with_metadata(text, ResponseMetadata::Expense(record.clone()))
    }

    /// Spending assumed before any expense is logged in a session
    pub fn monthly_baseline(&self) -> u64 {
        self.monthly_baseline
    }

    /// Terms in lookup order
    pub fn terms(&self) -> &[TermEntry] {
        &self.terms
    }

    /// The full scheme catalog
    pub fn schemes(&self) -> &[SchemeEntry] {
        &self.schemes
    }

    /// Schemes for one beneficiary group
    pub fn schemes_in(&self, group: SchemeGroup) -> Vec<&SchemeEntry> {
        self.schemes.iter().filter(|s| s.group == group).collect()
    }

    /// Look up a scheme by catalog ID
    pub fn scheme(&self, id: &str) -> Option<&SchemeEntry> {
        self.schemes.iter().find(|s| s.id == id)
    }

    /// Rule names in evaluation order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    /// Reload the rule table from disk
    pub fn reload(&mut self) -> Result<()> {
        let path = self.config_path.clone();
        let mut reloaded = Self::from_config(load_config(path.as_deref())?)?;
        reloaded.config_path = path;
        *self = reloaded;
        Ok(())
    }
}

fn alert_for(term: &TermEntry) -> ResponseMetadata {
    ResponseMetadata::Alert(AlertNotice {
        term: term.term.clone(),
        note: term.alert_note.clone().unwrap_or_default(),
    })
}

/// Case-insensitive whole-word regex over a term and its aliases
fn whole_word_regex(term: &str, aliases: &[String]) -> Result<Regex> {
    let alternatives: Vec<String> = std::iter::once(term)
        .chain(aliases.iter().map(String::as_str))
        .map(|s| regex::escape(s.trim()))
        .collect();
    if alternatives.iter().any(String::is_empty) {
        return Err(Error::Config(format!("term '{}' has an empty spelling", term)));
    }
    Ok(Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))?)
}

/// Pull an expense out of text that already contains a marker word.
/// Returns None when there is no positive amount that fits in a u64.
fn extract_expense(input: &str, lower: &str, amount_re: &Regex) -> Option<ExpenseRecord> {
    let digits = amount_re.captures(input)?.get(1)?.as_str().replace(',', "");
    let amount: u64 = digits.parse().ok()?;
    if amount == 0 {
        return None;
    }

    let category = ExpenseCategory::all()
        .iter()
        .copied()
        .find(|c| lower.contains(&c.as_str().to_lowercase()))
        .unwrap_or(ExpenseCategory::Other);

    Some(ExpenseRecord {
        amount,
        category,
        description: input.to_string(),
    })
}

/// Replace `{name}` placeholders
fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}
