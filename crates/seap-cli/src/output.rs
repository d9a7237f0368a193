//! Plain-text rendering of deals for the terminal

use chrono::{DateTime, Utc};
use std::fmt::Write;

use seap_core::{board, Credential, Deal};

/// Longest title shown in the compact table
const TITLE_WIDTH: usize = 48;

/// Longest authority shown in the compact table
const AUTHORITY_WIDTH: usize = 28;

/// Format a value as RON with thousands separators, e.g. "1.250.000 RON"
pub fn format_ron(value: Option<f64>) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };

    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}{} RON", if negative { "-" } else { "" }, grouped)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn deadline(deal: &Deal) -> String {
    deal.deadline_days
        .map(|d| format!("{}d", d))
        .unwrap_or_else(|| "-".to_string())
}

/// One row per deal
pub fn table(deals: &[Deal]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<tw$}  {:<aw$}  {:>16}  {:>8}  {}",
        "TITLE",
        "AUTHORITY",
        "VALUE",
        "DEADLINE",
        "CPV",
        tw = TITLE_WIDTH,
        aw = AUTHORITY_WIDTH
    );

    for deal in deals {
        let _ = writeln!(
            out,
            "{:<tw$}  {:<aw$}  {:>16}  {:>8}  {}",
            truncate(&deal.title, TITLE_WIDTH),
            truncate(&deal.authority, AUTHORITY_WIDTH),
            format_ron(deal.value),
            deadline(deal),
            deal.cpv.as_deref().unwrap_or("-"),
            tw = TITLE_WIDTH,
            aw = AUTHORITY_WIDTH
        );
    }

    out
}

/// Deals grouped by urgency
pub fn board_view(deals: &[Deal]) -> String {
    let mut out = String::new();

    for (urgency, column) in board(deals) {
        let _ = writeln!(out, "{} [{}]", urgency.label(), column.len());
        if column.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for deal in column {
            let _ = write!(
                out,
                "  - {} | {} | {}",
                truncate(&deal.title, TITLE_WIDTH),
                format_ron(deal.value),
                deadline(deal)
            );
            if let Some(savings) = deal.savings.filter(|s| *s > 0.0) {
                let _ = write!(out, " | saves {}", format_ron(Some(savings)));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

/// Who the stored credential belongs to and when it lapses.
///
/// Claims are read without checking the signature. A token whose payload
/// does not decode shows as "invalid username".
pub fn identity(credential: &Credential, now: DateTime<Utc>) -> String {
    let Ok(claims) = credential.claims() else {
        return "invalid username\n".to_string();
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        claims.username.as_deref().unwrap_or("invalid username")
    );
    if let Some(expires) = claims.expires_at() {
        if claims.is_expired_at(now) {
            let _ = writeln!(out, "session expired {}", expires.to_rfc3339());
        } else {
            let _ = writeln!(out, "session expires {}", expires.to_rfc3339());
        }
    }
    out
}
