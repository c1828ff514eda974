// crates/astra-ledger/src/markup.rs
//
// HtmlSurface: turns views into HTML fragments, one per element key.
//
// Every piece of resident-supplied text (names, roles, notes, proposal
// titles) goes through `escape`. The host page swaps the fragments into the
// containers named by `ElementKey::dom_id`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::RwLock;

use astra_core::Direction;

use crate::balance::BalanceSnapshot;
use crate::view::{DisplaySurface, ElementKey, ProposalRow, TransactionRow, View};

#[derive(Debug, Default)]
pub struct HtmlSurface {
    fragments: RwLock<HashMap<ElementKey, String>>,
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest fragment rendered for `key`.
    pub fn markup(&self, key: ElementKey) -> Option<String> {
        match self.fragments.read() {
            Ok(guard) => guard.get(&key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(&key).cloned(),
        }
    }
}

impl DisplaySurface for HtmlSurface {
    fn render(&self, key: ElementKey, view: View) {
        let html = render_view(&view);
        match self.fragments.write() {
            Ok(mut guard) => {
                guard.insert(key, html);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(key, html);
            }
        }
    }
}

/// Render a single view to an HTML fragment.
pub fn render_view(view: &View) -> String {
    match view {
        View::Balance(snapshot) => balance(snapshot),
        View::Transactions(rows) => transactions(rows),
        View::Suggestions(residents) => {
            let mut out = String::from("<div class=\"astra-suggestions\">");
            for r in residents {
                let _ = write!(
                    out,
                    "<div class=\"astra-suggestion\" data-resident-id=\"{}\"><strong>{}</strong><span class=\"role\">{}</span></div>",
                    r.id,
                    escape(&r.display_name),
                    escape(r.role.as_deref().unwrap_or(""))
                );
            }
            out.push_str("</div>");
            out
        }
        View::Proposals { rows, vote_weight } => proposals(rows, vote_weight.as_ref()),
        View::MarketStats(stats) => format!(
            "<div class=\"astra-market\"><span class=\"supply\">{}</span><span class=\"tx-24h\">{}</span></div>",
            stats.total_supply, stats.tx_count_24h
        ),
        View::Wallet(Some(address)) => format!(
            "<div class=\"astra-wallet connected\"><span class=\"pulse-dot\"></span>WALLET_CONNECTED<div class=\"addr\">{}</div></div>",
            escape(address)
        ),
        View::Wallet(None) => {
            "<div class=\"astra-wallet unbound\">WALLET_UNBOUND<div class=\"hint\">Connect a wallet in your profile to enable claims.</div></div>".to_string()
        }
        View::Hidden => String::new(),
    }
}

fn balance(snapshot: &BalanceSnapshot) -> String {
    if snapshot.is_verified() {
        format!(
            "<span class=\"astra-balance\" data-verified=\"true\">{}</span>",
            snapshot.amount.amount_string()
        )
    } else {
        format!(
            "<span class=\"astra-balance unverified\" data-verified=\"false\" title=\"Ledger unreachable, value not verified\">{}</span><span class=\"badge\">unverified</span>",
            snapshot.amount.amount_string()
        )
    }
}

fn transactions(rows: &[TransactionRow]) -> String {
    if rows.is_empty() {
        return "<div class=\"astra-empty\">No transactions</div>".to_string();
    }

    let mut out = String::new();
    for row in rows {
        let (class, preposition) = match row.direction {
            Direction::Incoming => ("incoming", "from"),
            Direction::Outgoing => ("outgoing", "to"),
        };
        let _ = write!(
            out,
            "<div class=\"astra-tx {}\"><div class=\"kind\">{}</div><div class=\"party\">{} {}</div>",
            class,
            escape(row.kind.label()),
            preposition,
            escape(&row.counterparty)
        );
        if let Some(note) = &row.note {
            let _ = write!(out, "<div class=\"note\">{}</div>", escape(note));
        }
        let _ = write!(
            out,
            "<div class=\"amount\">{}</div><time datetime=\"{}\">{}</time></div>",
            row.signed_amount(),
            row.created_at.to_rfc3339(),
            row.created_at.format("%d %b %H:%M")
        );
    }
    out
}

fn proposals(rows: &[ProposalRow], weight: Option<&astra_core::Astra>) -> String {
    let mut out = String::new();
    if let Some(w) = weight {
        let _ = write!(out, "<div class=\"dao-weight\">Voting power: {}</div>", w);
    }
    if rows.is_empty() {
        out.push_str("<div class=\"astra-empty\">No active proposals</div>");
        return out;
    }
    for row in rows {
        let p = &row.proposal;
        let pct = p.percent_for();
        let _ = write!(
            out,
            "<div class=\"dao-proposal{}\" data-proposal-id=\"{}\"><div class=\"title\">{}</div><div class=\"desc\">{}</div>\
             <div class=\"tally\"><span>YES: {}</span><span>NO: {}</span></div>\
             <div class=\"bar\"><div class=\"yes\" style=\"width: {}%\"></div><div class=\"no\" style=\"width: {}%\"></div></div></div>",
            if row.provisional { " provisional" } else { "" },
            escape(&p.id),
            escape(&p.title),
            escape(&p.description),
            p.votes_for.amount_string(),
            p.votes_against.amount_string(),
            pct,
            100 - pct
        );
    }
    out
}

/// Escape text for inclusion in HTML content and attribute values.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
