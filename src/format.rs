//! Display helpers shared by the trade and event views.

use rust_decimal::{Decimal, RoundingStrategy};

const EVENT_URL_BASE: &str = "https://polymarket.com/event";

/// `"42s ago"`, `"5m ago"`, `"3h ago"`, `"2d ago"`.
pub fn format_time_ago(timestamp: i64, now: i64) -> String {
    let seconds = (now - timestamp).max(0);
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// `$12,346` for amounts of a thousand or more, `$12.34` below that.
pub fn format_usd(amount: Decimal) -> String {
    if amount >= Decimal::ONE_THOUSAND {
        let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        format!("${}", group_thousands(&whole.trunc().to_string()))
    } else {
        let cents = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("${cents:.2}")
    }
}

/// `$2.5M`, `$1.2K`, `$12`; missing volume renders as `$0`.
pub fn format_volume(amount: Option<Decimal>) -> String {
    let Some(amount) = amount else {
        return "$0".into();
    };
    let million = Decimal::from(1_000_000);
    if amount >= million {
        format!("${:.1}M", round(amount / million, 1))
    } else if amount >= Decimal::ONE_THOUSAND {
        format!("${:.1}K", round(amount / Decimal::ONE_THOUSAND, 1))
    } else {
        format!("${:.0}", round(amount, 0))
    }
}

/// Probability price as a whole percentage, `0.655` → `"66%"`.
pub fn format_percent(price: Decimal) -> String {
    format!("{:.0}%", round(price * Decimal::ONE_HUNDRED, 0))
}

pub fn event_url(slug: &str) -> String {
    format!("{EVENT_URL_BASE}/{slug}")
}

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{sign}{out}")
}
