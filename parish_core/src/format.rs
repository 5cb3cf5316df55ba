use once_cell::sync::Lazy;
use time::{
    Date, OffsetDateTime, UtcOffset,
    format_description::{self, OwnedFormatItem},
};

use crate::records::Status;

pub static DATE_FORMAT: Lazy<OwnedFormatItem> =
    Lazy::new(|| format_description::parse_owned::<2>("[year]-[month]-[day]").unwrap());

pub static DISPLAY_DATE_FORMAT: Lazy<OwnedFormatItem> = Lazy::new(|| {
    format_description::parse_owned::<2>("[month repr:long] [day padding:none], [year]").unwrap()
});

pub static TIME_FORMAT: Lazy<OwnedFormatItem> = Lazy::new(|| {
    format_description::parse_owned::<2>("[year]-[month]-[day] [hour]:[minute]:[second]").unwrap()
});

pub const MISSING: &str = "—";

pub fn date(date: &Date) -> String {
    date.format(&DISPLAY_DATE_FORMAT).unwrap_or_default()
}

pub fn date_opt(value: Option<&Date>) -> String {
    value.map(date).unwrap_or_else(|| MISSING.to_owned())
}

pub fn iso_date(date: &Date) -> String {
    date.format(&DATE_FORMAT).unwrap_or_default()
}

pub fn time(time: &OffsetDateTime) -> String {
    time.to_offset(UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
        .replace_nanosecond(0)
        .unwrap_or(*time)
        .format(&TIME_FORMAT)
        .unwrap_or_default()
}

/// `₱1,234.50` style amounts.
pub fn currency(amount: f64, symbol: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{:02}", cents % 100)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

impl Tone {
    pub fn class(&self) -> &'static str {
        match self {
            Tone::Neutral => "badge neutral",
            Tone::Info => "badge info",
            Tone::Success => "badge success",
            Tone::Warning => "badge warning",
            Tone::Danger => "badge danger",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub class: &'static str,
}

impl Badge {
    pub fn of<S: Status>(status: &S) -> Self {
        Badge {
            label: status.label(),
            class: status.tone().class(),
        }
    }
}
