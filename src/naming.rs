//! Placeholder substitution for titles and file names.
//!
//! Supported placeholders:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `%RUN%` `%SUBRUN%` `%EVENT%` | run, subrun, event number |
//! | `%CHAN1%` `%CHAN2%` | first and last channel of the range |
//! | `%CRNAME%` `%CRLABEL%` | channel range name and label |
//! | `%STATUS%` | `all`, `bad`, `noisy` or `good` |
//!
//! Numeric placeholders also have a zero-padded form with a `0` prefix
//! (`%0RUN%`, `%0EVENT%`, ...) using the widths in [`PadWidths`].

use crate::models::{ChannelRange, ChannelStatus, Index};
use serde::{Deserialize, Serialize};

/// Status placeholder; its presence in the name template turns on the
/// status split.
pub const STATUS_TOKEN: &str = "%STATUS%";

/// Zero-padding widths for the `%0...%` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadWidths {
    #[serde(default = "default_run_width")]
    pub run_width: usize,
    #[serde(default = "default_subrun_width")]
    pub subrun_width: usize,
    #[serde(default = "default_event_width")]
    pub event_width: usize,
    #[serde(default = "default_channel_width")]
    pub channel_width: usize,
}

impl Default for PadWidths {
    fn default() -> Self {
        Self {
            run_width: default_run_width(),
            subrun_width: default_subrun_width(),
            event_width: default_event_width(),
            channel_width: default_channel_width(),
        }
    }
}

fn default_run_width() -> usize {
    6
}

fn default_subrun_width() -> usize {
    4
}

fn default_event_width() -> usize {
    6
}

fn default_channel_width() -> usize {
    5
}

/// Substitution values for one range (and status partition) of one event.
#[derive(Debug, Clone)]
pub struct NameTokens<'a> {
    pub run: Index,
    pub subrun: Index,
    pub event: Index,
    pub range: &'a ChannelRange,
    pub status: Option<ChannelStatus>,
}

impl<'a> NameTokens<'a> {
    pub fn new(run: Index, subrun: Index, event: Index, range: &'a ChannelRange) -> Self {
        Self {
            run,
            subrun,
            event,
            range,
            status: None,
        }
    }

    pub fn with_status(mut self, status: ChannelStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn status_name(&self) -> &'static str {
        self.status.map(|s| s.as_str()).unwrap_or("all")
    }
}

/// Replaces every placeholder in `template`.
pub fn substitute(template: &str, tokens: &NameTokens<'_>, widths: &PadWidths) -> String {
    if !template.contains('%') {
        return template.to_string();
    }

    let numeric = [
        ("RUN", tokens.run, widths.run_width),
        ("SUBRUN", tokens.subrun, widths.subrun_width),
        ("EVENT", tokens.event, widths.event_width),
        ("CHAN1", tokens.range.first, widths.channel_width),
        ("CHAN2", tokens.range.last, widths.channel_width),
    ];

    let mut out = template.to_string();
    for (key, value, width) in numeric {
        out = out.replace(&format!("%0{key}%"), &format!("{value:0width$}"));
        out = out.replace(&format!("%{key}%"), &value.to_string());
    }
    out = out.replace("%CRNAME%", &tokens.range.name);
    out = out.replace("%CRLABEL%", &tokens.range.label);
    out.replace(STATUS_TOKEN, tokens.status_name())
}

/// Whether a name template asks for status-split output.
pub fn uses_status(template: &str) -> bool {
    template.contains(STATUS_TOKEN)
}
