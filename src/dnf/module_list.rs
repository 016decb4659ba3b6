//! Parser for `dnf module list` output and the four-way state partition built
//! from it.
//!
//! The listing is one table per repository:
//!
//! ```text
//! CentOS Stream 8 - AppStream
//! Name             Stream      Profiles                Summary
//! container-tools  rhel8 [d][e] common [d]             Most recent container tools
//! python36         3.6 [d][e]  build, common [d]       Python programming language
//!
//! Hint: [d]efault, [e]nabled, [x]disabled, [i]nstalled
//! ```
//!
//! Rows outside a table (repo titles, hints) are ignored.

use std::collections::BTreeMap;

use serde::Serialize;

/// Ordered by precedence: when a module shows up with several streams, the
/// highest state wins its slot in [`ModuleStates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Unknown,
    Default,
    Disabled,
    Enabled,
}

impl ModuleState {
    fn from_markers(markers: &str) -> Self {
        if markers.contains("[e]") {
            Self::Enabled
        } else if markers.contains("[x]") {
            Self::Disabled
        } else if markers.contains("[d]") {
            Self::Default
        } else {
            Self::Unknown
        }
    }
}

/// One row of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStream {
    pub name: String,
    pub stream: String,
    pub profiles: Vec<String>,
    pub state: ModuleState,
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    profiles: Option<usize>,
    summary: Option<usize>,
}

impl Columns {
    fn from_header(header: &str) -> Self {
        Self {
            profiles: header.find("Profiles"),
            summary: header.find("Summary"),
        }
    }
}

pub fn parse_module_list(output: &str) -> Vec<ModuleStream> {
    let mut streams = Vec::new();
    let mut columns: Option<Columns> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("Hint:") {
            columns = None;
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        if tokens.next() == Some("Name") && tokens.next() == Some("Stream") {
            columns = Some(Columns::from_header(line));
            continue;
        }

        if let Some(cols) = columns {
            if let Some(row) = parse_row(line, cols) {
                streams.push(row);
            }
        }
    }

    streams
}

fn parse_row(line: &str, cols: Columns) -> Option<ModuleStream> {
    let mut tokens = line.split_whitespace();
    let name = tokens.next()?;
    let raw_stream = tokens.next()?;

    // Markers normally follow the stream after a space but may be glued on.
    let (stream, mut markers) = match raw_stream.find('[') {
        Some(idx) => (&raw_stream[..idx], raw_stream[idx..].to_string()),
        None => (raw_stream, String::new()),
    };
    for token in tokens.by_ref() {
        if !is_marker(token) {
            break;
        }
        markers.push_str(token);
    }

    Some(ModuleStream {
        name: name.to_string(),
        stream: stream.to_string(),
        profiles: parse_profiles(line, cols),
        state: ModuleState::from_markers(&markers),
    })
}

fn parse_profiles(line: &str, cols: Columns) -> Vec<String> {
    let Some(start) = cols.profiles else {
        return Vec::new();
    };
    let end = cols.summary.unwrap_or(line.len()).min(line.len());
    let Some(column) = line.get(start..end) else {
        return Vec::new();
    };

    column
        .split(',')
        .filter_map(|profile| profile.split_whitespace().next())
        .filter(|profile| !is_marker(profile) && *profile != "...")
        .map(str::to_string)
        .collect()
}

fn is_marker(token: &str) -> bool {
    token.starts_with('[')
        && token.ends_with(']')
        && token
            .chars()
            .all(|c| c == '[' || c == ']' || c.is_ascii_lowercase())
}

/// Known modules split by state. Each module name appears in exactly one
/// partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleStates {
    pub enabled: BTreeMap<String, ModuleStream>,
    pub default: BTreeMap<String, ModuleStream>,
    pub disabled: BTreeMap<String, ModuleStream>,
    pub unknown: BTreeMap<String, ModuleStream>,
}

impl ModuleStates {
    pub fn from_streams(streams: impl IntoIterator<Item = ModuleStream>) -> Self {
        let mut winners: BTreeMap<String, ModuleStream> = BTreeMap::new();
        for stream in streams {
            match winners.get(&stream.name) {
                Some(current) if current.state >= stream.state => {}
                _ => {
                    winners.insert(stream.name.clone(), stream);
                }
            }
        }

        let mut states = Self::default();
        for (name, stream) in winners {
            let partition = match stream.state {
                ModuleState::Enabled => &mut states.enabled,
                ModuleState::Default => &mut states.default,
                ModuleState::Disabled => &mut states.disabled,
                ModuleState::Unknown => &mut states.unknown,
            };
            partition.insert(name, stream);
        }
        states
    }

    pub fn state_of(&self, name: &str) -> Option<ModuleState> {
        if self.enabled.contains_key(name) {
            Some(ModuleState::Enabled)
        } else if self.disabled.contains_key(name) {
            Some(ModuleState::Disabled)
        } else if self.default.contains_key(name) {
            Some(ModuleState::Default)
        } else if self.unknown.contains_key(name) {
            Some(ModuleState::Unknown)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.enabled.len() + self.default.len() + self.disabled.len() + self.unknown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
