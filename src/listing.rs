//! Listing rows and the `--filter` rules applied to them.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

use crate::capabilities::DeviceReport;
use crate::discovery::DeviceNode;
use crate::error::Result;

/// One discovered node and the outcome of inspecting it.
#[derive(Debug)]
pub struct DeviceRow {
    pub node: DeviceNode,
    pub outcome: Result<DeviceReport>,
}

impl DeviceRow {
    pub fn new(node: DeviceNode, outcome: Result<DeviceReport>) -> Self {
        Self { node, outcome }
    }

    pub fn path(&self) -> &Path {
        &self.node.path
    }

    /// Device name; empty when the device could not be inspected.
    pub fn name(&self) -> &str {
        match &self.outcome {
            Ok(report) => &report.capabilities.identity.name,
            Err(_) => "",
        }
    }

    pub fn capability_names(&self) -> Vec<&'static str> {
        match &self.outcome {
            Ok(report) => report.capabilities.capability_names(),
            Err(_) => Vec::new(),
        }
    }

    pub fn by_id(&self) -> String {
        display_opt(self.node.by_id.as_deref())
    }

    pub fn by_path(&self) -> String {
        display_opt(self.node.by_path.as_deref())
    }
}

fn display_opt(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    DevicePath,
    Name,
    ById,
    ByPath,
    Capabilities,
}

impl FilterKey {
    pub const ALL: [FilterKey; 5] = [
        FilterKey::DevicePath,
        FilterKey::Name,
        FilterKey::ById,
        FilterKey::ByPath,
        FilterKey::Capabilities,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::DevicePath => "device_path",
            FilterKey::Name => "name",
            FilterKey::ById => "by_id",
            FilterKey::ByPath => "by_path",
            FilterKey::Capabilities => "capabilities",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FilterKey::DevicePath => "filter outputs that contain the device path",
            FilterKey::Name => "filter outputs that contain the name of the device",
            FilterKey::ById => "filter outputs that contain the by_id path of the device",
            FilterKey::ByPath => "filter outputs that contain the by_path path of the device",
            FilterKey::Capabilities => "filter outputs that have the capabilities listed",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("filter must be KEY=VALUE, got '{0}'")]
    Syntax(String),
    #[error("unknown filter key '{0}'")]
    UnknownKey(String),
    #[error("invalid filter regex: {0}")]
    Regex(#[from] regex::Error),
}

impl FromStr for FilterKey {
    type Err = FilterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FilterKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FilterError::UnknownKey(s.to_string()))
    }
}

/// A single `KEY=VALUE` filter as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub key: FilterKey,
    pub value: String,
}

impl FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| FilterError::Syntax(s.to_string()))?;
        Ok(Filter {
            key: key.trim().parse()?,
            value: value.to_string(),
        })
    }
}

#[derive(Debug)]
enum Matcher {
    Exact(String),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Exact(value) => value == candidate,
            Matcher::Pattern(re) => re.is_match(candidate),
        }
    }
}

/// Compiled filters. A row passes only if every rule matches.
#[derive(Debug, Default)]
pub struct RowFilter {
    rules: Vec<(FilterKey, Matcher)>,
}

impl RowFilter {
    pub fn new(filters: &[Filter], use_regex: bool) -> std::result::Result<Self, FilterError> {
        let mut rules = Vec::with_capacity(filters.len());
        for filter in filters {
            let matcher = if use_regex {
                Matcher::Pattern(Regex::new(&filter.value)?)
            } else {
                Matcher::Exact(filter.value.clone())
            };
            rules.push((filter.key, matcher));
        }
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn matches(&self, row: &DeviceRow) -> bool {
        self.rules.iter().all(|(key, matcher)| match key {
            FilterKey::DevicePath => matcher.matches(&row.path().display().to_string()),
            FilterKey::Name => matcher.matches(row.name()),
            FilterKey::ById => matcher.matches(&row.by_id()),
            FilterKey::ByPath => matcher.matches(&row.by_path()),
            FilterKey::Capabilities => row
                .capability_names()
                .into_iter()
                .any(|name| matcher.matches(name)),
        })
    }

    pub fn apply(&self, rows: Vec<DeviceRow>) -> Vec<DeviceRow> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;
    use crate::bitmask::CodeSet;
    use crate::capabilities::DeviceCapabilities;
    use crate::codes::EventType;
    use crate::error::Error;
    use crate::protocol::Identity;

    pub(crate) fn row(n: u32, name: &str, extra: &[EventType]) -> DeviceRow {
        let mut types = vec![
            EventType::Synchronization,
            EventType::Key,
            EventType::Relative,
            EventType::Misc,
        ];
        types.extend_from_slice(extra);
        let codes: BTreeMap<_, _> = types.into_iter().map(|t| (t, CodeSet::new())).collect();
        let report = DeviceReport {
            capabilities: DeviceCapabilities {
                identity: Identity {
                    name: name.to_string(),
                    ..Identity::default()
                },
                codes,
                abs_info: BTreeMap::new(),
            },
            warnings: Vec::new(),
        };
        DeviceRow::new(
            DeviceNode {
                path: PathBuf::from(format!("/dev/input/event{n}")),
                by_id: Some(PathBuf::from(format!("by_id_{n}"))),
                by_path: Some(PathBuf::from(format!("by_path_{n}"))),
            },
            Ok(report),
        )
    }

    fn sample() -> Vec<DeviceRow> {
        let mut third = row(11, "11", &[]);
        third.node.by_id = Some(PathBuf::from("by_id_2_10"));
        third.node.by_path = Some(PathBuf::from("by_path_2_10"));
        vec![row(3, "3", &[EventType::Led]), row(10, "10", &[]), third]
    }

    fn filtered(specs: &[&str], use_regex: bool) -> Vec<String> {
        let filters: Vec<Filter> = specs.iter().map(|s| s.parse().unwrap()).collect();
        RowFilter::new(&filters, use_regex)
            .unwrap()
            .apply(sample())
            .iter()
            .map(|r| r.path().display().to_string())
            .collect()
    }

    #[test]
    fn parses_key_value() {
        let f: Filter = "NAME=Logitech=USB".parse().unwrap();
        assert_eq!(f.key, FilterKey::Name);
        assert_eq!(f.value, "Logitech=USB");
        assert!(matches!("name".parse::<Filter>(), Err(FilterError::Syntax(_))));
        assert!(matches!("color=red".parse::<Filter>(), Err(FilterError::UnknownKey(_))));
    }

    #[test]
    fn exact_filters() {
        assert_eq!(filtered(&["device_path=/dev/input/event3"], false), vec!["/dev/input/event3"]);
        assert_eq!(filtered(&["by_id=by_id_3"], false), vec!["/dev/input/event3"]);
        assert_eq!(filtered(&["by_path=by_path_3"], false), vec!["/dev/input/event3"]);
        assert_eq!(filtered(&["name=3"], false), vec!["/dev/input/event3"]);
        assert_eq!(
            filtered(&["device_path=/dev/input/event3", "name=3"], false),
            vec!["/dev/input/event3"]
        );
        assert_eq!(
            filtered(&["capabilities=EV_LED", "capabilities=EV_SYN"], false),
            vec!["/dev/input/event3"]
        );
    }

    #[test]
    fn regex_filters() {
        assert_eq!(filtered(&["device_path=/dev/input/event.$"], true), vec!["/dev/input/event3"]);
        assert_eq!(filtered(&["by_id=by_id_.$"], true), vec!["/dev/input/event3"]);
        assert_eq!(filtered(&["by_path=by_path_.$"], true), vec!["/dev/input/event3"]);
        assert_eq!(filtered(&["name=^.$"], true), vec!["/dev/input/event3"]);
        assert_eq!(
            filtered(&["capabilities=EV_LE.$", "capabilities=EV_SY.$"], true),
            vec!["/dev/input/event3"]
        );
        assert_eq!(
            filtered(&["by_id=^by_id_.*", "by_id=.*d_10$"], true),
            vec!["/dev/input/event10"]
        );
    }

    #[test]
    fn contradicting_filters_match_nothing() {
        assert!(filtered(&["device_path=/dev/input/event3", "by_path=by_path_10"], false).is_empty());
        assert!(filtered(&["device_path=/dev/input/event.$", "by_path=by_path_..$"], true).is_empty());
    }

    #[test]
    fn failed_rows_have_no_name_or_capabilities() {
        let row = DeviceRow::new(DeviceNode::bare("/dev/input/event9"), Err(Error::PermissionDenied));
        assert_eq!(row.name(), "");
        assert!(row.capability_names().is_empty());
        assert_eq!(row.by_id(), "");

        let filters = vec!["name=".parse().unwrap()];
        assert!(RowFilter::new(&filters, false).unwrap().matches(&row));
        let filters = vec!["capabilities=.*".parse().unwrap()];
        assert!(!RowFilter::new(&filters, true).unwrap().matches(&row));
    }

    #[test]
    fn invalid_regex_is_reported() {
        let filters = vec!["name=(".parse().unwrap()];
        assert!(matches!(RowFilter::new(&filters, true), Err(FilterError::Regex(_))));
    }
}
