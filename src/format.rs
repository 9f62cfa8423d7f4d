//! Rendering of device rows as a table, CSV, JSON or a long per-device listing.

use std::fmt::Write as _;
use std::str::FromStr;

use serde_json::{Value, json};

use crate::capabilities::DeviceReport;
use crate::codes::{EventType, code_name};
use crate::listing::DeviceRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Csv,
    Json,
    Long,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Table, Format::Csv, Format::Json, Format::Long];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Table => "table",
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Long => "long",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Format::Table => "format the output as a table",
            Format::Csv => "format the output as CSV",
            Format::Json => "format the output as a JSON array with codes and axes",
            Format::Long => "list every code and absolute axis of each device",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown format '{s}' (expected table, csv, json or long)"))
    }
}

const HEADER: [&str; 5] = ["NAME", "DEVICE_PATH", "BY_ID", "BY_PATH", "CAPABILITIES"];

pub fn render(rows: &[DeviceRow], format: Format) -> String {
    match format {
        Format::Table => table(rows),
        Format::Csv => csv(rows),
        Format::Json => {
            let doc = Value::Array(rows.iter().map(json_row).collect());
            let mut out = serde_json::to_string_pretty(&doc).unwrap_or_default();
            out.push('\n');
            out
        }
        Format::Long => long(rows),
    }
}

/// The five summary cells of a row. Failed devices show the error in place of capabilities.
fn cells(row: &DeviceRow) -> [String; 5] {
    let capabilities = match &row.outcome {
        Ok(_) => {
            let names = row.capability_names();
            if names.is_empty() {
                String::new()
            } else {
                format!("[{}]", names.join(", "))
            }
        }
        Err(e) => format!("<{e}>"),
    };
    [
        row.name().to_string(),
        row.path().display().to_string(),
        row.by_id(),
        row.by_path(),
        capabilities,
    ]
}

fn table(rows: &[DeviceRow]) -> String {
    let body: Vec<[String; 5]> = rows.iter().map(cells).collect();
    let mut widths = HEADER.map(str::len);
    for row_cells in &body {
        for (width, cell) in widths.iter_mut().zip(row_cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut line = |cells: [&str; 5]| {
        for (i, cell) in cells.iter().enumerate() {
            if i == cells.len() - 1 {
                out.push_str(cell);
            } else {
                let _ = write!(out, "{cell:<width$}", width = widths[i] + 1);
            }
        }
        out.push('\n');
    };
    line(HEADER);
    for row_cells in &body {
        line(row_cells.each_ref().map(String::as_str));
    }
    out
}

fn csv_escape(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn csv(rows: &[DeviceRow]) -> String {
    let mut out = String::new();
    let mut line = |cells: [&str; 5]| {
        let escaped: Vec<String> = cells.iter().map(|c| csv_escape(c)).collect();
        out.push_str(&escaped.join(","));
        out.push('\n');
    };
    line(HEADER);
    for row in rows {
        let row_cells = cells(row);
        line(row_cells.each_ref().map(String::as_str));
    }
    out
}

fn json_row(row: &DeviceRow) -> Value {
    let mut value = match &row.outcome {
        Ok(report) => json_report(report),
        Err(e) => json!({ "error": e.to_string() }),
    };
    value["device_path"] = json!(row.path().display().to_string());
    value["by_id"] = json!(row.node.by_id.as_ref().map(|p| p.display().to_string()));
    value["by_path"] = json!(row.node.by_path.as_ref().map(|p| p.display().to_string()));
    value
}

fn json_report(report: &DeviceReport) -> Value {
    let caps = &report.capabilities;
    let identity = &caps.identity;
    let codes: serde_json::Map<String, Value> = caps
        .codes
        .iter()
        .map(|(ty, set)| {
            let names: Vec<String> = set.iter().map(|c| code_name(*ty, c)).collect();
            (ty.name().to_string(), json!(names))
        })
        .collect();
    let axes: serde_json::Map<String, Value> = caps
        .abs_info
        .iter()
        .map(|(axis, info)| {
            (
                code_name(EventType::Absolute, *axis),
                json!({
                    "value": info.value,
                    "minimum": info.minimum,
                    "maximum": info.maximum,
                    "fuzz": info.fuzz,
                    "flat": info.flat,
                    "resolution": info.resolution,
                }),
            )
        })
        .collect();
    json!({
        "name": identity.name,
        "physical_path": identity.physical_path,
        "unique_id": identity.unique_id,
        "bus_type": identity.id.bus_type,
        "vendor": identity.id.vendor,
        "product": identity.id.product,
        "version": identity.id.version,
        "capabilities": caps.capability_names(),
        "codes": codes,
        "absolute_axes": axes,
        "warnings": report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}

fn long(rows: &[DeviceRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(out, "{}", row.path().display());
        if let Some(by_id) = &row.node.by_id {
            let _ = writeln!(out, "  by-id:    {}", by_id.display());
        }
        if let Some(by_path) = &row.node.by_path {
            let _ = writeln!(out, "  by-path:  {}", by_path.display());
        }
        match &row.outcome {
            Ok(report) => long_report(&mut out, report),
            Err(e) => {
                let _ = writeln!(out, "  error:    {e}");
            }
        }
        out.push('\n');
    }
    out
}

fn long_report(out: &mut String, report: &DeviceReport) {
    let caps = &report.capabilities;
    let identity = &caps.identity;
    let id = identity.id;
    let _ = writeln!(out, "  name:     {}", identity.name);
    let _ = writeln!(out, "  phys:     {}", identity.physical_path.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  uniq:     {}", identity.unique_id.as_deref().unwrap_or("-"));
    let _ = writeln!(
        out,
        "  id:       bus {:#06x} vendor {:#06x} product {:#06x} version {:#06x}",
        id.bus_type, id.vendor, id.product, id.version
    );
    for (ty, set) in &caps.codes {
        if set.is_empty() {
            let _ = writeln!(out, "  {ty}");
            continue;
        }
        let names: Vec<String> = set.iter().map(|c| code_name(*ty, c)).collect();
        let _ = writeln!(out, "  {ty}: {}", names.join(", "));
    }
    for (axis, info) in &caps.abs_info {
        let _ = writeln!(
            out,
            "    {} ({axis}): value {}, min {}, max {}, fuzz {}, flat {}, resolution {}",
            code_name(EventType::Absolute, *axis),
            info.value,
            info.minimum,
            info.maximum,
            info.fuzz,
            info.flat,
            info.resolution
        );
    }
    for warning in &report.warnings {
        let _ = writeln!(out, "  warning:  {warning}");
    }
}
