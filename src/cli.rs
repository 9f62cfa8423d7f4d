use anyhow::{Result, anyhow};
use log::{debug, warn};
use pico_args::Arguments;
use std::{io::Write, path::PathBuf};

use evlist::discovery::{self, DEFAULT_INPUT_DIR};
use evlist::enumerate::Enumerator;
use evlist::error::ErrorKind;
use evlist::format::{self, Format};
use evlist::listing::{DeviceRow, Filter, FilterKey, RowFilter};

use crate::access;
use crate::config::{self, Config};
use crate::logging;

#[derive(Debug)]
struct Options {
    format: Option<Format>,
    filters: Vec<Filter>,
    use_regex: bool,
    config: Option<PathBuf>,
    input_dir: Option<PathBuf>,
    verbose: bool,
    /// Explicit nodes; discovery is skipped when non-empty.
    devices: Vec<PathBuf>,
}

impl Options {
    fn parse(mut pargs: Arguments) -> Result<Self> {
        let opts = Options {
            format: pargs.opt_value_from_str(["-o", "--format"])?,
            filters: pargs.values_from_str(["-f", "--filter"])?,
            use_regex: pargs.contains(["-r", "--use-regex"]),
            config: pargs.opt_value_from_str(["-c", "--config"])?,
            input_dir: pargs.opt_value_from_str("--input-dir")?,
            verbose: pargs.contains("--verbose"),
            devices: Vec::new(),
        };
        let mut devices = Vec::new();
        for arg in pargs.finish() {
            let arg = arg.to_string_lossy().into_owned();
            if arg.starts_with('-') {
                return Err(anyhow!("unknown option: {arg}\n\nrun `evlist --help` for usage"));
            }
            devices.push(PathBuf::from(arg));
        }
        Ok(Options { devices, ..opts })
    }
}

pub fn run() -> Result<()> {
    run_with(Arguments::from_env())
}

fn run_with(mut pargs: Arguments) -> Result<()> {
    if pargs.contains(["-h", "--help"]) {
        print_help();
        return Ok(());
    }
    if pargs.contains(["-V", "--version"]) {
        println!("evlist {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let opts = Options::parse(pargs)?;
    logging::init(opts.verbose);

    let cfg = Config::load(opts.config.as_deref())?;
    let format = opts.format.or(cfg.format()).unwrap_or_default();
    let input_dir = opts
        .input_dir
        .clone()
        .or_else(|| cfg.input_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR));
    let filter = RowFilter::new(&opts.filters, opts.use_regex)?;

    let nodes = if opts.devices.is_empty() {
        discovery::list_event_nodes(&input_dir)
            .map_err(|e| anyhow!("failed to list {}: {e}", input_dir.display()))?
    } else {
        opts.devices
            .iter()
            .map(|path| discovery::resolve_node(&input_dir, path))
            .collect()
    };
    debug!("inspecting {} device node(s)", nodes.len());

    let enumerator = Enumerator::nodes(cfg.code_limits());
    let paths: Vec<PathBuf> = nodes.iter().map(|n| n.path.clone()).collect();
    let rows: Vec<DeviceRow> = enumerator
        .enumerate(&paths)
        .zip(nodes)
        .map(|((_, outcome), node)| DeviceRow::new(node, outcome))
        .collect();

    report_problems(&rows);
    let rows = filter.apply(rows);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(format::render(&rows, format).as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Logs degraded and failed devices so they stand out from clean successes.
fn report_problems(rows: &[DeviceRow]) {
    let mut denied = 0;
    for row in rows {
        match &row.outcome {
            Ok(report) => {
                for warning in &report.warnings {
                    warn!("{}: {warning}", row.path().display());
                }
            }
            Err(e) => {
                if e.kind() == ErrorKind::PermissionDenied {
                    denied += 1;
                }
                warn!("{}: {e}", row.path().display());
            }
        }
    }
    access::hint_permission_denied(denied);
}

fn print_help() {
    let formats: String = Format::ALL
        .iter()
        .map(|f| format!("      - {}: {}\n", f.as_str(), f.description()))
        .collect();
    let filters: String = FilterKey::ALL
        .iter()
        .map(|k| format!("      - {}: {}\n", k.as_str(), k.description()))
        .collect();
    let config_path = config::default_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.config/evlist/config.toml".into());
    println!(
        r#"evlist - list input event devices and their capabilities

USAGE:
  evlist [OPTIONS] [DEVICE...]

OPTIONS:
  -o, --format FORMAT      Format to output devices in
{formats}  -f, --filter KEY=VALUE   Filter output rows by the column value. This option can be
                           specified multiple times; every filter must match. Keys:
{filters}  -r, --use-regex          Match --filter values as regular expressions
  -c, --config PATH        Configuration file (default: {config_path})
      --input-dir DIR      Directory to scan for event nodes (default: {DEFAULT_INPUT_DIR})
      --verbose            Log debug output to stderr
  -V, --version            Print version
  -h, --help               Print this help

Reading device capabilities usually requires root or membership in the input group."#
    );
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    #[test]
    fn parses_all_options() {
        let opts = Options::parse(args(&[
            "-o",
            "csv",
            "-f",
            "name=Mouse",
            "--filter",
            "capabilities=EV_REL",
            "-r",
            "--input-dir",
            "/tmp/input",
            "/dev/input/event3",
        ]))
        .unwrap();
        assert_eq!(opts.format, Some(Format::Csv));
        assert_eq!(opts.filters.len(), 2);
        assert_eq!(opts.filters[1].key, FilterKey::Capabilities);
        assert!(opts.use_regex);
        assert!(!opts.verbose);
        assert_eq!(opts.input_dir, Some(PathBuf::from("/tmp/input")));
        assert_eq!(opts.devices, vec![PathBuf::from("/dev/input/event3")]);
    }

    #[test]
    fn defaults_when_no_options() {
        let opts = Options::parse(args(&[])).unwrap();
        assert_eq!(opts.format, None);
        assert!(opts.filters.is_empty());
        assert!(opts.devices.is_empty());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Options::parse(args(&["-o", "xml"])).is_err());
        assert!(Options::parse(args(&["-f", "colour=red"])).is_err());
        assert!(Options::parse(args(&["--bogus"])).is_err());
    }
}
