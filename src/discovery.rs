//! Event-node discovery under the input directory (normally `/dev/input`).

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use log::debug;

pub const DEFAULT_INPUT_DIR: &str = "/dev/input";

/// An event node with the persistent symlinks udev created for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    pub path: PathBuf,
    pub by_id: Option<PathBuf>,
    pub by_path: Option<PathBuf>,
}

impl DeviceNode {
    pub fn bare(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            by_id: None,
            by_path: None,
        }
    }
}

/// Lists the `event*` character devices in `dir` in natural order, resolving their
/// `by-id/` and `by-path/` symlinks.
pub fn list_event_nodes(dir: &Path) -> io::Result<Vec<DeviceNode>> {
    scan(dir, true)
}

fn scan(dir: &Path, char_devices_only: bool) -> io::Result<Vec<DeviceNode>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_event = entry.file_name().to_string_lossy().contains("event");
        if !is_event {
            continue;
        }
        // Follows symlinks, so a link named event* to a device node is kept.
        if char_devices_only && !is_char_device(&entry.path()) {
            continue;
        }
        paths.push(entry.path());
    }
    paths.sort_by(|a, b| natural_cmp(&a.to_string_lossy(), &b.to_string_lossy()));

    let by_id_dir = dir.join("by-id");
    let by_path_dir = dir.join("by-path");
    let mut nodes = Vec::with_capacity(paths.len());
    for path in paths {
        let by_id = find_symlink(&by_id_dir, &path)?;
        let by_path = find_symlink(&by_path_dir, &path)?;
        debug!("found {} (by-id: {by_id:?}, by-path: {by_path:?})", path.display());
        nodes.push(DeviceNode {
            path,
            by_id,
            by_path,
        });
    }
    Ok(nodes)
}

fn is_char_device(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.file_type().is_char_device(),
        Err(e) => {
            debug!("skipping {}: {e}", path.display());
            false
        }
    }
}

/// Describes a node named explicitly rather than discovered. A failing link lookup
/// leaves that link empty.
pub fn resolve_node(dir: &Path, path: &Path) -> DeviceNode {
    let link = |sub: &str| {
        let links = dir.join(sub);
        find_symlink(&links, path).unwrap_or_else(|e| {
            debug!("cannot search {} for {}: {e}", links.display(), path.display());
            None
        })
    };
    DeviceNode {
        path: path.to_path_buf(),
        by_id: link("by-id"),
        by_path: link("by-path"),
    }
}

/// First symlink in `dir` (by name) whose target has the same file name as `node`.
/// A missing `dir` means there are no such links.
pub fn find_symlink(dir: &Path, node: &Path) -> io::Result<Option<PathBuf>> {
    let Some(node_name) = node.file_name() else {
        return Ok(None);
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut links = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_symlink() {
            links.push(entry.path());
        }
    }
    links.sort();

    for link in links {
        let target = fs::read_link(&link)?;
        if target.file_name() == Some(node_name) {
            return Ok(Some(link));
        }
    }
    Ok(None)
}

/// Case-insensitive ordering that compares runs of digits numerically, so that
/// `event3 < event10`. Falls back to plain string order when all segments tie.
pub fn natural_cmp(lhs: &str, rhs: &str) -> Ordering {
    let left = segments(lhs);
    let right = segments(rhs);
    for (l, r) in left.iter().zip(&right) {
        if l == r || l.is_empty() || r.is_empty() {
            continue;
        }
        let both_numeric = l.as_bytes()[0].is_ascii_digit() && r.as_bytes()[0].is_ascii_digit();
        if !both_numeric {
            return l.cmp(r);
        }
        match numeric_cmp(l, r) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    lhs.cmp(rhs)
}

/// Splits a lowercased string into digit runs and single non-digit characters.
fn segments(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut prev_digit = false;
    for c in s.chars().flat_map(char::to_lowercase) {
        let digit = c.is_ascii_digit();
        match out.last_mut() {
            Some(last) if digit && prev_digit => last.push(c),
            _ => out.push(c.to_string()),
        }
        prev_digit = digit;
    }
    out
}

fn numeric_cmp(l: &str, r: &str) -> Ordering {
    let l = l.trim_start_matches('0');
    let r = r.trim_start_matches('0');
    l.len().cmp(&r.len()).then_with(|| l.cmp(r))
}

#[cfg(test)]
mod tests {
    use std::os::unix::fs::symlink;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("evlist-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn natural_order_compares_numbers() {
        assert_eq!(natural_cmp("/dev/input/event3", "/dev/input/event10"), Ordering::Less);
        assert_eq!(natural_cmp("/dev/input/event3", "/dev/input/event4"), Ordering::Less);
        assert_eq!(natural_cmp("/dev/input/event0", "/dev/input/event3"), Ordering::Less);
        assert_eq!(natural_cmp("/dev/input/event12", "/dev/input/event2"), Ordering::Greater);
        assert_eq!(natural_cmp("event7", "event7"), Ordering::Equal);
    }

    #[test]
    fn natural_order_ignores_case_then_breaks_ties() {
        assert_eq!(natural_cmp("Event2", "event10"), Ordering::Less);
        assert_eq!(natural_cmp("Event2", "event2"), Ordering::Less);
        assert_eq!(natural_cmp("event01", "event1"), "event01".cmp("event1"));
    }

    #[test]
    fn segments_group_digit_runs() {
        assert_eq!(segments("ev12a3"), vec!["e", "v", "12", "a", "3"]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn resolves_symlinks_to_node() {
        let dir = scratch_dir("symlinks");
        let by_id = dir.join("by-id");
        fs::create_dir_all(&by_id).unwrap();
        symlink("../event4", by_id.join("usb-mouse-event-mouse")).unwrap();
        symlink("../event10", by_id.join("usb-kbd-event-kbd")).unwrap();

        let found = find_symlink(&by_id, &dir.join("event4")).unwrap();
        assert_eq!(found, Some(by_id.join("usb-mouse-event-mouse")));
        assert_eq!(find_symlink(&by_id, &dir.join("event1")).unwrap(), None);
        assert_eq!(find_symlink(&dir.join("by-path"), &dir.join("event4")).unwrap(), None);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn scan_sorts_and_attaches_links() {
        let dir = scratch_dir("scan");
        for name in ["event10", "event2", "mouse0", "event0"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        let by_path = dir.join("by-path");
        fs::create_dir_all(&by_path).unwrap();
        symlink("../event2", by_path.join("platform-i8042-serio-0-event-kbd")).unwrap();

        let nodes = scan(&dir, false).unwrap();
        let names: Vec<_> = nodes
            .iter()
            .map(|n| n.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["event0", "event2", "event10"]);
        assert_eq!(
            nodes[1].by_path,
            Some(by_path.join("platform-i8042-serio-0-event-kbd"))
        );
        assert_eq!(nodes[1].by_id, None);

        // Regular files are not event devices.
        assert!(list_event_nodes(&dir).unwrap().is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn symlinked_char_devices_are_listed() {
        let dir = scratch_dir("charlink");
        symlink("/dev/null", dir.join("event5")).unwrap();
        fs::write(dir.join("event6"), b"").unwrap();
        symlink("/nonexistent/evlist-event", dir.join("event7")).unwrap();

        let nodes = list_event_nodes(&dir).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].path, dir.join("event5"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unreadable_link_dirs_leave_links_empty() {
        let dir = scratch_dir("resolve");
        // A plain file where a directory is expected fails with ENOTDIR, not NotFound.
        fs::write(dir.join("by-id"), b"").unwrap();
        let by_path = dir.join("by-path");
        fs::create_dir_all(&by_path).unwrap();
        symlink("../event3", by_path.join("pci-0000:00:14.0-usb-0:1:1.0-event-mouse")).unwrap();

        let node = dir.join("event3");
        assert!(find_symlink(&dir.join("by-id"), &node).is_err());

        let resolved = resolve_node(&dir, &node);
        assert_eq!(resolved.path, node);
        assert_eq!(resolved.by_id, None);
        assert_eq!(
            resolved.by_path,
            Some(by_path.join("pci-0000:00:14.0-usb-0:1:1.0-event-mouse"))
        );

        fs::remove_dir_all(&dir).unwrap();
    }
}
