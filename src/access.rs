use std::fs;

use log::warn;

/// Whether the current user is listed in the `input` group of `/etc/group`.
pub fn in_input_group() -> bool {
    let Ok(groups) = fs::read_to_string("/etc/group") else {
        return false;
    };
    let user = whoami::username();
    member_of(&groups, "input", &user)
}

fn member_of(groups: &str, group: &str, user: &str) -> bool {
    groups
        .lines()
        .filter(|line| line.split(':').next() == Some(group))
        .any(|line| {
            line.split(':')
                .nth(3)
                .unwrap_or("")
                .split(',')
                .any(|u| u.trim() == user)
        })
}

/// Logs a hint when devices were unreadable because of missing permissions.
pub fn hint_permission_denied(denied: usize) {
    if denied == 0 || in_input_group() {
        return;
    }
    warn!(
        "{denied} device(s) could not be opened: permission denied. \
         Run as root or add yourself to the input group: sudo usermod -aG input $USER"
    );
}
