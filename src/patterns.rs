//! Dangerous-command detection for install-time lifecycle scripts

/// Command substrings that should raise security concerns in install scripts
pub const DANGEROUS_COMMANDS: &[&str] = &[
    // Network operations
    "curl", "wget", "nc ", "nc.traditional", "netcat", "telnet", "ftp",
    // Shell execution
    "bash -c", "/bin/sh", "/bin/bash", "sh -c", "/bin/dash",
    "eval(", "eval ", "exec(", "exec ",
    // Encoding/obfuscation
    "base64", "base32", "rot13", "atob", "btoa",
    // Windows shells
    "powershell", "cmd.exe", "cmd /c",
    // Destructive operations
    "rm -rf", "rm -fr", "del /f", "rmdir /s",
    "format ", "> /dev/", "| /dev/", "dd if=",
    // Persistence mechanisms
    "crontab", "systemctl", "launchctl", "at ", "schtasks",
    "service ", "chkconfig", "update-rc.d",
    // Data exfiltration
    "scp", "sftp", "rsync", "tar czf", "zip -r",
    // Process manipulation
    "kill ", "pkill", "killall", "nohup",
    // Permission changes
    "chmod +x", "chmod 777", "chown", "chgrp",
    // Network listeners
    "python -m http.server", "python -m SimpleHTTPServer",
    "php -S", "ruby -run", "nc -l",
];

/// Lifecycle hooks that execute code during install/uninstall
pub const LIFECYCLE_HOOKS: &[&str] = &[
    "preinstall",
    "install",
    "postinstall",
    "preuninstall",
    "uninstall",
    "postuninstall",
];

const CONTEXT_CHARS: usize = 50;
const MAX_CONTEXT_LEN: usize = 150;

/// Scan a script body for dangerous command substrings.
///
/// Returns `(pattern, context)` pairs, where the context is the surrounding
/// text (up to 50 characters each side, truncated to 150 total).
pub fn find_dangerous_patterns(script: &str) -> Vec<(&'static str, String)> {
    if script.is_empty() {
        return Vec::new();
    }

    let script_lower = script.to_lowercase();
    let mut found = Vec::new();

    for &command in DANGEROUS_COMMANDS {
        if let Some(index) = script_lower.find(&command.to_lowercase()) {
            found.push((command, extract_context(script, index, command.len())));
        }
    }

    found
}

/// Extract surrounding context for a match, staying on char boundaries.
fn extract_context(script: &str, index: usize, match_len: usize) -> String {
    let start = floor_char_boundary(script, index.saturating_sub(CONTEXT_CHARS));
    let end = ceil_char_boundary(script, (index + match_len + CONTEXT_CHARS).min(script.len()));

    let mut context = script[start..end].trim().to_string();
    if context.len() > MAX_CONTEXT_LEN {
        let cut = floor_char_boundary(&context, MAX_CONTEXT_LEN - 3);
        context.truncate(cut);
        context.push_str("...");
    }
    context
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
