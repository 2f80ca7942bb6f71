//! Turns the raw executable path reported by the OS into a stable
//! application identity for aggregation.

use std::sync::Arc;

/// Processes that own the desktop shell rather than a user application.
/// Focus landing on these is treated the same as no focus at all.
const SHELL_PROCESSES: &[&str] = &["dwm", "explorer", "winlogon", "csrss", "lsass"];

/// Display names for executables whose file stem reads poorly on its own.
const KNOWN_APPS: &[(&str, &str)] = &[
    ("chrome", "Google Chrome"),
    ("msedge", "Microsoft Edge"),
    ("firefox", "Mozilla Firefox"),
    ("code", "Visual Studio Code"),
    ("notepad++", "Notepad++"),
    ("devenv", "Visual Studio"),
    ("winword", "Microsoft Word"),
    ("excel", "Microsoft Excel"),
    ("powerpnt", "Microsoft PowerPoint"),
    ("outlook", "Microsoft Outlook"),
    ("discord", "Discord"),
    ("spotify", "Spotify"),
    ("steam", "Steam"),
    ("vlc", "VLC Media Player"),
];

/// Maps a full executable path to the application identity used for
/// aggregation, or `None` for shell processes and empty paths.
pub fn app_identity(process_path: &str) -> Option<Arc<str>> {
    let stem = executable_stem(process_path);
    if stem.is_empty() || is_shell_process(stem) {
        return None;
    }
    Some(display_name(stem).into())
}

/// Last path component without the `.exe` suffix. Handles both separator
/// styles since tests feed unix-style paths.
fn executable_stem(process_path: &str) -> &str {
    let name = process_path
        .trim_end_matches(['\0'])
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or(process_path);
    name.strip_suffix(".exe")
        .or_else(|| name.strip_suffix(".EXE"))
        .unwrap_or(name)
}

fn is_shell_process(stem: &str) -> bool {
    SHELL_PROCESSES
        .iter()
        .any(|shell| stem.eq_ignore_ascii_case(shell))
}

fn display_name(stem: &str) -> String {
    let lower = stem.to_ascii_lowercase();
    for (executable, display) in KNOWN_APPS {
        if lower.contains(executable) {
            return (*display).to_string();
        }
    }
    title_case(stem)
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::app_identity;

    #[test]
    fn known_executables_get_display_names() {
        assert_eq!(
            app_identity(r"C:\Program Files\Google\Chrome\Application\chrome.exe").as_deref(),
            Some("Google Chrome")
        );
        assert_eq!(
            app_identity(r"C:\Users\me\AppData\Local\Programs\Microsoft VS Code\Code.exe")
                .as_deref(),
            Some("Visual Studio Code")
        );
    }

    #[test]
    fn unknown_executables_are_title_cased() {
        assert_eq!(
            app_identity(r"C:\Games\factorio.exe").as_deref(),
            Some("Factorio")
        );
        assert_eq!(app_identity("/usr/bin/alacritty").as_deref(), Some("Alacritty"));
    }

    #[test]
    fn shell_processes_are_unfocused() {
        assert_eq!(app_identity(r"C:\Windows\explorer.exe"), None);
        assert_eq!(app_identity(r"C:\Windows\System32\dwm.exe"), None);
        assert_eq!(app_identity(""), None);
    }

    #[test]
    fn exe_suffix_is_case_insensitive() {
        assert_eq!(
            app_identity(r"D:\tools\HELIX.EXE").as_deref(),
            Some("HELIX")
        );
    }
}
