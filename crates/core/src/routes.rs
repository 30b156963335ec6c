//! Route prefixes that affect notification presentation.

/// Professor-facing inquiry detail pages render live updates inline, so a
/// toast there would duplicate what is already on screen.
pub const PROFESSOR_INQUIRY_PREFIX: &str = "/professor/inquiries/";

/// Prefixes on which new-notification toasts are suppressed.
pub const MUTED_TOAST_PREFIXES: &[&str] = &[PROFESSOR_INQUIRY_PREFIX];

/// Returns `true` when `path` starts with any of `prefixes`.
pub fn is_muted(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

/// The default muted prefixes as owned strings.
pub fn default_muted_prefixes() -> Vec<String> {
    MUTED_TOAST_PREFIXES.iter().map(|p| p.to_string()).collect()
}
