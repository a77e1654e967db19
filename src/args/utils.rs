//! Shared utilities for argument processing.

use crate::state::PollTarget;

/// What: Determine the log level based on command-line arguments and environment variables.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Verbose flag overrides `log_level` argument.
/// - `GALAXY_LISTS_TRACE=1` enables TRACE level for request-level timing.
#[must_use]
pub fn determine_log_level(args: &crate::args::Args) -> String {
    if args.verbose {
        "debug".to_string()
    } else if std::env::var("GALAXY_LISTS_TRACE").ok().as_deref() == Some("1") {
        "trace".to_string()
    } else {
        args.log_level.clone()
    }
}

/// What: Parse `OWNER/REPO` arguments into poll targets.
///
/// Output:
/// - Valid targets; malformed entries are reported on stderr and skipped.
#[must_use]
pub fn parse_targets(raw: &[String]) -> Vec<PollTarget> {
    raw.iter()
        .filter_map(|s| {
            let target = PollTarget::parse(s);
            if target.is_none() {
                eprintln!("ignoring '{s}': expected OWNER/REPO");
                tracing::warn!(value = %s, "Ignoring malformed OWNER/REPO argument");
            }
            target
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    /// What: Verbose wins over the explicit log level.
    fn log_level_prefers_verbose() {
        let args = crate::args::Args::parse_from(["galaxy-lists", "--log-level", "warn", "-v"]);
        assert_eq!(determine_log_level(&args), "debug");
        let args = crate::args::Args::parse_from(["galaxy-lists", "--log-level", "warn"]);
        if std::env::var("GALAXY_LISTS_TRACE").ok().as_deref() != Some("1") {
            assert_eq!(determine_log_level(&args), "warn");
        }
    }

    #[test]
    /// What: Malformed targets are skipped.
    fn parse_targets_skips_malformed() {
        let targets = parse_targets(&["a/b".to_string(), "broken".to_string()]);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].key(), ("a", "b"));
    }
}
