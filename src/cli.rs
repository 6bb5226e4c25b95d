use crate::pipeline::{ScanMode, ScanOptions};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "drive-sorter", version)]
#[command(about = "AI Drive Sorter: classify, rename and file documents from a cloud inbox", long_about = None)]
pub struct Cli {
    /// Maintenance scan, plan only
    #[arg(long)]
    pub scan: bool,

    /// Inbox auto-sort
    #[arg(long)]
    pub inbox: bool,

    /// Apply changes instead of only logging them
    #[arg(long)]
    pub execute: bool,

    /// Stop after this many processed files (0 means no limit)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Folder to scan instead of the configured Inbox
    #[arg(long, value_name = "ID")]
    pub folder: Option<String>,
}

impl Cli {
    /// Scan options implied by the flags, or `None` when there is nothing to do.
    ///
    /// `--inbox` wins over `--scan`; `--scan` never executes; `--execute`
    /// alone runs maintenance for real.
    pub fn scan_options(&self) -> Option<ScanOptions> {
        let limit = (self.limit > 0).then_some(self.limit);
        let (mode, dry_run) = if self.inbox {
            (ScanMode::Inbox, !self.execute)
        } else if self.scan {
            (ScanMode::Maintenance, true)
        } else if self.execute {
            (ScanMode::Maintenance, false)
        } else {
            return None;
        };
        Some(ScanOptions {
            mode,
            dry_run,
            limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("drive-sorter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_flags_means_usage() {
        assert!(parse(&[]).scan_options().is_none());
        assert!(parse(&["--limit", "5"]).scan_options().is_none());
    }

    #[test]
    fn test_inbox_modes() {
        let options = parse(&["--inbox"]).scan_options().unwrap();
        assert_eq!(options.mode, ScanMode::Inbox);
        assert!(options.dry_run);

        let options = parse(&["--inbox", "--execute", "--limit", "10"]).scan_options().unwrap();
        assert!(!options.dry_run);
        assert_eq!(options.limit, Some(10));

        let options = parse(&["--inbox", "--scan"]).scan_options().unwrap();
        assert_eq!(options.mode, ScanMode::Inbox);
    }

    #[test]
    fn test_scan_is_always_plan_only() {
        let options = parse(&["--scan", "--execute"]).scan_options().unwrap();
        assert_eq!(options.mode, ScanMode::Maintenance);
        assert!(options.dry_run);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_execute_alone_runs_maintenance() {
        let options = parse(&["--execute", "--folder", "abc"]).scan_options().unwrap();
        assert_eq!(options.mode, ScanMode::Maintenance);
        assert!(!options.dry_run);
        assert_eq!(parse(&["--folder", "abc"]).folder.as_deref(), Some("abc"));
    }
}
