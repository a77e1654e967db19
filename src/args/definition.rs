//! Command-line argument definition.

use clap::Parser;

/// galaxy-lists - Browse roles on a Galaxy server and follow repository imports
#[derive(Parser, Debug, Default)]
#[command(name = "galaxy-lists")]
#[command(version)]
#[command(about = "Browse roles on a Galaxy server and follow repository imports", long_about = None)]
pub struct Args {
    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Galaxy server URL (overrides `server_url` in settings.conf)
    #[arg(long)]
    pub server: Option<String>,

    /// Shareable list URL to restore filters from (e.g. a bookmark)
    #[arg(long)]
    pub url: Option<String>,

    /// Keyword filter (repeatable)
    #[arg(short, long = "keyword")]
    pub keywords: Vec<String>,

    /// Tag filter (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Platform filter (repeatable)
    #[arg(short, long = "platform")]
    pub platforms: Vec<String>,

    /// Cloud platform filter (repeatable)
    #[arg(long = "cloud-platform")]
    pub cloud_platforms: Vec<String>,

    /// Author filter (repeatable)
    #[arg(short, long = "author")]
    pub authors: Vec<String>,

    /// Role type filter (ANS, CON, APP, DEM)
    #[arg(long = "role-type")]
    pub role_types: Vec<String>,

    /// Drop restored filters before applying the ones given here
    #[arg(long)]
    pub reset: bool,

    /// Sort key (name, download_count, stargazers_count, created, modified)
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,

    /// Page to show
    #[arg(long)]
    pub page: Option<u32>,

    /// Items per page
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Look up typeahead suggestions for this text instead of listing roles
    #[arg(long)]
    pub suggest: Option<String>,

    /// Category for --suggest (keyword, tag, platform, cloud_platform, author, role_type)
    #[arg(long, default_value = "keyword")]
    pub category: String,

    /// Request an import of OWNER/REPO and follow it until it finishes
    #[arg(long, value_name = "OWNER/REPO")]
    pub import: Vec<String>,

    /// Follow the latest import of OWNER/REPO until it finishes (repeatable)
    #[arg(short, long, value_name = "OWNER/REPO")]
    pub watch: Vec<String>,

    /// Delete the role imported from OWNER/REPO
    #[arg(long, value_name = "OWNER/REPO")]
    pub delete: Option<String>,
}

impl Args {
    /// Whether any filter flag was given.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        !(self.keywords.is_empty()
            && self.tags.is_empty()
            && self.platforms.is_empty()
            && self.cloud_platforms.is_empty()
            && self.authors.is_empty()
            && self.role_types.is_empty())
    }
}
