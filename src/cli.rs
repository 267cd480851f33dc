use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lfiscan")]
#[command(about = "Local File Inclusion scanner driven by known-file signatures")]
#[command(long_about = r#"
lfiscan tests the query parameters of a URL for Local File Inclusion by
requesting well-known operating system files through relative path traversal
and recognising their contents in the response.

WARNING: Only scan applications you own or have explicit permission to test.
Unauthorized scanning may be illegal.

Usage Examples:
  lfiscan scan --url 'http://host/page.php?file=home'             # First hit
  lfiscan scan --url 'http://host/?a=1&b=2' -p b --os linux         # One parameter
  lfiscan scan --url 'http://host/?f=x' --exhaustive --mirror loot  # Every file
  lfiscan include --url 'http://host/?f=x' -p f --depth 4 --path /etc/hosts
  lfiscan signatures --category config
"#)]
#[command(version)]
#[command(author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output directory for reports
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a URL's query parameters for LFI
    Scan {
        /// Target URL including its query string
        #[arg(short, long, required = true)]
        url: String,

        /// Only test this query parameter
        #[arg(short, long)]
        param: Option<String>,

        /// Target operating system (linux, solaris, windows)
        #[arg(long)]
        os: Option<String>,

        /// Shallowest escape depth
        #[arg(long)]
        min_depth: Option<usize>,

        /// Deepest escape depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Signature categories to use (system, config, log, test)
        #[arg(long = "category", value_name = "NAME")]
        categories: Vec<String>,

        /// Report every matching signature instead of stopping at the first
        #[arg(long)]
        exhaustive: bool,

        /// Parameters scanned concurrently
        #[arg(long)]
        workers: Option<usize>,

        /// Save confirmed files under this directory, mirroring remote paths
        #[arg(long, value_name = "DIR")]
        mirror: Option<PathBuf>,

        /// Write reports to the output directory
        #[arg(long)]
        report: bool,

        /// Report formats
        #[arg(long, value_enum)]
        format: Vec<OutputFormat>,

        #[command(flatten)]
        traversal: TraversalArgs,
    },

    /// Fetch one remote file through a known vulnerable parameter
    Include {
        /// Vulnerable URL including its query string
        #[arg(short, long, required = true)]
        url: String,

        /// Vulnerable query parameter
        #[arg(short, long, required = true)]
        param: String,

        /// Remote path to include
        #[arg(long, required = true)]
        path: String,

        /// Escape depth
        #[arg(long, default_value = "0")]
        depth: usize,

        /// Save the file here instead of printing it
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,

        #[command(flatten)]
        traversal: TraversalArgs,
    },

    /// List the built-in signature catalog
    Signatures {
        /// Only list this category
        #[arg(long)]
        category: Option<String>,

        /// Only list paths for this operating system
        #[arg(long)]
        os: Option<String>,
    },
}

#[derive(Args, Clone, Debug)]
pub struct TraversalArgs {
    /// Literal traversal prefix used instead of ../ segments
    #[arg(long)]
    pub prefix: Option<String>,

    /// Directory separator for the traversal
    #[arg(long)]
    pub separator: Option<char>,

    /// Terminate paths with a NUL byte (legacy suffix truncation)
    #[arg(long)]
    pub null_byte: bool,

    /// HTTP method used for probes
    #[arg(long, value_enum)]
    pub method: Option<Method>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Method {
    Get,
    Post,
}

impl From<OutputFormat> for crate::config::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => crate::config::OutputFormat::Json,
            OutputFormat::Csv => crate::config::OutputFormat::Csv,
        }
    }
}

impl From<Method> for crate::transport::HttpMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => crate::transport::HttpMethod::Get,
            Method::Post => crate::transport::HttpMethod::Post,
        }
    }
}

/// Process exit status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// A vulnerability was found, or an exhaustive scan ran to completion.
    Success,
    /// First-match mode finished without a confirmed inclusion.
    NotFound,
    /// Bad input (URL, category, configuration) or an unrecoverable failure.
    Error,
    /// The scan was interrupted before it could finish.
    Aborted,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::NotFound => 1,
            ExitStatus::Error => 2,
            ExitStatus::Aborted => 130,
        }
    }

    /// An interrupted scan only counts as a success when first-match mode
    /// already had its answer.
    pub fn for_scan(exhaustive: bool, found: usize, aborted: bool) -> Self {
        match (aborted, exhaustive, found > 0) {
            (true, true, _) | (true, false, false) => ExitStatus::Aborted,
            (_, _, true) | (false, true, false) => ExitStatus::Success,
            (false, false, false) => ExitStatus::NotFound,
        }
    }
}
