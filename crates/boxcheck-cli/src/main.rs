mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "boxcheck",
    version,
    about = "Check that expected values appear inside the right boxes of PDF forms"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a box template from an annotated PDF
    Template {
        /// Annotated PDF with rectangles drawn around each field
        #[arg(long, value_name = "FILE")]
        pdf: PathBuf,

        /// Folder for the template JSON (must already exist)
        #[arg(long, value_name = "DIR", default_value = "json_files")]
        out_dir: PathBuf,
    },
    /// Extract the text inside each template box of a PDF
    Extract {
        /// Target PDF
        #[arg(long, value_name = "FILE")]
        pdf: PathBuf,

        /// Template JSON produced by `boxcheck template`
        #[arg(long, value_name = "FILE")]
        template: PathBuf,

        /// Folder for the default output file (must already exist)
        #[arg(long, value_name = "DIR", default_value = "json_files")]
        json_dir: PathBuf,

        /// Explicit output path instead of <json-dir>/<pdf>.first_half.json
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Replace an existing output file instead of writing <name>_<n>.json
        #[arg(long)]
        overwrite: bool,
    },
    /// Group the words of every page into positioned lines
    Layout {
        /// Target PDF
        #[arg(long, value_name = "FILE")]
        pdf: PathBuf,

        /// 1-based first page of the cross-validation section
        #[arg(long, value_name = "N", default_value_t = boxcheck_core::layout::DEFAULT_SECTION_START_PAGE)]
        section_start: usize,

        /// Maximum vertical distance between words on one line
        #[arg(long, value_name = "T", default_value_t = 2.0)]
        line_tolerance: f64,

        /// Write the layout JSON here instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Validate an extraction JSON against expected values
    Validate {
        /// Extraction JSON produced by `boxcheck extract`
        #[arg(long, value_name = "FILE")]
        extraction: PathBuf,

        /// Custom expectation file
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        expectations: Option<PathBuf>,

        /// Predefined expectation set (default: ums025)
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Layout JSON produced by `boxcheck layout`, enables cross-validation
        #[arg(long, value_name = "FILE")]
        layout: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text", value_parser = ["text", "json", "flat"])]
        output: String,

        /// Do not fail on notices (mislocated or mismatched values)
        #[arg(long)]
        allow_notices: bool,
    },
    /// Template, extract and validate one PDF using a cached work folder
    Run {
        /// Target PDF
        pdf: PathBuf,

        /// Work folder holding json_files/ and sample_pdfs/
        #[arg(long, value_name = "DIR", default_value = "json_work")]
        work_dir: PathBuf,

        /// Custom expectation file
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        expectations: Option<PathBuf>,

        /// Predefined expectation set (default: ums025)
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Re-extract even when a cached extraction exists
        #[arg(long)]
        refresh: bool,

        /// Output format for stdout
        #[arg(short, long, default_value = "json", value_parser = ["json", "flat"])]
        output: String,

        /// Do not fail on notices (mislocated or mismatched values)
        #[arg(long)]
        allow_notices: bool,
    },
    /// Inspect expectation sets
    Expectations {
        #[command(subcommand)]
        action: ExpectationsAction,
    },
}

#[derive(Subcommand)]
enum ExpectationsAction {
    /// List predefined expectation sets
    List,
    /// Print a predefined expectation set as JSON
    Show {
        /// Preset name (e.g., "ums025")
        preset: String,
    },
    /// Validate a custom expectation file
    Validate {
        /// Path to expectation JSON
        file: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Ok(false) means the command ran but at least one check failed.
    let result = match cli.command {
        Commands::Template { pdf, out_dir } => commands::template::run(&pdf, &out_dir).map(|_| true),
        Commands::Extract {
            pdf,
            template,
            json_dir,
            out,
            overwrite,
        } => commands::extract::run(&pdf, &template, &json_dir, out, overwrite).map(|_| true),
        Commands::Layout {
            pdf,
            section_start,
            line_tolerance,
            out,
        } => commands::layout::run(&pdf, section_start, line_tolerance, out).map(|_| true),
        Commands::Validate {
            extraction,
            expectations,
            preset,
            layout,
            output,
            allow_notices,
        } => commands::validate::run(
            &extraction,
            expectations,
            preset,
            layout,
            &output,
            allow_notices,
        ),
        Commands::Run {
            pdf,
            work_dir,
            expectations,
            preset,
            refresh,
            output,
            allow_notices,
        } => commands::run::run(
            &pdf,
            &work_dir,
            expectations,
            preset,
            refresh,
            &output,
            allow_notices,
        ),
        Commands::Expectations { action } => {
            let done = match action {
                ExpectationsAction::List => commands::expectations::list(),
                ExpectationsAction::Show { preset } => commands::expectations::show(&preset),
                ExpectationsAction::Validate { file } => commands::expectations::validate(&file),
            };
            done.map(|_| true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}
