use std::fs::File;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Datelike;
use clap::Parser;
use const_format::concatcp;
use log::info;
use serde::Serialize;
use simple_error::{SimpleResult, bail};
use unwrap::unwrap;

pub const SETTINGS_FILENAME: &str = "garfish.settings.json";

#[derive(Parser, Serialize)]
#[command(
    version,
    about,
    after_help = format!("Copyright (C) 2004-{}     Pacific Biosciences of California, Inc.
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()),
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(rename_all = "kebab_case")]
pub struct Settings {
    /// Directory for all command output (must not already exist unless --clobber is given)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_output"))]
    pub output_dir: Utf8PathBuf,

    /// Alignment segment table from the whole-genome aligner, in tab-delimited format with
    /// columns: ref, ref_start, ref_end, contig, contig_start, contig_end, orientation.
    /// May be gzip compressed.
    #[arg(long = "alignments", value_name = "FILE")]
    pub alignments_filename: String,

    /// Candidate SV regions in BED3+ format. May be gzip compressed.
    #[arg(long = "regions", value_name = "FILE")]
    pub regions_filename: String,

    /// Genome reference in FASTA format
    ///
    /// When given together with --contigs, output records carry literal REF/ALT allele
    /// sequences instead of symbolic alleles. The reference is also the authoritative source
    /// of chromosome lengths for the flank-buffer bounds check.
    ///
    #[arg(long = "ref", value_name = "FILE")]
    pub ref_filename: Option<String>,

    /// Assembled contigs in FASTA format (see --ref)
    #[arg(long = "contigs", value_name = "FILE")]
    pub contigs_filename: Option<String>,

    /// Distance from each region boundary to its flank probe window
    #[arg(long, value_name = "BASES", default_value_t = 500)]
    pub flank_buffer: i64,

    /// Width of the flank probe window used to test that a contig alignment continues past the
    /// region on each side
    #[arg(long = "bufseg", value_name = "BASES", default_value_t = 50)]
    pub flank_probe: i64,

    /// Overwrite an existing output directory
    #[arg(long)]
    pub clobber: bool,

    /// Turn on extra debug logging, including per-contig skip diagnostics
    #[arg(long)]
    pub debug: bool,
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{} already exists: \"{}\"", label, dirname);
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed automatically by clap
///
/// Assumes that the logger is not setup
///
fn validate_and_fix_settings_impl(settings: Settings) -> SimpleResult<Settings> {
    fn check_required_filename(filename: &str, label: &str) -> SimpleResult<()> {
        if filename.is_empty() {
            bail!("Must specify {label} file");
        }
        if !std::path::Path::new(&filename).exists() {
            bail!("Can't find specified {label} file: '{filename}'");
        }
        Ok(())
    }

    fn check_optional_filename(filename_opt: Option<&String>, label: &str) -> SimpleResult<()> {
        if let Some(filename) = filename_opt {
            if !std::path::Path::new(&filename).exists() {
                bail!("Can't find specified {label} file: '{filename}'");
            }
        }
        Ok(())
    }

    check_required_filename(&settings.alignments_filename, "alignment segment")?;
    check_required_filename(&settings.regions_filename, "region")?;
    check_optional_filename(settings.ref_filename.as_ref(), "reference fasta")?;
    check_optional_filename(settings.contigs_filename.as_ref(), "contig fasta")?;

    if settings.ref_filename.is_some() != settings.contigs_filename.is_some() {
        bail!("--ref and --contigs must be specified together");
    }

    if settings.flank_probe < 1 {
        bail!("--bufseg argument must be greater than 0");
    }
    if settings.flank_buffer < settings.flank_probe {
        bail!("--flank-buffer argument must be at least the --bufseg window size");
    }

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {}", msg);
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}

/// Write settings out in json format
pub fn write_settings(output_dir: &Utf8Path, settings: &Settings) {
    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing settings to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create settings json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &settings).unwrap();
}
