mod alignment_index;
mod classify;
mod cli;
mod error;
mod genome_seq;
mod globals;
mod logger;
mod process_regions;
mod refine;
mod regions;
mod run_stats;
mod seq_util;
mod span_validate;
mod vcf_output;

use std::error::Error;
use std::process;

use hhmmss::Hhmmss;
use log::info;

use crate::alignment_index::read_alignment_index;
use crate::genome_seq::read_seq_store;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::logger::setup_output_dir_and_logger;
use crate::process_regions::{process_regions, write_region_diagnostics};
use crate::regions::read_regions;
use crate::run_stats::write_run_stats;
use crate::vcf_output::write_vcf_records;

fn run(settings: &cli::Settings) -> Result<(), Box<dyn Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    let start = std::time::Instant::now();

    let index = read_alignment_index(&settings.alignments_filename)?;
    let regions = read_regions(&settings.regions_filename)?;

    let ref_seqs = settings
        .ref_filename
        .as_ref()
        .map(|x| read_seq_store(x, "reference"));
    let contig_seqs = settings
        .contigs_filename
        .as_ref()
        .map(|x| read_seq_store(x, "contig"));

    let result = process_regions(
        &index,
        &regions,
        ref_seqs.as_ref(),
        contig_seqs.as_ref(),
        settings.flank_buffer,
        settings.flank_probe,
    )?;

    write_vcf_records(&settings.output_dir, &result.vcf_lines);
    write_region_diagnostics(&settings.output_dir, &result.diagnostic_lines);
    write_run_stats(&settings.output_dir, &result.run_stats);

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());
    setup_output_dir_and_logger(&settings.output_dir, settings.clobber, settings.debug);
    cli::write_settings(&settings.output_dir, &settings);

    if let Err(err) = run(&settings) {
        info!("{PROGRAM_NAME} failed: {err}");
        eprintln!("ERROR: {err}");
        process::exit(2);
    }
}
