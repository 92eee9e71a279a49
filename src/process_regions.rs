//! Sequential per-region breakpoint discovery pipeline
//!
//! Regions are processed strictly in input order: candidate entry pairs are validated for flank
//! coverage, in-region segments of each accepted contig are collected and classified, and each
//! surviving breakpoint is refined and serialized. All per-region conditions are recoverable and
//! logged; only internal-consistency failures propagate out and end the run.
//!

use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use log::{debug, info};
use unwrap::unwrap;

use crate::alignment_index::AlignmentIndex;
use crate::classify::{ContigCall, classify_contig, collect_region_segments};
use crate::error::RefineResult;
use crate::genome_seq::SeqStore;
use crate::refine::refine_breakpoint;
use crate::regions::{Region, get_flank_windows};
use crate::run_stats::RunStats;
use crate::span_validate::validate_region_spans;
use crate::vcf_output::{build_variant_record, format_vcf_line};

pub const REGION_DIAGNOSTICS_FILENAME: &str = "region.diagnostics.txt";

pub struct RegionProcessingResult {
    pub vcf_lines: Vec<String>,
    pub diagnostic_lines: Vec<String>,
    pub run_stats: RunStats,
}

struct RegionProcessor<'a> {
    index: &'a AlignmentIndex,
    ref_seqs: Option<&'a SeqStore>,
    contig_seqs: Option<&'a SeqStore>,
    flank_buffer: i64,
    flank_probe: i64,
    result: RegionProcessingResult,
}

impl RegionProcessor<'_> {
    fn nocov(&mut self, region: &Region) {
        self.result
            .diagnostic_lines
            .push(format!("NOCOV {} {} {}", region.chrom, region.start, region.end));
        self.result.run_stats.nocov_region_count += 1;
    }

    fn chrom_length(&self, region: &Region, ref_entry: usize) -> i64 {
        // The reference fasta is the authoritative chromosome length source; without it, fall
        // back to the aligned extent observed in the segment input
        match self.ref_seqs.and_then(|x| x.entry_len(&region.chrom)) {
            Some(x) => x,
            None => self.index.ref_alignment_extent(ref_entry),
        }
    }

    fn process_region(&mut self, region: &Region) -> RefineResult<()> {
        self.result.run_stats.region_count += 1;
        let label = region.label();

        let ref_entry = match self.index.ref_entry_index(&region.chrom) {
            Some(x) => x,
            None => {
                self.nocov(region);
                return Ok(());
            }
        };

        // Regions too close to a chromosome end can't support the flank probes
        let chrom_length = self.chrom_length(region, ref_entry);
        if region.start - self.flank_buffer <= 0
            || chrom_length - (region.end + self.flank_buffer) < 0
        {
            self.nocov(region);
            return Ok(());
        }

        let (left_window, right_window) =
            get_flank_windows(region, self.flank_buffer, self.flank_probe);

        let spanning_contigs = validate_region_spans(
            self.index,
            self.index.pairs_for_ref(ref_entry),
            &left_window,
            &right_window,
            &label,
        );
        if spanning_contigs.is_empty() {
            self.nocov(region);
            return Ok(());
        }
        self.result.run_stats.spanning_contig_count += spanning_contigs.len();

        for spanning in spanning_contigs {
            let pair = self.index.entry_pair(spanning.pair_index);
            let contig_name = self.index.query_name(pair.query_entry);

            let collected = collect_region_segments(
                self.index,
                pair.query_entry,
                ref_entry,
                spanning.orientation,
                &left_window,
                &right_window,
            );
            let call =
                classify_contig(self.index, &collected, ref_entry, &left_window, &right_window);

            match call {
                ContigCall::HomRef { segment_index } => {
                    let segment = self.index.segment(segment_index);
                    self.result.diagnostic_lines.push(format!(
                        "HOMREF {} {} {} {} {} {} {} {} {}",
                        region.chrom,
                        region.start,
                        region.end,
                        region.chrom,
                        segment.ref_start,
                        segment.ref_end,
                        contig_name,
                        segment.query_start,
                        segment.query_end,
                    ));
                    self.result.run_stats.homref_count += 1;
                }
                ContigCall::InversionFlag => {
                    info!(
                        "Region {label} contig {contig_name}: alternating-orientation alignment \
                        pattern, candidate inversion is flagged but not emitted"
                    );
                    self.result.run_stats.inversion_flag_count += 1;
                }
                ContigCall::Skip(reason) => {
                    debug!("Region {label} contig {contig_name}: {reason}, skipping");
                    self.result.run_stats.unsupported_pattern_count += 1;
                }
                ContigCall::Breakpoints(breakpoint_pairs) => {
                    for breakpoint_pair in breakpoint_pairs {
                        if breakpoint_pair.is_alignment_artifact() {
                            debug!(
                                "Region {label} contig {contig_name}: homology length {} exceeds \
                                100x the {} base event size, dropped as alignment artifact",
                                breakpoint_pair.homology, breakpoint_pair.size
                            );
                            self.result.run_stats.artifact_filtered_count += 1;
                            continue;
                        }
                        let widened = refine_breakpoint(self.index, &breakpoint_pair)?;
                        let record = build_variant_record(self.index, &breakpoint_pair, widened);
                        self.result
                            .vcf_lines
                            .push(format_vcf_line(&record, self.ref_seqs, self.contig_seqs)?);
                        self.result.run_stats.add_record(record.sv_type);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Run breakpoint discovery over every region, in input order
///
pub fn process_regions(
    index: &AlignmentIndex,
    regions: &[Region],
    ref_seqs: Option<&SeqStore>,
    contig_seqs: Option<&SeqStore>,
    flank_buffer: i64,
    flank_probe: i64,
) -> RefineResult<RegionProcessingResult> {
    let mut processor = RegionProcessor {
        index,
        ref_seqs,
        contig_seqs,
        flank_buffer,
        flank_probe,
        result: RegionProcessingResult {
            vcf_lines: Vec::new(),
            diagnostic_lines: Vec::new(),
            run_stats: RunStats::default(),
        },
    };

    for region in regions {
        processor.process_region(region)?;
    }

    let stats = &processor.result.run_stats;
    info!(
        "Processed {} regions: {} records emitted, {} no-coverage, {} homozygous-reference",
        stats.region_count,
        stats.vcf_output_record_count,
        stats.nocov_region_count,
        stats.homref_count
    );
    Ok(processor.result)
}

pub fn write_region_diagnostics(output_dir: &Utf8Path, lines: &[String]) {
    let filename = output_dir.join(REGION_DIAGNOSTICS_FILENAME);

    info!("Writing region diagnostics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create region diagnostics file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
}
