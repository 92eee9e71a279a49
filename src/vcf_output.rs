//! Final variant record assembly and VCF data-line serialization
//!
//! Header emission is left to the downstream consumer; this module writes VCF4.2 data lines
//! only, one per accepted breakpoint, in region input order.
//!

use std::fs::File;
use std::io::{BufWriter, Write};

use camino::Utf8Path;
use log::info;
use unwrap::unwrap;

use crate::alignment_index::AlignmentIndex;
use crate::classify::{BreakpointPair, SvType};
use crate::error::{RefineError, RefineResult};
use crate::genome_seq::SeqStore;
use crate::refine::WidenedCoords;
use crate::seq_util::comp_base;

pub const VARIANT_RECORDS_FILENAME: &str = "variants.vcf";

/// One fully-normalized variant call ready for serialization
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VariantRecord {
    pub chrom: String,
    pub pos: i64,
    pub end: i64,
    pub sv_type: SvType,

    /// Signed length: negative for all loss types, positive otherwise
    pub svlen: i64,

    pub homology: i64,
    pub contig: String,
    pub alt_pos: i64,
    pub alt_end: i64,
    pub ref_widened: (i64, i64),
    pub contig_widened: (i64, i64),
    pub is_reverse: bool,
}

/// Assemble the variant record for one classified breakpoint, applying type-specific coordinate
/// normalization
///
/// Insertion-class records are anchored at the base before the left-aligned insertion point, so
/// END equals POS when there is no breakpoint homology. Deletion-class records carry the raw
/// flanking aligned bases as POS/END, except in the zero-homology case where the coordinates are
/// shifted inward so that the record starts on the VCF anchor-base convention.
///
pub fn build_variant_record(
    index: &AlignmentIndex,
    pair: &BreakpointPair,
    widened: Option<WidenedCoords>,
) -> VariantRecord {
    let left = index.segment(pair.left);
    let right = index.segment(pair.right);

    let ref1 = left.ref_end;
    let ref2 = right.ref_start;
    let q1 = left.query_end;
    let q2 = right.query_start;
    let is_reverse = pair.orientation.is_reverse();
    let step = if is_reverse { -1 } else { 1 };

    let chrom = index.ref_name(left.ref_entry).to_string();
    let contig = index.query_name(left.query_entry).to_string();
    let homology = pair.homology;
    let size = pair.size;

    match pair.sv_type {
        SvType::Insertion | SvType::Duplication => {
            let widened = widened.expect("refined coordinates required for insertion-class types");
            let alt_pos = q1 - homology * step;
            VariantRecord {
                chrom,
                pos: ref2 - 1,
                end: ref1,
                sv_type: pair.sv_type,
                svlen: size,
                homology,
                contig,
                alt_pos,
                alt_end: alt_pos + size * step,
                ref_widened: (ref2 - 1, ref1),
                contig_widened: (widened.first, widened.second),
                is_reverse,
            }
        }
        SvType::Deletion | SvType::Contraction => {
            let widened = widened.expect("refined coordinates required for deletion-class types");
            let mut record = VariantRecord {
                chrom,
                pos: ref1,
                end: ref2,
                sv_type: pair.sv_type,
                svlen: -size,
                homology,
                contig,
                alt_pos: q2,
                alt_end: q2,
                ref_widened: (widened.first, widened.second),
                contig_widened: (q2, q1),
                is_reverse,
            };
            if homology == 0 {
                // Zero-homology deletions need the anchor-base shift
                record.pos += 1;
                record.end -= 1;
                record.ref_widened.1 += 1;
                record.alt_pos -= step;
                record.alt_end -= step;
            }
            record
        }
        _ => VariantRecord {
            chrom,
            pos: ref1,
            end: ref2,
            sv_type: pair.sv_type,
            svlen: if pair.sv_type.is_loss() { -size } else { size },
            homology: 0,
            contig,
            alt_pos: q1,
            alt_end: q2,
            ref_widened: (ref1, ref2),
            contig_widened: (q1, q2),
            is_reverse,
        },
    }
}

/// Retrieve the REF and ALT allele text for a record
///
/// The contig accessor reverse-complements automatically when alt_pos > alt_end; the degenerate
/// single-base reverse anchor gives the accessor no direction signal, so it is complemented here
/// instead.
///
fn get_allele_seqs(
    record: &VariantRecord,
    ref_seqs: &SeqStore,
    contig_seqs: &SeqStore,
) -> RefineResult<(String, String)> {
    let ref_end = match record.sv_type {
        SvType::Deletion | SvType::Contraction => record.end,
        _ => record.pos,
    };
    let ref_allele = ref_seqs.seq(&record.chrom, record.pos, ref_end)?;

    let mut alt_allele = contig_seqs.seq(&record.contig, record.alt_pos, record.alt_end)?;
    if record.is_reverse && record.alt_pos == record.alt_end {
        alt_allele = vec![comp_base(alt_allele[0])?];
    }

    let to_string = |x: Vec<u8>| {
        String::from_utf8(x)
            .map_err(|_| RefineError::InvalidSequenceData("non-utf8 allele sequence".to_string()))
    };
    Ok((to_string(ref_allele)?, to_string(alt_allele)?))
}

/// Serialize one record as a VCF4.2 data line with the single fixed-genotype sample column
///
pub fn format_vcf_line(
    record: &VariantRecord,
    ref_seqs: Option<&SeqStore>,
    contig_seqs: Option<&SeqStore>,
) -> RefineResult<String> {
    let (ref_allele, alt_allele) = match (ref_seqs, contig_seqs) {
        (Some(r), Some(c)) => get_allele_seqs(record, r, c)?,
        _ => (".".to_string(), format!("<{}>", record.sv_type)),
    };

    let comp_suffix = if record.is_reverse { "_comp" } else { "" };
    let info = format!(
        "END={};SVTYPE={};SVLEN={};HOMAPPLEN={};REFWIDENED={}:{}-{};CONTIGALTPOS={}:{}-{};CONTIGWIDENED={}:{}-{}{}",
        record.end,
        record.sv_type,
        record.svlen,
        record.homology,
        record.chrom,
        record.ref_widened.0,
        record.ref_widened.1,
        record.contig,
        record.alt_pos,
        record.alt_end,
        record.contig,
        record.contig_widened.0,
        record.contig_widened.1,
        comp_suffix,
    );

    Ok(format!(
        "{}\t{}\t.\t{}\t{}\t.\tPASS\t{}\tGT\t1/1",
        record.chrom, record.pos, ref_allele, alt_allele, info
    ))
}

pub fn write_vcf_records(output_dir: &Utf8Path, lines: &[String]) {
    let filename = output_dir.join(VARIANT_RECORDS_FILENAME);

    info!("Writing {} variant records to file: '{filename}'", lines.len());

    let f = unwrap!(
        File::create(&filename),
        "Unable to create variant record file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
}
