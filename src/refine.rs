//! Breakpoint coordinate refinement via reciprocal reference/contig projection
//!
//! Insertion and duplication breakpoints are widened by projecting the bounding reference
//! coordinates into contig space through the opposite segment; deletions and contractions use the
//! symmetric contig-to-reference projection. The widened coordinate pair bounds the full
//! homologous interval around the breakpoint.
//!

use log::debug;

use crate::alignment_index::{AlignmentIndex, AlignmentSegment, Orientation};
use crate::classify::{BreakpointPair, SvType};
use crate::error::{RefineError, RefineResult};

/// Project a reference coordinate to its contig coordinate along one segment
///
/// Returns None if the reference coordinate is not covered by the segment.
///
pub fn project_ref_to_query(segment: &AlignmentSegment, ref_pos: i64) -> Option<i64> {
    if ref_pos < segment.ref_start || ref_pos > segment.ref_end {
        return None;
    }
    let offset = ref_pos - segment.ref_start;
    Some(match segment.orientation {
        Orientation::Forward => segment.query_start + offset,
        Orientation::Reverse => segment.query_start - offset,
    })
}

/// Project a contig coordinate to its reference coordinate along one segment
///
/// Returns None if the contig coordinate is not covered by the segment.
///
pub fn project_query_to_ref(segment: &AlignmentSegment, query_pos: i64) -> Option<i64> {
    let (lo, hi) = match segment.orientation {
        Orientation::Forward => (segment.query_start, segment.query_end),
        Orientation::Reverse => (segment.query_end, segment.query_start),
    };
    if query_pos < lo || query_pos > hi {
        return None;
    }
    Some(match segment.orientation {
        Orientation::Forward => segment.ref_start + (query_pos - segment.query_start),
        Orientation::Reverse => segment.ref_start + (segment.query_start - query_pos),
    })
}

/// Verify that projecting a segment's own reference endpoint reproduces its recorded contig
/// endpoint
///
/// A disagreement means the aligner segment data and the index contradict each other, which is
/// not recoverable at the region level because it implies the input files are not mutually
/// consistent.
///
fn check_segment_self_consistency(
    index: &AlignmentIndex,
    segment: &AlignmentSegment,
) -> RefineResult<()> {
    let projected = project_ref_to_query(segment, segment.ref_end);
    if projected != Some(segment.query_end) {
        return Err(RefineError::MismatchedCoordinates(format!(
            "projected contig coordinate {projected:?} disagrees with observed coordinate {} at \
            {}:{} on contig {}",
            segment.query_end,
            index.ref_name(segment.ref_entry),
            segment.ref_end,
            index.query_name(segment.query_entry),
        )));
    }
    Ok(())
}

/// The homology-widened coordinate pair for one refined breakpoint
///
/// For insertions/duplications the coordinates are in contig space (query1p/query2p); for
/// deletions/contractions they are in reference space (ref1p/ref2p).
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WidenedCoords {
    pub first: i64,
    pub second: i64,
}

/// Step one coordinate unit in the direction the contig advances along the reference
fn orientation_step(orientation: Orientation) -> i64 {
    match orientation {
        Orientation::Forward => 1,
        Orientation::Reverse => -1,
    }
}

/// Compute the widened homology interval for an insertion/duplication or deletion/contraction
/// breakpoint
///
/// Returns None for substitution-class breakpoints, which are not refined.
///
pub fn refine_breakpoint(
    index: &AlignmentIndex,
    pair: &BreakpointPair,
) -> RefineResult<Option<WidenedCoords>> {
    let left = index.segment(pair.left);
    let right = index.segment(pair.right);

    check_segment_self_consistency(index, left)?;
    check_segment_self_consistency(index, right)?;

    let ref1 = left.ref_end;
    let ref2 = right.ref_start;
    let q1 = left.query_end;
    let q2 = right.query_start;
    let step = orientation_step(pair.orientation);

    let contig_name = index.query_name(left.query_entry);

    let widened = match pair.sv_type {
        SvType::Insertion | SvType::Duplication => {
            // Project each bounding ref coordinate through the other side's segment. A missing
            // projection means the reference base is not repeated elsewhere on the contig, so the
            // breakpoint is non-repetitive and the widened interval collapses to the gap itself.
            let query1p = match project_ref_to_query(left, ref2) {
                Some(x) => x,
                None => {
                    debug!("Non-repetitive {} breakpoint at {}:{} contig {contig_name}",
                        pair.sv_type, index.ref_name(left.ref_entry), ref1);
                    q1 + step
                }
            };
            let query2p = match project_ref_to_query(right, ref1) {
                Some(x) => x,
                None => {
                    debug!("Non-repetitive {} breakpoint at {}:{} contig {contig_name}",
                        pair.sv_type, index.ref_name(right.ref_entry), ref2);
                    q2 - step
                }
            };
            Some(WidenedCoords {
                first: query1p,
                second: query2p,
            })
        }
        SvType::Deletion | SvType::Contraction => {
            let ref1p = match project_query_to_ref(left, q2) {
                Some(x) => x,
                None => {
                    debug!("Non-repetitive {} breakpoint at {}:{} contig {contig_name}",
                        pair.sv_type, index.ref_name(left.ref_entry), ref1);
                    ref1 + 1
                }
            };
            let ref2p = match project_query_to_ref(right, q1) {
                Some(x) => x,
                None => {
                    debug!("Non-repetitive {} breakpoint at {}:{} contig {contig_name}",
                        pair.sv_type, index.ref_name(right.ref_entry), ref2);
                    ref2 - 1
                }
            };
            Some(WidenedCoords {
                first: ref1p,
                second: ref2p,
            })
        }
        _ => None,
    };
    Ok(widened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_index::read_alignment_index_from_reader;
    use crate::classify::classify_breakpoint_pair;

    #[test]
    fn test_projection_forward() {
        let index =
            read_alignment_index_from_reader("chr1 100 200 tig1 51 151 0\n".as_bytes()).unwrap();
        let segment = index.segment(0);

        assert_eq!(project_ref_to_query(segment, 100), Some(51));
        assert_eq!(project_ref_to_query(segment, 150), Some(101));
        assert_eq!(project_ref_to_query(segment, 201), None);

        assert_eq!(project_query_to_ref(segment, 51), Some(100));
        assert_eq!(project_query_to_ref(segment, 101), Some(150));
        assert_eq!(project_query_to_ref(segment, 50), None);
    }

    #[test]
    fn test_projection_reverse() {
        let index =
            read_alignment_index_from_reader("chr1 100 200 tig1 151 51 1\n".as_bytes()).unwrap();
        let segment = index.segment(0);

        assert_eq!(project_ref_to_query(segment, 100), Some(151));
        assert_eq!(project_ref_to_query(segment, 200), Some(51));

        assert_eq!(project_query_to_ref(segment, 151), Some(100));
        assert_eq!(project_query_to_ref(segment, 51), Some(200));
        assert_eq!(project_query_to_ref(segment, 152), None);
    }

    #[test]
    fn test_projection_roundtrip() {
        let index = read_alignment_index_from_reader(
            "chr1 100 200 tig1 51 151 0\nchr1 300 400 tig1 500 400 1\n".as_bytes(),
        )
        .unwrap();
        for segment in index.segments.iter() {
            for ref_pos in [segment.ref_start, segment.ref_start + 17, segment.ref_end] {
                let q = project_ref_to_query(segment, ref_pos).unwrap();
                assert_eq!(project_query_to_ref(segment, q), Some(ref_pos));
            }
        }
    }

    #[test]
    fn test_mismatched_coordinates_fatal() {
        // Ref span is 101 bases but query span is 100: projection of the segment's own endpoint
        // disagrees with the recorded endpoint
        let index =
            read_alignment_index_from_reader("chr1 100 200 tig1 51 150 0\n".as_bytes()).unwrap();
        let pair = classify_breakpoint_pair(&index, 0, 0);
        let result = refine_breakpoint(&index, &pair);
        assert!(matches!(result, Err(RefineError::MismatchedCoordinates(_))));
    }

    #[test]
    fn test_deletion_widening() {
        // 55-base deletion with 5 bases of contig-overlap homology
        let input = "\
chr1 1 100 tig1 1 100 0
chr1 151 250 tig1 96 195 0
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let pair = classify_breakpoint_pair(&index, 0, 1);
        assert_eq!(pair.sv_type, SvType::Deletion);
        assert_eq!(pair.homology, 5);

        let widened = refine_breakpoint(&index, &pair).unwrap().unwrap();
        assert_eq!(widened, WidenedCoords { first: 96, second: 155 });
    }

    #[test]
    fn test_deletion_widening_fallback() {
        // Adjacent contig flanks: no reciprocal mapping exists, widened interval collapses to
        // exactly the deleted bases
        let input = "\
chr1 1 100 tig1 1 100 0
chr1 151 250 tig1 101 200 0
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let pair = classify_breakpoint_pair(&index, 0, 1);
        assert_eq!(pair.homology, 0);

        let widened = refine_breakpoint(&index, &pair).unwrap().unwrap();
        assert_eq!(widened, WidenedCoords { first: 101, second: 150 });
    }

    #[test]
    fn test_insertion_widening() {
        // 53-base insertion with 3 bases of ref-overlap homology
        let input = "\
chr1 1 100 tig1 1 100 0
chr1 98 200 tig1 151 253 0
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let pair = classify_breakpoint_pair(&index, 0, 1);
        assert_eq!(pair.sv_type, SvType::Insertion);
        assert_eq!(pair.ref_gap, -3);
        assert_eq!(pair.homology, 3);

        // query1p: ref2=98 on the left segment -> 98; query2p: ref1=100 on the right -> 153
        let widened = refine_breakpoint(&index, &pair).unwrap().unwrap();
        assert_eq!(widened, WidenedCoords { first: 98, second: 153 });
    }

    #[test]
    fn test_insertion_widening_reverse() {
        // Reverse-oriented insertion: the widened contig coordinates descend
        let input = "\
chr1 1 100 tig1 300 201 1
chr1 98 200 tig1 150 48 1
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let pair = classify_breakpoint_pair(&index, 0, 1);
        assert_eq!(pair.sv_type, SvType::Insertion);
        assert_eq!(pair.homology, 3);

        let widened = refine_breakpoint(&index, &pair).unwrap().unwrap();
        assert_eq!(widened, WidenedCoords { first: 203, second: 148 });
    }

    #[test]
    fn test_substitution_not_refined() {
        let input = "\
chr1 1 100 tig1 1 100 0
chr1 111 200 tig1 111 200 0
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let pair = classify_breakpoint_pair(&index, 0, 1);
        assert_eq!(pair.sv_type, SvType::Substitution);
        assert_eq!(refine_breakpoint(&index, &pair).unwrap(), None);
    }
}
