//! Breakpoint discovery and classification for one validated contig
//!
//! Given the region-restricted alignment segments of a contig that spans both region flanks,
//! this module determines the breakpoint count/pattern and classifies each adjacent-segment gap
//! into a variant type using signed reference/contig gap arithmetic.
//!

use std::cmp::Ordering;

use itertools::Itertools;
use strum::Display;

use crate::alignment_index::{AlignmentIndex, AlignmentSegment, Orientation};
use crate::regions::FlankWindow;

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum SvType {
    #[strum(to_string = "INS")]
    Insertion,
    #[strum(to_string = "DEL")]
    Deletion,
    #[strum(to_string = "DUP")]
    Duplication,
    #[strum(to_string = "CON")]
    Contraction,
    #[strum(to_string = "SUBSINS")]
    SubstitutionIns,
    #[strum(to_string = "SUBSDEL")]
    SubstitutionDel,
    #[strum(to_string = "SUBS")]
    Substitution,
}

impl SvType {
    /// Final reported signed length is negative for these types
    pub fn is_loss(&self) -> bool {
        matches!(
            self,
            SvType::Deletion | SvType::Contraction | SvType::SubstitutionDel
        )
    }
}

/// One classified gap between two adjacent same-orientation segments
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BreakpointPair {
    /// Segment index of the alignment ending at the breakpoint (lower ref coordinate side)
    pub left: usize,

    /// Segment index of the alignment resuming after the breakpoint
    pub right: usize,

    pub orientation: Orientation,
    pub ref_gap: i64,
    pub contig_gap: i64,
    pub signed_size: i64,
    pub sv_type: SvType,
    pub size: i64,
    pub homology: i64,
}

impl BreakpointPair {
    /// Candidates whose homology extent dwarfs the event size are treated as alignment noise
    /// rather than true breakpoints
    pub fn is_alignment_artifact(&self) -> bool {
        self.homology > 100 * self.size
    }
}

/// The classification outcome for one validated contig over one region
///
#[derive(Debug, Eq, PartialEq)]
pub enum ContigCall {
    /// A single segment covers the region and both flank windows: uniform reference coverage
    HomRef { segment_index: usize },

    /// One or two simple breakpoint pairs
    Breakpoints(Vec<BreakpointPair>),

    /// Alternating-orientation triple: candidate inversion, flagged but never emitted
    InversionFlag,

    /// Unsupported complex pattern, skipped with a log diagnostic only
    Skip(String),
}

/// Ordering of segments along the contig, walking in the direction of the resolved orientation
///
/// For a consistently-aligned contig this yields ascending reference order on the target
/// chromosome in both orientation cases.
///
pub fn contig_order_cmp(
    orientation: Orientation,
) -> impl Fn(&AlignmentSegment, &AlignmentSegment) -> Ordering {
    move |a, b| match orientation {
        Orientation::Forward => a.query_start.cmp(&b.query_start),
        Orientation::Reverse => b.query_start.cmp(&a.query_start),
    }
}

/// Collect the contig's segments lying within the region's flank windows
///
/// All segments of the contig are considered, across every reference entry it aligns to, sorted
/// by contig coordinate per the resolved orientation. A two-state scan then collects the
/// in-region run: collection opens at the first target-chromosome segment reaching past the left
/// window, and closes (exclusive) at the first target-chromosome segment starting past the right
/// window. Off-target segments inside the run are collected so that the caller can detect and
/// skip mixed-chromosome patterns.
///
pub fn collect_region_segments(
    index: &AlignmentIndex,
    query_entry: usize,
    target_ref_entry: usize,
    orientation: Orientation,
    left_window: &FlankWindow,
    right_window: &FlankWindow,
) -> Vec<usize> {
    let cmp = contig_order_cmp(orientation);
    let all_segments = index
        .pairs_for_query(query_entry)
        .iter()
        .flat_map(|&pair_index| index.entry_pair(pair_index).segment_indices.iter().copied())
        .sorted_by(|&a, &b| cmp(index.segment(a), index.segment(b)))
        .collect::<Vec<_>>();

    let mut collected = Vec::new();
    let mut in_region = false;
    for segment_index in all_segments {
        let segment = index.segment(segment_index);
        let on_target = segment.ref_entry == target_ref_entry;
        if !in_region {
            if on_target && segment.ref_end > left_window.end {
                in_region = true;
                collected.push(segment_index);
            }
        } else {
            if on_target && segment.ref_start > right_window.start {
                break;
            }
            collected.push(segment_index);
        }
    }
    collected
}

/// Classify the gap between two adjacent segments sharing one orientation
///
/// With ref1/ref2 the aligned reference endpoints bounding the break and q1/q2 the corresponding
/// contig endpoints, the signed gaps are:
///   ref_gap    = ref2 - ref1 - 1
///   contig_gap = q2 - q1 - 1  (forward) or  q1 - q2 - 1  (reverse)
///   signed_size = ref_gap - contig_gap
///
/// The duplication/contraction branch requires a true overlap on both sides (both gaps strictly
/// negative); a zero gap on either side falls through to the indel branches.
///
pub fn classify_breakpoint_pair(
    index: &AlignmentIndex,
    left: usize,
    right: usize,
) -> BreakpointPair {
    let left_segment = index.segment(left);
    let right_segment = index.segment(right);
    assert_eq!(left_segment.orientation, right_segment.orientation);
    let orientation = left_segment.orientation;

    let ref1 = left_segment.ref_end;
    let ref2 = right_segment.ref_start;
    let q1 = left_segment.query_end;
    let q2 = right_segment.query_start;

    let ref_gap = ref2 - ref1 - 1;
    let contig_gap = match orientation {
        Orientation::Forward => q2 - q1 - 1,
        Orientation::Reverse => q1 - q2 - 1,
    };
    let signed_size = ref_gap - contig_gap;

    let sv_type = if ref_gap < 0 && contig_gap < 0 {
        if signed_size < 0 {
            SvType::Duplication
        } else {
            SvType::Contraction
        }
    } else if signed_size < 0 && ref_gap > 0 {
        SvType::SubstitutionIns
    } else if signed_size > 0 && contig_gap > 0 {
        SvType::SubstitutionDel
    } else if signed_size < 0 {
        SvType::Insertion
    } else if signed_size > 0 {
        SvType::Deletion
    } else {
        SvType::Substitution
    };

    let homology = match sv_type {
        SvType::Insertion | SvType::Duplication => -ref_gap,
        SvType::Deletion | SvType::Contraction => -contig_gap,
        _ => 0,
    };

    BreakpointPair {
        left,
        right,
        orientation,
        ref_gap,
        contig_gap,
        signed_size,
        sv_type,
        size: signed_size.abs(),
        homology,
    }
}

/// Determine the breakpoint pattern for the collected in-region segments of one contig
///
pub fn classify_contig(
    index: &AlignmentIndex,
    collected: &[usize],
    target_ref_entry: usize,
    left_window: &FlankWindow,
    right_window: &FlankWindow,
) -> ContigCall {
    if collected.len() == 1 {
        let segment_index = collected[0];
        let segment = index.segment(segment_index);
        if segment.ref_entry == target_ref_entry
            && segment.ref_start < left_window.start
            && segment.ref_end > right_window.end
        {
            return ContigCall::HomRef { segment_index };
        }
    }

    if collected.len() > 3 {
        return ContigCall::Skip(format!(
            "unsupported pattern with {} in-region segments",
            collected.len()
        ));
    }
    if collected
        .iter()
        .any(|&x| index.segment(x).ref_entry != target_ref_entry)
    {
        return ContigCall::Skip("in-region segments span multiple chromosomes".to_string());
    }

    let orientations = collected
        .iter()
        .map(|&x| index.segment(x).orientation)
        .collect::<Vec<_>>();

    match collected.len() {
        2 if orientations[0] == orientations[1] => {
            ContigCall::Breakpoints(vec![classify_breakpoint_pair(
                index,
                collected[0],
                collected[1],
            )])
        }
        3 if orientations[0] == orientations[1] && orientations[1] == orientations[2] => {
            ContigCall::Breakpoints(vec![
                classify_breakpoint_pair(index, collected[0], collected[1]),
                classify_breakpoint_pair(index, collected[1], collected[2]),
            ])
        }
        3 if orientations[0] != orientations[1] && orientations[1] != orientations[2] => {
            ContigCall::InversionFlag
        }
        n => ContigCall::Skip(format!("unsupported {n}-segment orientation pattern")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_index::read_alignment_index_from_reader;

    fn window(start: i64, end: i64) -> FlankWindow {
        FlankWindow { start, end }
    }

    /// Flank windows matching region chr1:1000-1005 with buffer 100, probe 20
    fn test_windows() -> (FlankWindow, FlankWindow) {
        (window(900, 920), window(1085, 1105))
    }

    fn classify_two_segment_input(input: &str) -> BreakpointPair {
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let (left_window, right_window) = test_windows();
        let call = classify_contig(&index, &[0, 1], 0, &left_window, &right_window);
        match call {
            ContigCall::Breakpoints(pairs) => {
                assert_eq!(pairs.len(), 1);
                pairs.into_iter().next().unwrap()
            }
            other => panic!("expected breakpoints, got {other:?}"),
        }
    }

    #[test]
    fn test_deletion_with_contig_overlap() {
        // ref_gap=0, contig_gap=-50 -> signed_size=50 -> DEL with 50 bases of homology
        let input = "\
chr1 100 1002 tig1 1 903 0
chr1 1003 2000 tig1 854 1851 0
";
        let pair = classify_two_segment_input(input);
        assert_eq!(pair.ref_gap, 0);
        assert_eq!(pair.contig_gap, -50);
        assert_eq!(pair.signed_size, 50);
        assert_eq!(pair.sv_type, SvType::Deletion);
        assert_eq!(pair.size, 50);
        assert_eq!(pair.homology, 50);
        assert!(!pair.is_alignment_artifact());
    }

    #[test]
    fn test_insertion_with_contig_gap() {
        // Same geometry, contig_gap=+50 -> signed_size=-50 -> INS
        let input = "\
chr1 100 1002 tig1 1 903 0
chr1 1003 2000 tig1 954 1951 0
";
        let pair = classify_two_segment_input(input);
        assert_eq!(pair.ref_gap, 0);
        assert_eq!(pair.contig_gap, 50);
        assert_eq!(pair.signed_size, -50);
        assert_eq!(pair.sv_type, SvType::Insertion);
        assert_eq!(pair.homology, 0);
    }

    #[test]
    fn test_equal_gaps_are_substitution() {
        // ref_gap == contig_gap -> signed_size == 0 -> SUBS
        let input = "\
chr1 100 1000 tig1 1 901 0
chr1 1011 2000 tig1 912 1901 0
";
        let pair = classify_two_segment_input(input);
        assert_eq!(pair.ref_gap, 10);
        assert_eq!(pair.contig_gap, 10);
        assert_eq!(pair.signed_size, 0);
        assert_eq!(pair.sv_type, SvType::Substitution);
        assert_eq!(pair.size, 0);
        assert!(!pair.is_alignment_artifact());
    }

    #[test]
    fn test_duplication_and_contraction() {
        // Both gaps strictly negative
        let dup = "\
chr1 100 1002 tig1 1 903 0
chr1 983 2000 tig1 894 1911 0
";
        let pair = classify_two_segment_input(dup);
        assert_eq!(pair.ref_gap, -20);
        assert_eq!(pair.contig_gap, -10);
        assert_eq!(pair.signed_size, -10);
        assert_eq!(pair.sv_type, SvType::Duplication);
        assert_eq!(pair.homology, 20);

        let con = "\
chr1 100 1002 tig1 1 903 0
chr1 993 2000 tig1 884 1891 0
";
        let pair = classify_two_segment_input(con);
        assert_eq!(pair.ref_gap, -10);
        assert_eq!(pair.contig_gap, -20);
        assert_eq!(pair.signed_size, 10);
        assert_eq!(pair.sv_type, SvType::Contraction);
        assert_eq!(pair.homology, 20);
    }

    #[test]
    fn test_substitution_indel_types() {
        // signed_size<0 with ref_gap>0 -> SUBSINS
        let subsins = "\
chr1 100 1000 tig1 1 901 0
chr1 1011 2000 tig1 932 1921 0
";
        let pair = classify_two_segment_input(subsins);
        assert_eq!(pair.sv_type, SvType::SubstitutionIns);
        assert_eq!(pair.homology, 0);

        // signed_size>0 with contig_gap>0 -> SUBSDEL
        let subsdel = "\
chr1 100 1000 tig1 1 901 0
chr1 1031 2000 tig1 912 1881 0
";
        let pair = classify_two_segment_input(subsdel);
        assert_eq!(pair.sv_type, SvType::SubstitutionDel);
    }

    #[test]
    fn test_reverse_orientation_gap_arithmetic() {
        // Reverse-oriented deletion: contig coordinates descend along the reference
        let input = "\
chr1 100 1002 tig1 2000 1098 1
chr1 1003 2000 tig1 1147 150 1
";
        let pair = classify_two_segment_input(input);
        assert_eq!(pair.orientation, Orientation::Reverse);
        assert_eq!(pair.ref_gap, 0);
        assert_eq!(pair.contig_gap, -50);
        assert_eq!(pair.sv_type, SvType::Deletion);
    }

    #[test]
    fn test_artifact_filter() {
        // homology 150 on a size-1 event exceeds the 100x threshold
        let pair = BreakpointPair {
            left: 0,
            right: 1,
            orientation: Orientation::Forward,
            ref_gap: -150,
            contig_gap: -151,
            signed_size: -1,
            sv_type: SvType::Duplication,
            size: 1,
            homology: 150,
        };
        assert!(pair.is_alignment_artifact());

        // The boundary value is kept
        let pair = BreakpointPair {
            homology: 100,
            ..pair
        };
        assert!(!pair.is_alignment_artifact());
    }

    #[test]
    fn test_homref_single_covering_segment() {
        let input = "chr1 100 2000 tig1 1 1901 0\n";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let (left_window, right_window) = test_windows();
        let call = classify_contig(&index, &[0], 0, &left_window, &right_window);
        assert_eq!(call, ContigCall::HomRef { segment_index: 0 });
    }

    #[test]
    fn test_alternating_triple_is_inversion_flag() {
        let input = "\
chr1 100 950 tig1 1 851 0
chr1 960 1040 tig1 941 861 1
chr1 1050 2000 tig1 951 1901 0
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let (left_window, right_window) = test_windows();
        let collected =
            collect_region_segments(&index, 0, 0, Orientation::Forward, &left_window, &right_window);
        assert_eq!(collected, vec![0, 1, 2]);
        let call = classify_contig(&index, &collected, 0, &left_window, &right_window);
        assert_eq!(call, ContigCall::InversionFlag);
    }

    #[test]
    fn test_non_alternating_triple_is_skipped() {
        let input = "\
chr1 100 950 tig1 1 851 0
chr1 960 1040 tig1 861 941 0
chr1 1050 2000 tig1 1901 951 1
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let (left_window, right_window) = test_windows();
        let call = classify_contig(&index, &[0, 1, 2], 0, &left_window, &right_window);
        assert!(matches!(call, ContigCall::Skip(_)));
    }

    #[test]
    fn test_too_many_segments_skipped() {
        let input = "\
chr1 100 950 tig1 1 851 0
chr1 955 970 tig1 856 871 0
chr1 975 990 tig1 876 891 0
chr1 995 2000 tig1 896 1901 0
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let (left_window, right_window) = test_windows();
        let call = classify_contig(&index, &[0, 1, 2, 3], 0, &left_window, &right_window);
        assert!(matches!(call, ContigCall::Skip(_)));
    }

    #[test]
    fn test_mixed_chromosome_segments_skipped() {
        let input = "\
chr1 100 950 tig1 1 851 0
chr2 5000 5100 tig1 861 961 0
chr1 1050 2000 tig1 971 1921 0
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let chr1 = index.ref_entry_index("chr1").unwrap();
        let (left_window, right_window) = test_windows();

        let collected = collect_region_segments(
            &index,
            0,
            chr1,
            Orientation::Forward,
            &left_window,
            &right_window,
        );
        assert_eq!(collected, vec![0, 1, 2]);

        let call = classify_contig(&index, &collected, chr1, &left_window, &right_window);
        assert_eq!(
            call,
            ContigCall::Skip("in-region segments span multiple chromosomes".to_string())
        );
    }

    #[test]
    fn test_collection_scan_boundaries() {
        // First segment never reaches the left window; last segment starts past the right
        // window start and terminates collection without being included
        let input = "\
chr1 100 800 tig1 1 701 0
chr1 850 950 tig1 751 851 0
chr1 1000 1100 tig1 901 1001 0
chr1 1200 2000 tig1 1101 1901 0
";
        let index = read_alignment_index_from_reader(input.as_bytes()).unwrap();
        let (left_window, right_window) = test_windows();
        let collected = collect_region_segments(
            &index,
            0,
            0,
            Orientation::Forward,
            &left_window,
            &right_window,
        );
        assert_eq!(collected, vec![1, 2]);
    }

    #[test]
    fn test_contig_order_cmp_factory() {
        let index = read_alignment_index_from_reader(
            "chr1 100 200 tig1 301 401 0\nchr1 300 400 tig1 1 101 0\n".as_bytes(),
        )
        .unwrap();
        let fwd = contig_order_cmp(Orientation::Forward);
        let rev = contig_order_cmp(Orientation::Reverse);
        let (a, b) = (index.segment(0), index.segment(1));
        assert_eq!(fwd(a, b), Ordering::Greater);
        assert_eq!(rev(a, b), Ordering::Less);
    }
}
