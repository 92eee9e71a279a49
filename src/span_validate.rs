//! Find contigs whose alignments validly span a target region
//!

use log::debug;

use crate::alignment_index::{AlignmentIndex, Orientation};
use crate::regions::FlankWindow;

/// One entry pair accepted for a region, with the orientation resolved for that region
///
#[derive(Debug, Eq, PartialEq)]
pub struct SpanningContig {
    pub pair_index: usize,
    pub orientation: Orientation,
}

/// Return true if the segment extends past both edges of the flank window
fn spans_window(index: &AlignmentIndex, segment_index: usize, window: &FlankWindow) -> bool {
    let segment = index.segment(segment_index);
    segment.ref_start < window.start && segment.ref_end > window.end
}

/// Check each candidate entry pair for segments spanning both flank windows of a region, and
/// resolve a single orientation for each accepted pair
///
/// Both spanning sets must share an orientation for the pair to be accepted; forward is tested
/// first. Pairs with an empty spanning set on either side are silently rejected, since "no
/// coverage" is the overwhelmingly common outcome. All other rejections get a debug diagnostic.
///
/// Results preserve the first-encounter order of the input pair list.
///
pub fn validate_region_spans(
    index: &AlignmentIndex,
    pair_indices: &[usize],
    left_window: &FlankWindow,
    right_window: &FlankWindow,
    region_label: &str,
) -> Vec<SpanningContig> {
    let mut accepted = Vec::new();

    for &pair_index in pair_indices {
        let pair = index.entry_pair(pair_index);

        let left_spanning = pair
            .segment_indices
            .iter()
            .copied()
            .filter(|&x| spans_window(index, x, left_window))
            .collect::<Vec<_>>();
        if left_spanning.is_empty() {
            continue;
        }
        let right_spanning = pair
            .segment_indices
            .iter()
            .copied()
            .filter(|&x| spans_window(index, x, right_window))
            .collect::<Vec<_>>();
        if right_spanning.is_empty() {
            continue;
        }

        let contig_name = index.query_name(pair.query_entry);
        if left_spanning.len() > 1 || right_spanning.len() > 1 {
            debug!(
                "Region {region_label} contig {contig_name}: multiple flank-spanning segments \
                (left: {} right: {})",
                left_spanning.len(),
                right_spanning.len()
            );
        }

        let has_orientation = |segment_indices: &[usize], orientation: Orientation| {
            segment_indices
                .iter()
                .any(|&x| index.segment(x).orientation == orientation)
        };
        let resolve = |orientation: Orientation| {
            has_orientation(&left_spanning, orientation)
                && has_orientation(&right_spanning, orientation)
        };

        let orientation = if resolve(Orientation::Forward) {
            Orientation::Forward
        } else if resolve(Orientation::Reverse) {
            Orientation::Reverse
        } else {
            debug!(
                "Region {region_label} contig {contig_name}: inconsistent alignment pattern, no \
                shared flank orientation"
            );
            continue;
        };

        accepted.push(SpanningContig {
            pair_index,
            orientation,
        });
    }
    accepted
}
