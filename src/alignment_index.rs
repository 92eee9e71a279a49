//! Read-only index of reference-to-contig alignment segments
//!
//! The index is built once from the external aligner's segment table and never mutated
//! afterwards. Segments are stored in one arena vector, with entry pairs and per-entry lookup
//! tables expressed as index lists into that arena.
//!

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use log::info;
use unwrap::unwrap;

use crate::error::{RefineError, RefineResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn is_reverse(&self) -> bool {
        *self == Orientation::Reverse
    }
}

/// One maximal contiguous matched block between a reference entry and a contig entry
///
/// All coordinates are 1-based inclusive. Query coordinates are always given on the forward
/// strand of the contig, with `query_start` aligned to `ref_start`, so a reverse-orientation
/// segment has `query_start > query_end`.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignmentSegment {
    pub ref_entry: usize,
    pub ref_start: i64,
    pub ref_end: i64,
    pub query_entry: usize,
    pub query_start: i64,
    pub query_end: i64,
    pub orientation: Orientation,
}

/// All alignment segments between one reference entry and one contig entry
///
/// Segment indices are kept in first-encounter order from the input stream. The pair itself has
/// no orientation; an orientation is resolved for the pair separately each time it is validated
/// against a region.
///
pub struct EntryPair {
    pub ref_entry: usize,
    pub query_entry: usize,
    pub segment_indices: Vec<usize>,
}

#[derive(Default)]
pub struct AlignmentIndex {
    pub segments: Vec<AlignmentSegment>,
    pub entry_pairs: Vec<EntryPair>,

    ref_names: Vec<String>,
    query_names: Vec<String>,
    ref_name_to_index: HashMap<String, usize>,
    query_name_to_index: HashMap<String, usize>,

    /// Entry-pair indices grouped by reference entry, in pair first-encounter order
    pairs_by_ref: Vec<Vec<usize>>,

    /// Entry-pair indices grouped by contig entry, in pair first-encounter order
    pairs_by_query: Vec<Vec<usize>>,

    /// Highest aligned ref_end per reference entry, used as a chromosome length estimate when no
    /// reference fasta is provided
    ref_extent: Vec<i64>,
}

impl AlignmentIndex {
    pub fn ref_name(&self, ref_entry: usize) -> &str {
        &self.ref_names[ref_entry]
    }

    pub fn query_name(&self, query_entry: usize) -> &str {
        &self.query_names[query_entry]
    }

    pub fn ref_entry_index(&self, name: &str) -> Option<usize> {
        self.ref_name_to_index.get(name).copied()
    }

    pub fn segment(&self, segment_index: usize) -> &AlignmentSegment {
        &self.segments[segment_index]
    }

    pub fn entry_pair(&self, pair_index: usize) -> &EntryPair {
        &self.entry_pairs[pair_index]
    }

    /// Entry pairs aligned to the given reference entry, in first-encounter order
    pub fn pairs_for_ref(&self, ref_entry: usize) -> &[usize] {
        &self.pairs_by_ref[ref_entry]
    }

    /// Entry pairs involving the given contig entry, in first-encounter order
    pub fn pairs_for_query(&self, query_entry: usize) -> &[usize] {
        &self.pairs_by_query[query_entry]
    }

    pub fn ref_alignment_extent(&self, ref_entry: usize) -> i64 {
        self.ref_extent[ref_entry]
    }

    fn ref_entry_id(&mut self, name: &str) -> usize {
        match self.ref_name_to_index.get(name) {
            Some(&x) => x,
            None => {
                let x = self.ref_names.len();
                self.ref_names.push(name.to_string());
                self.ref_name_to_index.insert(name.to_string(), x);
                self.pairs_by_ref.push(Vec::new());
                self.ref_extent.push(0);
                x
            }
        }
    }

    fn query_entry_id(&mut self, name: &str) -> usize {
        match self.query_name_to_index.get(name) {
            Some(&x) => x,
            None => {
                let x = self.query_names.len();
                self.query_names.push(name.to_string());
                self.query_name_to_index.insert(name.to_string(), x);
                self.pairs_by_query.push(Vec::new());
                x
            }
        }
    }

    /// Add one segment during index construction, creating its entry pair on first encounter
    fn add_segment(
        &mut self,
        pair_lookup: &mut HashMap<(usize, usize), usize>,
        ref_name: &str,
        query_name: &str,
        ref_start: i64,
        ref_end: i64,
        query_start: i64,
        query_end: i64,
        orientation: Orientation,
    ) {
        let ref_entry = self.ref_entry_id(ref_name);
        let query_entry = self.query_entry_id(query_name);

        let segment_index = self.segments.len();
        self.segments.push(AlignmentSegment {
            ref_entry,
            ref_start,
            ref_end,
            query_entry,
            query_start,
            query_end,
            orientation,
        });
        self.ref_extent[ref_entry] = std::cmp::max(self.ref_extent[ref_entry], ref_end);

        let pair_index = match pair_lookup.get(&(ref_entry, query_entry)) {
            Some(&x) => x,
            None => {
                let x = self.entry_pairs.len();
                self.entry_pairs.push(EntryPair {
                    ref_entry,
                    query_entry,
                    segment_indices: Vec::new(),
                });
                pair_lookup.insert((ref_entry, query_entry), x);
                self.pairs_by_ref[ref_entry].push(x);
                self.pairs_by_query[query_entry].push(x);
                x
            }
        };
        self.entry_pairs[pair_index].segment_indices.push(segment_index);
    }
}

fn parse_orientation(word: &str) -> Option<Orientation> {
    match word {
        "0" | "+" | "F" => Some(Orientation::Forward),
        "1" | "-" | "R" => Some(Orientation::Reverse),
        _ => None,
    }
}

/// Parse one alignment segment row and add it to the index under construction
///
/// Expected columns are `ref_entry ref_start ref_end query_entry query_start query_end
/// orientation`. Reverse-orientation rows may carry either query coordinate order in the input;
/// they are normalized here so that `query_start > query_end`.
///
fn parse_segment_line(
    index: &mut AlignmentIndex,
    pair_lookup: &mut HashMap<(usize, usize), usize>,
    line_no: usize,
    line: &str,
) -> RefineResult<()> {
    let malformed =
        |msg: &str| RefineError::MalformedInput(format!("segment line {line_no}: {msg}: '{line}'"));

    let words = line.split_whitespace().collect::<Vec<_>>();
    if words.len() < 7 {
        return Err(malformed("expected at least 7 columns"));
    }

    let parse_coord = |word: &str, label: &str| -> RefineResult<i64> {
        word.parse::<i64>()
            .map_err(|_| malformed(&format!("can't parse {label} coordinate")))
    };

    let ref_start = parse_coord(words[1], "ref start")?;
    let ref_end = parse_coord(words[2], "ref end")?;
    let query_start = parse_coord(words[4], "query start")?;
    let query_end = parse_coord(words[5], "query end")?;
    let orientation =
        parse_orientation(words[6]).ok_or_else(|| malformed("can't parse orientation"))?;

    if ref_start > ref_end {
        return Err(malformed("ref start exceeds ref end"));
    }

    let (query_start, query_end) = match orientation {
        Orientation::Forward => {
            if query_start > query_end {
                return Err(malformed("query start exceeds query end on forward segment"));
            }
            (query_start, query_end)
        }
        Orientation::Reverse => {
            if query_start >= query_end {
                (query_start, query_end)
            } else {
                (query_end, query_start)
            }
        }
    };

    index.add_segment(
        pair_lookup,
        words[0],
        words[3],
        ref_start,
        ref_end,
        query_start,
        query_end,
        orientation,
    );
    Ok(())
}

/// Open a possibly-gzipped text input
pub fn get_text_input_reader(filename: &str) -> Box<dyn BufRead> {
    let file = unwrap!(File::open(filename), "Unable to open input file: '{}'", filename);
    if Utf8Path::new(filename).extension() == Some("gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    }
}

pub fn read_alignment_index_from_reader(reader: impl Read) -> RefineResult<AlignmentIndex> {
    let mut index = AlignmentIndex::default();
    let mut pair_lookup = HashMap::new();

    for (line_index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|e| {
            RefineError::MalformedInput(format!("can't read alignment segment input: {e}"))
        })?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        parse_segment_line(&mut index, &mut pair_lookup, line_index + 1, &line)?;
    }
    Ok(index)
}

/// Read the whole alignment segment table into an AlignmentIndex
///
/// Any malformed row is fatal, surfaced before region processing starts.
///
pub fn read_alignment_index(filename: &str) -> RefineResult<AlignmentIndex> {
    info!("Reading alignment segments from file '{filename}'");

    let index = read_alignment_index_from_reader(get_text_input_reader(filename))?;

    info!(
        "Indexed {} alignment segments in {} entry pairs",
        index.segments.len(),
        index.entry_pairs.len()
    );
    Ok(index)
}
