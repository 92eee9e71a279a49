use std::collections::HashMap;
use std::fs::File;

use bio::io::fasta;
use log::info;
use unwrap::unwrap;

use crate::error::{RefineError, RefineResult};
use crate::seq_util::rev_comp;

/// In-memory store of one FASTA input, either the reference genome or the contig assembly
///
#[derive(Default)]
pub struct SeqStore {
    /// A map from entry name to uppercase sequence
    pub entries: HashMap<String, Vec<u8>>,
}

impl SeqStore {
    /// Retrieve bases over a 1-based inclusive coordinate range
    ///
    /// A start coordinate greater than the end coordinate requests the reverse strand, and the
    /// extracted interval is reverse-complemented before being returned. Reverse extraction is
    /// restricted to ACGT/N characters.
    ///
    pub fn seq(&self, entry: &str, start: i64, end: i64) -> RefineResult<Vec<u8>> {
        let full = self.entries.get(entry).ok_or_else(|| {
            RefineError::MalformedInput(format!("unknown sequence entry name '{entry}'"))
        })?;

        let (lo, hi, flip) = if start <= end {
            (start, end, false)
        } else {
            (end, start, true)
        };
        if lo < 1 || hi > full.len() as i64 {
            return Err(RefineError::MalformedInput(format!(
                "coordinate range {start}-{end} out of bounds for entry '{entry}' of length {}",
                full.len()
            )));
        }
        let bases = &full[(lo - 1) as usize..hi as usize];
        if flip { rev_comp(bases) } else { Ok(bases.to_vec()) }
    }

    pub fn entry_len(&self, entry: &str) -> Option<i64> {
        self.entries.get(entry).map(|x| x.len() as i64)
    }
}

/// Read a FASTA file pointer into a SeqStore
///
/// This method converts all input characters to upper-case
///
pub fn read_seq_store_fp(file: File) -> SeqStore {
    let reader = fasta::Reader::new(file);

    let mut store = SeqStore::default();
    for result in reader.records() {
        let record = result.expect("Error during fasta record parsing");
        store
            .entries
            .insert(record.id().to_string(), record.seq().to_ascii_uppercase());
    }
    store
}

/// Read a FASTA file into a SeqStore
///
pub fn read_seq_store(filename: &str, label: &str) -> SeqStore {
    info!("Reading {label} sequences from file '{filename}'");

    let file = unwrap!(
        File::open(filename),
        "Unable to open {} fasta file: '{}'",
        label,
        filename,
    );
    read_seq_store_fp(file)
}
