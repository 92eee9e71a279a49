use crate::error::{RefineError, RefineResult};

/// Complement a single uppercase DNA base
///
/// Returns a MalformedInput-style sequence error on anything outside ACGT/N, since complemented
/// output is only ever requested for strand-flipped contig extraction where ambiguity codes are
/// not expected.
///
pub fn comp_base(base: u8) -> RefineResult<u8> {
    match base {
        b'A' => Ok(b'T'),
        b'T' => Ok(b'A'),
        b'C' => Ok(b'G'),
        b'G' => Ok(b'C'),
        b'N' => Ok(b'N'),
        y => Err(RefineError::InvalidSequenceData(format!(
            "unsupported DNA character '{}' in reverse-strand extraction",
            y as char
        ))),
    }
}

pub fn rev_comp(dna: &[u8]) -> RefineResult<Vec<u8>> {
    dna.iter().rev().map(|&x| comp_base(x)).collect()
}
