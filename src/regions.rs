//! Target region input and flank-window derivation
//!

use std::io::BufRead;

use log::info;

use crate::alignment_index::get_text_input_reader;
use crate::error::{RefineError, RefineResult};

/// One target region, converted on read from bed's zero-based half-open convention to the
/// 1-based inclusive convention used throughout breakpoint analysis
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Region {
    pub chrom: String,
    pub start: i64,
    pub end: i64,
}

impl Region {
    pub fn label(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// A short probe interval just outside one region boundary, used to confirm that an alignment
/// continues past the region on that side
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FlankWindow {
    pub start: i64,
    pub end: i64,
}

/// Left and right flank probe windows for a region
///
/// The buffer offsets each window out from the region boundary, and the probe size (bufseg) sets
/// the window width.
///
pub fn get_flank_windows(region: &Region, flank_buffer: i64, flank_probe: i64) -> (FlankWindow, FlankWindow) {
    let left = FlankWindow {
        start: region.start - flank_buffer,
        end: region.start - flank_buffer + flank_probe,
    };
    let right = FlankWindow {
        start: region.end + flank_buffer - flank_probe,
        end: region.end + flank_buffer,
    };
    (left, right)
}

fn parse_region_line(line_no: usize, line: &str) -> RefineResult<Region> {
    let malformed =
        |msg: &str| RefineError::MalformedInput(format!("region line {line_no}: {msg}: '{line}'"));

    let words = line.split_whitespace().collect::<Vec<_>>();
    if words.len() < 3 {
        return Err(malformed("expected at least 3 columns"));
    }

    let start0 = words[1]
        .parse::<i64>()
        .map_err(|_| malformed("can't parse start coordinate"))?;
    let end = words[2]
        .parse::<i64>()
        .map_err(|_| malformed("can't parse end coordinate"))?;

    let region = Region {
        chrom: words[0].to_string(),
        start: start0 + 1,
        end,
    };
    if region.end < region.start {
        return Err(malformed("end coordinate is less than start"));
    }
    Ok(region)
}

pub fn read_regions_from_reader(reader: impl BufRead) -> RefineResult<Vec<Region>> {
    let mut regions = Vec::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line = line
            .map_err(|e| RefineError::MalformedInput(format!("can't read region input: {e}")))?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        regions.push(parse_region_line(line_index + 1, &line)?);
    }
    Ok(regions)
}

/// Read target regions from a bed3+ file, preserving input order
///
pub fn read_regions(filename: &str) -> RefineResult<Vec<Region>> {
    info!("Reading target regions from file '{filename}'");

    let regions = read_regions_from_reader(get_text_input_reader(filename))?;

    info!("Read {} target regions", regions.len());
    Ok(regions)
}
