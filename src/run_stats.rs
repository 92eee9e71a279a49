//! Track stats for the whole garfish run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

use crate::classify::SvType;

pub const RUN_STATS_FILENAME: &str = "run.stats.json";

#[derive(Default, Deserialize, Serialize)]
pub struct RunStats {
    pub region_count: usize,
    pub nocov_region_count: usize,
    pub homref_count: usize,
    pub spanning_contig_count: usize,
    pub unsupported_pattern_count: usize,
    pub inversion_flag_count: usize,
    pub artifact_filtered_count: usize,

    pub vcf_output_record_count: usize,
    pub insertion_count: usize,
    pub deletion_count: usize,
    pub duplication_count: usize,
    pub contraction_count: usize,
    pub substitution_ins_count: usize,
    pub substitution_del_count: usize,
    pub substitution_count: usize,
}

impl RunStats {
    pub fn add_record(&mut self, sv_type: SvType) {
        self.vcf_output_record_count += 1;
        match sv_type {
            SvType::Insertion => self.insertion_count += 1,
            SvType::Deletion => self.deletion_count += 1,
            SvType::Duplication => self.duplication_count += 1,
            SvType::Contraction => self.contraction_count += 1,
            SvType::SubstitutionIns => self.substitution_ins_count += 1,
            SvType::SubstitutionDel => self.substitution_del_count += 1,
            SvType::Substitution => self.substitution_count += 1,
        }
    }
}

/// Write run_stats structure out in json format
pub fn write_run_stats(output_dir: &Utf8Path, run_stats: &RunStats) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    serde_json::to_writer_pretty(&f, &run_stats).unwrap();
}
