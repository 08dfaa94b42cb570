//! Candidate column names for metrics whose headers drifted across harness
//! versions. The first entry is the canonical name; resolution tries each
//! candidate exactly, then case-insensitively.

pub const GFLOPS: &[&str] = &["gflops", "gflops_per_s", "Gflops"];
pub const CPE: &[&str] = &["cpe", "cycles_per_element", "CPE"];
pub const GIBPS: &[&str] = &["gibps", "GiBps", "bandwidth_gib_per_s", "gib_per_s"];
pub const VERSION: &[&str] = &["version", "simd_or_scalar", "Version"];
