//! Parsing helpers for `kpartx -v` output.
//!
//! A verbose add prints one line per mapped partition:
//!
//! ```text
//! add map loop5p1 (253:0): 0 524288 linear 7:5 8192
//! add map loop5p2 (253:1): 0 3686400 linear 7:5 532480
//! ```

use regex::Regex;
use std::sync::OnceLock;

fn add_map_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"add map (loop\d+p\d+)").expect("valid kpartx regex"))
}

/// Mapping names (`loopNpM`) in the order kpartx reported them.
pub fn parse_add_maps(stdout: &str) -> Vec<String> {
    add_map_re()
        .captures_iter(stdout)
        .map(|caps| caps[1].to_string())
        .collect()
}
