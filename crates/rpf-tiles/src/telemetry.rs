//! Metric names emitted by the tile source.
//!
//! Metrics go through the `metrics` facade; they are no-ops until the
//! application installs a recorder. Call [`describe_metrics`] once at startup
//! to register descriptions and units.

use metrics::{describe_counter, Unit};

/// Frames opened through the frame reader (cache misses included).
pub const FRAMES_OPENED: &str = "rpf.frames.opened";

/// Frame opens served from the frame cache.
pub const FRAME_CACHE_HITS: &str = "rpf.frames.cache_hits";

/// Sub-frames decoded into tiles.
pub const SUBFRAMES_DECODED: &str = "rpf.subframes.decoded";

/// Frames or sub-frames left blank because they could not be read or decoded.
pub const DEGRADED_CELLS: &str = "rpf.cells.degraded";

/// Tiles returned by `get_tile`.
pub const TILES_SERVED: &str = "rpf.tiles.served";

/// Register descriptions for every metric in this crate.
pub fn describe_metrics() {
    describe_counter!(FRAMES_OPENED, Unit::Count, "Frames opened through the frame reader");
    describe_counter!(FRAME_CACHE_HITS, Unit::Count, "Frame opens served from the cache");
    describe_counter!(SUBFRAMES_DECODED, Unit::Count, "Sub-frames decoded into tiles");
    describe_counter!(
        DEGRADED_CELLS,
        Unit::Count,
        "Frames or sub-frames rendered blank after a read or decode failure"
    );
    describe_counter!(TILES_SERVED, Unit::Count, "Tiles returned to callers");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_unique() {
        let names = [FRAMES_OPENED, FRAME_CACHE_HITS, SUBFRAMES_DECODED, DEGRADED_CELLS, TILES_SERVED];
        for (i, a) in names.iter().enumerate() {
            assert!(a.starts_with("rpf."));
            assert!(names[i + 1..].iter().all(|b| a != b));
        }
    }

    #[test]
    fn test_describe_without_recorder() {
        // No recorder installed: describing is a no-op and must not panic.
        describe_metrics();
    }
}
