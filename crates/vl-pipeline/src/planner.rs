//! Rendition planning.

use vl_core::{Dimensions, Resolution};

/// Select every catalog entry strictly smaller than `source` on both axes.
///
/// Catalog order is preserved. An empty result means only the original is
/// delivered.
pub fn plan(source: Dimensions, catalog: &[Resolution]) -> Vec<Resolution> {
    catalog
        .iter()
        .copied()
        .filter(|r| r.dimensions().fits_strictly_within(&source))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_hd_source() {
        let planned = plan(Dimensions::new(1920, 1080), &Resolution::ALL);
        assert_eq!(planned, vec![Resolution::Hd, Resolution::Sd]);
    }

    #[test]
    fn small_source_plans_nothing() {
        assert!(plan(Dimensions::new(640, 480), &Resolution::ALL).is_empty());
        assert!(plan(Dimensions::new(854, 480), &Resolution::ALL).is_empty());
    }

    #[test]
    fn huge_source_plans_everything_in_order() {
        let planned = plan(Dimensions::new(7680, 4320), &Resolution::ALL);
        assert_eq!(planned, Resolution::ALL.to_vec());
    }

    #[test]
    fn both_axes_must_be_larger() {
        // Wide but short: 720p's height is not strictly smaller.
        let planned = plan(Dimensions::new(4000, 720), &Resolution::ALL);
        assert_eq!(planned, vec![Resolution::Sd]);

        // Portrait phone video: width never exceeds the catalog widths.
        assert!(plan(Dimensions::new(720, 1280), &Resolution::ALL).is_empty());
    }

    #[test]
    fn never_includes_equal_or_larger_dimension() {
        for w in (400..4000).step_by(173) {
            for h in (300..2400).step_by(97) {
                let src = Dimensions::new(w, h);
                for r in plan(src, &Resolution::ALL) {
                    let d = r.dimensions();
                    assert!(d.width < w && d.height < h, "{r} planned for {src}");
                }
            }
        }
    }

    #[test]
    fn respects_custom_catalog_order() {
        let catalog = [Resolution::Sd, Resolution::Hd];
        let planned = plan(Dimensions::new(1920, 1080), &catalog);
        assert_eq!(planned, vec![Resolution::Sd, Resolution::Hd]);
    }
}
