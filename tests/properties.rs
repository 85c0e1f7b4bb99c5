//! Property tests over small random grids

use geo::{coord, Area, BoundingRect, Rect};
use proptest::prelude::*;

use rastervec::coordinate::{BoundingBox, CoordinateSystem};
use rastervec::extractor::{accepts, polygonize};
use rastervec::{
    FeatureValue, FilterMode, GeoTransform, RasterGrid, RasterVec, RegionSource, RunConfig, StrategyKind,
};

const NODATA: f64 = -1.0;

fn arb_grid() -> impl Strategy<Value = RasterGrid> {
    (1usize..7, 1usize..7).prop_flat_map(|(rows, cols)| {
        prop::collection::vec(prop::sample::select(vec![NODATA, 0.0, 1.0, 2.5, 7.0]), rows * cols)
            .prop_map(move |values| {
                RasterGrid::new(
                    values,
                    rows,
                    cols,
                    GeoTransform::new(0.0, rows as f64, 1.0, 1.0),
                    CoordinateSystem::WGS84,
                    Some(NODATA),
                )
                .unwrap()
            })
    })
}

fn arb_mode() -> impl Strategy<Value = FilterMode> {
    prop_oneof![Just(FilterMode::Intersects), Just(FilterMode::CentroidContained)]
}

fn arb_strategy() -> impl Strategy<Value = StrategyKind> {
    prop_oneof![Just(StrategyKind::PixelSquares), Just(StrategyKind::MergedRegions)]
}

fn qualifying(grid: &RasterGrid, exclude_zero: bool) -> usize {
    (0..grid.rows())
        .flat_map(|r| grid.row(r).iter().copied())
        .filter(|v| *v != NODATA && !(exclude_zero && *v == 0.0))
        .count()
}

proptest! {
    #[test]
    fn every_qualifying_cell_yields_one_square(grid in arb_grid(), exclude_zero in any::<bool>()) {
        let config = RunConfig { exclude_zero, ..RunConfig::default() };
        let output = RasterVec::new().convert_grid(&grid, &config).unwrap();

        prop_assert_eq!(output.features.len(), qualifying(&grid, exclude_zero));
        for feature in &output.features {
            prop_assert_ne!(feature.value, FeatureValue::Count(-1));
            if exclude_zero {
                prop_assert_ne!(feature.value, FeatureValue::Count(0));
            }
            prop_assert_eq!(feature.geometry.unsigned_area(), 1.0);
        }
    }

    #[test]
    fn emitted_features_satisfy_the_filter(
        grid in arb_grid(),
        mode in arb_mode(),
        strategy in arb_strategy(),
        min_x in -1.0f64..6.0,
        min_y in -1.0f64..6.0,
        size in 0.1f64..4.0,
    ) {
        let bbox = BoundingBox::new(min_x, min_y, min_x + size, min_y + size);
        let region = bbox.to_polygon();
        let config = RunConfig {
            region: Some(RegionSource::BoundingBox(bbox)),
            filter_mode: mode,
            strategy,
            ..RunConfig::default()
        };

        let first = RasterVec::new().convert_grid(&grid, &config).unwrap();
        let second = RasterVec::new().convert_grid(&grid, &config).unwrap();

        for feature in &first.features {
            prop_assert!(accepts(&feature.geometry, Some(&region), mode));
        }
        prop_assert_eq!(first.features, second.features);
    }

    #[test]
    fn sharding_does_not_change_output(grid in arb_grid(), exclude_zero in any::<bool>()) {
        let sequential = RunConfig { exclude_zero, ..RunConfig::default() };
        let parallel = RunConfig { parallel: true, ..sequential.clone() };

        let a = RasterVec::new().convert_grid(&grid, &sequential).unwrap();
        let b = RasterVec::new().convert_grid(&grid, &parallel).unwrap();
        prop_assert_eq!(a.features, b.features);
        prop_assert_eq!(a.report, b.report);
    }

    #[test]
    fn merged_regions_cover_qualifying_cells(grid in arb_grid(), exclude_zero in any::<bool>()) {
        let regions: Vec<_> = polygonize(&grid, exclude_zero)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        let cells: usize = regions.iter().map(|r| r.cells).sum();
        prop_assert_eq!(cells, qualifying(&grid, exclude_zero));

        let extent = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: grid.cols() as f64, y: grid.rows() as f64 });
        for region in &regions {
            // Unit cells: the polygon area equals its cell count
            prop_assert_eq!(region.polygon.unsigned_area(), region.cells as f64);
            let bounds = region.polygon.bounding_rect().unwrap();
            prop_assert!(bounds.min().x >= extent.min().x && bounds.max().x <= extent.max().x);
            prop_assert!(bounds.min().y >= extent.min().y && bounds.max().y <= extent.max().y);
        }

        let config = RunConfig { strategy: StrategyKind::MergedRegions, exclude_zero, ..RunConfig::default() };
        let output = RasterVec::new().convert_grid(&grid, &config).unwrap();
        prop_assert_eq!(output.features.len(), regions.len());
    }
}
