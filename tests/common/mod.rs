//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::fs::File;
use std::path::Path;

use tiff::encoder::{colortype::Gray32Float, TiffEncoder};
use tiff::tags::Tag;

use rastervec::coordinate::CoordinateSystem;
use rastervec::{GeoTransform, RasterGrid};

/// GeoKeys for a raster stored in WGS84
pub const WGS84_KEYS: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 2, 2048, 0, 1, 4326];

/// GeoKeys for a user-defined Mollweide raster, as GHS products carry them
pub const MOLLWEIDE_KEYS: [u16; 16] = [1, 1, 0, 3, 1024, 0, 1, 1, 1026, 34737, 16, 0, 3072, 0, 1, 32767];
pub const MOLLWEIDE_CITATION: &str = "World_Mollweide|";

/// Write a single-band float GeoTIFF
pub fn write_geotiff(
    path: &Path,
    rows: u32,
    cols: u32,
    values: &[f32],
    transform: GeoTransform,
    geo_keys: &[u16],
    citation: Option<&str>,
    nodata: Option<&str>,
) {
    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder.new_image::<Gray32Float>(cols, rows).unwrap();

    let scale = [transform.pixel_width, transform.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];
    image.encoder().write_tag(Tag::Unknown(33550), &scale[..]).unwrap();
    image.encoder().write_tag(Tag::Unknown(33922), &tiepoint[..]).unwrap();
    image.encoder().write_tag(Tag::Unknown(34735), geo_keys).unwrap();
    if let Some(citation) = citation {
        image.encoder().write_tag(Tag::Unknown(34737), citation).unwrap();
    }
    if let Some(nodata) = nodata {
        image.encoder().write_tag(Tag::Unknown(42113), nodata).unwrap();
    }

    image.write_data(values).unwrap();
}

/// The 2x2 grid `[[5, -1], [0, 3]]` with unit cells, origin (0, 0) and
/// no-data -1
pub fn small_grid() -> RasterGrid {
    RasterGrid::from_rows(
        &[vec![5.0, -1.0], vec![0.0, 3.0]],
        GeoTransform::new(0.0, 0.0, 1.0, 1.0),
        CoordinateSystem::WGS84,
        Some(-1.0),
    )
    .unwrap()
}
