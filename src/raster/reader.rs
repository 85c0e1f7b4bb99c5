//! Raster readers
//!
//! Readers materialize the first band of a source into a `RasterGrid`
//! together with its georeferencing, CRS and no-data sentinel.

use std::fs::File;
use std::io::BufReader;

use log::{debug, info};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;

use super::geotransform::GeoTransform;
use super::grid::RasterGrid;
use crate::coordinate::CoordinateSystem;
use crate::errors::{ConversionError, ConversionResult};

/// GeoTIFF tag and key identifiers
mod geotiff {
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const GEO_KEY_DIRECTORY: u16 = 34735;
    pub const GEO_ASCII_PARAMS: u16 = 34737;
    pub const GDAL_NODATA: u16 = 42113;

    pub const GT_MODEL_TYPE_KEY: u16 = 1024;
    pub const GT_RASTER_TYPE_KEY: u16 = 1025;
    pub const GT_CITATION_KEY: u16 = 1026;
    pub const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
    pub const GEOG_CITATION_KEY: u16 = 2049;
    pub const PROJECTED_CS_TYPE_KEY: u16 = 3072;
    pub const PCS_CITATION_KEY: u16 = 3073;

    pub const MODEL_TYPE_PROJECTED: u16 = 1;
    pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
    pub const RASTER_PIXEL_IS_POINT: u16 = 2;
    pub const USER_DEFINED: u16 = 32767;
}

/// Source of raster grids
pub trait RasterReader {
    /// Read the first band of `source` into a grid
    fn read(&self, source: &str) -> ConversionResult<RasterGrid>;
}

/// One entry of the GeoKey directory
#[derive(Debug, Clone, Copy)]
struct GeoKey {
    id: u16,
    location: u16,
    count: u16,
    value: u16,
}

/// Reader for single-band GeoTIFF files
#[derive(Debug, Default)]
pub struct GeoTiffReader;

impl GeoTiffReader {
    pub fn new() -> Self {
        GeoTiffReader
    }

    fn read_error(source: &str, reason: impl Into<String>) -> ConversionError {
        ConversionError::RasterRead {
            source_id: source.to_string(),
            reason: reason.into(),
        }
    }

    fn find_f64_tag<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        tag: u16,
        source: &str,
    ) -> ConversionResult<Option<Vec<f64>>> {
        let value = decoder.find_tag(Tag::Unknown(tag))
            .map_err(|e| Self::read_error(source, format!("tag {}: {}", tag, e)))?;
        value
            .map(|v| v.into_f64_vec())
            .transpose()
            .map_err(|e| Self::read_error(source, format!("tag {}: {}", tag, e)))
    }

    fn find_string_tag<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        tag: u16,
        source: &str,
    ) -> ConversionResult<Option<String>> {
        let value = decoder.find_tag(Tag::Unknown(tag))
            .map_err(|e| Self::read_error(source, format!("tag {}: {}", tag, e)))?;
        let Some(value) = value else {
            return Ok(None);
        };

        // Some writers store ASCII parameters as plain bytes
        match value.clone().into_string() {
            Ok(text) => Ok(Some(text)),
            Err(_) => value
                .into_u8_vec()
                .map(|bytes| Some(String::from_utf8_lossy(&bytes).into_owned()))
                .map_err(|e| Self::read_error(source, format!("tag {}: {}", tag, e))),
        }
    }

    /// Derive the affine mapping from ModelPixelScale and ModelTiepoint
    fn read_transform<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        keys: &[GeoKey],
        source: &str,
    ) -> ConversionResult<GeoTransform> {
        let scale = Self::find_f64_tag(decoder, geotiff::MODEL_PIXEL_SCALE, source)?
            .ok_or_else(|| Self::read_error(source, "missing ModelPixelScale tag"))?;
        let tiepoint = Self::find_f64_tag(decoder, geotiff::MODEL_TIEPOINT, source)?
            .ok_or_else(|| Self::read_error(source, "missing ModelTiepoint tag"))?;

        if scale.len() < 2 || tiepoint.len() < 6 {
            return Err(Self::read_error(source, "truncated ModelPixelScale or ModelTiepoint tag"));
        }

        let (pixel_width, pixel_height) = (scale[0], scale[1]);
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);

        let mut origin_x = x - i * pixel_width;
        let mut origin_y = y + j * pixel_height;

        // PixelIsPoint ties cell centers, not corners
        let pixel_is_point = keys.iter()
            .any(|k| k.id == geotiff::GT_RASTER_TYPE_KEY && k.value == geotiff::RASTER_PIXEL_IS_POINT);
        if pixel_is_point {
            debug!("Raster is PixelIsPoint, shifting origin by half a cell");
            origin_x -= pixel_width / 2.0;
            origin_y += pixel_height / 2.0;
        }

        Ok(GeoTransform::new(origin_x, origin_y, pixel_width, pixel_height))
    }

    fn read_geo_keys<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
        source: &str,
    ) -> ConversionResult<Vec<GeoKey>> {
        let value = decoder.find_tag(Tag::Unknown(geotiff::GEO_KEY_DIRECTORY))
            .map_err(|e| Self::read_error(source, format!("GeoKeyDirectory: {}", e)))?;
        let Some(value) = value else {
            return Ok(Vec::new());
        };

        let directory = value.into_u16_vec()
            .map_err(|e| Self::read_error(source, format!("GeoKeyDirectory: {}", e)))?;
        Ok(parse_geo_key_directory(&directory))
    }

    /// Resolve the native coordinate system from the GeoKey directory
    fn resolve_crs(keys: &[GeoKey], ascii_params: Option<&str>, source: &str) -> ConversionResult<CoordinateSystem> {
        let key_value = |id: u16| keys.iter().find(|k| k.id == id && k.location == 0).map(|k| k.value);
        let citation = |id: u16| -> Option<String> {
            let key = keys.iter().find(|k| k.id == id && k.location == geotiff::GEO_ASCII_PARAMS)?;
            let params = ascii_params?;
            let start = key.value as usize;
            let end = (start + key.count as usize).min(params.len());
            params.get(start..end).map(|s| s.trim_end_matches(['|', '\0']).to_string())
        };

        let unsupported = |reason: String| ConversionError::UnsupportedProjection {
            crs: format!("GeoKeys of {}", source),
            reason,
        };

        let model_type = key_value(geotiff::GT_MODEL_TYPE_KEY);
        let projected = key_value(geotiff::PROJECTED_CS_TYPE_KEY);
        let geographic = key_value(geotiff::GEOGRAPHIC_TYPE_KEY);

        if model_type == Some(geotiff::MODEL_TYPE_PROJECTED) || projected.is_some() {
            return match projected {
                Some(code) if code != geotiff::USER_DEFINED => Ok(CoordinateSystem::from_epsg(code as u32)),
                _ => {
                    let citations = [geotiff::PCS_CITATION_KEY, geotiff::GT_CITATION_KEY]
                        .iter()
                        .filter_map(|id| citation(*id))
                        .collect::<Vec<_>>()
                        .join(" ");
                    if citations.to_lowercase().contains("mollweide") {
                        Ok(CoordinateSystem::Mollweide)
                    } else {
                        Err(unsupported(format!("user-defined projected CRS '{}'", citations)))
                    }
                },
            };
        }

        if model_type == Some(geotiff::MODEL_TYPE_GEOGRAPHIC) || geographic.is_some() {
            return match geographic {
                Some(code) if code != geotiff::USER_DEFINED => Ok(CoordinateSystem::from_epsg(code as u32)),
                _ => {
                    let name = citation(geotiff::GEOG_CITATION_KEY).unwrap_or_default();
                    if name.contains("WGS 84") || name.contains("WGS84") {
                        Ok(CoordinateSystem::WGS84)
                    } else {
                        Err(unsupported(format!("user-defined geographic CRS '{}'", name)))
                    }
                },
            };
        }

        Err(unsupported("no coordinate system GeoKeys".to_string()))
    }

    fn decode_values(result: DecodingResult, source: &str) -> ConversionResult<Vec<f64>> {
        let values = match result {
            DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
            DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
            DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
            DecodingResult::F64(v) => v,
            #[allow(unreachable_patterns)]
            _ => return Err(Self::read_error(source, "unsupported sample format")),
        };
        Ok(values)
    }
}

impl RasterReader for GeoTiffReader {
    fn read(&self, source: &str) -> ConversionResult<RasterGrid> {
        info!("Opening raster file {}", source);

        let file = File::open(source)
            .map_err(|e| Self::read_error(source, e.to_string()))?;
        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| Self::read_error(source, e.to_string()))?
            .with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions()
            .map_err(|e| Self::read_error(source, e.to_string()))?;
        let colortype = decoder.colortype()
            .map_err(|e| Self::read_error(source, e.to_string()))?;
        if !matches!(colortype, ColorType::Gray(_)) {
            return Err(Self::read_error(source, format!("expected a single-band raster, found {:?}", colortype)));
        }

        let keys = Self::read_geo_keys(&mut decoder, source)?;
        let ascii_params = Self::find_string_tag(&mut decoder, geotiff::GEO_ASCII_PARAMS, source)?;
        let crs = Self::resolve_crs(&keys, ascii_params.as_deref(), source)?;
        let transform = Self::read_transform(&mut decoder, &keys, source)?;

        let nodata = match Self::find_string_tag(&mut decoder, geotiff::GDAL_NODATA, source)? {
            Some(text) => {
                let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
                Some(trimmed.parse::<f64>()
                    .map_err(|_| Self::read_error(source, format!("invalid GDAL_NODATA value '{}'", trimmed)))?)
            },
            None => None,
        };

        info!("Reading raster band...");
        let image = decoder.read_image()
            .map_err(|e| Self::read_error(source, e.to_string()))?;
        let values = Self::decode_values(image, source)?;

        let grid = RasterGrid::new(values, height as usize, width as usize, transform, crs, nodata)?
            .with_source(source);

        info!("Raster dimensions: {} rows x {} columns ({} pixels).", grid.rows(), grid.cols(), grid.len());
        info!("Raster CRS: {}.", crs.description());
        info!("Pixel size: {} x {}.", transform.pixel_width, transform.pixel_height);

        Ok(grid)
    }
}

/// Split a raw GeoKeyDirectory into key entries
fn parse_geo_key_directory(directory: &[u16]) -> Vec<GeoKey> {
    if directory.len() < 4 {
        return Vec::new();
    }

    let num_keys = directory[3] as usize;
    directory[4..]
        .chunks_exact(4)
        .take(num_keys)
        .map(|entry| GeoKey {
            id: entry[0],
            location: entry[1],
            count: entry[2],
            value: entry[3],
        })
        .collect()
}
