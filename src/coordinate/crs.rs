//! Coordinate Reference System handling

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;

use crate::errors::{ConversionError, ConversionResult};

lazy_static! {
    // Parse the CRS registry once, on first use
    static ref CRS_REGISTRY: CrsRegistry = {
        let content = include_str!("../../crs_definitions.toml");
        CrsRegistry::from_str(content).unwrap_or_else(|e| {
            warn!("Failed to parse CRS definitions: {}", e);
            CrsRegistry::default()
        })
    };

    static ref CRS_PATTERN: Regex =
        Regex::new(r"(?i)^(?:urn:ogc:def:crs:)?(EPSG|ESRI)::?(\d+)$").expect("CRS pattern is a valid regex");
}

/// Authority that issued a coordinate system code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authority {
    Epsg,
    Esri,
}

impl Authority {
    fn prefix(&self) -> &'static str {
        match self {
            Authority::Epsg => "EPSG",
            Authority::Esri => "ESRI",
        }
    }
}

/// Identifier for the coordinate systems a raster can be stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326), the output system of every run
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM Zone (EPSG:326xx for northern hemisphere, 327xx for southern)
    UTM(u8, bool),
    /// World Mollweide (ESRI:54009)
    Mollweide,
    /// Other EPSG code
    Epsg(u32),
    /// Other ESRI code
    Esri(u32),
}

impl CoordinateSystem {
    /// Build a coordinate system from an authority code
    pub fn from_code(authority: Authority, code: u32) -> Self {
        match (authority, code) {
            (Authority::Epsg, 4326) => CoordinateSystem::WGS84,
            (Authority::Epsg, 3857) | (Authority::Epsg, 900913) => CoordinateSystem::WebMercator,
            (Authority::Epsg, 32601..=32660) => CoordinateSystem::UTM((code - 32600) as u8, true),
            (Authority::Epsg, 32701..=32760) => CoordinateSystem::UTM((code - 32700) as u8, false),
            // GHS products label Mollweide with its ESRI code under either authority
            (_, 54009) => CoordinateSystem::Mollweide,
            (Authority::Epsg, _) => CoordinateSystem::Epsg(code),
            (Authority::Esri, _) => CoordinateSystem::Esri(code),
        }
    }

    /// Build a coordinate system from an EPSG code
    pub fn from_epsg(epsg: u32) -> Self {
        Self::from_code(Authority::Epsg, epsg)
    }

    /// Parse a coordinate system identifier
    ///
    /// Accepts `EPSG:4326`, `epsg:4326`, a bare `4326` (EPSG), `ESRI:54009`
    /// and OGC URNs such as `urn:ogc:def:crs:EPSG::4326`.
    pub fn parse(crs_str: &str) -> ConversionResult<Self> {
        let trimmed = crs_str.trim();

        if let Ok(code) = trimmed.parse::<u32>() {
            return Ok(Self::from_epsg(code));
        }

        let captures = CRS_PATTERN.captures(trimmed).ok_or_else(|| {
            ConversionError::UnsupportedProjection {
                crs: trimmed.to_string(),
                reason: "unrecognised CRS identifier format".to_string(),
            }
        })?;

        let authority = if captures[1].eq_ignore_ascii_case("ESRI") {
            Authority::Esri
        } else {
            Authority::Epsg
        };
        let code = captures[2].parse::<u32>().map_err(|_| ConversionError::UnsupportedProjection {
            crs: trimmed.to_string(),
            reason: "CRS code out of range".to_string(),
        })?;

        Ok(Self::from_code(authority, code))
    }

    /// Issuing authority of this coordinate system
    pub fn authority(&self) -> Authority {
        match self {
            CoordinateSystem::Mollweide | CoordinateSystem::Esri(_) => Authority::Esri,
            _ => Authority::Epsg,
        }
    }

    /// Numeric code of this coordinate system within its authority
    pub fn code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, is_northern) => {
                if *is_northern {
                    32600 + *zone as u32
                } else {
                    32700 + *zone as u32
                }
            },
            CoordinateSystem::Mollweide => 54009,
            CoordinateSystem::Epsg(code) | CoordinateSystem::Esri(code) => *code,
        }
    }

    /// Identifier in `AUTHORITY:CODE` form
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.authority().prefix(), self.code())
    }

    /// OGC URN, as written into GeoJSON `crs` members
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:{}::{}", self.authority().prefix(), self.code())
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::UTM(zone, is_northern) => {
                let hemisphere = if *is_northern { "N" } else { "S" };
                format!("UTM Zone {}{} ({})", zone, hemisphere, self.identifier())
            },
            _ => match CRS_REGISTRY.names.get(&self.identifier()) {
                Some(name) => format!("{} ({})", name, self.identifier()),
                None => self.identifier(),
            },
        }
    }

    /// PROJ definition used to build a transform from this system
    pub fn proj_string(&self) -> Option<String> {
        match self {
            CoordinateSystem::UTM(zone, is_northern) => {
                let south = if *is_northern { "" } else { " +south" };
                Some(format!("+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs", zone, south))
            },
            _ => CRS_REGISTRY.proj_strings.get(&self.identifier()).cloned(),
        }
    }

    /// Whether coordinates in this system are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        match self {
            CoordinateSystem::WGS84 => true,
            CoordinateSystem::WebMercator | CoordinateSystem::UTM(..) | CoordinateSystem::Mollweide => false,
            _ => self
                .proj_string()
                .map(|s| s.contains("+proj=longlat") || s.contains("+proj=latlong"))
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Built-in PROJ definitions and display names keyed by identifier
#[derive(Debug, Default)]
struct CrsRegistry {
    proj_strings: HashMap<String, String>,
    names: HashMap<String, String>,
}

impl CrsRegistry {
    fn from_str(content: &str) -> Result<Self, String> {
        let toml_value: toml::Value = content
            .parse()
            .map_err(|e| format!("Failed to parse TOML: {}", e))?;

        let mut registry = CrsRegistry::default();
        Self::parse_table(&toml_value, "proj_strings", &mut registry.proj_strings);
        Self::parse_table(&toml_value, "names", &mut registry.names);
        Ok(registry)
    }

    fn parse_table(toml_value: &toml::Value, table_name: &str, target: &mut HashMap<String, String>) {
        if let Some(table) = toml_value.get(table_name).and_then(|v| v.as_table()) {
            for (k, v) in table {
                if let Some(value) = v.as_str() {
                    target.insert(k.to_uppercase(), value.to_string());
                }
            }
        }
    }
}
