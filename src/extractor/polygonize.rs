//! Connected-component polygonisation
//!
//! Cells are grouped into 4-connected components of identical value, and
//! each component's outline is traced along the grid-vertex lattice. Vertex
//! `(c, r)` is the corner shared by the cells around column edge `c` and
//! row edge `r`; lattice coordinates grow east and south.

use std::collections::HashMap;

use geo::orient::{Direction, Orient};
use geo::{Coord, LineString, Polygon};

use super::cell::qualifies;
use crate::errors::{ConversionError, ConversionResult};
use crate::raster::{GeoTransform, RasterGrid};

const NO_LABEL: usize = usize::MAX;

type Vertex = (usize, usize);
type Step = (isize, isize);

/// One connected region in native coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPolygon {
    pub polygon: Polygon<f64>,
    pub value: f64,
    /// Number of cells in the region
    pub cells: usize,
}

/// Directed unit edge with the component on its right
#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    to: Vertex,
}

impl Edge {
    fn step(&self) -> Step {
        (
            self.to.0 as isize - self.from.0 as isize,
            self.to.1 as isize - self.from.1 as isize,
        )
    }
}

/// Labelled components of a grid
#[derive(Debug)]
pub struct Components {
    /// Component index per cell, `NO_LABEL` for excluded cells
    labels: Vec<usize>,
    /// Value and cell count per component
    regions: Vec<(f64, usize)>,
}

impl Components {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[inline]
fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// Label 4-connected components of equal value in row-major seed order
pub fn label_components(grid: &RasterGrid, exclude_zero: bool) -> Components {
    let (rows, cols) = (grid.rows(), grid.cols());
    let mut labels = vec![NO_LABEL; rows * cols];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for r in 0..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            if labels[idx] != NO_LABEL {
                continue;
            }
            let value = grid.row(r)[c];
            if !qualifies(grid, value, exclude_zero) {
                continue;
            }

            let label = regions.len();
            let mut count = 0;
            labels[idx] = label;
            stack.push((r, c));

            while let Some((cr, cc)) = stack.pop() {
                count += 1;

                let mut visit = |nr: usize, nc: usize, stack: &mut Vec<(usize, usize)>| {
                    let nidx = nr * cols + nc;
                    if labels[nidx] == NO_LABEL && same_value(grid.row(nr)[nc], value) {
                        labels[nidx] = label;
                        stack.push((nr, nc));
                    }
                };

                // 4-connected neighbors
                if cr > 0 { visit(cr - 1, cc, &mut stack); }
                if cr + 1 < rows { visit(cr + 1, cc, &mut stack); }
                if cc > 0 { visit(cr, cc - 1, &mut stack); }
                if cc + 1 < cols { visit(cr, cc + 1, &mut stack); }
            }

            regions.push((value, count));
        }
    }

    Components { labels, regions }
}

/// Boundary edges of every component, grouped by component
fn boundary_edges(components: &Components, rows: usize, cols: usize) -> Vec<Vec<Edge>> {
    let mut edges = vec![Vec::new(); components.len()];
    let labels = &components.labels;

    for r in 0..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            let label = labels[idx];
            if label == NO_LABEL {
                continue;
            }
            let out = &mut edges[label];

            if r == 0 || labels[idx - cols] != label {
                out.push(Edge { from: (c, r), to: (c + 1, r) });
            }
            if c + 1 == cols || labels[idx + 1] != label {
                out.push(Edge { from: (c + 1, r), to: (c + 1, r + 1) });
            }
            if r + 1 == rows || labels[idx + cols] != label {
                out.push(Edge { from: (c + 1, r + 1), to: (c, r + 1) });
            }
            if c == 0 || labels[idx - 1] != label {
                out.push(Edge { from: (c, r + 1), to: (c, r) });
            }
        }
    }

    edges
}

/// Chain boundary edges into closed rings of corner vertices
fn trace_rings(edges: &[Edge]) -> Result<Vec<Vec<Vertex>>, String> {
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, edge) in edges.iter().enumerate() {
        outgoing.entry(edge.from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }

        let start = edges[first].from;
        let mut walk: Vec<(Vertex, Step)> = Vec::new();
        let mut current = first;

        loop {
            used[current] = true;
            let edge = edges[current];
            walk.push((edge.from, edge.step()));
            if edge.to == start {
                break;
            }
            current = next_edge(&outgoing, &used, edges, edge)
                .ok_or_else(|| format!("open boundary at vertex {:?}", edge.to))?;
        }

        rings.push(corners(&walk));
    }

    Ok(rings)
}

/// Pick the continuation at `edge.to`: left turn onto a diagonal cell first,
/// then straight on, then right
fn next_edge(
    outgoing: &HashMap<Vertex, Vec<usize>>,
    used: &[bool],
    edges: &[Edge],
    edge: Edge,
) -> Option<usize> {
    let candidates: Vec<usize> = outgoing
        .get(&edge.to)?
        .iter()
        .copied()
        .filter(|i| !used[*i])
        .collect();

    let (dx, dy) = edge.step();
    let left = (dy, -dx);
    let right = (-dy, dx);

    [left, (dx, dy), right]
        .iter()
        .find_map(|wanted| candidates.iter().copied().find(|i| edges[*i].step() == *wanted))
        .or_else(|| candidates.first().copied())
}

/// Keep only the vertices where the walk changes direction
fn corners(walk: &[(Vertex, Step)]) -> Vec<Vertex> {
    let n = walk.len();
    (0..n)
        .filter(|&i| walk[(i + n - 1) % n].1 != walk[i].1)
        .map(|i| walk[i].0)
        .collect()
}

/// Twice the signed area of a lattice ring; positive for outlines
fn signed_area2(ring: &[Vertex]) -> i64 {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let (x0, y0) = (ring[i].0 as i64, ring[i].1 as i64);
            let (x1, y1) = (ring[(i + 1) % n].0 as i64, ring[(i + 1) % n].1 as i64);
            x0 * y1 - x1 * y0
        })
        .sum()
}

fn to_line_string(ring: &[Vertex], transform: &GeoTransform) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring
        .iter()
        .map(|&(c, r)| {
            let (x, y) = transform.corner(c, r);
            Coord { x, y }
        })
        .collect();
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    LineString::from(coords)
}

/// Assemble the polygon of one component from its traced rings
fn assemble(rings: Vec<Vec<Vertex>>, transform: &GeoTransform) -> Result<Polygon<f64>, String> {
    let exterior_idx = rings
        .iter()
        .enumerate()
        .max_by_key(|(_, ring)| signed_area2(ring))
        .map(|(i, _)| i)
        .ok_or_else(|| "component has no boundary".to_string())?;

    if signed_area2(&rings[exterior_idx]) <= 0 {
        return Err("component outline has no positive area".to_string());
    }

    let exterior = to_line_string(&rings[exterior_idx], transform);
    let holes = rings
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != exterior_idx)
        .map(|(_, ring)| to_line_string(ring, transform))
        .collect();

    Ok(Polygon::new(exterior, holes).orient(Direction::Default))
}

/// Polygonise every connected region of the grid in native coordinates
///
/// Regions come out in the row-major order of their first cell. A region
/// whose outline cannot be assembled is returned as a geometry error naming
/// its index.
pub fn polygonize(grid: &RasterGrid, exclude_zero: bool) -> Vec<ConversionResult<RegionPolygon>> {
    let components = label_components(grid, exclude_zero);
    let edges = boundary_edges(&components, grid.rows(), grid.cols());
    let transform = grid.transform();

    edges
        .iter()
        .zip(components.regions.iter())
        .enumerate()
        .map(|(index, (component_edges, &(value, cells)))| {
            trace_rings(component_edges)
                .and_then(|rings| assemble(rings, transform))
                .map(|polygon| RegionPolygon { polygon, value, cells })
                .map_err(|reason| ConversionError::region(index, reason))
        })
        .collect()
}
