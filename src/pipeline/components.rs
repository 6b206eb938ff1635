// src/pipeline/components.rs

//! Area-based speckle removal over 8-connected components.
//!
//! The mask is decomposed into horizontal runs of nonzero pixels, runs on
//! adjacent rows are merged with union-find (a ±1 horizontal slack makes
//! the connectivity 8-way), and every component smaller than the area
//! floor is cleared. Run-based labeling keeps the working set proportional
//! to the number of spans, not pixels.

use crate::image::GrayRaster;
use bitvec::prelude::*;

/// A horizontal span of nonzero mask pixels on one row, inclusive ends.
#[derive(Debug, Clone, Copy)]
struct Run {
    y: u32,
    x1: u32,
    x2: u32,
}

impl Run {
    fn len(&self) -> u64 {
        (self.x2 - self.x1 + 1) as u64
    }

    /// 8-connectivity between vertically adjacent runs: horizontal overlap
    /// with one pixel of slack on either side.
    fn touches(&self, other: &Run) -> bool {
        self.x1 <= other.x2 + 1 && self.x2 + 1 >= other.x1
    }
}

fn extract_runs(mask: &GrayRaster) -> Vec<Run> {
    let (width, height) = mask.dimensions();
    let mut runs = Vec::new();
    for y in 0..height {
        let row = mask.row(y);
        let mut x = 0usize;
        while x < width as usize {
            while x < width as usize && row[x] == 0 {
                x += 1;
            }
            if x < width as usize {
                let x1 = x as u32;
                while x < width as usize && row[x] != 0 {
                    x += 1;
                }
                runs.push(Run {
                    y,
                    x1,
                    x2: (x - 1) as u32,
                });
            }
        }
    }
    runs
}

fn find(parent: &mut [u32], mut i: u32) -> u32 {
    while parent[i as usize] != i {
        let up = parent[parent[i as usize] as usize];
        parent[i as usize] = up;
        i = up;
    }
    i
}

fn union(parent: &mut [u32], a: u32, b: u32) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi as usize] = lo;
    }
}

/// Labels the runs with union-find, returning one parent entry per run.
/// Runs are produced in (y, x1) order, so the previous row forms a sliding
/// window just behind the current run.
fn label_runs(runs: &[Run]) -> Vec<u32> {
    let mut parent: Vec<u32> = (0..runs.len() as u32).collect();
    let mut window = 0usize;

    for n in 0..runs.len() {
        let current = runs[n];
        if current.y == 0 {
            continue;
        }
        while window < n && runs[window].y + 1 < current.y {
            window += 1;
        }
        let mut p = window;
        while p < n && runs[p].y < current.y {
            if runs[p].y + 1 == current.y && current.touches(&runs[p]) {
                union(&mut parent, n as u32, p as u32);
            }
            p += 1;
        }
    }
    parent
}

/// Removes connected components smaller than `min_area` pixels.
///
/// Pixels belonging to a surviving component become 255; everything else
/// becomes 0. With `min_area <= 1` every nonzero pixel survives, so the
/// result equals the (binary) input.
pub fn filter_by_area(mask: &GrayRaster, min_area: u32) -> GrayRaster {
    let (width, height) = mask.dimensions();
    let runs = extract_runs(mask);
    let mut parent = label_runs(&runs);

    let mut areas = vec![0u64; runs.len()];
    for i in 0..runs.len() {
        let root = find(&mut parent, i as u32) as usize;
        areas[root] += runs[i].len();
    }

    let mut keep = bitvec![u8, Msb0; 0; runs.len()];
    for (root, &area) in areas.iter().enumerate() {
        if area >= min_area as u64 {
            keep.set(root, true);
        }
    }

    let mut out = GrayRaster::new(width, height);
    for i in 0..runs.len() {
        let root = find(&mut parent, i as u32) as usize;
        if keep[root] {
            let run = runs[i];
            for x in run.x1..=run.x2 {
                out.put(x, run.y, 255);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&[u8]]) -> GrayRaster {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        GrayRaster::from_fn(width, height, |x, y| rows[y as usize][x as usize])
    }

    #[test]
    fn test_min_area_one_is_identity() {
        let mask = mask_from(&[
            &[255, 0, 255, 0],
            &[0, 0, 255, 0],
            &[255, 0, 0, 255],
        ]);
        assert_eq!(filter_by_area(&mask, 1), mask);
    }

    #[test]
    fn test_removes_speckles_keeps_blob() {
        let mask = mask_from(&[
            &[255, 255, 0, 0, 255],
            &[255, 255, 0, 0, 0],
            &[0, 0, 0, 255, 0],
        ]);
        let out = filter_by_area(&mask, 3);
        // The 2x2 blob survives; the two single-pixel speckles do not.
        assert_eq!(
            out.values(),
            &[
                255, 255, 0, 0, 0, //
                255, 255, 0, 0, 0, //
                0, 0, 0, 0, 0,
            ]
        );
    }

    #[test]
    fn test_diagonal_pixels_are_one_component() {
        let mask = mask_from(&[
            &[255, 0, 0],
            &[0, 255, 0],
            &[0, 0, 255],
        ]);
        // 8-connected: the diagonal is a single 3-pixel component.
        assert_eq!(filter_by_area(&mask, 3), mask);
        assert_eq!(filter_by_area(&mask, 4).values(), &[0; 9]);
    }

    #[test]
    fn test_u_shape_merges_across_arms() {
        // Two arms joined at the bottom: one component of 7 pixels.
        let mask = mask_from(&[
            &[255, 0, 255],
            &[255, 0, 255],
            &[255, 255, 255],
        ]);
        assert_eq!(filter_by_area(&mask, 7), mask);
    }

    #[test]
    fn test_empty_mask() {
        let mask = GrayRaster::new(4, 4);
        assert_eq!(filter_by_area(&mask, 5).values(), &[0; 16]);
    }
}
