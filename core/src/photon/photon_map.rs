//! Photon Map

use super::*;
use crate::error::*;
use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::mem::size_of;
use std::path::Path;

/// Photon map file header.
const MAGIC: [u8; 8] = *b"PHOTONMP";

/// Photon map file format version.
const FORMAT_VERSION: u32 = 1;

/// Stores deposited photons. Photons are appended while shooting, then the
/// map is built once and queried concurrently.
#[derive(Clone, Debug, Default)]
pub struct PhotonMap {
    /// Name used for logging and in saved files.
    name: String,

    /// The photons.
    photons: Vec<Photon>,

    /// Number of emitted paths the photons came from.
    paths: u64,

    /// Spatial index. `None` until built.
    tree: Option<KdTree>,
}

impl PhotonMap {
    /// Returns an empty, unbuilt map.
    ///
    /// * `name` - Name used for logging.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    /// Returns the map name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reserves capacity for `capacity` more photons.
    ///
    /// * `capacity` - Number of photons.
    pub fn reserve(&mut self, capacity: usize) {
        self.photons.reserve(capacity);
    }

    /// Removes all photons, resets the path count and drops the index.
    pub fn clear(&mut self) {
        self.photons.clear();
        self.paths = 0;
        self.tree = None;
    }

    /// Returns the number of emitted paths.
    pub fn path_count(&self) -> u64 {
        self.paths
    }

    /// Returns the number of stored photons.
    pub fn photon_count(&self) -> usize {
        self.photons.len()
    }

    /// Returns the stored photons.
    pub fn photons(&self) -> &[Photon] {
        &self.photons
    }

    /// Returns `1 / path_count()`, or 0 for a map without paths.
    pub fn inv_path_count(&self) -> Float {
        if self.paths > 0 {
            1.0 / self.paths as Float
        } else {
            0.0
        }
    }

    /// Merges a worker batch. The index is dropped and must be rebuilt.
    ///
    /// * `photons` - Photons deposited by the worker.
    /// * `paths`   - Paths the worker emitted.
    pub fn append_batch(&mut self, mut photons: Vec<Photon>, paths: u64) {
        self.photons.append(&mut photons);
        self.paths += paths;
        self.tree = None;
    }

    /// Adds a single photon. The index is dropped and must be rebuilt.
    ///
    /// * `photon` - The photon.
    pub fn push(&mut self, photon: Photon) {
        self.photons.push(photon);
        self.tree = None;
    }

    /// Builds the spatial index. Does nothing if the map is already built.
    pub fn build(&mut self) {
        if self.tree.is_some() {
            debug!("{} photon map is already built", self.name);
            return;
        }
        let positions: Vec<Point3f> = self.photons.iter().map(|p| p.pos).collect();
        self.tree = Some(KdTree::new(&positions));
        debug!(
            "Built {} photon map with {} photons from {} paths",
            self.name,
            self.photons.len(),
            self.paths
        );
    }

    /// Returns true if the index is built.
    pub fn is_built(&self) -> bool {
        self.tree.is_some()
    }

    /// Returns at most `max_count` photons closer than the squared radius
    /// together with the final squared radius. Once `max_count` photons are
    /// held the radius shrinks to the farthest of them, but never to zero.
    /// An unbuilt map returns nothing.
    ///
    /// * `p`         - Query position.
    /// * `max_count` - Maximum number of photons.
    /// * `radius_sq` - Squared search radius.
    pub fn gather(&self, p: &Point3f, max_count: usize, radius_sq: Float) -> (Vec<FoundPhoton<'_>>, Float) {
        let tree = match self.tree.as_ref() {
            Some(tree) if max_count > 0 && !tree.is_empty() => tree,
            _ => return (Vec::new(), radius_sq),
        };

        let mut heap: BinaryHeap<(OrderedFloat<Float>, usize)> = BinaryHeap::with_capacity(max_count + 1);
        let radius_sq = tree.lookup(p, radius_sq, |index, d2, max_d2| {
            if heap.len() < max_count {
                heap.push((OrderedFloat(d2), index));
            } else if let Some(&(far, _)) = heap.peek() {
                if OrderedFloat(d2) >= far {
                    return;
                }
                heap.pop();
                heap.push((OrderedFloat(d2), index));
            }

            if heap.len() == max_count {
                if let Some(&(far, _)) = heap.peek() {
                    if far.0 > 0.0 {
                        *max_d2 = far.0;
                    }
                }
            }
        });

        let found = heap
            .into_iter()
            .map(|(d2, index)| FoundPhoton {
                photon: &self.photons[index],
                dist_sq: d2.0,
            })
            .collect();
        (found, radius_sq)
    }

    /// Returns the nearest photon whose direction lies on the same side as
    /// `n`, within the squared radius.
    ///
    /// * `p`       - Query position.
    /// * `n`       - Normal the photon direction must agree with.
    /// * `dist_sq` - Squared search radius.
    pub fn find_nearest(&self, p: &Point3f, n: &Vector3f, dist_sq: Float) -> Option<&Photon> {
        let tree = self.tree.as_ref()?;
        let mut nearest = None;
        tree.lookup(p, dist_sq, |index, d2, max_d2| {
            if n.dot(&self.photons[index].dir) > 0.0 {
                nearest = Some(index);
                *max_d2 = d2;
            }
        });
        nearest.map(|i| &self.photons[i])
    }

    /// Writes the photons and the path count to a file. The index is not
    /// stored.
    ///
    /// * `path` - The file path.
    pub fn save(&self, path: &Path) -> Result<()> {
        info!("Saving {} photon map to '{}'", self.name, path.display());
        let file = File::create(path).map_err(|e| PhotonError::io(path, e))?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w).map_err(|e| PhotonError::io(path, e))?;
        w.flush().map_err(|e| PhotonError::io(path, e))
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&MAGIC)?;
        w.write_u32::<LittleEndian>(FORMAT_VERSION)?;
        w.write_u8(size_of::<Float>() as u8)?;

        let name = self.name.as_bytes();
        w.write_u32::<LittleEndian>(name.len() as u32)?;
        w.write_all(name)?;

        w.write_u64::<LittleEndian>(self.paths)?;
        w.write_u64::<LittleEndian>(self.photons.len() as u64)?;
        for photon in self.photons.iter() {
            for v in [photon.pos.x, photon.pos.y, photon.pos.z] {
                w.write_f32::<LittleEndian>(v)?;
            }
            for v in [photon.dir.x, photon.dir.y, photon.dir.z] {
                w.write_f32::<LittleEndian>(v)?;
            }
            for v in photon.color.samples() {
                w.write_f32::<LittleEndian>(*v)?;
            }
        }
        Ok(())
    }

    /// Replaces the map with the contents of a file written by `save()` and
    /// builds the index.
    ///
    /// * `path` - The file path.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        info!("Loading {} photon map from '{}'", self.name, path.display());
        let file = File::open(path).map_err(|e| PhotonError::io(path, e))?;
        let mut r = BufReader::new(file);

        let invalid = |reason: &str| PhotonError::InvalidFormat {
            path: path.to_path_buf(),
            reason: reason.to_owned(),
        };
        let read_err = |e: io::Error| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                invalid("truncated file")
            } else {
                PhotonError::io(path, e)
            }
        };

        let mut magic = [0_u8; 8];
        r.read_exact(&mut magic).map_err(read_err)?;
        if magic != MAGIC {
            return Err(invalid("bad magic"));
        }
        let version = r.read_u32::<LittleEndian>().map_err(read_err)?;
        if version != FORMAT_VERSION {
            return Err(invalid(&format!("unsupported version {}", version)));
        }
        let float_size = r.read_u8().map_err(read_err)?;
        if float_size as usize != size_of::<Float>() {
            return Err(invalid(&format!("unsupported float size {}", float_size)));
        }

        let name_len = r.read_u32::<LittleEndian>().map_err(read_err)? as usize;
        let mut name = vec![0_u8; name_len];
        r.read_exact(&mut name).map_err(read_err)?;
        let name = String::from_utf8(name).map_err(|_| invalid("map name is not UTF-8"))?;

        let paths = r.read_u64::<LittleEndian>().map_err(read_err)?;
        let count = r.read_u64::<LittleEndian>().map_err(read_err)? as usize;

        let mut values = [0.0_f32; 9];
        let mut photons = Vec::with_capacity(count);
        for _ in 0..count {
            r.read_f32_into::<LittleEndian>(&mut values).map_err(read_err)?;
            photons.push(Photon::new(
                Vector3f::new(values[3], values[4], values[5]),
                Point3f::new(values[0], values[1], values[2]),
                Spectrum::rgb(values[6], values[7], values[8]),
            ));
        }

        if name != self.name {
            debug!("Loaded photon map '{}' into {} photon map", name, self.name);
        }
        self.photons = photons;
        self.paths = paths;
        self.tree = None;
        self.build();
        Ok(())
    }
}
