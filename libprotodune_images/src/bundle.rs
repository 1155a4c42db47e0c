use ndarray::{Array2, Array3};
use ndarray_npy::NpzWriter;
use std::fs::File;
use std::path::Path;

use super::binner::BinningMode;
use super::constants::{PLANE_KEYS, SINGLE_PLANE_KEY};
use super::detector::Plane;
use super::error::BinningError;

/// ImageBundle accumulates images for the whole run, one list per output key.
///
/// Single plane binning uses the key `images`; combined binning keeps `plane0`, `plane1` and
/// `plane2`. Everything is held in memory until the bundle is written.
#[derive(Debug, Clone)]
pub struct ImageBundle {
    mode: BinningMode,
    n_channel_bins: usize,
    n_time_bins: usize,
    lists: Vec<Vec<Array2<f64>>>,
}

impl ImageBundle {
    pub fn new(mode: BinningMode, n_channel_bins: usize, n_time_bins: usize) -> Self {
        let n_lists = match mode {
            BinningMode::SinglePlane(_) => 1,
            BinningMode::Combined => PLANE_KEYS.len(),
        };
        Self {
            mode,
            n_channel_bins,
            n_time_bins,
            lists: vec![Vec::new(); n_lists],
        }
    }

    /// The output keys in the order they are written
    pub fn keys(&self) -> Vec<&'static str> {
        match self.mode {
            BinningMode::SinglePlane(_) => vec![SINGLE_PLANE_KEY],
            BinningMode::Combined => PLANE_KEYS.to_vec(),
        }
    }

    fn list_index(&self, plane: Plane) -> usize {
        match self.mode {
            BinningMode::SinglePlane(_) => 0,
            BinningMode::Combined => plane.index(),
        }
    }

    /// Append the image of a plane
    pub fn push(&mut self, plane: Plane, image: Array2<f64>) {
        let idx = self.list_index(plane);
        self.lists[idx].push(image);
    }

    /// Number of images held for each key
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        self.keys()
            .into_iter()
            .zip(self.lists.iter().map(|l| l.len()))
            .collect()
    }

    pub fn images(&self, key: &str) -> Option<&[Array2<f64>]> {
        let idx = self.keys().iter().position(|k| *k == key)?;
        Some(&self.lists[idx])
    }

    /// Stack each list into an array of shape (count, channel bins, time bins)
    pub fn stack(&self) -> Result<Vec<(&'static str, Array3<f64>)>, BinningError> {
        let mut stacked = Vec::with_capacity(self.lists.len());
        for (key, list) in self.keys().into_iter().zip(self.lists.iter()) {
            let mut flat = Vec::with_capacity(list.len() * self.n_channel_bins * self.n_time_bins);
            for image in list {
                flat.extend(image.iter().copied());
            }
            let array =
                Array3::from_shape_vec((list.len(), self.n_channel_bins, self.n_time_bins), flat)?;
            stacked.push((key, array));
        }
        Ok(stacked)
    }

    /// Write the bundle as a compressed .npz archive
    pub fn write_npz(&self, path: &Path) -> Result<(), BinningError> {
        let mut npz = NpzWriter::new_compressed(File::create(path)?);
        for (key, array) in self.stack()? {
            npz.add_array(key, &array)?;
        }
        npz.finish()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_single_plane_stack() {
        let mut bundle = ImageBundle::new(BinningMode::SinglePlane(Plane::Z), 2, 2);
        bundle.push(Plane::Z, array![[1.0, 2.0], [3.0, 4.0]]);
        bundle.push(Plane::Z, array![[5.0, 6.0], [7.0, 8.0]]);
        let stacked = bundle.stack().unwrap();
        assert_eq!(stacked.len(), 1);
        let (key, array) = &stacked[0];
        assert_eq!(*key, "images");
        assert_eq!(array.shape(), &[2, 2, 2]);
        assert_eq!(array[[1, 0, 1]], 6.0);
        assert_eq!(array[[0, 1, 0]], 3.0);
    }

    #[test]
    fn test_empty_combined_stack() {
        let bundle = ImageBundle::new(BinningMode::Combined, 3, 4);
        let stacked = bundle.stack().unwrap();
        let keys: Vec<_> = stacked.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["plane0", "plane1", "plane2"]);
        for (_, array) in stacked {
            assert_eq!(array.shape(), &[0, 3, 4]);
        }
    }

    #[test]
    fn test_write_npz() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images.npz");
        let mut bundle = ImageBundle::new(BinningMode::Combined, 1, 1);
        for plane in Plane::ALL {
            bundle.push(plane, array![[1.0]]);
        }
        bundle.write_npz(&path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
