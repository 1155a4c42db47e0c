use ndarray::{Array1, Array2};

use super::constants::TIME_WINDOW_TICKS;
use super::subevent::{Selection, SubEvent};

/// `n` evenly spaced values from `start` to `stop`, both ends included
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let mut values = Array1::linspace(start, stop, n).to_vec();
    // Pin the last edge so it is exactly `stop` regardless of rounding
    if n > 1 {
        values[n - 1] = stop;
    }
    values
}

/// Strictly increasing bin boundaries along one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    /// Edges for the channels `[first_channel, first_channel + channel_count)`
    pub fn channel_edges(first_channel: i32, channel_count: i32, n_bins: usize) -> Self {
        let first = first_channel as f64;
        Self {
            edges: linspace(first, first + channel_count as f64, n_bins + 1),
        }
    }

    /// Edges for a readout window starting at `start_time`
    pub fn time_edges(start_time: f64, n_bins: usize) -> Self {
        Self {
            edges: linspace(start_time, start_time + TIME_WINDOW_TICKS, n_bins + 1),
        }
    }

    /// Wrap explicit edges. Returns None unless there are at least two strictly increasing values.
    pub fn from_edges(edges: Vec<f64>) -> Option<Self> {
        if edges.len() < 2 || edges.windows(2).any(|w| w[0] >= w[1]) {
            return None;
        }
        Some(Self { edges })
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Index of the bin `[edge_i, edge_i+1)` holding `x`, None if `x` is outside every bin.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        let first = *self.edges.first()?;
        let last = *self.edges.last()?;
        if !(x >= first && x < last) {
            return None;
        }
        Some(self.edges.partition_point(|e| *e <= x) - 1)
    }
}

/// Fill a 2D histogram of the selected hits, weighted by ADC integral.
///
/// Rows are channel bins and columns are time bins, like an event display. Hits falling outside
/// the edges are dropped.
pub fn histogram2d(
    subevent: &SubEvent,
    selection: &Selection,
    channel_edges: &BinEdges,
    time_edges: &BinEdges,
) -> Array2<f64> {
    let mut image = Array2::<f64>::zeros((channel_edges.n_bins(), time_edges.n_bins()));
    for hit in selection.hits() {
        let channel_bin = channel_edges.find_bin(subevent.channel_id[hit] as f64);
        let time_bin = time_edges.find_bin(subevent.time_peak[hit] as f64);
        if let (Some(row), Some(col)) = (channel_bin, time_bin) {
            image[[row, col]] += subevent.adc_integral[hit] as f64;
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Plane;
    use ndarray::array;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 10.0, 3), vec![0.0, 5.0, 10.0]);
        assert_eq!(linspace(2.0, 2.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        let edges = linspace(0.0, 0.3, 4);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3], 0.3);
    }

    #[test]
    fn test_time_edges_span_window() {
        let edges = BinEdges::time_edges(1000.0, 4);
        assert_eq!(
            edges.edges(),
            &[1000.0, 6000.0, 11000.0, 16000.0, 21000.0]
        );
        assert_eq!(edges.n_bins(), 4);
    }

    #[test]
    fn test_channel_edges() {
        let edges = BinEdges::channel_edges(2080, 480, 4);
        assert_eq!(edges.edges(), &[2080.0, 2200.0, 2320.0, 2440.0, 2560.0]);
    }

    #[test]
    fn test_find_bin_half_open() {
        let edges = BinEdges::from_edges(vec![0.0, 10.0, 20.0]).unwrap();
        assert_eq!(edges.find_bin(0.0), Some(0));
        assert_eq!(edges.find_bin(9.99), Some(0));
        assert_eq!(edges.find_bin(10.0), Some(1));
        assert_eq!(edges.find_bin(20.0), None);
        assert_eq!(edges.find_bin(-1.0), None);
        assert!(BinEdges::from_edges(vec![0.0, 0.0]).is_none());
    }

    #[test]
    fn test_histogram_drops_out_of_range() {
        let sub = SubEvent::new(
            vec![2, 3, 99],
            vec![3, 8, 1],
            vec![5, 15, 25],
            vec![1, 1, 1],
            vec![2, 2, 2],
        )
        .unwrap();
        let selection = sub.select(1, Plane::Z);
        let channel_edges = BinEdges::from_edges(vec![0.0, 10.0, 20.0]).unwrap();
        let time_edges = BinEdges::from_edges(vec![0.0, 5.0, 10.0]).unwrap();
        let image = histogram2d(&sub, &selection, &channel_edges, &time_edges);
        assert_eq!(image, array![[2.0, 0.0], [0.0, 3.0]]);
        assert_eq!(image.sum(), 5.0);
    }

    #[test]
    fn test_histogram_respects_selection() {
        let sub = SubEvent::new(
            vec![4, 6],
            vec![1, 1],
            vec![1, 1],
            vec![1, 2],
            vec![0, 0],
        )
        .unwrap();
        let selection = sub.select(2, Plane::U);
        let edges = BinEdges::from_edges(vec![0.0, 10.0]).unwrap();
        let image = histogram2d(&sub, &selection, &edges, &edges);
        assert_eq!(image, array![[6.0]]);
    }
}
