use super::bundle::ImageBundle;
use super::channel_map::ChannelMap;
use super::detector::Plane;
use super::error::ChannelMapError;
use super::histogram::{histogram2d, BinEdges};
use super::subevent::SubEvent;

/// Which images are made for each module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinningMode {
    /// One image per module for the given plane
    SinglePlane(Plane),
    /// One image per plane per module, only when all three planes have hits
    Combined,
}

/// The planes binned for each module and how their time windows are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneTargets {
    pub planes: Vec<Plane>,
    /// Skip the module unless every plane has hits
    pub all_or_nothing: bool,
    /// If set, every plane shares the time window starting at the earliest hit of this plane.
    /// Otherwise each plane starts its window at its own earliest hit.
    pub time_anchor: Option<Plane>,
}

impl From<BinningMode> for PlaneTargets {
    fn from(mode: BinningMode) -> Self {
        match mode {
            BinningMode::SinglePlane(plane) => Self {
                planes: vec![plane],
                all_or_nothing: false,
                time_anchor: None,
            },
            // The collection plane anchors the window for the induction planes too
            BinningMode::Combined => Self {
                planes: Plane::ALL.to_vec(),
                all_or_nothing: true,
                time_anchor: Some(Plane::Z),
            },
        }
    }
}

/// ImageBinner turns sub-events into fixed size (channel, time) images.
///
/// For every module of a sub-event (minus an excluded one) the hits of each target plane are
/// histogrammed over the channel range of that plane and a 20000 tick window, weighted by ADC
/// integral.
#[derive(Debug, Clone)]
pub struct ImageBinner {
    channel_map: ChannelMap,
    targets: PlaneTargets,
    n_channel_bins: usize,
    n_time_bins: usize,
    excluded_module: Option<i32>,
}

impl ImageBinner {
    pub fn new(
        channel_map: ChannelMap,
        targets: PlaneTargets,
        n_channel_bins: usize,
        n_time_bins: usize,
        excluded_module: Option<i32>,
    ) -> Self {
        Self {
            channel_map,
            targets,
            n_channel_bins,
            n_time_bins,
            excluded_module,
        }
    }

    /// Bin every module of a sub-event into the bundle.
    ///
    /// Returns the number of modules which produced images. Modules without hits on the target
    /// plane(s) are skipped. A module or plane missing from the channel map is an error, even
    /// when the module has no hits on that plane. In all-or-nothing mode modules lacking a
    /// plane are skipped before the map is consulted.
    pub fn bin_subevent(
        &self,
        subevent: &SubEvent,
        bundle: &mut ImageBundle,
    ) -> Result<usize, ChannelMapError> {
        let mut n_binned = 0;
        for module in subevent.module_ids(self.excluded_module) {
            let selections: Vec<_> = self
                .targets
                .planes
                .iter()
                .map(|plane| (*plane, subevent.select(module, *plane)))
                .collect();

            if self.targets.all_or_nothing && selections.iter().any(|(_, s)| s.is_empty()) {
                spdlog::debug!("Module {module} is missing hits on at least one plane, skipping");
                continue;
            }

            let shared_window = match self.targets.time_anchor {
                Some(anchor) => match subevent.select(module, anchor).min_time(subevent) {
                    Some(start) => Some(BinEdges::time_edges(start, self.n_time_bins)),
                    None => continue,
                },
                None => None,
            };

            let mut images = Vec::with_capacity(selections.len());
            for (plane, selection) in selections.iter() {
                // Resolved before the hit check: a module without geometry aborts the run
                let record = self.channel_map.get_record(module, *plane)?;
                let time_edges = match (&shared_window, selection.min_time(subevent)) {
                    (_, None) => continue,
                    (Some(shared), Some(_)) => shared.clone(),
                    (None, Some(start)) => BinEdges::time_edges(start, self.n_time_bins),
                };
                let channel_edges = BinEdges::channel_edges(
                    record.first_channel,
                    record.channel_count,
                    self.n_channel_bins,
                );
                images.push((
                    *plane,
                    histogram2d(subevent, selection, &channel_edges, &time_edges),
                ));
            }

            if images.is_empty() {
                continue;
            }
            for (plane, image) in images {
                bundle.push(plane, image);
            }
            n_binned += 1;
        }
        Ok(n_binned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detector;

    fn binner(mode: BinningMode, excluded: Option<i32>) -> ImageBinner {
        let map = ChannelMap::for_detector(Detector::Np04).unwrap();
        ImageBinner::new(map, PlaneTargets::from(mode), 4, 4, excluded)
    }

    // Module 1 has hits on all planes, module 2 only on the collection plane
    fn make_subevent() -> SubEvent {
        SubEvent::new(
            vec![10, 20, 30, 40, 50],
            vec![6000, 1000, 500, 300, 2000],
            vec![2100, 401, 1201, 2100, 4200],
            vec![1, 1, 1, 1, 2],
            vec![2, 0, 1, 2, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_single_plane() {
        let binner = binner(BinningMode::SinglePlane(Plane::Z), None);
        let mode = BinningMode::SinglePlane(Plane::Z);
        let mut bundle = ImageBundle::new(mode, 4, 4);
        let n = binner.bin_subevent(&make_subevent(), &mut bundle).unwrap();
        assert_eq!(n, 2);
        let images = bundle.images("images").unwrap();
        assert_eq!(images.len(), 2);
        // Module 1: window starts at 300, bins are 5000 ticks wide, channels 2080..2560 in 120s
        assert_eq!(images[0].shape(), &[4, 4]);
        assert_eq!(images[0][[0, 0]], 40.0);
        assert_eq!(images[0][[0, 1]], 10.0);
        assert_eq!(images[0].sum(), 50.0);
        // Module 2: single hit at the start of its own window
        assert_eq!(images[1][[0, 0]], 50.0);
    }

    #[test]
    fn test_single_plane_excluded_module() {
        let binner = binner(BinningMode::SinglePlane(Plane::Z), Some(1));
        let mut bundle = ImageBundle::new(BinningMode::SinglePlane(Plane::Z), 4, 4);
        let n = binner.bin_subevent(&make_subevent(), &mut bundle).unwrap();
        assert_eq!(n, 1);
        assert_eq!(bundle.images("images").unwrap()[0].sum(), 50.0);
    }

    #[test]
    fn test_single_plane_without_hits_skips() {
        let binner = binner(BinningMode::SinglePlane(Plane::U), None);
        let mut bundle = ImageBundle::new(BinningMode::SinglePlane(Plane::U), 4, 4);
        let sub = SubEvent::new(vec![1], vec![1], vec![2100], vec![1], vec![2]).unwrap();
        assert_eq!(binner.bin_subevent(&sub, &mut bundle).unwrap(), 0);
        assert!(bundle.images("images").unwrap().is_empty());
    }

    #[test]
    fn test_combined_all_or_nothing() {
        let binner = binner(BinningMode::Combined, None);
        let mut bundle = ImageBundle::new(BinningMode::Combined, 4, 4);
        let n = binner.bin_subevent(&make_subevent(), &mut bundle).unwrap();
        // Module 2 lacks induction hits and produces nothing on any plane
        assert_eq!(n, 1);
        for (_, count) in bundle.counts() {
            assert_eq!(count, 1);
        }
    }

    #[test]
    fn test_combined_shares_collection_window() {
        let binner = binner(BinningMode::Combined, None);
        let mut bundle = ImageBundle::new(BinningMode::Combined, 4, 4);
        binner.bin_subevent(&make_subevent(), &mut bundle).unwrap();
        // Plane 0 hit at t=1000 and plane 1 hit at t=500 both land in the first bin of the
        // window anchored on the earliest collection hit (t=300)
        let plane0 = &bundle.images("plane0").unwrap()[0];
        let plane1 = &bundle.images("plane1").unwrap()[0];
        assert_eq!(plane0[[0, 0]], 20.0);
        assert_eq!(plane1[[0, 0]], 30.0);
    }

    #[test]
    fn test_combined_anchor_drops_early_induction_hits() {
        // Induction hit earlier than every collection hit falls before the shared window
        let sub = SubEvent::new(
            vec![5, 6, 7],
            vec![100, 200, 1000],
            vec![401, 1201, 2100],
            vec![1, 1, 1],
            vec![0, 1, 2],
        )
        .unwrap();
        let binner = binner(BinningMode::Combined, None);
        let mut bundle = ImageBundle::new(BinningMode::Combined, 4, 4);
        assert_eq!(binner.bin_subevent(&sub, &mut bundle).unwrap(), 1);
        assert_eq!(bundle.images("plane0").unwrap()[0].sum(), 0.0);
        assert_eq!(bundle.images("plane1").unwrap()[0].sum(), 0.0);
        assert_eq!(bundle.images("plane2").unwrap()[0].sum(), 7.0);
    }

    #[test]
    fn test_unmapped_module_without_plane_hits_is_an_error() {
        // Module 1 only has hits on plane 0, module 5 has a collection hit
        let map = ChannelMap::for_detector(Detector::Np02).unwrap();
        let targets = PlaneTargets::from(BinningMode::SinglePlane(Plane::Z));
        let binner = ImageBinner::new(map, targets, 4, 4, None);
        let mut bundle = ImageBundle::new(BinningMode::SinglePlane(Plane::Z), 4, 4);
        let sub = SubEvent::new(vec![1, 2], vec![1, 1], vec![10, 20], vec![1, 5], vec![0, 2])
            .unwrap();
        assert!(matches!(
            binner.bin_subevent(&sub, &mut bundle),
            Err(ChannelMapError::Lookup(1, Plane::Z))
        ));
    }

    #[test]
    fn test_combined_skips_before_lookup() {
        // Module 9 is unmapped but lacks induction hits, so it never reaches the map
        let binner = binner(BinningMode::Combined, None);
        let mut bundle = ImageBundle::new(BinningMode::Combined, 4, 4);
        let sub = SubEvent::new(vec![1], vec![1], vec![1], vec![9], vec![2]).unwrap();
        assert_eq!(binner.bin_subevent(&sub, &mut bundle).unwrap(), 0);
    }

    #[test]
    fn test_unknown_module_is_an_error() {
        let binner = binner(BinningMode::SinglePlane(Plane::Z), None);
        let mut bundle = ImageBundle::new(BinningMode::SinglePlane(Plane::Z), 4, 4);
        let sub = SubEvent::new(vec![1], vec![1], vec![1], vec![9], vec![2]).unwrap();
        assert!(matches!(
            binner.bin_subevent(&sub, &mut bundle),
            Err(ChannelMapError::Lookup(9, Plane::Z))
        ));
    }
}
