use super::detector::Plane;

/// The trigger primitives of one sub-event, stored as parallel arrays.
///
/// Element `i` of each array describes the same hit. All arrays have the same length, which is
/// checked when the SubEvent is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubEvent {
    pub adc_integral: Vec<i32>,
    pub time_peak: Vec<i32>,
    pub channel_id: Vec<i32>,
    pub module_id: Vec<i32>,
    pub plane_id: Vec<i32>,
}

impl SubEvent {
    /// Create a SubEvent. Returns None if the arrays do not all have the same length.
    pub fn new(
        adc_integral: Vec<i32>,
        time_peak: Vec<i32>,
        channel_id: Vec<i32>,
        module_id: Vec<i32>,
        plane_id: Vec<i32>,
    ) -> Option<Self> {
        let n = adc_integral.len();
        if [&time_peak, &channel_id, &module_id, &plane_id]
            .iter()
            .any(|v| v.len() != n)
        {
            return None;
        }
        Some(Self {
            adc_integral,
            time_peak,
            channel_id,
            module_id,
            plane_id,
        })
    }

    /// Number of hits
    pub fn len(&self) -> usize {
        self.adc_integral.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adc_integral.is_empty()
    }

    /// The sorted, de-duplicated module ids seen in this sub-event.
    ///
    /// An excluded module is removed from the set entirely, so none of its hits are ever
    /// selected.
    pub fn module_ids(&self, exclude: Option<i32>) -> Vec<i32> {
        let mut ids = self.module_id.clone();
        ids.sort_unstable();
        ids.dedup();
        if let Some(bad) = exclude {
            ids.retain(|id| *id != bad);
        }
        ids
    }

    /// Select the hits of one module and plane
    pub fn select(&self, module: i32, plane: Plane) -> Selection {
        let plane_id = plane.id();
        Selection {
            mask: self
                .module_id
                .iter()
                .zip(self.plane_id.iter())
                .map(|(m, p)| *m == module && *p == plane_id)
                .collect(),
        }
    }
}

/// A boolean mask over the hits of a SubEvent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    mask: Vec<bool>,
}

impl Selection {
    /// Number of selected hits
    pub fn len(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.mask.iter().any(|m| *m)
    }

    pub fn contains(&self, hit: usize) -> bool {
        self.mask.get(hit).copied().unwrap_or(false)
    }

    /// Indices of the selected hits
    pub fn hits(&self) -> impl Iterator<Item = usize> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(idx, m)| if *m { Some(idx) } else { None })
    }

    /// Earliest peak time among the selected hits, None if nothing is selected
    pub fn min_time(&self, subevent: &SubEvent) -> Option<f64> {
        self.hits()
            .map(|idx| subevent.time_peak[idx])
            .min()
            .map(|t| t as f64)
    }
}
