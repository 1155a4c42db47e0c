/// Which pipeline stage a status message refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Extraction,
    Binning,
}

/// Progress report sent from a running stage to whoever is watching (typically the CLI).
#[derive(Debug, Clone, Default)]
pub struct StageStatus {
    pub progress: f32,
    pub stage: Stage,
    pub message: String,
}

impl StageStatus {
    pub fn new(progress: f32, stage: Stage, message: String) -> Self {
        Self {
            progress,
            stage,
            message,
        }
    }
}
