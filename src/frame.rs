use crate::history::HistoryEntry;
use crate::rays::{compute_rays, RaySegment};
use crate::telemetry::TelemetryState;
use crate::viewport::ViewportState;

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub trail: Vec<HistoryEntry>,
    pub latest: Option<HistoryEntry>,
    pub rays: Vec<RaySegment>,
    pub viewport: ViewportState,
}

pub trait Renderer {
    fn draw(&mut self, frame: &Frame);
}

#[derive(Debug, Default)]
pub struct FrameAssembler {
    key: Option<(Option<u64>, u64)>,
    frame: Option<Frame>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assemble(state: &TelemetryState) -> Frame {
        let (trail, latest) = state.history_snapshot();
        let rays = latest
            .map(|entry| compute_rays(&entry.pose, entry.reading.as_ref()))
            .unwrap_or_default();

        Frame {
            trail,
            latest,
            rays,
            viewport: state.viewport(),
        }
    }

    pub fn refresh(&mut self, state: &TelemetryState) -> (&Frame, bool) {
        let key = (state.latest_seq(), state.viewport_revision());
        let stale = self.frame.is_none() || self.key != Some(key);
        if stale {
            self.key = Some(key);
            self.frame = Some(Self::assemble(state));
        }
        let frame: &Frame = self.frame.get_or_insert_with(|| Self::assemble(state));
        (frame, stale)
    }
}
