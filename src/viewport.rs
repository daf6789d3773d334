pub const DEFAULT_ZOOM_BASE: f64 = 1.2;
pub const FIELD_SIZE: f64 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub scale: f64,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::new(0.0, FIELD_SIZE, 0.0, FIELD_SIZE)
    }
}

impl ViewportState {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            scale: 1.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn is_valid(&self) -> bool {
        [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite())
            && self.x_max > self.x_min
            && self.y_max > self.y_min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomPolicy {
    pub base: f64,
    pub min_extent: Option<f64>,
    pub max_extent: Option<f64>,
}

impl Default for ZoomPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_ZOOM_BASE,
            min_extent: None,
            max_extent: None,
        }
    }
}

impl ZoomPolicy {
    pub fn factor(&self, direction: ZoomDirection) -> f64 {
        match direction {
            ZoomDirection::Out => self.base,
            ZoomDirection::In => 1.0 / self.base,
        }
    }

    fn clamp_factor(&self, factor: f64, extent: f64) -> f64 {
        let mut factor = factor;
        if let Some(min) = self.min_extent {
            factor = factor.max(min / extent);
        }
        if let Some(max) = self.max_extent {
            factor = factor.min(max / extent);
        }
        factor
    }
}

fn scale_axis(min: f64, max: f64, anchor: f64, factor: f64) -> (f64, f64) {
    (
        anchor - (anchor - min) * factor,
        anchor + (max - anchor) * factor,
    )
}

/// Zooms `state` around the data point under the cursor.
///
/// The anchor keeps its screen position: its fractional offset within each
/// axis is unchanged. Returns `state` untouched if the anchor is not finite or
/// the result would collapse an axis.
pub fn zoom(
    state: &ViewportState,
    anchor_x: f64,
    anchor_y: f64,
    direction: ZoomDirection,
    policy: &ZoomPolicy,
) -> ViewportState {
    if !anchor_x.is_finite() || !anchor_y.is_finite() {
        return *state;
    }

    let factor = policy.factor(direction);
    let fx = policy.clamp_factor(factor, state.width());
    let fy = policy.clamp_factor(factor, state.height());

    let (x_min, x_max) = scale_axis(state.x_min, state.x_max, anchor_x, fx);
    let (y_min, y_max) = scale_axis(state.y_min, state.y_max, anchor_y, fy);

    let next = ViewportState {
        x_min,
        x_max,
        y_min,
        y_max,
        scale: state.scale * fx,
    };

    if next.is_valid() {
        next
    } else {
        *state
    }
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewportState,
    initial: ViewportState,
    policy: ZoomPolicy,
    revision: u64,
}

impl ViewportController {
    pub fn new(initial: ViewportState, policy: ZoomPolicy) -> Self {
        Self {
            state: initial,
            initial,
            policy,
            revision: 0,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn apply_zoom(
        &mut self,
        cursor_x: f64,
        cursor_y: f64,
        direction: ZoomDirection,
    ) -> ViewportState {
        let next = zoom(&self.state, cursor_x, cursor_y, direction, &self.policy);
        self.set(next);
        self.state
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> ViewportState {
        if dx.is_finite() && dy.is_finite() && (dx != 0.0 || dy != 0.0) {
            let next = ViewportState {
                x_min: self.state.x_min + dx,
                x_max: self.state.x_max + dx,
                y_min: self.state.y_min + dy,
                y_max: self.state.y_max + dy,
                scale: self.state.scale,
            };
            if next.is_valid() {
                self.set(next);
            }
        }
        self.state
    }

    pub fn reset(&mut self) -> ViewportState {
        self.set(self.initial);
        self.state
    }

    fn set(&mut self, next: ViewportState) {
        if next != self.state {
            self.state = next;
            self.revision += 1;
        }
    }
}
