/// Inner margins of the plot area, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            top: 36.0,
            right: 56.0,
            bottom: 36.0,
            left: 56.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Line appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    pub dashed: bool,
    pub opacity: f64,
}

impl Stroke {
    pub fn solid(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
            dashed: false,
            opacity: 1.0,
        }
    }

    pub fn dashed(color: impl Into<String>, width: f64) -> Self {
        Self {
            dashed: true,
            ..Self::solid(color, width)
        }
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

/// Drawing surface used by the chart renderer. Coordinates are in canvas
/// units with the origin at the top left.
pub trait Canvas {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: &Stroke);
    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke);
    fn circle(&mut self, center: (f64, f64), radius: f64, fill: &str, opacity: f64);
    fn text(&mut self, at: (f64, f64), text: &str, anchor: TextAnchor, color: &str);
}
