use super::canvas::{Canvas, Stroke, TextAnchor};

/// [`Canvas`] that accumulates SVG elements.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width: f64,
    height: f64,
    background: Option<String>,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
            background: None,
            body: String::new(),
        }
    }

    #[must_use]
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background = Some(color.into());
        self
    }

    /// Complete SVG document.
    #[must_use]
    pub fn finish(self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w:.0} {h:.0}" width="{w:.0}" height="{h:.0}"><style>text{{font-family:Arial,sans-serif;font-size:10px}}</style>"#,
            w = self.width,
            h = self.height
        );
        if let Some(bg) = &self.background {
            svg.push_str(&format!(
                r#"<rect x="0" y="0" width="{w:.0}" height="{h:.0}" fill="{bg}" />"#,
                w = self.width,
                h = self.height
            ));
        }
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }
}

impl Canvas for SvgCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: &Stroke) {
        self.body.push_str(&format!(
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" {} />"#,
            from.0,
            from.1,
            to.0,
            to.1,
            stroke_attrs(stroke)
        ));
    }

    fn polyline(&mut self, points: &[(f64, f64)], stroke: &Stroke) {
        if points.is_empty() {
            return;
        }
        let coords: String = points
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.body.push_str(&format!(
            r#"<polyline fill="none" {} stroke-linejoin="round" points="{coords}" />"#,
            stroke_attrs(stroke)
        ));
    }

    fn circle(&mut self, center: (f64, f64), radius: f64, fill: &str, opacity: f64) {
        self.body.push_str(&format!(
            r#"<circle cx="{:.2}" cy="{:.2}" r="{radius:.2}" fill="{fill}" fill-opacity="{opacity:.2}" />"#,
            center.0, center.1
        ));
    }

    fn text(&mut self, at: (f64, f64), text: &str, anchor: TextAnchor, color: &str) {
        self.body.push_str(&format!(
            r#"<text x="{:.2}" y="{:.2}" text-anchor="{}" fill="{color}">{}</text>"#,
            at.0,
            at.1,
            anchor.as_str(),
            escape_text(text)
        ));
    }
}

fn stroke_attrs(stroke: &Stroke) -> String {
    let dash = if stroke.dashed { "4 3" } else { "0" };
    format!(
        r#"stroke="{}" stroke-width="{:.2}" stroke-dasharray="{dash}" stroke-opacity="{:.2}""#,
        stroke.color, stroke.width, stroke.opacity
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
