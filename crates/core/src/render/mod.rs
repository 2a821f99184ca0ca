pub mod canvas;
pub mod chart_renderer;
pub mod svg;
