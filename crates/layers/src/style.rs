use std::rc::Rc;

use foundation::ImageId;

use crate::feature::Feature;

/// Normalized RGBA.
pub type Rgba = [f32; 4];

pub const BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];
pub const WHITE: Rgba = [1.0, 1.0, 1.0, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub enum FillColor {
    Solid(Rgba),
    /// Canvas pattern; `fallback` is drawn where patterns are unsupported.
    Pattern { fallback: Option<Rgba> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub color: FillColor,
}

impl Fill {
    pub fn solid(color: Rgba) -> Self {
        Self {
            color: FillColor::Solid(color),
        }
    }

    pub fn pattern(fallback: Option<Rgba>) -> Self {
        Self {
            color: FillColor::Pattern { fallback },
        }
    }

    /// Solid colour, or the pattern fallback.
    pub fn solid_color(&self) -> Option<Rgba> {
        match self.color {
            FillColor::Solid(c) => Some(c),
            FillColor::Pattern { fallback } => fallback,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
    pub line_dash: Option<Vec<f64>>,
}

impl Stroke {
    pub fn new(color: Rgba, width: f64) -> Self {
        Self {
            color,
            width,
            line_dash: None,
        }
    }

    pub fn dashed(mut self, dash: Vec<f64>) -> Self {
        self.line_dash = Some(dash);
        self
    }

    pub fn is_dashed(&self) -> bool {
        self.line_dash.as_ref().is_some_and(|d| !d.is_empty())
    }
}

/// Icon reference. Load state lives in the map's image registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStyle {
    pub image: ImageId,
    pub scale: f64,
    pub opacity: f64,
    pub anchor: Option<[f64; 2]>,
    pub size: Option<[f64; 2]>,
}

impl ImageStyle {
    pub fn new(image: ImageId) -> Self {
        Self {
            image,
            scale: 1.0,
            opacity: 1.0,
            anchor: None,
            size: None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
    Center,
    Start,
    End,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
    Bottom,
    Alphabetic,
    Hanging,
    Ideographic,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub text: Option<String>,
    pub font: Option<String>,
    pub text_align: Option<TextAlign>,
    pub text_baseline: Option<TextBaseline>,
    pub offset_x: f64,
    pub offset_y: f64,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
}

impl TextStyle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Text present and non-empty.
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub image: Option<ImageStyle>,
    pub text: Option<TextStyle>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_image(mut self, image: ImageStyle) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_text(mut self, text: TextStyle) -> Self {
        self.text = Some(text);
        self
    }
}

/// Style function `(feature, resolution) -> styles`.
#[derive(Clone)]
pub struct StyleFn(Rc<dyn Fn(&Feature, f64) -> Vec<Style>>);

impl StyleFn {
    pub fn new(f: impl Fn(&Feature, f64) -> Vec<Style> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Always returns `style`.
    pub fn fixed(style: Style) -> Self {
        Self::new(move |_, _| vec![style.clone()])
    }

    pub fn call(&self, feature: &Feature, resolution: f64) -> Vec<Style> {
        (self.0)(feature, resolution)
    }
}

impl std::fmt::Debug for StyleFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StyleFn(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::{BLACK, Fill, Stroke, Style, StyleFn, TextStyle};
    use crate::feature::Feature;

    #[test]
    fn fixed_style_fn_returns_one_style() {
        let style = Style::new().with_fill(Fill::solid(BLACK));
        let f = StyleFn::fixed(style.clone());
        assert_eq!(f.call(&Feature::empty(), 1.0), vec![style]);
    }

    #[test]
    fn pattern_fill_exposes_fallback() {
        assert_eq!(Fill::pattern(None).solid_color(), None);
        assert_eq!(Fill::pattern(Some(BLACK)).solid_color(), Some(BLACK));
    }

    #[test]
    fn empty_dash_is_solid() {
        assert!(!Stroke::new(BLACK, 1.0).dashed(vec![]).is_dashed());
        assert!(Stroke::new(BLACK, 1.0).dashed(vec![4.0, 2.0]).is_dashed());
        assert!(!TextStyle::new("").has_text());
    }
}
