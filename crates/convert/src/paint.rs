use layers::{BLACK, Feature, Fill, FillColor, Stroke, Style, StyleFn};
use scene::{Capabilities, Color, Material, TRANSPARENT};

/// Stripe repetitions along a dashed line.
const DASH_REPEAT: f64 = 500.0;

/// The single style a feature is drawn with, if any.
///
/// The feature's own style function wins over `fallback`; of several
/// styles only the first is used.
pub fn compute_plain_style(feature: &Feature, fallback: Option<&StyleFn>, resolution: f64) -> Option<Style> {
    let from_feature = feature
        .style
        .as_ref()
        .map(|f| f.call(feature, resolution))
        .filter(|styles| !styles.is_empty());
    let styles = match from_feature {
        Some(styles) => styles,
        None => fallback?.call(feature, resolution),
    };
    styles.into_iter().next()
}

/// Stroke colour when drawing an outline and a stroke exists, else the
/// fill colour, else black.
pub fn extract_color(fill: Option<&Fill>, stroke: Option<&Stroke>, outline: bool) -> Color {
    if outline && let Some(stroke) = stroke {
        return stroke.color;
    }
    fill.and_then(Fill::solid_color).unwrap_or(BLACK)
}

pub fn line_width(stroke: Option<&Stroke>) -> f64 {
    stroke.map_or(0.0, |s| s.width)
}

/// How a polygon-like fill is painted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FillPaint {
    Color(Color),
    /// Pattern drawn as a wallpaper material.
    Pattern,
}

/// Patterns need ground-primitive material support; without it the
/// pattern's fallback colour is used.
pub fn fill_paint(style: &Style, capabilities: &Capabilities) -> FillPaint {
    match style.fill.as_ref().map(|f| &f.color) {
        None => FillPaint::Color(BLACK),
        Some(FillColor::Solid(c)) => FillPaint::Color(*c),
        Some(FillColor::Pattern { .. }) if capabilities.ground_primitive_materials => FillPaint::Pattern,
        Some(FillColor::Pattern { fallback }) => FillPaint::Color(fallback.unwrap_or(BLACK)),
    }
}

/// Material for polylines: striped when dashed, plain colour otherwise.
pub fn line_material(style: &Style) -> Material {
    let color = extract_color(style.fill.as_ref(), style.stroke.as_ref(), true);
    match &style.stroke {
        Some(stroke) if stroke.is_dashed() => Material::Stripe {
            even: color,
            odd: TRANSPARENT,
            repeat: DASH_REPEAT,
            horizontal: false,
        },
        _ => Material::Color(color),
    }
}

#[cfg(test)]
mod tests {
    use super::{FillPaint, compute_plain_style, extract_color, fill_paint, line_material};
    use layers::{BLACK, Feature, Fill, Stroke, Style, StyleFn};
    use scene::{Capabilities, Material};

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

    #[test]
    fn feature_style_wins_and_first_element_is_used() {
        let layer = StyleFn::fixed(Style::new().with_fill(Fill::solid(BLUE)));
        let feature = Feature::empty().with_style(StyleFn::new(|_, _| {
            vec![
                Style::new().with_fill(Fill::solid(RED)),
                Style::new().with_fill(Fill::solid(BLUE)),
            ]
        }));
        let style = compute_plain_style(&feature, Some(&layer), 1.0).unwrap();
        assert_eq!(style.fill, Some(Fill::solid(RED)));

        let plain = Feature::empty();
        let style = compute_plain_style(&plain, Some(&layer), 1.0).unwrap();
        assert_eq!(style.fill, Some(Fill::solid(BLUE)));
        assert!(compute_plain_style(&plain, None, 1.0).is_none());
        let nothing = StyleFn::new(|_, _| Vec::new());
        assert!(compute_plain_style(&plain, Some(&nothing), 1.0).is_none());
    }

    #[test]
    fn colour_extraction_order() {
        let fill = Fill::solid(RED);
        let stroke = Stroke::new(BLUE, 2.0);
        assert_eq!(extract_color(Some(&fill), Some(&stroke), true), BLUE);
        assert_eq!(extract_color(Some(&fill), Some(&stroke), false), RED);
        assert_eq!(extract_color(None, None, true), BLACK);
    }

    #[test]
    fn patterns_depend_on_material_support() {
        let style = Style::new().with_fill(Fill::pattern(Some(RED)));
        assert_eq!(fill_paint(&style, &Capabilities::default()), FillPaint::Pattern);
        assert_eq!(fill_paint(&style, &Capabilities::minimal()), FillPaint::Color(RED));
        let bare = Style::new().with_fill(Fill::pattern(None));
        assert_eq!(fill_paint(&bare, &Capabilities::minimal()), FillPaint::Color(BLACK));
    }

    #[test]
    fn dashed_strokes_are_striped() {
        let style = Style::new().with_stroke(Stroke::new(RED, 1.0).dashed(vec![4.0, 2.0]));
        assert!(matches!(line_material(&style), Material::Stripe { repeat, .. } if repeat == 500.0));
        let solid = Style::new().with_stroke(Stroke::new(RED, 1.0));
        assert_eq!(line_material(&solid), Material::Color(RED));
    }
}
