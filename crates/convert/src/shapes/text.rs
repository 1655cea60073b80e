use foundation::lon_lat_to_ecef;
use layers::{Feature, Geometry, TextAlign, TextBaseline, TextStyle};
use scene::{HorizontalOrigin, Label, LabelId, LabelStyle, PickRef, VerticalOrigin};

use crate::converter::{Conversion, FeatureConverter};
use crate::paint::{extract_color, line_width};

fn horizontal_origin(align: Option<TextAlign>) -> HorizontalOrigin {
    match align {
        Some(TextAlign::Left) => HorizontalOrigin::Left,
        Some(TextAlign::Right) => HorizontalOrigin::Right,
        _ => HorizontalOrigin::Center,
    }
}

fn vertical_origin(baseline: TextBaseline) -> VerticalOrigin {
    match baseline {
        TextBaseline::Top | TextBaseline::Alphabetic => VerticalOrigin::Top,
        TextBaseline::Middle => VerticalOrigin::Center,
        TextBaseline::Bottom | TextBaseline::Hanging | TextBaseline::Ideographic => {
            VerticalOrigin::Bottom
        }
    }
}

/// Font, colours, label style and origins taken from a text style.
pub(crate) fn apply_text_style(label: &mut Label, text: &TextStyle) {
    if let Some(font) = &text.font {
        label.font = Some(font.clone());
    }
    let fill = text.fill.as_ref();
    let stroke = text.stroke.as_ref();
    if fill.is_some() {
        label.fill_color = Some(extract_color(fill, stroke, false));
    }
    if stroke.is_some() {
        label.outline_width = Some(line_width(stroke));
        label.outline_color = Some(extract_color(fill, stroke, true));
    }
    label.style = match (fill.is_some(), stroke.is_some()) {
        (true, true) => Some(LabelStyle::FillAndOutline),
        (true, false) => Some(LabelStyle::Fill),
        (false, true) => Some(LabelStyle::Outline),
        (false, false) => None,
    };
    label.horizontal_origin = horizontal_origin(text.text_align);
    if let Some(baseline) = text.text_baseline {
        label.vertical_origin = Some(vertical_origin(baseline));
    }
}

impl FeatureConverter {
    /// Adds a label for `text` at the centre of the geometry's extent,
    /// lifted to the Z of its first coordinate.
    pub(crate) fn text_label(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        geometry: &Geometry,
        text: &TextStyle,
    ) -> Option<LabelId> {
        let content = text.text.clone()?;
        let [x, y] = geometry.extent().center();
        let z = geometry.first_coordinate().map_or(0.0, |c| c.z);
        let pick = PickRef::new(cx.layer.id(), feature.id());

        let mut label = Label::new(lon_lat_to_ecef(x, y, z), content, Some(pick));
        label.height_reference = self.height_reference(cx.layer, feature, geometry);
        label.pixel_offset = Some([text.offset_x, text.offset_y]);
        apply_text_style(&mut label, text);
        if let Some(dz) = feature.properties.number(&self.keys.z_eye_offset()) {
            label.eye_offset = Some([0.0, 0.0, dz]);
        }
        cx.context.labels.add(label)
    }
}

#[cfg(test)]
mod tests {
    use super::apply_text_style;
    use foundation::Ecef;
    use layers::{Fill, Stroke, TextAlign, TextBaseline, TextStyle};
    use scene::{HorizontalOrigin, Label, LabelStyle, VerticalOrigin};

    #[test]
    fn fill_and_stroke_make_fill_and_outline() {
        let mut text = TextStyle::new("A");
        text.fill = Some(Fill::solid([1.0, 0.0, 0.0, 1.0]));
        text.stroke = Some(Stroke::new([0.0, 0.0, 1.0, 1.0], 3.0));
        text.text_align = Some(TextAlign::Right);
        text.text_baseline = Some(TextBaseline::Hanging);
        let mut label = Label::new(Ecef::ZERO, "A", None);
        apply_text_style(&mut label, &text);
        assert_eq!(label.style, Some(LabelStyle::FillAndOutline));
        assert_eq!(label.fill_color, Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(label.outline_color, Some([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(label.outline_width, Some(3.0));
        assert_eq!(label.horizontal_origin, HorizontalOrigin::Right);
        assert_eq!(label.vertical_origin, Some(VerticalOrigin::Bottom));
    }

    #[test]
    fn baselines_map_to_vertical_origins() {
        let cases = [
            (TextBaseline::Top, VerticalOrigin::Top),
            (TextBaseline::Middle, VerticalOrigin::Center),
            (TextBaseline::Bottom, VerticalOrigin::Bottom),
            (TextBaseline::Alphabetic, VerticalOrigin::Top),
        ];
        for (baseline, expected) in cases {
            assert_eq!(super::vertical_origin(baseline), expected);
        }
        let mut label = Label::new(Ecef::ZERO, "A", None);
        apply_text_style(&mut label, &TextStyle::new("A"));
        assert_eq!(label.vertical_origin, None);
        assert_eq!(label.style, None);
        assert_eq!(label.horizontal_origin, HorizontalOrigin::Center);
    }
}
