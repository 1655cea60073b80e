use foundation::{Ecef, SourceId, lon_lat_to_ecef};
use layers::{Coordinate, Feature, Geometry, GeometryKind, ImageRegistry, Layer, Shape, Style};
use scene::{
    Appearance, Capabilities, ClassificationType, ConversionContext, GeometryInstance,
    GeometryShape, HeightReference, Material, PickRef, Primitive, PrimitiveCollection,
    PrimitiveKind, SceneObject,
};
use tracing::trace;

use crate::error::ConvertError;
use crate::height::{HeightInfo, HeightPolicy};
use crate::image_gate::ImageGate;
use crate::overrides::{self, OverrideChain, PropertyKeys};
use crate::paint::{FillPaint, extract_color, fill_paint, line_width};

/// Borrowed state one conversion call writes into.
pub struct Conversion<'a> {
    pub layer: &'a Layer,
    pub images: &'a ImageRegistry,
    pub gate: &'a mut ImageGate,
    pub context: &'a mut ConversionContext,
}

impl Conversion<'_> {
    pub(crate) fn source(&self) -> SourceId {
        self.layer
            .feature_source()
            .map(|s| s.id())
            .unwrap_or_default()
    }
}

pub(crate) fn to_ecef(c: &Coordinate) -> Ecef {
    lon_lat_to_ecef(c.x, c.y, c.z)
}

pub(crate) fn to_ecef_all(coords: &[Coordinate]) -> Vec<Ecef> {
    coords.iter().map(to_ecef).collect()
}

fn non_empty(collection: PrimitiveCollection) -> Option<SceneObject> {
    if collection.is_empty() {
        None
    } else {
        Some(SceneObject::Collection(collection))
    }
}

/// Turns styled 2D features into scene objects.
#[derive(Debug, Clone, Default)]
pub struct FeatureConverter {
    pub(crate) keys: PropertyKeys,
    pub(crate) height: HeightPolicy,
    pub(crate) capabilities: Capabilities,
}

impl FeatureConverter {
    pub fn new(keys: PropertyKeys, height: HeightPolicy, capabilities: Capabilities) -> Self {
        Self {
            keys,
            height,
            capabilities,
        }
    }

    pub fn keys(&self) -> &PropertyKeys {
        &self.keys
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub(crate) fn chain<'a>(
        &self,
        layer: &'a Layer,
        feature: &'a Feature,
        geometry: &'a Geometry,
    ) -> OverrideChain<'a> {
        OverrideChain::new(Some(&geometry.properties), &feature.properties, &layer.properties)
    }

    pub(crate) fn height_info(&self, layer: &Layer, feature: &Feature) -> Option<HeightInfo> {
        self.height.resolve(&feature.properties, &layer.properties)
    }

    pub(crate) fn height_reference(&self, layer: &Layer, feature: &Feature, geometry: &Geometry) -> HeightReference {
        overrides::height_reference(&self.keys, self.chain(layer, feature, geometry), geometry.kind())
    }

    pub(crate) fn allow_picking(&self, layer: &Layer, feature: &Feature, geometry: &Geometry) -> bool {
        overrides::allow_picking(&self.keys, self.chain(layer, feature, geometry))
    }

    pub(crate) fn classification(&self, layer: &Layer, feature: &Feature, geometry: &Geometry) -> Option<ClassificationType> {
        overrides::classification_type(&self.keys, self.chain(layer, feature, geometry))
    }

    /// Converts `feature`, or `geometry` in its place, into one scene object.
    ///
    /// Billboards and labels land in the context's shared collections and
    /// are referenced from the returned tree. Returns `Ok(None)` when
    /// nothing needs a root object.
    pub fn convert(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        style: &Style,
        geometry: Option<&Geometry>,
    ) -> Result<Option<SceneObject>, ConvertError> {
        let Some(geometry) = geometry.or(feature.geometry.as_ref()) else {
            return Ok(None);
        };
        let geometry = geometry.to_lon_lat(&cx.context.projection);
        self.convert_lon_lat(cx, feature, style, &geometry)
    }

    fn convert_lon_lat(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        style: &Style,
        geometry: &Geometry,
    ) -> Result<Option<SceneObject>, ConvertError> {
        trace!(feature = %feature.id(), kind = %geometry.kind(), "converting feature");
        match &geometry.shape {
            Shape::GeometryCollection(members) => {
                let mut out = PrimitiveCollection::new();
                for member in members {
                    if let Some(object) = self.convert_lon_lat(cx, feature, style, member)? {
                        out.add(object);
                    }
                }
                Ok(non_empty(out))
            }
            Shape::Point(c) => Ok(self.point(cx, feature, style, geometry, *c)),
            Shape::Circle { .. } => Ok(Some(self.circle(cx, feature, style, geometry))),
            Shape::LineString(coords) => {
                if coords.len() < 2 {
                    trace!(feature = %feature.id(), "skipping degenerate line");
                    return Ok(None);
                }
                Ok(Some(SceneObject::Collection(
                    self.line_string(cx, feature, style, geometry, false),
                )))
            }
            Shape::Polygon(rings) => {
                if rings.is_empty() || rings.iter().any(|r| r.len() < 2) {
                    trace!(feature = %feature.id(), "skipping degenerate polygon");
                    return Ok(None);
                }
                Ok(Some(SceneObject::Collection(self.polygon(cx, feature, style, geometry))))
            }
            Shape::MultiPoint(_) | Shape::MultiLineString(_) | Shape::MultiPolygon(_) => {
                Ok(self.multi(cx, feature, style, geometry))
            }
            Shape::LinearRing(_) => Err(ConvertError::UnsupportedGeometry {
                kind: GeometryKind::LinearRing,
            }),
        }
    }

    /// Fans a multi-geometry out to its members.
    ///
    /// Multi-points without a text style only produce billboards and
    /// return nothing; with text each point keeps its own label.
    fn multi(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        style: &Style,
        geometry: &Geometry,
    ) -> Option<SceneObject> {
        let member = |shape: Shape| Geometry::new(shape).with_properties(geometry.properties.clone());
        let mut out = PrimitiveCollection::new();
        match &geometry.shape {
            Shape::MultiPoint(points) => {
                for c in points {
                    let result = self.point(cx, feature, style, &member(Shape::Point(*c)), *c);
                    if style.text.is_some()
                        && let Some(object) = result
                    {
                        out.add(object);
                    }
                }
                if style.text.is_none() {
                    return None;
                }
            }
            Shape::MultiLineString(lines) => {
                for line in lines.iter().filter(|l| l.len() >= 2) {
                    let g = member(Shape::LineString(line.clone()));
                    let line = self.line_string(cx, feature, style, &g, false);
                    out.add(SceneObject::Collection(line));
                }
            }
            Shape::MultiPolygon(polygons) => {
                for rings in polygons {
                    if rings.is_empty() || rings.iter().any(|r| r.len() < 2) {
                        continue;
                    }
                    let g = member(Shape::Polygon(rings.clone()));
                    out.add(SceneObject::Collection(self.polygon(cx, feature, style, &g)));
                }
            }
            _ => return None,
        }
        non_empty(out)
    }

    /// One primitive drawing `shapes` in a single colour or pattern.
    ///
    /// Clamped geometry without extrusion becomes a ground primitive, or
    /// nothing when the shape cannot be draped. Otherwise a classification
    /// primitive is used when supported and requested, else a plain one.
    pub(crate) fn colored_primitive(
        &self,
        cx: &Conversion<'_>,
        feature: &Feature,
        geometry: &Geometry,
        shapes: Vec<GeometryShape>,
        paint: FillPaint,
        height: Option<&HeightInfo>,
        flat: bool,
    ) -> Option<Primitive> {
        let first = shapes.first()?;
        let drapable = first.supports_shadow_volume();
        let pick = PickRef::new(cx.layer.id(), feature.id());
        let instances: Vec<GeometryInstance> = shapes
            .into_iter()
            .map(|shape| match paint {
                FillPaint::Color(c) => GeometryInstance::colored(shape, c),
                FillPaint::Pattern => GeometryInstance::new(shape),
            })
            .collect();
        let appearance = match paint {
            FillPaint::Color(c) => Appearance::PerInstanceColor {
                flat,
                translucent: c[3] != 1.0,
            },
            FillPaint::Pattern => {
                let [x, y] = geometry.extent().bottom_left();
                Appearance::Material {
                    material: Material::Wallpaper {
                        anchor: lon_lat_to_ecef(x, y, 0.0),
                    },
                    flat,
                }
            }
        };

        let href = self.height_reference(cx.layer, feature, geometry);
        let allow = self.allow_picking(cx.layer, feature, geometry);
        let classification = self.classification(cx.layer, feature, geometry);

        let primitive = if href == HeightReference::ClampToGround && height.is_none() {
            if !drapable {
                return None;
            }
            let mut p = Primitive::new(PrimitiveKind::Ground, instances, pick)
                .with_classification(Some(classification.unwrap_or(ClassificationType::Terrain)));
            if paint == FillPaint::Pattern {
                p = p.with_appearance(appearance);
            }
            p
        } else if self.capabilities.classification_primitives && classification.is_some() {
            Primitive::new(PrimitiveKind::Classification, instances, pick)
                .with_appearance(appearance)
                .with_classification(classification)
                .with_shadows()
        } else {
            Primitive::new(PrimitiveKind::Primitive, instances, pick)
                .with_appearance(appearance)
                .with_shadows()
        };
        Some(primitive.with_allow_picking(allow))
    }

    /// Fill and outline primitives for one geometry.
    ///
    /// The outline needs a stroke with non-zero width; outlines that
    /// cannot be clamped to the ground are skipped.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn wrap_fill_and_outline(
        &self,
        cx: &Conversion<'_>,
        feature: &Feature,
        geometry: &Geometry,
        fill: Vec<GeometryShape>,
        outline: Option<Vec<GeometryShape>>,
        style: &Style,
        height: Option<&HeightInfo>,
    ) -> PrimitiveCollection {
        let mut primitives = PrimitiveCollection::new();
        if style.fill.is_some() {
            let paint = fill_paint(style, &self.capabilities);
            if let Some(p) = self.colored_primitive(cx, feature, geometry, fill, paint, height, false) {
                primitives.add(SceneObject::Primitive(p));
            }
        }
        if let (Some(stroke), Some(outline)) = (&style.stroke, outline) {
            let width = line_width(Some(stroke));
            if width != 0.0 {
                let color = extract_color(style.fill.as_ref(), Some(stroke), true);
                let paint = FillPaint::Color(color);
                match self.colored_primitive(cx, feature, geometry, outline, paint, height, true) {
                    Some(p) => {
                        primitives.add(SceneObject::Primitive(p));
                    }
                    None => trace!(feature = %feature.id(), "outline cannot be clamped, skipped"),
                }
            }
        }
        primitives
    }

    /// Appends the text label of `style`, if it has text.
    pub(crate) fn add_text_style(
        &self,
        cx: &mut Conversion<'_>,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        mut primitives: PrimitiveCollection,
    ) -> PrimitiveCollection {
        if let Some(text) = style.text.as_ref().filter(|t| t.has_text())
            && let Some(label) = self.text_label(cx, feature, geometry, text)
        {
            primitives.add(SceneObject::Label(label));
        }
        primitives
    }
}

#[cfg(test)]
mod tests {
    use super::{Conversion, FeatureConverter};
    use crate::error::ConvertError;
    use crate::height::HeightPolicy;
    use crate::image_gate::ImageGate;
    use crate::layer::LayerConverter;
    use crate::overrides::PropertyKeys;
    use foundation::{LayerId, Projection};
    use layers::{
        Coordinate, Feature, Fill, Geometry, GeometryKind, ImageStyle, Layer, Map, Properties,
        Shape, Stroke, Style, StyleFn, TextStyle, VectorSource, View,
    };
    use pretty_assertions::assert_eq;
    use scene::{
        Capabilities, GeometryShape, HeightReference, LayerCounterpart, PrimitiveKind, SceneObject,
    };

    fn map_with(features: Vec<Feature>, properties: Properties, style: Style) -> (Map, LayerId) {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let layer = Layer::vector(VectorSource::with_features(features))
            .with_properties(properties)
            .with_style(StyleFn::fixed(style));
        let id = map.add_layer(map.root(), layer).unwrap();
        (map, id)
    }

    fn triangle() -> Feature {
        Feature::new(Geometry::polygon(vec![vec![
            Coordinate::xy(0.0, 0.0),
            Coordinate::xy(1.0, 0.0),
            Coordinate::xy(1.0, 1.0),
        ]]))
    }

    fn filled() -> Style {
        Style::new().with_fill(Fill::solid([0.0, 0.0, 1.0, 1.0]))
    }

    fn convert_layer(converter: &FeatureConverter, map: &Map, id: LayerId) -> LayerCounterpart {
        let mut gate = ImageGate::default();
        let layer = map.layer(id).unwrap();
        converter
            .layer_counterpart(layer, map.view(), map.images(), &mut gate)
            .unwrap()
    }

    fn root_kinds(counterpart: &LayerCounterpart) -> Vec<PrimitiveKind> {
        counterpart
            .primitives()
            .unwrap()
            .iter()
            .flat_map(SceneObject::primitives)
            .map(|p| p.kind)
            .collect()
    }

    #[test]
    fn open_polygon_rings_are_closed() {
        let (map, id) = map_with(vec![triangle()], Properties::new(), filled());
        let counterpart = convert_layer(&FeatureConverter::default(), &map, id);
        let root = counterpart.primitives().unwrap();
        assert_eq!(root.len(), 1);
        let object = root.iter().next().unwrap();
        let primitives = object.primitives();
        assert_eq!(primitives.len(), 1);
        let GeometryShape::Polygon(polygon) = &primitives[0].instances[0].geometry else {
            panic!("expected a polygon fill");
        };
        assert_eq!(polygon.hierarchy.positions.len(), 4);
        assert_eq!(
            polygon.hierarchy.positions.first(),
            polygon.hierarchy.positions.last()
        );
        assert!(primitives[0].allow_picking);
    }

    #[test]
    fn multipolygon_members_nest_below_one_object() {
        let ring = |x: f64| {
            vec![
                Coordinate::xy(x, 0.0),
                Coordinate::xy(x + 1.0, 0.0),
                Coordinate::xy(x + 1.0, 1.0),
            ]
        };
        let shape = Shape::MultiPolygon(vec![
            vec![ring(0.0)],
            vec![vec![Coordinate::xy(5.0, 5.0)]],
            vec![ring(2.0)],
        ]);
        let (map, id) = map_with(vec![Feature::new(Geometry::new(shape))], Properties::new(), filled());
        let counterpart = convert_layer(&FeatureConverter::default(), &map, id);
        let root = counterpart.primitives().unwrap();
        assert_eq!(root.len(), 1);
        let Some(SceneObject::Collection(members)) = root.iter().next() else {
            panic!("expected one collection per feature");
        };
        assert_eq!(members.len(), 2);
        assert!(members.iter().all(|m| matches!(m, SceneObject::Collection(_))));
        assert_eq!(root.iter().next().unwrap().primitives().len(), 2);
    }

    #[test]
    fn degenerate_rings_produce_nothing() {
        let feature = Feature::new(Geometry::polygon(vec![vec![Coordinate::xy(0.0, 0.0)]]));
        let (map, id) = map_with(vec![feature], Properties::new(), filled());
        let counterpart = convert_layer(&FeatureConverter::default(), &map, id);
        assert!(counterpart.primitives().unwrap().is_empty());
    }

    #[test]
    fn bare_linear_rings_are_rejected() {
        let ring = Shape::LinearRing(vec![Coordinate::xy(0.0, 0.0), Coordinate::xy(1.0, 1.0)]);
        let (map, id) = map_with(vec![Feature::new(Geometry::new(ring))], Properties::new(), filled());
        let mut gate = ImageGate::default();
        let result = FeatureConverter::default().layer_counterpart(
            map.layer(id).unwrap(),
            map.view(),
            map.images(),
            &mut gate,
        );
        assert_eq!(
            result.err(),
            Some(ConvertError::UnsupportedGeometry {
                kind: GeometryKind::LinearRing
            })
        );
    }

    #[test]
    fn conversion_waits_for_the_view() {
        let (mut map, id) = map_with(vec![triangle()], Properties::new(), filled());
        map.set_view(View::default());
        let mut gate = ImageGate::default();
        let result = FeatureConverter::default().layer_counterpart(
            map.layer(id).unwrap(),
            map.view(),
            map.images(),
            &mut gate,
        );
        assert_eq!(result.err(), Some(ConvertError::ViewNotReady));
    }

    #[test]
    fn storeys_become_stacked_slabs() {
        let keys = PropertyKeys::default();
        let feature = triangle().with_properties(
            Properties::new()
                .with(keys.extruded_height(), 9.0)
                .with(keys.storey_height(), 3.0),
        );
        let (map, id) = map_with(vec![feature], Properties::new(), filled());
        let counterpart = convert_layer(&FeatureConverter::default(), &map, id);
        let object = counterpart.primitives().unwrap().iter().next().unwrap();
        let fill = object.primitives()[0];
        let tops: Vec<Option<f64>> = fill
            .instances
            .iter()
            .map(|i| match &i.geometry {
                GeometryShape::Polygon(p) => p.extruded_height,
                _ => None,
            })
            .collect();
        assert_eq!(tops, vec![Some(3.0), Some(6.0), Some(9.0)]);
    }

    #[test]
    fn the_top_storey_is_capped_at_the_extrusion() {
        let keys = PropertyKeys::default();
        let feature = triangle().with_properties(
            Properties::new()
                .with(keys.extruded_height(), 10.0)
                .with(keys.storey_height(), 3.0),
        );
        let (map, id) = map_with(vec![feature], Properties::new(), filled());
        let counterpart = convert_layer(&FeatureConverter::default(), &map, id);
        let object = counterpart.primitives().unwrap().iter().next().unwrap();
        let tops: Vec<Option<f64>> = object.primitives()[0]
            .instances
            .iter()
            .map(|i| match &i.geometry {
                GeometryShape::Polygon(p) => p.extruded_height,
                _ => None,
            })
            .collect();
        assert_eq!(tops, vec![Some(3.0), Some(6.0), Some(9.0), Some(10.0)]);
    }

    #[test]
    fn clamped_outlines_need_ground_polylines() {
        let keys = PropertyKeys::default();
        let props = Properties::new().with(keys.altitude_mode(), "clampToGround");
        let style = filled().with_stroke(Stroke::new([0.0, 0.0, 0.0, 1.0], 2.0));
        let (map, id) = map_with(vec![triangle()], props, style);

        let full = convert_layer(&FeatureConverter::default(), &map, id);
        assert_eq!(
            root_kinds(&full),
            vec![PrimitiveKind::Ground, PrimitiveKind::GroundPolyline]
        );

        let minimal = FeatureConverter::new(keys, HeightPolicy::default(), Capabilities::minimal());
        assert_eq!(root_kinds(&convert_layer(&minimal, &map, id)), vec![PrimitiveKind::Ground]);
    }

    #[test]
    fn multipoints_without_text_only_add_billboards() {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let icon = map.register_image("icon.png", true);
        let style = Style::new().with_image(ImageStyle::new(icon));
        let points = Shape::MultiPoint(vec![Coordinate::xy(1.0, 1.0), Coordinate::xy(2.0, 2.0)]);
        let layer = Layer::vector(VectorSource::with_features(vec![Feature::new(Geometry::new(points))]))
            .with_style(StyleFn::fixed(style));
        let id = map.add_layer(map.root(), layer).unwrap();

        let counterpart = convert_layer(&FeatureConverter::default(), &map, id);
        assert!(counterpart.primitives().unwrap().is_empty());
        assert_eq!(counterpart.context.billboards.len(), 2);
    }

    #[test]
    fn multipoints_with_text_keep_their_labels() {
        let points = Shape::MultiPoint(vec![Coordinate::xy(1.0, 1.0), Coordinate::xy(2.0, 2.0)]);
        let style = Style::new().with_text(TextStyle::new("here"));
        let (map, id) = map_with(vec![Feature::new(Geometry::new(points))], Properties::new(), style);
        let counterpart = convert_layer(&FeatureConverter::default(), &map, id);
        assert_eq!(counterpart.primitives().unwrap().len(), 1);
        assert_eq!(counterpart.context.labels.len(), 2);
    }

    #[test]
    fn extruded_points_get_a_pin_and_an_unclamped_billboard() {
        let keys = PropertyKeys::default();
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let icon = map.register_image("icon.png", true);
        let feature = Feature::new(Geometry::point(Coordinate::xy(5.0, 5.0))).with_properties(
            Properties::new()
                .with(keys.extruded_height(), 20.0)
                .with(keys.altitude_mode(), "clampToGround"),
        );
        let style = Style::new()
            .with_image(ImageStyle::new(icon))
            .with_stroke(Stroke::new([1.0, 0.0, 0.0, 1.0], 1.0));
        let layer = Layer::vector(VectorSource::with_features(vec![feature]))
            .with_style(StyleFn::fixed(style));
        let id = map.add_layer(map.root(), layer).unwrap();

        let counterpart = convert_layer(&FeatureConverter::default(), &map, id);
        assert_eq!(root_kinds(&counterpart), vec![PrimitiveKind::Primitive]);
        let (_, billboard) = counterpart.context.billboards.iter().next().unwrap();
        assert_eq!(billboard.height_reference, HeightReference::None);
    }

    #[test]
    fn only_the_latest_image_request_creates_a_billboard() {
        let mut map = Map::new(View::new(Projection::Epsg4326, 1.0));
        let first = map.register_image("a.png", false);
        let second = map.register_image("b.png", false);
        let point = Feature::new(Geometry::point(Coordinate::xy(1.0, 1.0)));
        let id = map
            .add_layer(map.root(), Layer::vector(VectorSource::with_features(vec![point])))
            .unwrap();
        let layer = map.layer(id).unwrap();
        let feature = layer.feature_source().unwrap().features().next().unwrap();

        let converter = FeatureConverter::default();
        let mut gate = ImageGate::default();
        let mut counterpart = LayerCounterpart::new_primitives(id, Projection::Epsg4326);
        for image in [first, second] {
            let style = Style::new().with_image(ImageStyle::new(image));
            let mut cx = Conversion {
                layer,
                images: map.images(),
                gate: &mut gate,
                context: &mut counterpart.context,
            };
            assert_eq!(converter.convert(&mut cx, feature, &style, None), Ok(None));
        }
        assert_eq!(counterpart.context.pending.len(), 2);

        assert_eq!(counterpart.complete_image(first).created, 0);
        assert_eq!(counterpart.complete_image(second).created, 1);
        let (_, billboard) = counterpart.context.billboards.iter().next().unwrap();
        assert_eq!(billboard.image, Some(second));
        assert_eq!(billboard.id, None);
    }
}
