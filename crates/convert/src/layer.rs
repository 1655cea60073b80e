use foundation::Projection;
use layers::{Feature, ImageRegistry, Layer, StyleFn, View};
use scene::LayerCounterpart;
use tracing::{debug, warn};

use crate::converter::{Conversion, FeatureConverter};
use crate::error::ConvertError;
use crate::image_gate::ImageGate;
use crate::paint::compute_plain_style;

/// Builds and updates the counterpart of one kind of layer.
pub trait LayerConverter {
    /// Converts every feature of `layer` into a fresh counterpart.
    fn layer_counterpart(
        &self,
        layer: &Layer,
        view: &View,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> Result<LayerCounterpart, ConvertError>;

    /// Converts one feature into an existing counterpart. Returns `false`
    /// when the feature is not drawn.
    fn add_feature(
        &self,
        counterpart: &mut LayerCounterpart,
        layer: &Layer,
        feature: &Feature,
        view: &View,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> Result<bool, ConvertError>;
}

/// Projection and resolution of a ready view.
pub fn view_state(view: &View) -> Result<(Projection, f64), ConvertError> {
    match (view.projection, view.resolution) {
        (Some(projection), Some(resolution)) => Ok((projection, resolution)),
        _ => Err(ConvertError::ViewNotReady),
    }
}

impl FeatureConverter {
    #[allow(clippy::too_many_arguments)]
    fn add_styled(
        &self,
        counterpart: &mut LayerCounterpart,
        layer: &Layer,
        feature: &Feature,
        fallback: Option<&StyleFn>,
        resolution: f64,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> Result<bool, ConvertError> {
        let Some(style) = compute_plain_style(feature, fallback, resolution) else {
            warn!(layer = %layer.id(), feature = %feature.id(), "feature has no style, not drawn");
            return Ok(false);
        };
        let mut cx = Conversion {
            layer,
            images,
            gate,
            context: &mut counterpart.context,
        };
        if let Some(object) = self.convert(&mut cx, feature, &style, None)? {
            counterpart.add_feature_object(feature.id(), object);
        }
        Ok(true)
    }
}

impl LayerConverter for FeatureConverter {
    /// Image layers without a vector source get an empty counterpart.
    fn layer_counterpart(
        &self,
        layer: &Layer,
        view: &View,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> Result<LayerCounterpart, ConvertError> {
        let (projection, resolution) = view_state(view)?;
        let mut counterpart = LayerCounterpart::new_primitives(layer.id(), projection);
        let Some(source) = layer.feature_source() else {
            debug!(layer = %layer.id(), "no vector source, empty counterpart");
            return Ok(counterpart);
        };
        let fallback = layer.fallback_style();
        for feature in source.features() {
            self.add_styled(&mut counterpart, layer, feature, fallback, resolution, images, gate)?;
        }
        debug!(
            layer = %layer.id(),
            features = source.len(),
            objects = counterpart.object_count(),
            "converted vector layer"
        );
        Ok(counterpart)
    }

    fn add_feature(
        &self,
        counterpart: &mut LayerCounterpart,
        layer: &Layer,
        feature: &Feature,
        view: &View,
        images: &ImageRegistry,
        gate: &mut ImageGate,
    ) -> Result<bool, ConvertError> {
        let (projection, resolution) = view_state(view)?;
        if layer.feature_source().is_none() {
            return Ok(false);
        }
        counterpart.context.projection = projection;
        self.add_styled(counterpart, layer, feature, layer.fallback_style(), resolution, images, gate)
    }
}
