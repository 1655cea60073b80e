use std::path::PathBuf;

use clap::Parser;
use foundation::{Ecef, Extent, ImageId, Projection};
use layers::{
    ClusterSource, Coordinate, Feature, Fill, Geometry, ImageStyle, Layer, Map, MapError,
    Properties, Stroke, Style, StyleFn, TextStyle, TileGrid, TileSource, TileWmsSource,
    VectorSource, View,
};
use scene::{Scene, ScreenProjector};
use serde_json::json;
use sync::{RasterSynchronizer, SyncConfig, VectorSynchronizer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Mirror a sample 2D layer tree into a 3D scene")]
struct Args {
    /// JSON configuration file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a JSON summary of the resulting scene
    #[arg(long)]
    json: bool,

    /// Map resolution used for style evaluation
    #[arg(long, default_value_t = 0.01)]
    resolution: f64,
}

/// Flattens positions onto a plane, one pixel per 10 km.
struct FlatProjector;

impl ScreenProjector for FlatProjector {
    fn to_screen(&self, position: Ecef) -> Option<[f64; 2]> {
        Some([position.y / 10_000.0, position.z / 10_000.0])
    }
}

/// Sample tree plus the icon that is still loading.
fn sample_map(config: &SyncConfig, resolution: f64) -> Result<(Map, ImageId), MapError> {
    let keys = config.property_keys();
    let mut map = Map::new(View::new(Projection::Epsg4326, resolution));
    let pin = map.register_image("pin.png", true);
    let bubble = map.register_image("bubble.png", false);

    let buildings = VectorSource::with_features(vec![
        Feature::new(Geometry::polygon(vec![vec![
            Coordinate::xy(6.14, 46.20),
            Coordinate::xy(6.15, 46.20),
            Coordinate::xy(6.15, 46.21),
            Coordinate::xy(6.14, 46.21),
        ]]))
        .with_id("hall")
        .with_properties(Properties::new().with(keys.extruded_height(), 24.0)),
        Feature::new(Geometry::line_string(vec![
            Coordinate::xy(6.10, 46.19),
            Coordinate::xy(6.20, 46.22),
        ]))
        .with_id("tram"),
    ]);
    let building_style = StyleFn::fixed(
        Style::new()
            .with_fill(Fill::solid([0.8, 0.4, 0.1, 0.9]))
            .with_stroke(Stroke::new([0.2, 0.2, 0.2, 1.0], 2.0)),
    );
    let places = VectorSource::with_features(vec![
        Feature::new(Geometry::point(Coordinate::xy(6.143, 46.204))).with_id("station"),
        Feature::new(Geometry::point(Coordinate::xy(6.149, 46.201))).with_id("lake"),
        Feature::new(Geometry::point(Coordinate::xy(6.146, 46.199))).with_id("bridge"),
    ]);
    let place_style = StyleFn::new(move |feature: &Feature, _| {
        let text = match feature.members.len() {
            0 => feature.stable_id.clone().unwrap_or_default(),
            n => n.to_string(),
        };
        let image = if feature.members.is_empty() { pin } else { bubble };
        vec![Style::new().with_image(ImageStyle::new(image)).with_text(TextStyle::new(text))]
    });

    let grid = TileGrid::new([-180.0, -90.0], vec![0.703125, 0.3515625, 0.17578125], [256, 256]);
    let wms = TileWmsSource::new("https://maps.example/wms", "relief").with_tile_grid(grid);

    let root = map.root();
    let city = map.add_layer(root, Layer::group().with_z_index(1))?;
    map.add_layer(city, Layer::vector(buildings).with_style(building_style))?;
    map.add_layer(
        city,
        Layer::cluster(ClusterSource::new(40.0, places))
            .with_style(place_style)
            .with_properties(Properties::new().with(keys.altitude_mode(), "relativeToGround")),
    )?;
    map.add_layer(
        root,
        Layer::tile(TileSource::Wms(wms))
            .with_opacity(0.7)
            .with_extent(Extent::from_array([5.9, 45.8, 10.5, 47.8])),
    )?;
    map.add_layer(
        root,
        Layer::tile(TileSource::Xyz {
            url: "https://tiles.example/{z}/{x}/{y}.png".to_string(),
        }),
    )?;
    Ok((map, bubble))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    config.validate()?;

    let (mut map, bubble) = sample_map(&config, args.resolution)?;
    let mut scene = Scene::new(config.capabilities());
    let mut vectors: VectorSynchronizer = config.vector_synchronizer();
    let mut rasters: RasterSynchronizer = config.raster_synchronizer();

    vectors.synchronize(&map, &mut scene)?;
    rasters.synchronize(&map, &mut scene)?;
    map.drain_events();
    info!(
        counterparts = scene.counterparts.len(),
        imagery = scene.imagery_layers.len(),
        "initial synchronization done"
    );

    // Late icon load followed by a clustering pass.
    map.image_loaded(bubble);
    let events = map.drain_events();
    vectors.process_events(&map, &mut scene, &events)?;
    rasters.process_events(&map, &mut scene, &events)?;
    let clustered = vectors.recluster(&map, &mut scene, &FlatProjector);
    info!(clustered, "clustering pass done");

    if args.json {
        let counterparts: Vec<_> = scene
            .counterparts
            .iter()
            .map(|(id, c)| {
                json!({
                    "id": id.0,
                    "layer": c.layer().get(),
                    "show": c.show(),
                    "objects": c.object_count(),
                    "clusters": c.data_source().map(|ds| ds.clusters.len()),
                })
            })
            .collect();
        let imagery: Vec<_> = scene
            .imagery_layers
            .ids()
            .into_iter()
            .filter_map(|id| scene.imagery_layers.get(id))
            .map(|l| {
                json!({
                    "url": l.provider.url,
                    "layers": l.provider.layers,
                    "alpha": l.alpha,
                    "show": l.show,
                    "minimum_level": l.provider.minimum_level,
                    "maximum_level": l.provider.maximum_level,
                })
            })
            .collect();
        let summary = json!({
            "counterparts": counterparts,
            "imagery_layers": imagery,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for (id, c) in scene.counterparts.iter() {
            info!(id = id.0, layer = %c.layer(), objects = c.object_count(), "counterpart");
        }
    }
    Ok(())
}
