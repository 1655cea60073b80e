use foundation::LayerId;
use layers::Map;

/// Layers in the order the 2D renderer paints them, bottom first.
///
/// The tree is walked depth-first with children in declared order, then
/// stably sorted by z-index so equal indices keep their walk order.
pub fn paint_order(map: &Map) -> Vec<LayerId> {
    let mut layers: Vec<(LayerId, i32)> = map
        .preorder(map.root())
        .into_iter()
        .filter_map(|id| map.layer(id).map(|l| (id, l.z_index)))
        .collect();
    layers.sort_by_key(|(_, z)| *z);
    layers.into_iter().map(|(id, _)| id).collect()
}
