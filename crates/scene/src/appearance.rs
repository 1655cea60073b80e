use foundation::Ecef;

use crate::types::Color;

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Color(Color),
    /// Alternating bands, used for dashed lines.
    Stripe {
        even: Color,
        odd: Color,
        repeat: f64,
        horizontal: bool,
    },
    /// Repeating image anchored at a world position.
    Wallpaper { anchor: Ecef },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Appearance {
    PerInstanceColor { flat: bool, translucent: bool },
    Material { material: Material, flat: bool },
    PolylineMaterial(Material),
}
