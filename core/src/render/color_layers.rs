//! Color Layers

use crate::spectrum::*;
use std::collections::HashMap;

/// Semantic output layers that can be recorded during integration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Emit,
    DiffuseDirect,
    DiffuseIndirect,
    Glossy,
    Transmission,
    Caustics,
    Radiance,
    Shadow,
}

/// Sparse set of enabled layers and their accumulated colors.
#[derive(Clone, Debug, Default)]
pub struct ColorLayers {
    layers: HashMap<LayerKind, Spectrum>,
}

impl ColorLayers {
    /// Returns layers with the given kinds enabled and set to black.
    ///
    /// * `kinds` - Layers to enable.
    pub fn new(kinds: &[LayerKind]) -> Self {
        Self {
            layers: kinds.iter().map(|k| (*k, Spectrum::ZERO)).collect(),
        }
    }

    /// Returns true if the layer is enabled.
    ///
    /// * `kind` - The layer.
    pub fn enabled(&self, kind: LayerKind) -> bool {
        self.layers.contains_key(&kind)
    }

    /// Returns the layer color if enabled.
    ///
    /// * `kind` - The layer.
    pub fn get(&self, kind: LayerKind) -> Option<Spectrum> {
        self.layers.get(&kind).copied()
    }

    /// Adds `color` to an enabled layer when called for a top level ray.
    /// Returns `color`.
    ///
    /// * `kind`      - The layer.
    /// * `color`     - The color.
    /// * `top_level` - True for camera rays.
    pub fn record_add(&mut self, kind: LayerKind, color: Spectrum, top_level: bool) -> Spectrum {
        if top_level {
            if let Some(c) = self.layers.get_mut(&kind) {
                *c += color;
            }
        }
        color
    }

    /// Overwrites an enabled layer with `color` when called for a top level
    /// ray. Returns `color`.
    ///
    /// * `kind`      - The layer.
    /// * `color`     - The color.
    /// * `top_level` - True for camera rays.
    pub fn record_set(&mut self, kind: LayerKind, color: Spectrum, top_level: bool) -> Spectrum {
        if top_level {
            if let Some(c) = self.layers.get_mut(&kind) {
                *c = color;
            }
        }
        color
    }
}

/// Records into an optional layer set. Returns `color` unchanged.
///
/// * `layers`    - Optional layers.
/// * `kind`      - The layer.
/// * `color`     - The color.
/// * `top_level` - True for camera rays.
pub fn record_add(
    layers: &mut Option<&mut ColorLayers>,
    kind: LayerKind,
    color: Spectrum,
    top_level: bool,
) -> Spectrum {
    match layers {
        Some(l) => l.record_add(kind, color, top_level),
        None => color,
    }
}

/// Records into an optional layer set, overwriting. Returns `color` unchanged.
///
/// * `layers`    - Optional layers.
/// * `kind`      - The layer.
/// * `color`     - The color.
/// * `top_level` - True for camera rays.
pub fn record_set(
    layers: &mut Option<&mut ColorLayers>,
    kind: LayerKind,
    color: Spectrum,
    top_level: bool,
) -> Spectrum {
    match layers {
        Some(l) => l.record_set(kind, color, top_level),
        None => color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_layers_pass_color_through() {
        let mut layers = ColorLayers::new(&[LayerKind::Emit]);
        let c = Spectrum::rgb(1.0, 2.0, 3.0);
        assert_eq!(layers.record_add(LayerKind::Caustics, c, true), c);
        assert!(!layers.enabled(LayerKind::Caustics));
        assert_eq!(layers.get(LayerKind::Caustics), None);
    }

    #[test]
    fn only_top_level_is_recorded() {
        let mut layers = ColorLayers::new(&[LayerKind::Emit, LayerKind::Radiance]);
        let c = Spectrum::new(0.5);
        layers.record_add(LayerKind::Emit, c, true);
        layers.record_add(LayerKind::Emit, c, true);
        layers.record_add(LayerKind::Emit, c, false);
        assert_eq!(layers.get(LayerKind::Emit), Some(Spectrum::new(1.0)));

        layers.record_set(LayerKind::Radiance, c, true);
        layers.record_set(LayerKind::Radiance, Spectrum::new(0.25), true);
        assert_eq!(layers.get(LayerKind::Radiance), Some(Spectrum::new(0.25)));
    }

    #[test]
    fn recording_without_layers() {
        let mut none: Option<&mut ColorLayers> = None;
        let c = Spectrum::new(2.0);
        assert_eq!(record_add(&mut none, LayerKind::Emit, c, true), c);
        assert_eq!(record_set(&mut none, LayerKind::Emit, c, true), c);
    }
}
