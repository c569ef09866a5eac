//! Contracts for the opaque 3D globe engine.
//!
//! The engine itself (terrain decoding, tile streaming, building meshes) is
//! a third-party runtime consumed through the two traits here. Construction
//! is asynchronous and staged; everything after construction is synchronous
//! calls on the returned [`ViewerHandle`].

use std::fmt;

use crate::camera::CameraFlight;
use crate::config::EngineConfig;

/// Errors surfaced by an engine collaborator, tagged by the provisioning
/// stage that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Terrain provider acquisition failed (network, asset access).
    Terrain(String),
    /// Viewer construction against the host surface failed (GPU context).
    Viewer(String),
    /// Buildings overlay layer acquisition failed.
    Buildings(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terrain(msg) => write!(f, "terrain provider: {msg}"),
            Self::Viewer(msg) => write!(f, "viewer construction: {msg}"),
            Self::Buildings(msg) => write!(f, "buildings layer: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Chrome widgets the engine's stock viewer can embed around the globe
/// canvas. The site viewer is embedded in a marketing page, so everything
/// defaults to off and hosts opt individual widgets back in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewerPreferences {
    /// Playback timeline strip below the canvas.
    pub timeline: bool,
    /// Clock/animation dial widget.
    pub animation_widget: bool,
    /// Imagery base-layer picker button.
    pub base_layer_picker: bool,
    /// Location search box.
    pub geocoder: bool,
    /// Home-view button.
    pub home_button: bool,
    /// 2D/3D/Columbus scene mode switcher.
    pub scene_mode_picker: bool,
    /// Navigation help overlay toggle.
    pub navigation_help: bool,
}

/// A constructed viewer: the engine instance bound to one host surface.
///
/// Exclusively owned by the lifecycle controller once installed. `destroy`
/// releases GPU and network resources; after it returns, every other method
/// except [`ViewerHandle::is_destroyed`] is off limits (the controller's
/// phase machine enforces this, the trait does not).
pub trait ViewerHandle {
    /// Overlay layer type produced by the paired engine.
    type Buildings;

    /// Attach the buildings overlay produced during provisioning.
    fn attach_buildings(&mut self, layer: Self::Buildings);

    /// Animate the camera to the given flight destination. Fire-and-forget;
    /// completion of the animation is not an ordering dependency.
    fn fly_to(&mut self, flight: &CameraFlight);

    /// Release GPU and network resources. Must be called at most once.
    fn destroy(&mut self);

    /// Whether `destroy` has already run.
    fn is_destroyed(&self) -> bool;
}

/// The globe engine runtime, consumed as an async factory.
///
/// The three creation calls are opaque and independently fallible; the
/// controller sequences them (terrain, then viewer, then buildings) and is
/// the only ordering authority between them. None of the calls are
/// cancellable — late results are made harmless by the controller's
/// generation stamp rather than aborted.
#[allow(async_fn_in_trait)] // single-threaded cooperative hosts only
pub trait RenderEngine {
    /// Host surface the viewer renders into.
    type Node;
    /// Opaque terrain provider passed into viewer construction.
    type Terrain;
    /// Opaque buildings overlay layer.
    type Buildings;
    /// Constructed viewer bound to a host surface.
    type Handle: ViewerHandle<Buildings = Self::Buildings>;

    /// Acquire a terrain provider using the access credential in `config`.
    async fn create_terrain_provider(
        &self,
        config: &EngineConfig,
    ) -> Result<Self::Terrain, EngineError>;

    /// Construct a viewer against `node` with the given terrain and chrome
    /// preferences.
    async fn create_viewer(
        &self,
        node: Self::Node,
        terrain: Self::Terrain,
        preferences: &ViewerPreferences,
    ) -> Result<Self::Handle, EngineError>;

    /// Acquire the buildings overlay layer referenced by `config`.
    async fn create_buildings_layer(
        &self,
        config: &EngineConfig,
    ) -> Result<Self::Buildings, EngineError>;
}
