//! The viewer lifecycle state machine.
//!
//! One [`ViewerLifecycleController`] exists per mounted globe viewer. It is
//! the only owner of the engine handle and the only ordering authority over
//! the engine's async construction. The machine is
//! `Uninitialized → Initializing → Ready → Destroyed`, with `Destroyed`
//! reachable from anywhere; a detached controller may open a fresh mount
//! period with a new generation, which is what makes a remount the retry
//! path after a failed construction.
//!
//! All controller state lives on one cooperative thread; the only hazard is
//! an async construction resolving after newer events have happened. That is
//! handled by stamping every construction with the mount generation and
//! destroying late arrivals on receipt instead of installing them. Nothing
//! is ever cancelled mid-flight — the engine's calls are not cancellable —
//! the late result is simply made harmless.

use crate::camera::{CameraFlight, CameraTarget};
use crate::config::EngineConfig;
use crate::engine::{RenderEngine, ViewerHandle, ViewerPreferences};
use crate::error::GlobeViewError;

/// Where a controller is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No host surface has ever attached.
    Uninitialized,
    /// Engine construction is in flight, or failed and is awaiting remount.
    Initializing,
    /// A live handle is installed and accepting camera commands.
    Ready,
    /// The handle (if any) has been torn down for this mount period.
    Destroyed,
}

/// A claim ticket for one engine construction, minted by
/// [`ViewerLifecycleController::attach`].
///
/// Carries the host surface to build against and the generation stamp the
/// eventual [`InitOutcome`] is checked against.
#[derive(Debug)]
pub struct InitRequest<N> {
    node: N,
    generation: u64,
}

impl<N> InitRequest<N> {
    /// The mount generation this construction belongs to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// The resolution of one engine construction, fed back to
/// [`ViewerLifecycleController::complete_init`].
#[derive(Debug)]
pub struct InitOutcome<H> {
    result: Result<H, GlobeViewError>,
    generation: u64,
}

impl<H> InitOutcome<H> {
    /// The mount generation this construction belonged to.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

/// Run the staged engine construction for one [`InitRequest`].
///
/// Stages: terrain provider, viewer against the host surface, buildings
/// overlay. Any stage's failure is captured into the outcome — nothing
/// escapes past the controller boundary. The host drives this future to
/// completion (blocking or spawned) and hands the outcome back to
/// [`ViewerLifecycleController::complete_init`]; the initial camera fly-to
/// happens there, not here, so the latest requested target wins.
pub async fn provision<E: RenderEngine>(
    engine: &E,
    config: &EngineConfig,
    preferences: &ViewerPreferences,
    request: InitRequest<E::Node>,
) -> InitOutcome<E::Handle> {
    let InitRequest { node, generation } = request;
    let result = build_viewer(engine, config, preferences, node).await;
    InitOutcome { result, generation }
}

async fn build_viewer<E: RenderEngine>(
    engine: &E,
    config: &EngineConfig,
    preferences: &ViewerPreferences,
    node: E::Node,
) -> Result<E::Handle, GlobeViewError> {
    config.validate()?;
    let terrain = engine.create_terrain_provider(config).await?;
    log::debug!("terrain provider ready (asset {})", config.terrain_asset);
    let mut handle = engine.create_viewer(node, terrain, preferences).await?;
    log::debug!("viewer constructed");
    let buildings = engine.create_buildings_layer(config).await?;
    handle.attach_buildings(buildings);
    log::debug!("buildings layer attached (asset {})", config.buildings_asset);
    Ok(handle)
}

/// The per-mount lifecycle state machine for one embedded globe viewer.
///
/// Owns the engine handle exclusively for its entire `Ready` lifetime and is
/// the only caller of `destroy()` on it. Event handlers are synchronous; the
/// async work lives in [`provision`], which the host interleaves with the
/// other events however its runtime dictates.
#[derive(Debug)]
pub struct ViewerLifecycleController<H: ViewerHandle> {
    phase: Phase,
    handle: Option<H>,
    pending_target: CameraTarget,
    generation: u64,
}

impl<H: ViewerHandle> ViewerLifecycleController<H> {
    /// A fresh controller aimed at the mount-time location props.
    #[must_use]
    pub const fn new(initial_target: CameraTarget) -> Self {
        Self {
            phase: Phase::Uninitialized,
            handle: None,
            pending_target: initial_target,
            generation: 0,
        }
    }

    /// A host surface became available.
    ///
    /// Returns a construction ticket when the controller actually starts a
    /// new mount period (from `Uninitialized` or `Destroyed`); duplicate
    /// attach notifications during `Initializing`/`Ready` are logged no-ops,
    /// so at most one construction is ever in flight per period.
    pub fn attach<N>(&mut self, node: N) -> Option<InitRequest<N>> {
        match self.phase {
            Phase::Uninitialized | Phase::Destroyed => {
                self.generation += 1;
                self.phase = Phase::Initializing;
                log::info!(
                    "host surface attached, starting generation {}",
                    self.generation
                );
                Some(InitRequest {
                    node,
                    generation: self.generation,
                })
            }
            Phase::Initializing | Phase::Ready => {
                log::debug!(
                    "duplicate attach ignored in phase {:?}",
                    self.phase
                );
                None
            }
        }
    }

    /// An engine construction resolved.
    ///
    /// A successful handle from a stale generation — the surface detached,
    /// or detached and reattached, while construction was in flight — is
    /// destroyed on the spot and never installed. A current success installs
    /// the handle, moves to `Ready`, and issues the initial fly-to against
    /// the target pending *now* (not the one pending at attach time). A
    /// current failure is logged and leaves the phase `Initializing`: the
    /// page stays up, and only a remount retries.
    pub fn complete_init(&mut self, outcome: InitOutcome<H>) {
        let InitOutcome { result, generation } = outcome;
        let stale =
            generation != self.generation || self.phase != Phase::Initializing;
        match result {
            Ok(mut handle) => {
                if stale {
                    log::debug!(
                        "discarding stale viewer from generation {generation} \
                         (current {}, phase {:?})",
                        self.generation,
                        self.phase
                    );
                    destroy_once(&mut handle);
                    return;
                }
                handle.fly_to(&CameraFlight::over(&self.pending_target));
                self.handle = Some(handle);
                self.phase = Phase::Ready;
                log::info!(
                    "viewer ready over '{}'",
                    self.pending_target.label
                );
            }
            Err(e) => {
                if stale {
                    log::debug!(
                        "stale construction failure from generation \
                         {generation} ignored: {e}"
                    );
                    return;
                }
                // Phase stays Initializing until a detach/remount.
                log::error!("viewer construction failed: {e}");
            }
        }
    }

    /// The location props changed.
    ///
    /// The pending target is always recorded, whatever the phase. When
    /// `Ready`, the camera retargets immediately; otherwise the update is
    /// latent and the eventual initial fly-to consumes it, so bursts of
    /// updates before readiness collapse to the latest one.
    pub fn set_target(&mut self, target: CameraTarget) {
        self.pending_target = target;
        if self.phase != Phase::Ready {
            log::debug!(
                "camera target '{}' deferred in phase {:?}",
                self.pending_target.label,
                self.phase
            );
            return;
        }
        if let Some(handle) = self.handle.as_mut() {
            if !handle.is_destroyed() {
                handle.fly_to(&CameraFlight::over(&self.pending_target));
            }
        }
    }

    /// The host surface went away (detach or unmount).
    ///
    /// Bumps the generation so any in-flight construction resolves stale,
    /// destroys the installed handle exactly once, and closes the mount
    /// period. A later [`ViewerLifecycleController::attach`] opens a new
    /// one.
    pub fn detach(&mut self) {
        self.generation += 1;
        if let Some(mut handle) = self.handle.take() {
            destroy_once(&mut handle);
            log::info!("viewer destroyed on detach");
        }
        if self.phase != Phase::Uninitialized {
            self.phase = Phase::Destroyed;
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a live handle is installed and accepting camera commands.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// The most recently requested camera target.
    #[must_use]
    pub const fn pending_target(&self) -> &CameraTarget {
        &self.pending_target
    }

    /// The current mount generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl<H: ViewerHandle> Drop for ViewerLifecycleController<H> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            destroy_once(&mut handle);
            log::debug!("viewer destroyed on controller drop");
        }
    }
}

/// Tear a handle down, tolerating (but flagging in debug builds) a handle
/// that was already destroyed behind the controller's back.
fn destroy_once<H: ViewerHandle>(handle: &mut H) {
    debug_assert!(
        !handle.is_destroyed(),
        "viewer handle reached teardown already destroyed"
    );
    if !handle.is_destroyed() {
        handle.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;
    use crate::engine::EngineError;

    /// Shared recorder for everything the mock engine and handles do.
    #[derive(Default)]
    struct EngineLog {
        constructions: Cell<u32>,
        destroys: Cell<u32>,
        flights: RefCell<Vec<CameraFlight>>,
    }

    struct MockHandle {
        log: Rc<EngineLog>,
        destroyed: bool,
        buildings_attached: bool,
    }

    impl ViewerHandle for MockHandle {
        type Buildings = ();

        fn attach_buildings(&mut self, (): ()) {
            self.buildings_attached = true;
        }

        fn fly_to(&mut self, flight: &CameraFlight) {
            assert!(!self.destroyed, "fly_to on destroyed handle");
            self.log.flights.borrow_mut().push(*flight);
        }

        fn destroy(&mut self) {
            assert!(!self.destroyed, "double destroy");
            self.destroyed = true;
            self.log.destroys.set(self.log.destroys.get() + 1);
        }

        fn is_destroyed(&self) -> bool {
            self.destroyed
        }
    }

    struct MockEngine {
        log: Rc<EngineLog>,
        fail_terrain: bool,
    }

    impl MockEngine {
        fn new(log: &Rc<EngineLog>) -> Self {
            Self {
                log: Rc::clone(log),
                fail_terrain: false,
            }
        }
    }

    impl RenderEngine for MockEngine {
        type Node = ();
        type Terrain = ();
        type Buildings = ();
        type Handle = MockHandle;

        async fn create_terrain_provider(
            &self,
            _config: &EngineConfig,
        ) -> Result<(), EngineError> {
            if self.fail_terrain {
                Err(EngineError::Terrain("simulated network failure".into()))
            } else {
                Ok(())
            }
        }

        async fn create_viewer(
            &self,
            (): (),
            (): (),
            _preferences: &ViewerPreferences,
        ) -> Result<MockHandle, EngineError> {
            self.log.constructions.set(self.log.constructions.get() + 1);
            Ok(MockHandle {
                log: Rc::clone(&self.log),
                destroyed: false,
                buildings_attached: false,
            })
        }

        async fn create_buildings_layer(
            &self,
            _config: &EngineConfig,
        ) -> Result<(), EngineError> {
            Ok(())
        }
    }

    fn config() -> EngineConfig {
        EngineConfig {
            access_token: "tok-test".to_owned(),
            ..EngineConfig::default()
        }
    }

    fn run_provision(
        engine: &MockEngine,
        request: InitRequest<()>,
    ) -> InitOutcome<MockHandle> {
        pollster::block_on(provision(
            engine,
            &config(),
            &ViewerPreferences::default(),
            request,
        ))
    }

    fn newark() -> CameraTarget {
        CameraTarget::new(40.0, -74.0, "Newark site")
    }

    #[test]
    fn mount_flies_once_to_initial_target() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        assert_eq!(ctrl.phase(), Phase::Initializing);

        ctrl.complete_init(run_provision(&engine, request));

        assert!(ctrl.is_ready());
        let flights = log.flights.borrow();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].longitude, -74.0);
        assert_eq!(flights[0].latitude, 40.0);
    }

    #[test]
    fn duplicate_attach_is_a_no_op() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        // Second notification while construction is in flight
        assert!(ctrl.attach(()).is_none());

        ctrl.complete_init(run_provision(&engine, request));
        // And again once ready
        assert!(ctrl.attach(()).is_none());

        assert_eq!(log.constructions.get(), 1);
    }

    #[test]
    fn unmount_before_resolution_destroys_the_orphan() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        ctrl.detach();
        assert_eq!(ctrl.phase(), Phase::Destroyed);

        // The in-flight construction resolves after the unmount.
        ctrl.complete_init(run_provision(&engine, request));

        assert_eq!(ctrl.phase(), Phase::Destroyed);
        assert_eq!(log.destroys.get(), 1);
        assert!(log.flights.borrow().is_empty());
    }

    #[test]
    fn detach_then_reattach_discards_the_prior_handle() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let first = ctrl.attach(()).unwrap();
        ctrl.detach();
        let second = ctrl.attach(()).unwrap();
        assert_ne!(first.generation(), second.generation());

        // First construction resolves late: destroyed, never installed.
        ctrl.complete_init(run_provision(&engine, first));
        assert_eq!(ctrl.phase(), Phase::Initializing);
        assert_eq!(log.destroys.get(), 1);

        // Second construction installs normally.
        ctrl.complete_init(run_provision(&engine, second));
        assert!(ctrl.is_ready());
        assert_eq!(log.destroys.get(), 1);
        assert_eq!(log.flights.borrow().len(), 1);
    }

    #[test]
    fn latest_pre_ready_target_wins() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        ctrl.set_target(CameraTarget::new(48.9, 2.3, "Paris site"));
        ctrl.set_target(CameraTarget::new(51.5, -0.1, "London site"));

        ctrl.complete_init(run_provision(&engine, request));

        let flights = log.flights.borrow();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].longitude, -0.1);
        assert_eq!(flights[0].latitude, 51.5);
    }

    #[test]
    fn ready_retarget_flies_without_reconstruction() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        ctrl.complete_init(run_provision(&engine, request));

        ctrl.set_target(CameraTarget::new(51.5, -0.1, "London site"));

        assert_eq!(log.constructions.get(), 1);
        assert_eq!(log.destroys.get(), 0);
        let flights = log.flights.borrow();
        assert_eq!(flights.len(), 2);
        assert_eq!(flights[1].longitude, -0.1);
        assert_eq!(flights[1].latitude, 51.5);
    }

    #[test]
    fn construction_failure_stalls_without_escaping() {
        let log = Rc::new(EngineLog::default());
        let mut engine = MockEngine::new(&log);
        engine.fail_terrain = true;
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        ctrl.complete_init(run_provision(&engine, request));

        // Stalled, not crashed: no handle, no retry, page stays up.
        assert_eq!(ctrl.phase(), Phase::Initializing);
        assert!(!ctrl.is_ready());
        assert_eq!(log.constructions.get(), 0);
        assert!(log.flights.borrow().is_empty());

        // Remount is the retry path.
        ctrl.detach();
        engine.fail_terrain = false;
        let retry = ctrl.attach(()).unwrap();
        ctrl.complete_init(run_provision(&engine, retry));
        assert!(ctrl.is_ready());
    }

    #[test]
    fn missing_token_fails_provisioning() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        let outcome = pollster::block_on(provision(
            &engine,
            &EngineConfig::default(),
            &ViewerPreferences::default(),
            request,
        ));
        ctrl.complete_init(outcome);

        assert_eq!(ctrl.phase(), Phase::Initializing);
        assert_eq!(log.constructions.get(), 0);
    }

    #[test]
    fn detach_destroys_exactly_once() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        ctrl.complete_init(run_provision(&engine, request));

        ctrl.detach();
        ctrl.detach();
        drop(ctrl);

        assert_eq!(log.destroys.get(), 1);
    }

    #[test]
    fn drop_tears_down_a_ready_viewer() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        ctrl.complete_init(run_provision(&engine, request));
        assert!(ctrl.is_ready());

        drop(ctrl);
        assert_eq!(log.destroys.get(), 1);
    }

    #[test]
    fn duplicate_resolution_keeps_the_installed_handle() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        let generation = request.generation();
        ctrl.complete_init(run_provision(&engine, request));
        assert!(ctrl.is_ready());

        // A spurious second resolution for the same generation must not
        // displace the installed handle.
        let spurious = pollster::block_on(provision(
            &engine,
            &config(),
            &ViewerPreferences::default(),
            InitRequest { node: (), generation },
        ));
        ctrl.complete_init(spurious);

        assert!(ctrl.is_ready());
        assert_eq!(log.destroys.get(), 1);
        assert_eq!(log.flights.borrow().len(), 1);

        ctrl.detach();
        assert_eq!(log.destroys.get(), 2);
    }

    #[test]
    fn targets_recorded_while_detached_survive_remount() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        ctrl.set_target(CameraTarget::new(35.7, 139.7, "Tokyo site"));
        assert_eq!(ctrl.pending_target().label, "Tokyo site");

        let request = ctrl.attach(()).unwrap();
        ctrl.complete_init(run_provision(&engine, request));

        let flights = log.flights.borrow();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].latitude, 35.7);
        assert_eq!(flights[0].longitude, 139.7);
    }

    #[test]
    fn provision_attaches_buildings_before_install() {
        let log = Rc::new(EngineLog::default());
        let engine = MockEngine::new(&log);
        let mut ctrl = ViewerLifecycleController::new(newark());

        let request = ctrl.attach(()).unwrap();
        let outcome = run_provision(&engine, request);
        assert!(matches!(&outcome.result, Ok(h) if h.buildings_attached));
        ctrl.complete_init(outcome);
        assert!(ctrl.is_ready());
    }
}
