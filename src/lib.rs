// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Unused / redundant code
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Lifecycle controller for an embedded 3D globe site viewer.
//!
//! The heavyweight globe engine (terrain streaming, building meshes, GPU
//! surface) is an opaque asynchronous collaborator. What this crate owns is
//! the part that is easy to get wrong: constructing that engine at most once
//! per mount of the host surface, retargeting the camera when the site
//! location changes without reconstructing anything, and tearing the engine
//! down exactly once — even when construction is still in flight at the
//! moment the surface disappears.
//!
//! # Key entry points
//!
//! - [`controller::ViewerLifecycleController`] - the mount/teardown state
//!   machine
//! - [`controller::provision`] - the staged async engine construction
//!   sequence
//! - [`engine::RenderEngine`] / [`engine::ViewerHandle`] - the contracts the
//!   globe engine is consumed through
//! - [`config::EngineConfig`] - engine access credential and asset ids,
//!   injected explicitly instead of living in process-wide state
//!
//! # Lifecycle
//!
//! A controller moves `Uninitialized → Initializing → Ready → Destroyed`.
//! Stale construction results (the host surface detached, or detached and
//! reattached, while the engine was still coming up) are recognized by a
//! mount-generation stamp and destroyed on arrival instead of installed; in-
//! flight construction is never aborted, only ignored.

pub mod camera;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
