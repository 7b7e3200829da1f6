//! The shared OpenGL context for shader invocations.
//!
//! [`GpuContext`] wraps the host application's rendering context in a glium
//! context and hands it out one invocation at a time through
//! [`GpuContext::with_context`]. Initialization happens once per process and
//! fails softly: with no usable GPU every later acquisition reports
//! [`Error::ContextUnavailable`] instead of crashing the host.
//!
//! ### Warning
//!
//! This module makes assumptions about the OpenGL context inside the host:
//! the context must be current on the thread that initializes and runs
//! invocations, and nothing else may issue GL calls while an acquisition is
//! active.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use glium::CapabilitiesSource;
use layershader_core::{Error, Result};
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

mod gl_backend;

use gl_backend::RawGlBackend;

/// The glium context plus everything derived from it at startup.
struct GlState {
    ctx: Rc<glium::backend::Context>,
    backend: Rc<RawGlBackend>,
    version: String,
    compute_supported: bool,
}

impl GlState {
    fn create() -> std::result::Result<GlState, String> {
        let backend = Rc::new(RawGlBackend::new());

        if !gl::GetString::is_loaded() {
            return Err("OpenGL function pointers could not be loaded".into());
        }
        // Probe for a current context before handing the backend to glium;
        // glium's constructor assumes one exists.
        if unsafe { gl::GetString(gl::VERSION).is_null() } {
            return Err("no OpenGL context is current on the initializing thread".into());
        }

        let ctx = unsafe {
            glium::backend::Context::new(
                backend.clone(),
                false,
                glium::debug::DebugCallbackBehavior::Ignore,
            )
        }
        .map_err(|e| format!("could not wrap the host OpenGL context: {e}"))?;

        debug!(
            "VALID GLSL VERSIONS: {:?}",
            ctx.get_capabilities().supported_glsl_versions
        );

        let version = ctx.get_opengl_version_string().to_string();
        let gl_version = *ctx.get_opengl_version();
        let compute_supported = matches!(
            gl_version,
            glium::Version(glium::Api::Gl, major, minor) if (major, minor) >= (4, 3)
        );

        Ok(GlState {
            ctx,
            backend,
            version,
            compute_supported,
        })
    }
}

enum ContextSlot {
    Ready(GlState),
    Missing(String),
}

struct Shared {
    slot: Mutex<ContextSlot>,
}

// SAFETY: the glium context is thread-confined GL state. It is only touched
// through the surrounding mutex, and the host guarantees its GL context is
// current on the thread that runs invocations (the same contract the
// original plugin host provides).
unsafe impl Send for ContextSlot {}

static SHARED: OnceCell<Arc<Shared>> = OnceCell::new();

/// Handle to the process-wide rendering context.
///
/// Cloning the handle is cheap; every clone refers to the same underlying
/// context state, so the one-exclusive-holder rule holds across all of them.
#[derive(Clone)]
pub struct GpuContext {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext").finish()
    }
}

impl GpuContext {
    /// Initialize (once) and return a handle to the shared context.
    ///
    /// The first call attempts to wrap whatever GL context is current on the
    /// calling thread. Failure is soft: the handle is still returned, and
    /// every [`with_context`](Self::with_context) call reports
    /// [`Error::ContextUnavailable`] with the recorded reason.
    pub fn initialize() -> GpuContext {
        let shared = SHARED
            .get_or_init(|| {
                let slot = match GlState::create() {
                    Ok(state) => {
                        info!(
                            version = %state.version,
                            compute = state.compute_supported,
                            "GPU context initialized"
                        );
                        ContextSlot::Ready(state)
                    }
                    Err(reason) => {
                        warn!(%reason, "GPU context unavailable; shader runs will fail softly");
                        ContextSlot::Missing(reason)
                    }
                };
                Arc::new(Shared {
                    slot: Mutex::new(slot),
                })
            })
            .clone();

        GpuContext { shared }
    }

    /// Whether a usable context was found at startup.
    pub fn is_available(&self) -> bool {
        let guard = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        matches!(&*guard, ContextSlot::Ready(_))
    }

    /// Run `f` with exclusive access to the rendering context.
    ///
    /// Acquisitions are serialized: a second concurrent call blocks until
    /// the first completes. The context is released on every exit path —
    /// including a panic inside `f`, which unwinds through the guard without
    /// wedging later invocations.
    pub fn with_context<T>(&self, f: impl FnOnce(&GlSession<'_>) -> Result<T>) -> Result<T> {
        // A panicked invocation poisons the lock but leaves the context
        // itself intact, so recover the slot rather than failing forever.
        let guard = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match &*guard {
            ContextSlot::Ready(state) => f(&GlSession { state }),
            ContextSlot::Missing(reason) => Err(Error::ContextUnavailable(reason.clone())),
        }
    }
}

/// One exclusive acquisition of the rendering context.
///
/// Only exists inside [`GpuContext::with_context`]; holding it proves no
/// other invocation is touching the GPU.
pub struct GlSession<'a> {
    state: &'a GlState,
}

impl GlSession<'_> {
    /// The glium context, for resource creation and draws.
    pub fn facade(&self) -> &Rc<glium::backend::Context> {
        &self.state.ctx
    }

    /// Whether compute dispatch is available (requires OpenGL 4.3).
    pub fn supports_compute(&self) -> bool {
        self.state.compute_supported
    }

    /// The driver's version string, for diagnostics.
    pub fn version_string(&self) -> &str {
        &self.state.version
    }

    /// Re-synchronize glium with the raw GL state before GPU work.
    ///
    /// Must be called on the thread where the host's GL context is current.
    /// Raw `gl::*` calls made between glium operations leave glium's state
    /// cache stale; rebuilding at the start of each invocation resets it.
    pub fn activate(&self) -> Result<()> {
        unsafe { self.state.ctx.rebuild(self.state.backend.clone()) }.map_err(|e| {
            Error::ContextUnavailable(format!("could not reactivate the OpenGL context: {e}"))
        })
    }
}
