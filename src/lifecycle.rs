//! Subsystem lifecycle.
//!
//! A subsystem moves through
//! `Uninitialized -> Initialized -> Started <-> Stopped -> Shutdown`.
//! `initialize` and `start` may fail; `stop` and `shutdown` are cleanup paths
//! and cannot. An `initialize` failure parks the subsystem in
//! [`LifecycleState::Unavailable`] for good.
//!
//! The host validates every requested transition *before* calling into the
//! provider, so a provider never sees an out-of-order call.

use serde::{Deserialize, Serialize};

use crate::error::{Result, XrError};
use crate::handle::SubsystemHandle;
use crate::manager::ReregistrationPolicy;
use crate::provider::InputProvider;
use crate::topology::DeviceNotifier;

/// Where a subsystem is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    Started,
    Stopped,
    Shutdown,
    /// `initialize` failed; the subsystem is never started or polled.
    Unavailable,
}

/// A lifecycle call the host can make.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleOp {
    Initialize,
    Start,
    Stop,
    Shutdown,
}

impl LifecycleState {
    /// State reached if `op` succeeds, or [`XrError::InvalidTransition`].
    pub fn after(self, op: LifecycleOp) -> Result<LifecycleState> {
        use LifecycleOp as Op;
        use LifecycleState as S;
        match (self, op) {
            (S::Uninitialized, Op::Initialize) => Ok(S::Initialized),
            (S::Initialized | S::Stopped, Op::Start) => Ok(S::Started),
            (S::Started, Op::Stop) => Ok(S::Stopped),
            (S::Initialized | S::Stopped, Op::Shutdown) => Ok(S::Shutdown),
            (state, op) => Err(XrError::InvalidTransition { op, state }),
        }
    }

    /// Only started subsystems are polled.
    #[inline]
    pub fn is_running(self) -> bool {
        self == LifecycleState::Started
    }
}

/// Plugin-side lifecycle callbacks.
///
/// The provider value itself is the plugin's context; it is handed back on
/// every call as `&mut self`.
pub trait LifecycleProvider: Send {
    /// Acquire resources. Typically registers an input provider.
    fn initialize(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()>;

    /// Begin producing input.
    fn start(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<()>;

    /// Pause. Errors must be absorbed and logged by the provider.
    fn stop(&mut self, ctx: &mut SubsystemContext<'_>);

    /// Release everything acquired in `initialize`. Always the last call.
    fn shutdown(&mut self, ctx: &mut SubsystemContext<'_>);
}

/// What a lifecycle callback can see and do on its subsystem.
pub struct SubsystemContext<'a> {
    pub(crate) handle: SubsystemHandle,
    pub(crate) plugin_name: &'a str,
    pub(crate) subsystem_id: &'a str,
    pub(crate) notifier: &'a DeviceNotifier,
    pub(crate) policy: ReregistrationPolicy,
    pub(crate) input: &'a mut Option<Box<dyn InputProvider>>,
}

impl<'a> SubsystemContext<'a> {
    pub fn handle(&self) -> SubsystemHandle {
        self.handle
    }

    pub fn plugin_name(&self) -> &str {
        self.plugin_name
    }

    pub fn subsystem_id(&self) -> &str {
        self.subsystem_id
    }

    /// Notifier for device topology changes; clone it into detection threads.
    pub fn notifier(&self) -> &DeviceNotifier {
        self.notifier
    }

    pub fn reregistration_policy(&self) -> ReregistrationPolicy {
        self.policy
    }

    pub fn has_input_provider(&self) -> bool {
        self.input.is_some()
    }

    /// Bind an input provider to this subsystem.
    ///
    /// A second registration follows the host's [`ReregistrationPolicy`].
    pub fn register_input_provider(&mut self, provider: Box<dyn InputProvider>) -> Result<()> {
        if self.input.is_some() {
            match self.policy {
                ReregistrationPolicy::Reject => {
                    tracing::warn!(subsystem = %self.handle, "input provider re-registration rejected");
                    return Err(XrError::ProviderAlreadyRegistered(self.handle));
                }
                ReregistrationPolicy::Replace => {
                    tracing::info!(subsystem = %self.handle, "input provider replaced");
                }
            }
        } else {
            tracing::debug!(subsystem = %self.handle, "input provider registered");
        }
        *self.input = Some(provider);
        Ok(())
    }
}
