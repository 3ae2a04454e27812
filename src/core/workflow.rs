//! Workflow state machine.
//!
//! Holds the client's view of one project's workflow. Every transition is a
//! fresh fetch from the backend; the previous snapshot is replaced wholesale.
//!
//! Loads may overlap. Each load takes the next value of a monotonic sequence
//! number when it starts, and its result is installed only if no newer load
//! has started since (last request wins). Superseded fetches still run to
//! completion; their results are dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

use crate::adapters::ApiGateway;
use crate::domain::{ProjectStatus, StageGateMap};

/// Capacity of the transition log channel
const EVENT_CAPACITY: usize = 256;

/// Current view of the project workflow
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// No project requested yet
    Initial,

    /// A fetch is in flight
    Loading { project_id: String },

    /// Latest authoritative snapshot
    Loaded(Arc<ProjectStatus>),

    /// The latest fetch failed
    Error { project_id: String, message: String },
}

impl WorkflowState {
    /// Project this state refers to
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::Initial => None,
            Self::Loading { project_id } | Self::Error { project_id, .. } => {
                Some(project_id.as_str())
            }
            Self::Loaded(status) => Some(status.project_id()),
        }
    }

    pub fn as_loaded(&self) -> Option<&Arc<ProjectStatus>> {
        match self {
            Self::Loaded(status) => Some(status),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Loading { .. } => "loading",
            Self::Loaded(_) => "loaded",
            Self::Error { .. } => "error",
        }
    }
}

/// Result of a load: the installed state, or `None` when superseded
pub type LoadOutcome = Option<WorkflowState>;

/// One installed transition
#[derive(Debug, Clone)]
pub struct WorkflowEvent {
    /// Sequence number of the load that produced this state
    pub seq: u64,

    /// The state installed
    pub state: WorkflowState,

    /// When it was installed
    pub at: DateTime<Utc>,
}

/// Owns the current workflow state and serializes loads
pub struct WorkflowStateMachine {
    gateway: Arc<dyn ApiGateway>,
    stage_gates: Arc<StageGateMap>,
    /// Current state; all installs happen under this channel's lock
    state: watch::Sender<WorkflowState>,
    /// Latest issued load sequence number
    latest: AtomicU64,
    events: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowStateMachine {
    /// Create a machine in the `Initial` state
    pub fn new(gateway: Arc<dyn ApiGateway>, stage_gates: Arc<StageGateMap>) -> Self {
        let (state, _) = watch::channel(WorkflowState::Initial);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            stage_gates,
            state,
            latest: AtomicU64::new(0),
            events,
        }
    }

    /// Latest installed state
    pub fn current(&self) -> WorkflowState {
        self.state.borrow().clone()
    }

    /// Current state plus change notification
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// Ordered log of installed transitions
    pub fn events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub fn stage_gates(&self) -> &StageGateMap {
        &self.stage_gates
    }

    pub fn gateway(&self) -> &Arc<dyn ApiGateway> {
        &self.gateway
    }

    /// Latest issued load sequence number (0 before any load)
    pub fn latest_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Fetch a project's status and install the outcome.
    ///
    /// Returns the installed state, or `None` when a newer load started
    /// while this one was in flight.
    #[instrument(skip(self))]
    pub async fn request_load(&self, project_id: &str) -> LoadOutcome {
        let seq = self.begin_load(project_id);

        let next = match self.gateway.get_status(project_id).await {
            Ok(status) => {
                status.warn_if_inconsistent(&self.stage_gates);
                info!(
                    seq,
                    stages = status.stages().len(),
                    pending_gate = ?status.pending_gate(),
                    "Project status loaded"
                );
                WorkflowState::Loaded(Arc::new(status))
            }
            Err(e) => {
                warn!(seq, error = %e, "Project status fetch failed");
                WorkflowState::Error {
                    project_id: project_id.to_string(),
                    message: e.to_string(),
                }
            }
        };

        if self.install(seq, next.clone()) {
            Some(next)
        } else {
            debug!(seq, latest = self.latest_seq(), "Discarding superseded load result");
            None
        }
    }

    /// Reload the project of the current state; `None` from `Initial`
    pub async fn refresh(&self) -> LoadOutcome {
        let project_id = self.current().project_id()?.to_string();
        self.request_load(&project_id).await
    }

    /// Issue a new sequence number and enter `Loading`
    fn begin_load(&self, project_id: &str) -> u64 {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *state = WorkflowState::Loading {
                project_id: project_id.to_string(),
            };
            self.publish(seq, state);
        });
        debug!(seq, "Load started");
        seq
    }

    /// Install `next` if `seq` is still the latest load
    fn install(&self, seq: u64, next: WorkflowState) -> bool {
        self.state.send_if_modified(|state| {
            if self.latest.load(Ordering::SeqCst) != seq {
                return false;
            }
            *state = next;
            self.publish(seq, state);
            true
        })
    }

    fn publish(&self, seq: u64, state: &WorkflowState) {
        // Ignore send errors (no subscribers)
        let _ = self.events.send(WorkflowEvent {
            seq,
            state: state.clone(),
            at: Utc::now(),
        });
    }
}
