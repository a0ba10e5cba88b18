use crate::config::PinpointConfig;
use crate::grid::discover::discover_grids;
use crate::grid::schema::infer_grid_schema;
use pinpoint_common::protocol::{ElementHandle, GridDescriptor};
use pinpoint_common::tree::DomTree;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PickState {
    #[default]
    Idle,
    Active,
    Picked,
}

/// One grid-pick interaction. A session yields at most one descriptor; call
/// `begin` again to pick another grid.
#[derive(Debug, Default)]
pub struct PickSession {
    state: PickState,
}

impl PickSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the session. Returns false if it was already armed.
    pub fn begin(&mut self) -> bool {
        if self.state == PickState::Active {
            return false;
        }
        self.state = PickState::Active;
        true
    }

    pub fn cancel(&mut self) {
        self.state = PickState::Idle;
    }

    pub fn is_active(&self) -> bool {
        self.state == PickState::Active
    }

    pub fn state(&self) -> PickState {
        self.state
    }

    /// Grids offered while the session is armed.
    pub fn candidates<T: DomTree + ?Sized>(&self, tree: &T) -> Vec<ElementHandle> {
        if self.is_active() {
            discover_grids(tree)
        } else {
            Vec::new()
        }
    }

    pub fn pick<T: DomTree + ?Sized>(
        &mut self,
        tree: &T,
        container: ElementHandle,
        config: &PinpointConfig,
    ) -> Option<GridDescriptor> {
        if !self.is_active() {
            debug!(state = ?self.state, "pick ignored");
            return None;
        }
        self.state = PickState::Picked;
        Some(infer_grid_schema(tree, container, config))
    }
}
