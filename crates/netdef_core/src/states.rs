//! Netmode logic states and their visibility per remote role.
//!
//! Each state group is a role label ("Server", "Client", ...) with two
//! fixed-width vectors matching the host's 30 logic states, laid out as two
//! rows of three columns of five slots. Slot indices are opaque.

use crate::types::NetworkRole;
use serde::{Deserialize, Serialize};

/// Number of logic states the host exposes.
pub const STATE_COUNT: usize = 30;

const COLUMNS: usize = 3;
const SLOTS_PER_COLUMN: usize = 5;
const ROW_WIDTH: usize = COLUMNS * SLOTS_PER_COLUMN;

pub const SERVER_GROUP: &str = "Server";
pub const CLIENT_GROUP: &str = "Client";

/// Whether a set state will be realized for a given remote role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateVisibility {
    Enabled,
    /// The role can never realize this state.
    SuppressedByRole,
    /// Reachable, but forwarded from the server rather than driven locally.
    SuppressedBySimulation,
    NotSet,
}

/// A named bundle of logic states for one network role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetmodeStateGroup {
    pub name: String,
    pub states: [bool; STATE_COUNT],
    /// Only meaningful for the client group.
    #[serde(default = "empty_states")]
    pub simulated_states: [bool; STATE_COUNT],
}

fn empty_states() -> [bool; STATE_COUNT] {
    [false; STATE_COUNT]
}

impl NetmodeStateGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: empty_states(),
            simulated_states: empty_states(),
        }
    }

    pub fn with_state(mut self, index: usize) -> Self {
        if index < STATE_COUNT {
            self.states[index] = true;
        }
        self
    }

    pub fn is_client(&self) -> bool {
        self.name.eq_ignore_ascii_case(CLIENT_GROUP)
    }

    /// Visibility of slot `index`, reading the simulated flag from this
    /// group. Out-of-range indices are never set.
    pub fn visibility(&self, role: NetworkRole, index: usize) -> StateVisibility {
        if index >= STATE_COUNT {
            return StateVisibility::NotSet;
        }

        effective_visibility(role, self, index, self.simulated_states[index])
    }

    /// Visibility of every slot, in index order.
    pub fn visibility_map(&self, role: NetworkRole) -> Vec<StateVisibility> {
        (0..STATE_COUNT).map(|index| self.visibility(role, index)).collect()
    }

    /// Copies the host's visible-state mask into `states`.
    pub fn set_states_from_visible(&mut self, visible: &[bool]) {
        copy_mask(&mut self.states, visible);
    }

    /// Copies the host's visible-state mask into `simulated_states`.
    pub fn set_simulated_from_visible(&mut self, visible: &[bool]) {
        copy_mask(&mut self.simulated_states, visible);
    }
}

fn copy_mask(target: &mut [bool; STATE_COUNT], visible: &[bool]) {
    for (index, slot) in target.iter_mut().enumerate() {
        *slot = visible.get(index).copied().unwrap_or(false);
    }
}

/// Whether the state at `index` of `group` is realized for `role`.
///
/// Advisory only: the stored vectors are persisted as they are, whatever
/// this reports. Role suppression applies to the client group alone.
pub fn effective_visibility(
    role: NetworkRole,
    group: &NetmodeStateGroup,
    index: usize,
    is_simulated: bool,
) -> StateVisibility {
    if !group.states.get(index).copied().unwrap_or(false) {
        return StateVisibility::NotSet;
    }

    if !group.is_client() {
        return StateVisibility::Enabled;
    }

    if role.has_no_states() {
        return StateVisibility::SuppressedByRole;
    }

    match role {
        NetworkRole::SimulatedProxy if !is_simulated => StateVisibility::SuppressedByRole,
        NetworkRole::AutonomousProxy if !is_simulated => StateVisibility::SuppressedBySimulation,
        _ => StateVisibility::Enabled,
    }
}

/// `(row, column, slot)` of a state index in the 2 x 3 x 5 layout. The top
/// row holds indices 0-14, the bottom row 15-29.
pub fn grid_position(index: usize) -> Option<(usize, usize, usize)> {
    if index >= STATE_COUNT {
        return None;
    }

    let row = index / ROW_WIDTH;
    let within = index % ROW_WIDTH;
    Some((row, within / SLOTS_PER_COLUMN, within % SLOTS_PER_COLUMN))
}

/// Adds the "Server" and "Client" groups if missing. New server groups start
/// with slot 1 set, new client groups with slot 0.
pub fn ensure_default_groups(groups: &mut Vec<NetmodeStateGroup>) {
    let has = |groups: &[NetmodeStateGroup], name: &str| {
        groups.iter().any(|g| g.name.eq_ignore_ascii_case(name))
    };

    if !has(groups, SERVER_GROUP) {
        groups.push(NetmodeStateGroup::new(SERVER_GROUP).with_state(1));
    }

    if !has(groups, CLIENT_GROUP) {
        groups.push(NetmodeStateGroup::new(CLIENT_GROUP).with_state(0));
    }
}
