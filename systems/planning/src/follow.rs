use snake_autopilot_core::{PlanError, PlanMeta, PlanResult};
use snake_autopilot_world::GameState;

use crate::{cycle_position, PlanOptions, Strategy};

/// Follows the Hamiltonian cycle without ever leaving it.
///
/// The body always occupies a contiguous arc of the cycle, so this strategy
/// survives until the board is full.
#[derive(Clone, Copy, Debug, Default)]
pub struct HamiltonianFollow;

impl HamiltonianFollow {
    /// Registry name.
    pub const NAME: &'static str = "hamiltonian";
}

impl Strategy for HamiltonianFollow {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn plan(&mut self, state: &GameState, _options: &PlanOptions) -> Result<PlanResult, PlanError> {
        follow_plan(state, PlanMeta::for_strategy(Self::NAME), "following cycle")
    }
}

/// Cycle-follow move annotated with the cycle path to the fruit.
pub(crate) fn follow_plan(
    state: &GameState,
    meta: PlanMeta,
    reason: &str,
) -> Result<PlanResult, PlanError> {
    let cycle = state.cycle();
    let head = state.head();
    let position = cycle_position(state, head, meta.strategy)?;
    let next = cycle.cell_at(position + 1);
    let path = state
        .fruit()
        .map(|fruit| cycle.path(head, fruit))
        .unwrap_or_default();

    Ok(PlanResult::new(next, reason, meta).with_path(path))
}
