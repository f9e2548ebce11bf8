//! # Tick Context
//!
//! Everything a system may read besides the world: the frame number, the
//! player count, the session seed and the orchestrator's input buffer. The
//! context is built fresh for every frame and passed by reference; there is
//! no ambient state.

use bytemuck::{Pod, Zeroable};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::world::Cell;

/// Button bit: retarget the player's units to [`PlayerInput::target`].
pub const BUTTON_RETARGET: u32 = 1;

/// One player's input for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PlayerInput {
    /// Cursor cell.
    pub target: Cell,
    /// Pressed button bits.
    pub buttons: u32,
}

impl PlayerInput {
    /// Checks if every bit of `button` is pressed.
    #[inline]
    #[must_use]
    pub const fn pressed(&self, button: u32) -> bool {
        self.buttons & button == button
    }
}

/// Read-only view of the orchestrator's input buffer for the current frame.
pub trait InputSource {
    /// Returns the input of `player`; absent players read as default input.
    fn player_input(&self, player: u8) -> PlayerInput;
}

/// Input source with no pressed buttons for any player.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn player_input(&self, _player: u8) -> PlayerInput {
        PlayerInput::default()
    }
}

impl InputSource for Vec<PlayerInput> {
    fn player_input(&self, player: u8) -> PlayerInput {
        self.get(usize::from(player)).copied().unwrap_or_default()
    }
}

impl<const N: usize> InputSource for [PlayerInput; N] {
    fn player_input(&self, player: u8) -> PlayerInput {
        self.get(usize::from(player)).copied().unwrap_or_default()
    }
}

/// Per-frame inputs handed to every system.
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    /// Frame being simulated.
    pub frame: u64,
    /// Number of players in the session.
    pub player_count: u8,
    /// Session seed shared by every replica.
    pub session_seed: u64,
    /// Input buffer for this frame.
    pub inputs: &'a dyn InputSource,
}

impl std::fmt::Debug for TickContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickContext")
            .field("frame", &self.frame)
            .field("player_count", &self.player_count)
            .field("session_seed", &self.session_seed)
            .finish_non_exhaustive()
    }
}

impl TickContext<'_> {
    /// Derives an RNG for one purpose on this frame.
    ///
    /// The stream depends only on `(session_seed, frame, purpose)`, so no
    /// RNG state ever needs to be stored or rolled back.
    #[must_use]
    pub fn rng(&self, purpose: u64) -> ChaCha8Rng {
        let mut seed = [0u8; 32];
        seed[..8].copy_from_slice(&self.session_seed.to_le_bytes());
        seed[8..16].copy_from_slice(&self.frame.to_le_bytes());
        seed[16..24].copy_from_slice(&purpose.to_le_bytes());
        ChaCha8Rng::from_seed(seed)
    }
}
