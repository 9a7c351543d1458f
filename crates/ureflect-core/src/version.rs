//! Version context: the facts every versioned read is gated on.
//!
//! A package carries a monotonic format version, a licensee sub-version and a
//! discrete game tag naming the shipped title or fork it came from. Game tags
//! are encoded so that the high bits name the engine family; comparing two
//! codes numerically is how "this game or any later one" checks are written.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Mask selecting the engine-family bits of a game code.
pub const ENGINE_MASK: u32 = 0xFFF_0000;

/// Discrete game tag identifying an engine release or a game-specific fork.
///
/// Discriminants are stable codes; forks sit directly above the engine
/// family they derive from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum Game {
    Ue1 = 0x010_0000,
    Ue2 = 0x020_0000,
    Ut2 = 0x020_0001,
    Ue3 = 0x080_0000,
    Bioshock3 = 0x080_0001,
    Borderlands = 0x080_0002,
    Transformers = 0x080_0003,
    LostPlanet3 = 0x080_0004,
    Tna = 0x080_0005,
    A51 = 0x080_0006,
    Tera = 0x080_0007,
    Batman2 = 0x080_0008,
    Batman3 = 0x080_0009,
    Batman4 = 0x080_000A,
    Midway3 = 0x081_0000,
    Mk = 0x081_0001,
    Ue4Base = 0x100_0000,
}

impl Game {
    /// Raw game code.
    #[inline]
    pub fn code(self) -> u32 {
        self.into()
    }

    /// Engine-family part of the game code.
    #[inline]
    pub fn engine_code(self) -> u32 {
        self.code() & ENGINE_MASK
    }

    /// Look up a game tag by its raw code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::try_from(code).ok()
    }
}

/// The triple selecting which binary layout rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionContext {
    /// Monotonic package format version.
    pub version: i32,
    /// Licensee sub-version.
    pub licensee_version: i32,
    /// Game tag.
    pub game: Game,
}

impl VersionContext {
    pub const fn new(version: i32, licensee_version: i32, game: Game) -> Self {
        Self {
            version,
            licensee_version,
            game,
        }
    }

    /// `true` when this is exactly `game`.
    #[inline]
    pub fn is(&self, game: Game) -> bool {
        self.game == game
    }

    /// Game code comparison: this game or any later code.
    #[inline]
    pub fn game_at_least(&self, game: Game) -> bool {
        self.game.code() >= game.code()
    }

    /// Game code comparison: strictly earlier code.
    #[inline]
    pub fn game_below(&self, game: Game) -> bool {
        self.game.code() < game.code()
    }

    /// Inclusive game code range check.
    #[inline]
    pub fn game_between(&self, first: Game, last: Game) -> bool {
        self.game_at_least(first) && self.game.code() <= last.code()
    }

    /// Coarse engine-family comparison.
    #[inline]
    pub fn engine_at_least(&self, family: Game) -> bool {
        self.game.engine_code() >= family.code()
    }

    /// Pre-UE3 families store references, counts and string lengths as
    /// compact indices.
    #[inline]
    pub fn uses_compact_indices(&self) -> bool {
        !self.engine_at_least(Game::Ue3)
    }
}

impl fmt::Display for VersionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} (version {}, licensee {})",
            self.game, self.version, self.licensee_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_family_of_forks() {
        assert_eq!(Game::Borderlands.engine_code(), Game::Ue3.code());
        assert_eq!(Game::Mk.engine_code(), Game::Midway3.code());
        assert_eq!(Game::Ut2.engine_code(), Game::Ue2.code());
    }

    #[test]
    fn midway_counts_as_ue3_family() {
        let ctx = VersionContext::new(472, 0, Game::Mk);
        assert!(ctx.engine_at_least(Game::Ue3));
        assert!(ctx.game_at_least(Game::Ue3));
        assert!(!ctx.uses_compact_indices());
    }

    #[test]
    fn batman_range() {
        let ctx = VersionContext::new(805, 101, Game::Batman3);
        assert!(ctx.game_between(Game::Batman2, Game::Batman4));
        let other = VersionContext::new(805, 101, Game::Tera);
        assert!(!other.game_between(Game::Batman2, Game::Batman4));
    }

    #[test]
    fn game_code_round_trip() {
        assert_eq!(Game::from_code(0x080_0002), Some(Game::Borderlands));
        assert_eq!(Game::from_code(0x1234), None);
    }

    #[test]
    fn display() {
        let ctx = VersionContext::new(700, 3, Game::Ue3);
        assert_eq!(ctx.to_string(), "Ue3 (version 700, licensee 3)");
    }
}
