use std::ops::Mul;

use serde::{Deserialize, Serialize};

// ── Newtypes ────────────────────────────────────────────────────────

/// Hit points. Always clamped to [0, max].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Hp(pub f32);

impl Hp {
    pub fn new(v: f32) -> Self {
        debug_assert!(v.is_finite(), "Hp must be finite");
        Self(v.max(0.0))
    }

    pub fn add_clamped(self, delta: f32, max: f32) -> Self {
        let v = (self.0 + delta).clamp(0.0, max);
        debug_assert!(v.is_finite());
        Self(v)
    }

    pub fn sub_clamped(self, delta: f32) -> Self {
        let v = (self.0 - delta).max(0.0);
        debug_assert!(v.is_finite());
        Self(v)
    }

    pub fn is_alive(self) -> bool {
        self.0 > 0.0
    }
}

/// Duration in seconds. Always >= 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(pub f32);

impl Seconds {
    pub fn new(v: f32) -> Self {
        Self(v.max(0.0))
    }

    /// Decrement by dt, clamped to 0.
    pub fn dec(self, dt: f32) -> Self {
        Self((self.0 - dt).max(0.0))
    }

    pub fn is_expired(self) -> bool {
        self.0 <= 0.0
    }
}

/// Fractional damage mitigation. Clamped to [0, MAX] so no combination of
/// sources reaches invulnerability.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct DamageReduction(pub f32);

impl DamageReduction {
    pub const MAX: f32 = 0.95;

    pub fn new(v: f32) -> Self {
        debug_assert!(v.is_finite(), "DamageReduction must be finite");
        Self(v.clamp(0.0, Self::MAX))
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    /// Multiplicative composition of independent sources:
    /// `1 - (1-a)(1-b)`. Commutative, never exceeds MAX, identity at 0.
    pub fn compose(self, other: Self) -> Self {
        Self::new(1.0 - (1.0 - self.0) * (1.0 - other.0))
    }

    /// Fraction of raw damage that gets through.
    pub fn passthrough(self) -> f32 {
        1.0 - self.0
    }
}

/// Multiplier value. Clamped to [0, MAX_MULT].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Multiplier(pub f32);

impl Multiplier {
    pub const MAX: f32 = 10.0;

    pub fn new(v: f32) -> Self {
        debug_assert!(v.is_finite(), "Multiplier must be finite");
        Self(v.clamp(0.0, Self::MAX))
    }

    pub fn one() -> Self {
        Self(1.0)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self(1.0)
    }
}

impl Mul for Multiplier {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.0 * rhs.0)
    }
}

// ── Enums ───────────────────────────────────────────────────────────

/// Permanent class chosen on the first reborn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RebornClass {
    Dps,
    Tank,
}

/// The seven allocatable skills. Fixed shape, one field per skill in
/// `SkillAllocation` — never a keyed map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    Damage,
    BodyDamage,
    Defense,
    MaxHp,
    Regen,
    Speed,
    Mobility,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_is_commutative_and_dominates() {
        let cases = [(0.0, 0.0), (0.3, 0.5), (0.9, 0.9), (0.05, 0.7)];
        for (a, b) in cases {
            let ab = DamageReduction::new(a).compose(DamageReduction::new(b));
            let ba = DamageReduction::new(b).compose(DamageReduction::new(a));
            assert!((ab.0 - ba.0).abs() < 1e-6);
            assert!(ab.0 >= a.max(b) - 1e-6);
        }
    }

    #[test]
    fn compose_with_zero_is_identity() {
        let a = DamageReduction::new(0.42);
        assert!((a.compose(DamageReduction::zero()).0 - 0.42).abs() < 1e-6);
    }

    #[test]
    fn compose_level_and_phase_dr() {
        // 0.3 level DR + 0.5 phase DR = 0.65, not 0.8.
        let dr = DamageReduction::new(0.3).compose(DamageReduction::new(0.5));
        assert!((dr.0 - 0.65).abs() < 1e-6);
    }

    #[test]
    fn compose_never_exceeds_cap() {
        let dr = DamageReduction::new(0.9).compose(DamageReduction::new(0.9));
        assert!(dr.0 <= DamageReduction::MAX);
    }

    #[test]
    fn hp_clamps_at_zero() {
        let hp = Hp::new(10.0).sub_clamped(25.0);
        assert_eq!(hp.0, 0.0);
        assert!(!hp.is_alive());
    }
}
