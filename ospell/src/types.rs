use std::{
    cmp::Ordering,
    fmt::Display,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};

/// Operator of a flag diacritic such as `@P.CASE.NOM@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagDiacriticOperator {
    PositiveSet,
    NegativeSet,
    Require,
    Disallow,
    Clear,
    Unification,
}

impl std::str::FromStr for FlagDiacriticOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" => Ok(FlagDiacriticOperator::PositiveSet),
            "N" => Ok(FlagDiacriticOperator::NegativeSet),
            "R" => Ok(FlagDiacriticOperator::Require),
            "D" => Ok(FlagDiacriticOperator::Disallow),
            "C" => Ok(FlagDiacriticOperator::Clear),
            "U" => Ok(FlagDiacriticOperator::Unification),
            _ => Err(()),
        }
    }
}

/// Boolean properties stored in the optimized-lookup header, in file order.
#[derive(Debug, Clone, Copy)]
pub enum HeaderFlag {
    Weighted,
    Deterministic,
    InputDeterministic,
    Minimized,
    Cyclic,
    HasEpsilonEpsilonTransitions,
    HasInputEpsilonTransitions,
    HasInputEpsilonCycles,
    HasUnweightedInputEpsilonCycles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDiacriticOperation {
    pub operation: FlagDiacriticOperator,
    pub feature: SymbolNumber,
    pub value: ValueNumber,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SymbolNumber(pub u16);

impl SymbolNumber {
    /// The epsilon symbol, always the first entry of an alphabet.
    pub const ZERO: Self = SymbolNumber(0);
    pub(crate) const MAX: Self = SymbolNumber(u16::MAX);

    #[inline(always)]
    pub(crate) fn incr(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl Display for SymbolNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ValueNumber(pub i16);

impl ValueNumber {
    pub const ZERO: Self = ValueNumber(0);

    #[inline(always)]
    pub(crate) fn invert(&self) -> Self {
        ValueNumber(-self.0)
    }

    #[inline(always)]
    pub(crate) fn incr(&self) -> Self {
        ValueNumber(self.0 + 1)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
#[serde(transparent)]
pub struct InputIndex(pub u32);

impl InputIndex {
    pub(crate) const ZERO: Self = InputIndex(0);

    #[inline(always)]
    pub(crate) fn incr(&self, val: u32) -> Self {
        Self(self.0 + val)
    }

    #[inline(always)]
    pub(crate) fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
#[serde(transparent)]
pub struct TransitionTableIndex(pub u32);

impl Display for TransitionTableIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for TransitionTableIndex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        TransitionTableIndex(self.0 + rhs.0)
    }
}

impl Sub for TransitionTableIndex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        TransitionTableIndex(self.0 - rhs.0)
    }
}

impl TransitionTableIndex {
    /// The start state of every transducer.
    pub const ZERO: Self = TransitionTableIndex(0);
    pub(crate) const ONE: Self = TransitionTableIndex(1);

    #[inline(always)]
    pub(crate) fn incr(&self) -> Self {
        Self(self.0 + 1)
    }

    #[inline(always)]
    pub(crate) fn offset(&self, symbol: SymbolNumber) -> Self {
        Self(self.0 + u32::from(symbol.0))
    }
}

/// A tropical weight: costs add up along a path and smaller is better.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, PartialOrd)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Weight(pub f32);

impl Weight {
    pub const ZERO: Self = Weight(0.0);
    pub const MAX: Self = Weight(f32::MAX);
    pub const INFINITE: Self = Weight(f32::INFINITY);

    /// Total order used by the priority queues; NaN never reaches them since
    /// weights are validated at load.
    #[inline(always)]
    pub fn total_cmp(&self, other: &Weight) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }

    #[inline(always)]
    pub fn min(self, other: Weight) -> Weight {
        if other < self {
            other
        } else {
            self
        }
    }

    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        !self.0.is_nan() && self.0 >= 0.0
    }
}

impl Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Weight {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Weight(self.0 + rhs.0)
    }
}

impl Sub for Weight {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Weight(self.0 - rhs.0)
    }
}

pub type FlagDiacriticState = Vec<ValueNumber>;
pub type OperationsMap = hashbrown::HashMap<SymbolNumber, FlagDiacriticOperation>;
