use crate::types::{SymbolNumber, TransitionTableIndex, Weight};

#[derive(Debug, Clone)]
pub struct SymbolTransition {
    target: Option<TransitionTableIndex>,
    symbol: Option<SymbolNumber>,
    weight: Option<Weight>,
}

impl SymbolTransition {
    pub fn new(
        target: Option<TransitionTableIndex>,
        symbol: Option<SymbolNumber>,
        weight: Option<Weight>,
    ) -> SymbolTransition {
        SymbolTransition {
            target,
            symbol,
            weight,
        }
    }

    #[inline(always)]
    pub fn target(&self) -> Option<TransitionTableIndex> {
        self.target
    }

    #[inline(always)]
    pub fn symbol(&self) -> Option<SymbolNumber> {
        self.symbol
    }

    #[inline(always)]
    pub fn weight(&self) -> Option<Weight> {
        self.weight
    }

    /// Target, output and weight, or `None` for a separator entry.
    #[inline(always)]
    pub fn parts(&self) -> Option<(TransitionTableIndex, SymbolNumber, Weight)> {
        Some((
            self.target?,
            self.symbol.unwrap_or(SymbolNumber::ZERO),
            self.weight.unwrap_or(Weight::ZERO),
        ))
    }
}
