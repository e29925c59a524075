/// A named protocol upgrade, ordered by activation.
///
/// `Hardfork` implements `Ord` so `fork >= Hardfork::Istanbul` reads as "at
/// or after Istanbul rules" the way the gas schedule and Executive want to
/// gate behaviour — the same `SpecId`-ordered gating `revm` uses, adapted
/// to the block-activated forks §6's `params` enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Hardfork {
    Frontier,
    Homestead,
    /// EIP-150, "Tangerine Whistle": the 63/64 sub-call gas cap and
    /// increased IO-heavy opcode costs.
    Eip150,
    /// EIP-158, "Spurious Dragon": empty-account sweep and the EXP/EXTCODE
    /// cost bump that shipped alongside it.
    Eip158,
    Byzantium,
    Constantinople,
    /// "Petersburg": re-disables EIP-1283's net SSTORE metering pending
    /// Istanbul's reentrancy-safe EIP-2200 replacement.
    ConstantinopleFix,
    /// EIP-2200 net-metered SSTORE, SELFBALANCE, CHAINID.
    Istanbul,
    /// EIP-3529: refund quotient cut from 1/2 to 1/5, SELFDESTRUCT refund
    /// removed.
    London,
}

impl Hardfork {
    pub const ALL: [Hardfork; 9] = [
        Hardfork::Frontier,
        Hardfork::Homestead,
        Hardfork::Eip150,
        Hardfork::Eip158,
        Hardfork::Byzantium,
        Hardfork::Constantinople,
        Hardfork::ConstantinopleFix,
        Hardfork::Istanbul,
        Hardfork::London,
    ];

    pub fn is_at_least(self, other: Hardfork) -> bool {
        self >= other
    }
}
