/// A 256-bit unsigned machine word.
///
/// All stack entries and storage values are `Word`s. Signed opcodes
/// (`SDIV`, `SMOD`, `SLT`, `SGT`, `SAR`) reinterpret the same bit pattern as
/// two's-complement; that reinterpretation is the VM's concern
/// (`evmcore_vm::arithmetic`), not this type's.
pub type Word = alloy_primitives::U256;
