//! Gas accounting for oracle script runs.
//!
//! Guest compute is metered with Wasmtime fuel, one unit per instruction.
//! Gas is the caller-facing unit; one fuel unit is worth [`GAS_PER_FUEL`]
//! gas. Host calls are charged in gas and converted to fuel before they are
//! deducted from the store.

// ── Conversion ──

/// Gas represented by a single unit of Wasmtime fuel.
pub const GAS_PER_FUEL: u64 = 1_000_000;

// ── Host call costs ──

/// Base cost of every host call.
pub const G_HOST_CALL: u64 = 100 * GAS_PER_FUEL;

/// Cost per byte moved across the host/guest boundary.
pub const G_PER_BYTE: u64 = GAS_PER_FUEL;

/// Extra cost of recording an external data request.
pub const G_ASK_EXTERNAL_DATA: u64 = 1_000 * GAS_PER_FUEL;

/// Gas cost of moving `byte_count` bytes across the boundary.
pub fn gas_cost_bytes(byte_count: usize) -> u64 {
    (byte_count as u64).saturating_mul(G_PER_BYTE)
}

/// Gas cost of a host call that moves `byte_count` bytes.
pub fn gas_cost_host_call(byte_count: usize) -> u64 {
    G_HOST_CALL.saturating_add(gas_cost_bytes(byte_count))
}

/// Gas cost of `ask_external_data` with `calldata_len` bytes of calldata.
pub fn gas_cost_ask_external_data(calldata_len: usize) -> u64 {
    gas_cost_host_call(calldata_len).saturating_add(G_ASK_EXTERNAL_DATA)
}

/// Fuel available for a gas limit. Partial fuel units are not granted.
pub fn gas_to_fuel(gas: u64) -> u64 {
    gas / GAS_PER_FUEL
}

/// Fuel needed to pay `gas`. Partial fuel units are charged in full.
pub fn gas_to_fuel_ceil(gas: u64) -> u64 {
    gas.div_ceil(GAS_PER_FUEL)
}

/// Gas represented by `fuel` units.
pub fn fuel_to_gas(fuel: u64) -> u64 {
    fuel.saturating_mul(GAS_PER_FUEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_to_fuel_floors() {
        assert_eq!(gas_to_fuel(0), 0);
        assert_eq!(gas_to_fuel(GAS_PER_FUEL - 1), 0);
        assert_eq!(gas_to_fuel(GAS_PER_FUEL), 1);
        assert_eq!(gas_to_fuel(250_000_000_000), 250_000);
    }

    #[test]
    fn test_gas_to_fuel_ceil() {
        assert_eq!(gas_to_fuel_ceil(0), 0);
        assert_eq!(gas_to_fuel_ceil(1), 1);
        assert_eq!(gas_to_fuel_ceil(GAS_PER_FUEL), 1);
        assert_eq!(gas_to_fuel_ceil(GAS_PER_FUEL + 1), 2);
    }

    #[test]
    fn test_fuel_to_gas_saturates() {
        assert_eq!(fuel_to_gas(3), 3 * GAS_PER_FUEL);
        assert_eq!(fuel_to_gas(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_host_call_costs() {
        assert_eq!(gas_cost_host_call(0), G_HOST_CALL);
        assert_eq!(gas_cost_host_call(4), G_HOST_CALL + 4 * G_PER_BYTE);
        assert_eq!(
            gas_cost_ask_external_data(4),
            G_HOST_CALL + 4 * G_PER_BYTE + G_ASK_EXTERNAL_DATA
        );
        assert_eq!(gas_cost_host_call(usize::MAX), u64::MAX);
    }

    #[test]
    fn test_costs_are_whole_fuel_units() {
        for cost in [G_HOST_CALL, G_PER_BYTE, G_ASK_EXTERNAL_DATA] {
            assert_eq!(cost % GAS_PER_FUEL, 0);
        }
    }
}
