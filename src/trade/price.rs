//! Sqrt price limits and slippage arithmetic
//!
//! Uniswap V3 pools express prices as Q64.96 square roots. A swap's
//! `sqrtPriceLimitX96` must lie strictly between the protocol's MIN and
//! MAX ratios, on the correct side for the swap direction (token0 -> token1
//! pushes the price down, token1 -> token0 pushes it up).

use alloy::primitives::{Address, U160, U256};

/// Protocol lower bound on sqrtPriceX96 (TickMath.MIN_SQRT_RATIO).
pub const MIN_SQRT_RATIO: U160 = U160::from_limbs([4_295_128_739, 0, 0]);

/// Protocol upper bound on sqrtPriceX96 (TickMath.MAX_SQRT_RATIO).
pub const MAX_SQRT_RATIO: U160 =
    U160::from_limbs([0x5D95_1D52_6398_8D26, 0xEFD1_FC6A_5064_8849, 0xFFFD_8963]);

/// Swap direction: true when `token_in` is the pool's token0, i.e. the
/// lexicographically smaller address.
pub fn is_zero_for_one(token_in: Address, token_out: Address) -> bool {
    token_in < token_out
}

/// Directional price limit at the protocol extreme, nudged one unit
/// inside the bound so the pool accepts it. This effectively disables
/// in-pool price protection; output protection comes from
/// `amountOutMinimum`.
pub fn default_sqrt_price_limit(zero_for_one: bool) -> U160 {
    if zero_for_one {
        MIN_SQRT_RATIO + U160::from(1)
    } else {
        MAX_SQRT_RATIO - U160::from(1)
    }
}

/// Price limit derived from the pool's current sqrt price, offset by the
/// tolerance in the swap direction. The sqrt of a price moves by roughly
/// half the price's relative change, hence `bps / 2`.
pub fn sqrt_price_limit_from_pool(current: U160, zero_for_one: bool, tolerance_bps: u32) -> U160 {
    // Divide first so the intermediate never exceeds 160 bits.
    let delta = current / U160::from(10_000u32) * U160::from(tolerance_bps / 2);
    if zero_for_one {
        let limit = current.saturating_sub(delta);
        limit.max(MIN_SQRT_RATIO + U160::from(1))
    } else {
        let limit = current.saturating_add(delta);
        limit.min(MAX_SQRT_RATIO - U160::from(1))
    }
}

/// Minimum acceptable output after slippage: `amount - amount * bps / 10000`.
/// Tolerances above 100% are capped there, so the result never exceeds
/// the input amount whatever the caller passes.
pub fn minimum_output(amount_out: U256, slippage_bps: u32) -> U256 {
    let bps = slippage_bps.min(10_000);
    amount_out - amount_out * U256::from(bps) / U256::from(10_000u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn direction_follows_address_order() {
        let low = address!("1111111111111111111111111111111111111111");
        let high = address!("2222222222222222222222222222222222222222");
        assert!(is_zero_for_one(low, high));
        assert!(!is_zero_for_one(high, low));
    }

    #[test]
    fn default_limits_strictly_inside_bounds() {
        let down = default_sqrt_price_limit(true);
        let up = default_sqrt_price_limit(false);
        assert!(down > MIN_SQRT_RATIO);
        assert!(up < MAX_SQRT_RATIO);
        assert_ne!(down, up);
    }

    #[test]
    fn pool_limit_moves_with_direction() {
        let current = U160::ONE << 96;
        let down = sqrt_price_limit_from_pool(current, true, 100);
        let up = sqrt_price_limit_from_pool(current, false, 100);
        assert!(down < current);
        assert!(up > current);
        assert_ne!(down, up);
    }

    #[test]
    fn pool_limit_clamps_to_bounds() {
        let near_min = MIN_SQRT_RATIO + U160::from(10);
        let down = sqrt_price_limit_from_pool(near_min, true, 10_000);
        assert!(down > MIN_SQRT_RATIO);

        let near_max = MAX_SQRT_RATIO - U160::from(10);
        let up = sqrt_price_limit_from_pool(near_max, false, 10_000);
        assert!(up < MAX_SQRT_RATIO);
    }

    #[test]
    fn minimum_output_bounds() {
        let amount = U256::from(1_000_000u64);
        assert_eq!(minimum_output(amount, 0), amount);
        assert_eq!(minimum_output(amount, 50), U256::from(995_000u64));
        assert_eq!(minimum_output(amount, 10_000), U256::ZERO);
        assert!(minimum_output(amount, 1) < amount);
    }

    #[test]
    fn minimum_output_caps_excess_tolerance() {
        let amount = U256::from(1000u64);
        assert_eq!(minimum_output(amount, 20_000), U256::ZERO);
        assert_eq!(minimum_output(amount, u32::MAX), U256::ZERO);
        for bps in [0u32, 50, 9_999, 10_001, 60_000] {
            assert!(minimum_output(amount, bps) <= amount);
        }
    }

    #[test]
    fn max_ratio_constant_value() {
        // TickMath.MAX_SQRT_RATIO = 1461446703485210103287273052203988822378723970342
        let expected = "1461446703485210103287273052203988822378723970342";
        assert_eq!(MAX_SQRT_RATIO.to_string(), expected);
        assert_eq!(MIN_SQRT_RATIO.to_string(), "4295128739");
    }
}
