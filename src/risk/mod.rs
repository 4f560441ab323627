// Risk management module

/// Calculate the notional size of a buy from account equity and the
/// configured risk fraction.
///
/// No minimum-order clamping is applied; a venue-side rejection of a
/// too-small order surfaces as an execution error.
pub fn notional_size(equity: f64, risk_fraction: f64) -> f64 {
    equity * risk_fraction
}
