//! Discrete exponential moving average on integers.

/// One smoothing step: `(current * (factor - 1) + target) / factor`.
///
/// The division rounds toward `target`, so each step moves at least one unit and the
/// value settles exactly on `target` without overshooting it. Plain truncation would
/// stall up to `factor` units below a rising target.
pub fn ema_step(current: u16, target: u16, factor: u16) -> u16 {
    if factor <= 1 || current == target {
        return target;
    }

    let factor = u32::from(factor);
    let weighted = u32::from(current) * (factor - 1) + u32::from(target);

    let next = if target > current {
        weighted.div_ceil(factor)
    } else {
        weighted / factor
    };

    next as u16
}
