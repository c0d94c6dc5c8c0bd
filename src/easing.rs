/// Progress-shaping functions for movement segments.
/// All take progress in [0,1] and return the eased fraction in [0,1],
/// except `jump_arc` which returns the arc height factor.

pub fn linear(progress: f32) -> f32 {
    progress.clamp(0.0, 1.0)
}

/// Classic smooth-step: eases in and out over the whole segment.
pub fn smooth_step(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    p * p * (3.0 - 2.0 * p)
}

/// N discrete foot-falls, each smoothed: the actor advances in `steps`
/// visible increments instead of gliding.
pub fn stepped(progress: f32, steps: u32) -> f32 {
    let steps = steps.max(1);
    let p = progress.clamp(0.0, 1.0);
    let scaled = p * steps as f32;
    let index = scaled.floor().min(steps as f32 - 1.0);
    let fraction = scaled - index;
    (index + smooth_step(fraction)) / steps as f32
}

/// Vertical component of stair climbing: within each step the rise happens
/// in the first half, then holds. Paired with a linear planar component
/// this reads as climbing discrete steps rather than a ramp.
pub fn stair_vertical(progress: f32, steps: u32) -> f32 {
    let steps = steps.max(1);
    let p = progress.clamp(0.0, 1.0);
    let scaled = p * steps as f32;
    let index = scaled.floor().min(steps as f32 - 1.0);
    let fraction = scaled - index;
    let rise = smooth_step((fraction * 2.0).min(1.0));
    (index + rise) / steps as f32
}

/// Parabolic jump arc height factor: 0 at both ends, 1 at the apex.
pub fn jump_arc(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    4.0 * p * (1.0 - p)
}
