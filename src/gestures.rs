use glam::Vec3;

use crate::config::GestureConfig;
use crate::frame::{Frame, Hand};

/// True iff the frame's hand and finger counts both match the action's shape.
pub fn is_active(frame: &Frame, cfg: &GestureConfig) -> bool {
    cfg.hands.matches(frame.hand_count()) && cfg.fingers.matches(frame.finger_count())
}

/// Resolve the single hand that supplies the control signal.
///
/// Two hands are ordered by palm x; the larger x is the "right" hand.
/// Zero hands, or more than two, resolve to nothing.
pub fn select_hand<'a>(frame: &'a Frame, cfg: &GestureConfig) -> Option<&'a Hand> {
    match frame.hands.as_slice() {
        [only] => Some(only),
        [a, b] => {
            let (left, right) = if a.palm_position.x < b.palm_position.x {
                (a, b)
            } else {
                (b, a)
            };
            Some(if cfg.prefer_right_hand { right } else { left })
        }
        _ => None,
    }
}

/// Extract the control point for an action.
///
/// Fingertip mode reads `frame.pointables[0]` whichever hand it belongs to.
pub fn sample_position(frame: &Frame, hand: &Hand, cfg: &GestureConfig) -> Option<Vec3> {
    if cfg.use_hand_position {
        return Some(if cfg.use_stabilized {
            hand.stabilized_palm()
        } else {
            hand.palm_position
        });
    }
    let tip = frame.pointables.first()?;
    Some(if cfg.use_stabilized {
        tip.stabilized_tip()
    } else {
        tip.tip_position
    })
}

/// Classifier, selector and sampler in one pass. `None` means "inactive this tick".
pub fn control_point(frame: &Frame, cfg: &GestureConfig) -> Option<Vec3> {
    if !cfg.enabled || !is_active(frame, cfg) {
        return None;
    }
    let hand = select_hand(frame, cfg)?;
    sample_position(frame, hand, cfg)
}
