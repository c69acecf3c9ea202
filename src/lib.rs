//! Turns a stream of hand-tracking frames into camera or object transforms:
//! orbit rotation, zoom (or uniform scale) and pan. Feed frames to
//! [`controls::Controls::update`] once per tick.

pub mod actions;
pub mod config;
pub mod controls;
pub mod frame;
pub mod gestures;
pub mod mapping;
pub mod session;
pub mod target;
pub mod tracker;

pub use config::{Action, CountSpec, GestureConfig, Profile, Variant};
pub use controls::Controls;
pub use frame::{Frame, Hand, Pointable};
