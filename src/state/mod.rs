pub mod gesture;

pub use gesture::{Gesture, GestureEnd, GestureState};
