mod planes;
mod plasma;
mod starfield;

pub use planes::Planes;
pub use plasma::Plasma;
pub use starfield::Starfield;
pub use temporal_test::TemporalTest;

use crate::dither::Screen;
use crate::timeline::FrameContext;

/// Trait for all demo effects
pub trait Effect {
    /// Effect name for UI/debugging
    fn name(&self) -> &str;

    /// Draw one frame into `screen.frame`, either directly or by filling an
    /// intensity buffer and presenting it. Returns a small debug value
    /// (mode, object count) shown by the host.
    fn update(&mut self, frame: &FrameContext, screen: &mut Screen) -> i32;

    /// Back to the initial state, called when the effect is (re)entered
    fn reset(&mut self) {}
}

/// Every effect, in timeline index order
pub fn all() -> Vec<Box<dyn Effect>> {
    vec![
        Box::new(Starfield::new()),
        Box::new(Plasma::new()),
        Box::new(Planes::new()),
        Box::new(TemporalTest::new()),
    ]
}
