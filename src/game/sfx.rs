use log::trace;

/// Fire-and-forget sound effects, identified by name.
pub trait Sfx {
    fn play(&self, id: &str, volume: f32);
}

/// Drops every effect.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSfx;

impl Sfx for NullSfx {
    fn play(&self, id: &str, volume: f32) {
        trace!("sfx '{}' at {:.2} (muted)", id, volume);
    }
}
