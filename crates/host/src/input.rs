use glam::Vec2;

/// Pointer and loop events delivered by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    MouseDown { x: f32, y: f32 },
    MouseMove { x: f32, y: f32 },
    MouseUp,
    /// Fired once per loop iteration when no other input arrived.
    Idle,
}

/// Drag tracking between pointer events.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    last: Option<Vec2>,
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        self.last.is_some()
    }

    pub fn press(&mut self, at: Vec2) {
        self.last = Some(at);
    }

    /// Pointer delta since the previous press or move. `None` when no drag
    /// is in progress.
    pub fn move_to(&mut self, at: Vec2) -> Option<Vec2> {
        let last = self.last.replace(at)?;
        Some(at - last)
    }

    pub fn release(&mut self) {
        self.last = None;
    }
}
