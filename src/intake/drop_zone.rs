use super::IncomingFile;
use tracing::trace;

/// Pointer events delivered to the drop surface
#[derive(Debug, Clone)]
pub enum DragEvent {
    Enter,
    Over,
    Leave,
    Drop(Vec<IncomingFile>),
}

/// Drop surface state: the "active drag" highlight
#[derive(Debug, Default)]
pub struct DropZone {
    drag_active: bool,
}

impl DropZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_drag_active(&self) -> bool {
        self.drag_active
    }

    /// Update the highlight and hand back the first dropped file
    pub fn handle(&mut self, event: DragEvent) -> Option<IncomingFile> {
        match event {
            DragEvent::Enter | DragEvent::Over => {
                self.drag_active = true;
                None
            }
            DragEvent::Leave => {
                self.drag_active = false;
                None
            }
            DragEvent::Drop(files) => {
                self.drag_active = false;
                if files.len() > 1 {
                    trace!("{} files dropped, taking the first", files.len());
                }
                files.into_iter().next()
            }
        }
    }

    pub fn reset(&mut self) {
        self.drag_active = false;
    }
}
