use crate::storage::Storage;

/// Windows narrower than this start with the sidebar hidden.
pub const BREAKPOINT: f32 = 992.0;
pub const STORAGE_KEY: &str = "sidebar-hidden";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidebarController {
    hidden: bool,
    toggle_active: bool,
}

impl SidebarController {
    /// Narrow windows always start hidden; wider ones follow the stored
    /// preference and default to visible.
    pub fn initialize(width: f32, storage: &dyn Storage) -> Self {
        let hidden = if width < BREAKPOINT {
            true
        } else {
            storage.get(STORAGE_KEY).as_deref() == Some("true")
        };

        SidebarController {
            hidden,
            toggle_active: !hidden,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_toggle_active(&self) -> bool {
        self.toggle_active
    }

    pub fn toggle(&mut self, storage: &mut dyn Storage) {
        self.hidden = !self.hidden;
        self.toggle_active = !self.hidden;

        let value = if self.hidden { "true" } else { "false" };
        if let Err(e) = storage.set(STORAGE_KEY, value) {
            tracing::warn!("Could not save sidebar preference: {}", e);
        }
    }

    pub fn on_resize(&mut self, width: f32) {
        if width >= BREAKPOINT && !self.hidden {
            self.toggle_active = true;
        }
    }

    /// On narrow windows the open sidebar covers the chat, so a click on the
    /// chat closes it.
    pub fn on_main_content_click(&mut self, width: f32, storage: &mut dyn Storage) {
        if width < BREAKPOINT && !self.hidden {
            self.toggle(storage);
        }
    }
}
