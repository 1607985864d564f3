//! Probe script template with a single label placeholder

/// Token replaced by the configured label text
pub const PLACEHOLDER: &str = "{{PLACEHOLDER}}";

/// JXA script asking System Events whether Zoom's `Meeting` menu holds
/// an item titled with the label. That item only exists while the
/// microphone is live, so its presence means "Unmuted".
pub const ZOOM_MENU_SCRIPT: &str = r#"ObjC.import("Foundation");

function checkZoomStatus() {
  const btnTitle = "{{PLACEHOLDER}}";

  const systemEvents = Application("System Events");
  const zoomApp = Application("zoom.us");

  if (zoomApp.running()) {
    const zoomProcess = systemEvents.processes["zoom.us"];
    try {
      const menuItemExists = zoomProcess.menuBars[0].menuBarItems["Meeting"].menus[0].menuItems[btnTitle].exists();
      return menuItemExists ? "Unmuted" : "Muted";
    } catch (e) {
      return "Muted";
    }
  }
  return "Muted";
}
checkZoomStatus();
"#;

/// Parameterized probe script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTemplate {
    text: String,
}

impl ScriptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Replace every placeholder with `label_text`, inserted verbatim.
    /// A template without the placeholder is returned unchanged.
    pub fn render(&self, label_text: &str) -> String {
        self.text.replace(PLACEHOLDER, label_text)
    }
}

impl Default for ScriptTemplate {
    fn default() -> Self {
        Self::new(ZOOM_MENU_SCRIPT)
    }
}
