//! # Views
//!
//! A view is a payload attached to a response and rendered when the
//! response is finalized. Templating engines live outside this crate; they
//! only need to implement [`View`].

use std::fmt;

/// Renderable response payload
pub trait View: Send + Sync {
    /// Produce the markup appended to the response body
    ///
    /// # Errors
    ///
    /// Any error turns the finalized response into a 500.
    fn render(&self) -> anyhow::Result<String>;

    /// View name for logging
    fn name(&self) -> &str {
        "view"
    }
}

impl fmt::Debug for dyn View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View").field("name", &self.name()).finish()
    }
}

/// Pre-rendered markup
#[derive(Debug, Clone)]
pub struct StaticView {
    name: String,
    html: String,
}

impl StaticView {
    /// Create a view that always renders `html`
    pub fn new(name: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            html: html.into(),
        }
    }
}

impl View for StaticView {
    fn render(&self) -> anyhow::Result<String> {
        Ok(self.html.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
