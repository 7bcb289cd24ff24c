//! Scripted-browser session abstraction used to read client-rendered charts.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The `href` of an SVG anchor. SVG exposes links as animated strings with a
/// current (`animVal`) and a base (`baseVal`) value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimatedHref {
    #[serde(rename = "animVal", default)]
    pub anim_val: Option<String>,
    #[serde(rename = "baseVal", default)]
    pub base_val: Option<String>,
}

impl AnimatedHref {
    /// Returns the animated value when set, else the base value, else `""`.
    pub fn resolved(&self) -> &str {
        match (self.anim_val.as_deref(), self.base_val.as_deref()) {
            (Some(anim), _) if !anim.is_empty() => anim,
            (_, Some(base)) => base,
            _ => "",
        }
    }
}

/// A live browser page that can be navigated and queried.
///
/// Lookups return `Ok(None)` (or an empty vector) when nothing matches; an
/// `Err` means the session itself failed. Only one page is loaded at a time,
/// so navigation needs exclusive access.
#[allow(async_fn_in_trait)]
pub trait RenderedSession {
    /// Handle to an element of the currently loaded page.
    type Element: Clone;

    /// Loads `url` and waits for the browser to report the page as loaded.
    async fn navigate(&mut self, url: &str) -> Result<(), Error>;

    /// Finds an element by id, in the whole document or below `scope`.
    async fn find_by_id(
        &self,
        scope: Option<&Self::Element>,
        id: &str,
    ) -> Result<Option<Self::Element>, Error>;

    /// Finds the first descendant of `scope` with the given tag name.
    async fn find_by_tag(
        &self,
        scope: &Self::Element,
        tag: &str,
    ) -> Result<Option<Self::Element>, Error>;

    /// Finds the first descendant of `scope` carrying `class`.
    async fn find_by_class(
        &self,
        scope: &Self::Element,
        class: &str,
    ) -> Result<Option<Self::Element>, Error>;

    /// Finds every descendant of `scope` carrying `class`, in document order.
    async fn find_all_by_class(
        &self,
        scope: &Self::Element,
        class: &str,
    ) -> Result<Vec<Self::Element>, Error>;

    /// Reads the element's `href` as an animated string pair.
    async fn href(&self, element: &Self::Element) -> Result<Option<AnimatedHref>, Error>;

    /// Rendered text of the element.
    async fn text(&self, element: &Self::Element) -> Result<String, Error>;

    /// Ends the session and releases the browser.
    async fn close(self) -> Result<(), Error>
    where
        Self: Sized;
}
