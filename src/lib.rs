//! folio: a page-flip simulation engine.
//!
//! The engine turns pointer input into the geometry of a turning page: fold
//! lines, clip polygons, rotation angles and shadows, drawn every frame through
//! opaque [`PageSurface`]s supplied by the host. [`Book`] is the entry point.

pub mod animation;
pub mod book;
pub mod error;
pub mod events;
pub mod flip;
pub mod geometry;
pub mod input;
pub mod page;
pub mod render;
pub mod settings;

pub use book::Book;
pub use error::{ConfigError, FlipError, FlipResult, GeometryError, RenderError};
pub use events::{BookEvent, BookEventKind, ListenerId};
pub use flip::{FlipCorner, FlipDirection, FlippingState};
pub use geometry::{PageRect, Point};
pub use input::{Key, PointerTarget};
pub use page::{DrawContext, PageDensity, PageOrientation, PageSnapshot, PageSource, PageSurface, Placement};
pub use render::{FrameSnapshot, Orientation};
pub use settings::{FlipSetting, Settings};
