use thiserror::Error;

/// Invalid book settings. Fatal at construction, never recovered.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid size type \"{0}\": available only \"fixed\" and \"stretch\"")]
    InvalidSize(String),

    #[error("Invalid width or height: {width}x{height}")]
    InvalidDimensions { width: f64, height: f64 },

    #[error("Invalid flipping time: {0}")]
    InvalidFlippingTime(f64),

    #[error("Invalid corner smoothing {0}: expected a value in [0, 1]")]
    InvalidCornerSmoothing(f64),

    #[error("Invalid animation mode \"{0}\": available only \"corner\" and \"page\"")]
    InvalidAnimationMode(String),

    #[error("Invalid max hover fold distance {0}: expected a value in [0, 1]")]
    InvalidMaxHoverFoldDistance(f64),

    #[error("Invalid max shadow opacity {0}: expected a value in [0, 1]")]
    InvalidMaxShadowOpacity(f64),

    #[error("Invalid swipe distance: {0}")]
    InvalidSwipeDistance(f64),

    #[error("Invalid duplicate event window: {0}")]
    InvalidDuplicateEventWindow(f64),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Degenerate fold geometry. Contained inside `FlipCalculation::calc`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    #[error("fold angle is degenerate")]
    DegenerateAngle,

    #[error("drag point is too close to the rest corner")]
    PointTooSmall,

    #[error("segments are collinear")]
    SegmentIncluded,

    #[error("page dimension is not a number: {0:?}")]
    InvalidDimension(&'static str),
}

/// A page surface could not be produced or drawn this frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Draw failed: {0}")]
    DrawFailed(String),
}

/// Unified error type for the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlipError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Invalid gesture: {0}")]
    InvalidGesture(String),

    #[error("Invalid page number: {0}")]
    InvalidPage(usize),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

pub type FlipResult<T> = Result<T, FlipError>;
