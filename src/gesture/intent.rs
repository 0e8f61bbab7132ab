use super::Direction;

/// Everything a user can ask the feed to do. Produced by the input layer (or by the host's
/// button handlers) and matched exhaustively by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    DragStart { y: f32 },
    DragMove { y: f32 },
    DragEnd,
    DragCancel,
    Step(Direction),
    TogglePlay,
    Like,
    Dislike,
    Share,
    OpenExternally,
    /// Leave the current video (offered by the error fallback).
    Skip,
    /// The thumbnail shown by the error fallback failed to load.
    ThumbnailFailed,
    BreakRest,
    BreakContinue,
    BreakSkipRest,
}
