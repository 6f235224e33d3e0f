//! The message vocabulary between a presenter and the engine worker.
//!
//! Requests flow in, updates flow out, both over channels, both strictly
//! FIFO.  Buffers inside an [Update] are owned by the receiver; the worker
//! allocates fresh ones per update and never touches them again.
use aeon_patterns::PackedPattern;

/// One cell edit addressed by viewport index: the cell at
/// `(idx % view_w, idx / view_w)` relative to the viewport origin.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CellEdit {
    pub idx: u32,
    pub alive: bool,
}

/// Presenter-to-engine messages.
#[derive(Clone, Debug)]
pub enum Request {
    /// Set viewport dimensions; when the store is empty and `preserve` is
    /// false, seed the default pattern.
    Init {
        cols: u32,
        rows: u32,
        preserve: bool,
    },

    /// Change viewport dimensions with no other side effects.
    Resize { cols: u32, rows: u32 },

    /// Move the viewport origin to a global coordinate.
    ViewportMove { x: i64, y: i64 },

    Start,
    Stop,

    /// One generation forward.
    Step,

    /// One generation backward; a no-op when history is empty or off.
    Reverse,

    /// Target cadence in frames per second, `0 < fps <= 60`, fractional
    /// allowed.
    SetFps(f64),

    SetHistory { enabled: bool, size: usize },
    SetAgeTracking(bool),
    SetHeatmap(bool),

    /// Replace the rule; a bad string is reported via [Update::RuleError]
    /// and the current rule stays.
    SetRule(String),

    SetCell(CellEdit),
    SetCells(Vec<CellEdit>),

    Clear,

    /// Replace the viewport rectangle with Bernoulli(density) cells.
    Randomize(f64),

    /// Replace the whole store with a packed bitmap at the origin.
    Load(PackedPattern),

    /// Ask for [Update::ExportData] carrying RLE of the world's bounding
    /// box.
    Export,

    /// Advance silently to a later generation.
    JumpToGen(u64),

    /// End the worker thread.  Dropping the [crate::Engine] handle sends
    /// this implicitly.
    Shutdown,
}

/// Everything a presenter needs to draw one frame.
#[derive(Clone, Debug, Default)]
pub struct FrameUpdate {
    /// Packed bitmap of the viewport, `ceil(w / 32)` words per row.
    pub grid: Vec<u32>,
    pub generation: u64,
    pub population: u64,
    pub running: bool,
    /// Chunk-aligned world bounds as `(x, y, w, h)` in cells; None when no
    /// chunks exist.
    pub bbox: Option<(i64, i64, i64, i64)>,
    /// The current rule in canonical form.
    pub rule: String,
    pub fps_actual: f64,
    pub fps_target: f64,
    pub chunks: usize,
    pub history_size: usize,
    /// Per-viewport-cell ages; present only while age tracking is on.
    pub ages: Option<Vec<u8>>,
    /// Per-viewport-cell activity heat; present only while the heatmap is
    /// on.
    pub heatmap: Option<Vec<u8>>,
}

/// Engine-to-presenter messages.
#[derive(Clone, Debug)]
pub enum Update {
    Frame(FrameUpdate),
    ExportData { rle: String, w: u64, h: u64 },
    RuleChanged(String),
    RuleError(String),
    JumpProgress { current: u64, target: u64 },
    JumpComplete(u64),
    JumpError(String),
}
