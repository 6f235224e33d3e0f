use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam::channel as chan;
use log::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use aeon_patterns::{cell_bounds, emit_rle, load_packed, PackedPattern};
use aeon_sim::render::{self, Viewport};
use aeon_sim::{Rule, World};

use crate::command::{CellEdit, FrameUpdate, Request, Update};

/// How many requests may be outstanding before senders block.
const REQUEST_QUEUE_LENGTH: usize = 1024;

const DEFAULT_FPS: f64 = 10.0;
const MAX_FPS: f64 = 60.0;

/// During a jump, how often a progress ping goes out.
const JUMP_PROGRESS_INTERVAL: u64 = 1000;

/// Handle to an engine worker thread.
///
/// Requests are enqueued over a bounded channel and handled strictly in
/// order.  Dropping the handle shuts the worker down and joins it.
pub struct Engine {
    sender: chan::Sender<Request>,
    thread: Option<JoinHandle<()>>,
}

impl Engine {
    /// Start a worker and hand back the handle plus the update stream.
    pub fn spawn() -> (Engine, chan::Receiver<Update>) {
        let (req_tx, req_rx) = chan::bounded(REQUEST_QUEUE_LENGTH);
        let (update_tx, update_rx) = chan::unbounded();

        let thread = std::thread::spawn(move || Worker::new(update_tx).run(req_rx));

        (
            Engine {
                sender: req_tx,
                thread: Some(thread),
            },
            update_rx,
        )
    }

    pub fn send(&self, request: Request) -> Result<()> {
        self.sender.send(request)?;
        Ok(())
    }

    pub fn init(&self, cols: u32, rows: u32, preserve: bool) -> Result<()> {
        self.send(Request::Init {
            cols,
            rows,
            preserve,
        })
    }

    pub fn resize(&self, cols: u32, rows: u32) -> Result<()> {
        self.send(Request::Resize { cols, rows })
    }

    pub fn viewport_move(&self, x: i64, y: i64) -> Result<()> {
        self.send(Request::ViewportMove { x, y })
    }

    pub fn start(&self) -> Result<()> {
        self.send(Request::Start)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Request::Stop)
    }

    pub fn step(&self) -> Result<()> {
        self.send(Request::Step)
    }

    pub fn reverse(&self) -> Result<()> {
        self.send(Request::Reverse)
    }

    pub fn set_fps(&self, fps: f64) -> Result<()> {
        self.send(Request::SetFps(fps))
    }

    pub fn set_history(&self, enabled: bool, size: usize) -> Result<()> {
        self.send(Request::SetHistory { enabled, size })
    }

    pub fn set_age_tracking(&self, enabled: bool) -> Result<()> {
        self.send(Request::SetAgeTracking(enabled))
    }

    pub fn set_heatmap(&self, enabled: bool) -> Result<()> {
        self.send(Request::SetHeatmap(enabled))
    }

    pub fn set_rule(&self, rule: impl Into<String>) -> Result<()> {
        self.send(Request::SetRule(rule.into()))
    }

    pub fn set_cell(&self, edit: CellEdit) -> Result<()> {
        self.send(Request::SetCell(edit))
    }

    pub fn set_cells(&self, edits: Vec<CellEdit>) -> Result<()> {
        self.send(Request::SetCells(edits))
    }

    pub fn clear(&self) -> Result<()> {
        self.send(Request::Clear)
    }

    pub fn randomize(&self, density: f64) -> Result<()> {
        self.send(Request::Randomize(density))
    }

    pub fn load(&self, pattern: PackedPattern) -> Result<()> {
        self.send(Request::Load(pattern))
    }

    pub fn export(&self) -> Result<()> {
        self.send(Request::Export)
    }

    pub fn jump_to_gen(&self, target: u64) -> Result<()> {
        self.send(Request::JumpToGen(target))
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // The worker may already be gone; either way, join it.
        let _ = self.sender.send(Request::Shutdown);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

/// The state owned by the worker thread.
struct Worker {
    world: World,
    view: Viewport,
    running: bool,
    fps_target: f64,
    /// When the next run-loop tick is due; meaningful only while running.
    next_tick: Instant,
    frames_in_window: u32,
    window_start: Instant,
    fps_actual: f64,
    rng: SmallRng,
    updates: chan::Sender<Update>,
}

impl Worker {
    fn new(updates: chan::Sender<Update>) -> Worker {
        Worker {
            world: World::new(),
            view: Viewport::new(0, 0, 0, 0),
            running: false,
            fps_target: DEFAULT_FPS,
            next_tick: Instant::now(),
            frames_in_window: 0,
            window_start: Instant::now(),
            fps_actual: 0.0,
            rng: SmallRng::from_entropy(),
            updates,
        }
    }

    fn run(mut self, requests: chan::Receiver<Request>) {
        loop {
            let msg = if self.running {
                match requests.recv_deadline(self.next_tick) {
                    Ok(m) => Some(m),
                    Err(chan::RecvTimeoutError::Timeout) => None,
                    Err(chan::RecvTimeoutError::Disconnected) => break,
                }
            } else {
                match requests.recv() {
                    Ok(m) => Some(m),
                    Err(_) => break,
                }
            };

            match msg {
                Some(request) => {
                    if !self.handle(request) {
                        break;
                    }
                }
                None => self.tick(),
            }
        }
        debug!("engine worker exiting");
    }

    /// Handle one request.  Returns false on shutdown.
    fn handle(&mut self, request: Request) -> bool {
        match request {
            Request::Init {
                cols,
                rows,
                preserve,
            } => {
                self.view.w = cols;
                self.view.h = rows;
                if self.world.store().is_empty() && !preserve {
                    self.seed_default();
                }
                self.send_frame();
            }
            Request::Resize { cols, rows } => {
                self.view.w = cols;
                self.view.h = rows;
                self.send_frame();
            }
            Request::ViewportMove { x, y } => {
                self.view.x = x;
                self.view.y = y;
                self.send_frame();
            }
            Request::Start => {
                if !self.running {
                    self.running = true;
                    self.next_tick = Instant::now();
                    self.window_start = Instant::now();
                    self.frames_in_window = 0;
                }
                self.send_frame();
            }
            Request::Stop => {
                self.halt();
                self.send_frame();
            }
            Request::Step => {
                self.halt();
                self.world.step();
                self.send_frame();
            }
            Request::Reverse => {
                self.halt();
                if !self.world.reverse() {
                    debug!("reverse ignored: history empty or disabled");
                }
                self.send_frame();
            }
            Request::SetFps(fps) => {
                // NaN and out-of-range silently keep the old cadence.
                if fps > 0.0 && fps <= MAX_FPS {
                    self.fps_target = fps;
                } else {
                    warn!("ignoring target fps {}", fps);
                }
                self.send_frame();
            }
            Request::SetHistory { enabled, size } => {
                self.world.set_history(enabled, size);
                self.send_frame();
            }
            Request::SetAgeTracking(enabled) => {
                self.world.set_age_tracking(enabled);
                self.send_frame();
            }
            Request::SetHeatmap(enabled) => {
                self.world.set_heatmap(enabled);
                self.send_frame();
            }
            Request::SetRule(text) => match text.parse::<Rule>() {
                Ok(rule) => {
                    self.world.set_rule(rule);
                    self.send(Update::RuleChanged(rule.to_string()));
                    self.send_frame();
                }
                Err(e) => {
                    self.send(Update::RuleError(format!(
                        "cannot parse {:?} as a rule: {}",
                        text, e
                    )));
                }
            },
            Request::SetCell(edit) => {
                self.apply_edit(edit);
                self.send_frame();
            }
            Request::SetCells(edits) => {
                for edit in edits {
                    self.apply_edit(edit);
                }
                self.send_frame();
            }
            Request::Clear => {
                self.halt();
                self.world.clear();
                self.send_frame();
            }
            Request::Randomize(density) => {
                self.halt();
                if density > 0.0 && density < 1.0 {
                    let (x, y, w, h) = (self.view.x, self.view.y, self.view.w, self.view.h);
                    self.world.randomize(x, y, w, h, density, &mut self.rng);
                } else {
                    warn!("ignoring randomize density {}", density);
                }
                self.send_frame();
            }
            Request::Load(pattern) => {
                self.halt();
                self.world.replace_store(load_packed(&pattern));
                self.send_frame();
            }
            Request::Export => {
                let mut cells = vec![];
                self.world.store().for_each_live(|x, y| cells.push((x, y)));
                let (_, _, w, h) = cell_bounds(&cells).unwrap_or((0, 0, 0, 0));
                let rle = emit_rle(&cells, &self.world.rule().to_string());
                self.send(Update::ExportData { rle, w, h });
            }
            Request::JumpToGen(target) => self.jump(target),
            Request::Shutdown => return false,
        }
        true
    }

    fn halt(&mut self) {
        self.running = false;
    }

    fn seed_default(&mut self) {
        // A glider near the viewport center.
        let cx = self.view.x + self.view.w as i64 / 2 - 1;
        let cy = self.view.y + self.view.h as i64 / 2 - 1;
        for (dx, dy) in [(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)] {
            self.world.set_cell(cx + dx, cy + dy, true);
        }
    }

    fn apply_edit(&mut self, edit: CellEdit) {
        if self.view.w == 0 || edit.idx >= self.view.w * self.view.h {
            warn!("cell edit index {} outside viewport", edit.idx);
            return;
        }
        let x = self.view.x + (edit.idx % self.view.w) as i64;
        let y = self.view.y + (edit.idx / self.view.w) as i64;
        self.world.set_cell(x, y, edit.alive);
    }

    /// One run-loop tick: step, frame, reschedule.  The next tick lands at
    /// `max(period, elapsed)` after this one started, which self-corrects
    /// toward the target cadence when steps are cheap and degrades
    /// gracefully when they aren't.
    fn tick(&mut self) {
        let started = Instant::now();
        self.world.step();
        self.count_frame();
        self.send_frame();
        let period = Duration::from_secs_f64(1.0 / self.fps_target);
        self.next_tick = started + period.max(started.elapsed());
    }

    fn count_frame(&mut self) {
        self.frames_in_window += 1;
        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.fps_actual = self.frames_in_window as f64 / elapsed.as_secs_f64();
            self.frames_in_window = 0;
            self.window_start = Instant::now();
        }
    }

    fn jump(&mut self, target: u64) {
        self.halt();
        let current = self.world.generation();
        if target <= current {
            self.send(Update::JumpError(format!(
                "target generation {} is not ahead of {}",
                target, current
            )));
            return;
        }

        while self.world.generation() < target {
            self.world.step_silent();
            let current = self.world.generation();
            if current % JUMP_PROGRESS_INTERVAL == 0 && current != target {
                self.send(Update::JumpProgress { current, target });
            }
        }

        // Silent stepping skipped the overlays; square them up once.
        self.world.resync_overlays();
        self.send(Update::JumpComplete(target));
        self.send_frame();
    }

    fn send_frame(&mut self) {
        let grid = render::project_cells(self.world.store(), &self.view);
        let ages = self
            .world
            .ages()
            .map(|a| render::project_bytes(a, &self.view));
        let heatmap = self
            .world
            .heat()
            .map(|h| render::project_bytes(h, &self.view));
        let bbox = self.world.bounding_rect().map(|r| r.to_cell_rect());

        let frame = FrameUpdate {
            grid,
            generation: self.world.generation(),
            population: self.world.population(),
            running: self.running,
            bbox,
            rule: self.world.rule().to_string(),
            fps_actual: self.fps_actual,
            fps_target: self.fps_target,
            chunks: self.world.store().chunk_count(),
            history_size: self.world.history_len(),
            ages,
            heatmap,
        };
        self.send(Update::Frame(frame));
    }

    fn send(&self, update: Update) {
        // The presenter hanging up isn't our problem; the worker keeps
        // draining requests until the request channel closes too.
        if self.updates.send(update).is_err() {
            debug!("dropping update: presenter receiver is gone");
        }
    }
}
