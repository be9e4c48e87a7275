//! Window overlay metadata
//!
//! Split-window borders and per-window backgrounds need layout data the
//! backend only answers asynchronously. The resolver runs the batched query
//! on a worker thread (tokio runtime), and the paint path waits for a fresh
//! snapshot only up to a bound: past it, the previous snapshot is reused
//! (stale-but-available, never an error) and the in-flight query is
//! abandoned, not aborted — its result lands in the shared slot for a later
//! paint.

use std::future::Future;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info, warn};

use crate::color::{parse_hex_color, Rgba};

/// Backend-assigned window identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub i64);

/// Backend-assigned tabpage identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(pub i64);

/// Snapshot of one window's backend-reported layout
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub id: WindowId,
    /// Grid position of the top-left cell (row, col)
    pub pos: (usize, usize),
    pub width: usize,
    pub height: usize,
    pub tab: TabId,
    /// Raw per-window highlight option string
    pub hl_option: String,
    /// Per-window background override decoded from a "Normal:" group
    pub bg: Option<Rgba>,
    /// Whether a status line reduces the window's paintable area
    pub statusline: bool,
    pub buf_name: String,
}

/// Raw per-window answer from the batched layout query
#[derive(Debug, Clone)]
pub struct RawWindow {
    pub id: i64,
    pub pos: (usize, usize),
    pub width: usize,
    pub height: usize,
    pub tab: i64,
    pub hl_option: String,
    pub buf_name: String,
}

/// One batched layout answer
#[derive(Debug, Clone, Default)]
pub struct LayoutBatch {
    pub windows: Vec<RawWindow>,
    /// Global command-line height in rows
    pub cmdline_height: usize,
}

/// Backend layout query seam. Implementations run on the resolver's worker
/// runtime, so their futures never cross threads.
pub trait LayoutSource: Send + 'static {
    /// One batched query: every window's width/height/position/tab/highlight
    /// option and buffer name, plus the command-line height
    fn fetch(&mut self) -> impl Future<Output = Result<LayoutBatch>> + '_;

    /// Resolve a highlight group's background color as a hex string
    /// (the `synIDattr` answer shape); None when the group has no background
    fn group_background<'a>(
        &'a mut self,
        group: &'a str,
    ) -> impl Future<Output = Result<Option<String>>> + 'a;
}

/// Latest completed layout snapshot. Windows absent from it are closed and
/// excluded from border painting.
#[derive(Debug, Clone, Default)]
pub struct LayoutSnapshot {
    pub windows: Vec<WindowInfo>,
    pub cmdline_height: usize,
}

impl LayoutSnapshot {
    pub fn get(&self, id: WindowId) -> Option<&WindowInfo> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Window containing the cell position (x = column, y = row)
    pub fn window_at(&self, x: usize, y: usize) -> Option<&WindowInfo> {
        self.windows.iter().find(|w| {
            w.pos.0 <= y && w.pos.1 <= x && w.pos.0 + w.height + 1 >= y && w.pos.1 + w.width >= x
        })
    }
}

struct RefreshRequest {
    /// Current grid row count, needed for the status-line heuristic
    rows: usize,
    /// Ack channel; dropped by a caller that gave up waiting
    done: mpsc::Sender<()>,
}

/// Asynchronous window-layout refresher with a bounded per-call wait
pub struct OverlayResolver {
    snapshot: Arc<Mutex<LayoutSnapshot>>,
    request_tx: tokio::sync::mpsc::Sender<RefreshRequest>,
    _worker: thread::JoinHandle<()>,
}

impl OverlayResolver {
    /// Start the worker thread owning the layout source
    pub fn spawn<S: LayoutSource>(source: S) -> Result<Self> {
        let (request_tx, request_rx) = tokio::sync::mpsc::channel::<RefreshRequest>(8);
        let snapshot = Arc::new(Mutex::new(LayoutSnapshot::default()));
        let slot = Arc::clone(&snapshot);
        let worker = thread::Builder::new()
            .name("nvscreen-overlay".into())
            .spawn(move || worker_thread(source, request_rx, slot))?;
        Ok(Self {
            snapshot,
            request_tx,
            _worker: worker,
        })
    }

    /// Issue one batched refresh and wait for it at most `timeout`.
    ///
    /// On expiry the previous snapshot is returned unchanged; the query
    /// keeps running and a later call observes its result.
    pub fn refresh(&self, timeout: Duration, rows: usize) -> LayoutSnapshot {
        let (done_tx, done_rx) = mpsc::channel();
        let request = RefreshRequest { rows, done: done_tx };
        if self.request_tx.try_send(request).is_ok() {
            if done_rx.recv_timeout(timeout).is_err() {
                debug!("overlay refresh exceeded {:?}; using previous snapshot", timeout);
            }
        }
        self.current_windows()
    }

    /// Latest completed snapshot
    pub fn current_windows(&self) -> LayoutSnapshot {
        match self.snapshot.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn worker_thread<S: LayoutSource>(
    mut source: S,
    mut request_rx: tokio::sync::mpsc::Receiver<RefreshRequest>,
    slot: Arc<Mutex<LayoutSnapshot>>,
) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            warn!("failed to create overlay runtime: {}", e);
            return;
        }
    };

    rt.block_on(async move {
        while let Some(request) = request_rx.recv().await {
            match refresh_once(&mut source, request.rows).await {
                Ok(snapshot) => {
                    match slot.lock() {
                        Ok(mut guard) => *guard = snapshot,
                        Err(poisoned) => *poisoned.into_inner() = snapshot,
                    }
                }
                // Stale data is not an error; the previous snapshot stands
                Err(e) => warn!("window layout fetch failed: {}", e),
            }
            let _ = request.done.send(());
        }
        info!("overlay worker terminated");
    });
}

/// Run the batched query and resolve per-window background overrides
async fn refresh_once<S: LayoutSource>(source: &mut S, rows: usize) -> Result<LayoutSnapshot> {
    let batch = source.fetch().await?;
    let mut windows = Vec::with_capacity(batch.windows.len());
    for raw in batch.windows {
        let mut bg = None;
        if let Some(group) = normal_group(&raw.hl_option) {
            match source.group_background(group).await {
                // Malformed hex answers leave the override unset
                Ok(Some(hex)) => bg = parse_hex_color(&hex),
                Ok(None) => {}
                Err(e) => warn!("background lookup for {:?} failed: {}", group, e),
            }
        }
        let statusline = raw.pos.0 + raw.height < rows.saturating_sub(batch.cmdline_height);
        windows.push(WindowInfo {
            id: WindowId(raw.id),
            pos: raw.pos,
            width: raw.width,
            height: raw.height,
            tab: TabId(raw.tab),
            hl_option: raw.hl_option,
            bg,
            statusline,
            buf_name: raw.buf_name,
        });
    }
    Ok(LayoutSnapshot {
        windows,
        cmdline_height: batch.cmdline_height,
    })
}

/// Extract the group name of a `Normal:<group>` entry from a comma-separated
/// per-window highlight option
fn normal_group(hl_option: &str) -> Option<&str> {
    hl_option
        .split(',')
        .find_map(|part| part.strip_prefix("Normal:"))
        .filter(|group| !group.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Instant;

    struct ScriptedSource {
        batches: VecDeque<(Duration, LayoutBatch)>,
        backgrounds: Vec<(String, Option<String>)>,
    }

    impl LayoutSource for ScriptedSource {
        async fn fetch(&mut self) -> Result<LayoutBatch> {
            let (delay, batch) = self
                .batches
                .pop_front()
                .unwrap_or((Duration::ZERO, LayoutBatch::default()));
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(batch)
        }

        async fn group_background(&mut self, group: &str) -> Result<Option<String>> {
            Ok(self
                .backgrounds
                .iter()
                .find(|(name, _)| name == group)
                .and_then(|(_, hex)| hex.clone()))
        }
    }

    fn raw(id: i64, pos: (usize, usize), width: usize, height: usize) -> RawWindow {
        RawWindow {
            id,
            pos,
            width,
            height,
            tab: 1,
            hl_option: String::new(),
            buf_name: format!("buf{}", id),
        }
    }

    #[test]
    fn test_refresh_reflects_reported_windows() {
        let batch = LayoutBatch {
            windows: vec![raw(1, (0, 0), 40, 20), raw(2, (0, 41), 39, 24)],
            cmdline_height: 1,
        };
        let source = ScriptedSource {
            batches: VecDeque::from([(Duration::ZERO, batch)]),
            backgrounds: vec![],
        };
        let resolver = OverlayResolver::spawn(source).unwrap();
        let snap = resolver.refresh(Duration::from_secs(2), 25);
        assert_eq!(snap.windows.len(), 2);
        assert!(snap.get(WindowId(1)).is_some());
        // Window 1 ends above rows - cmdheight: it carries a status line
        assert!(snap.get(WindowId(1)).unwrap().statusline);
        assert!(!snap.get(WindowId(2)).unwrap().statusline);
    }

    #[test]
    fn test_timeout_returns_previous_snapshot() {
        let slow = LayoutBatch {
            windows: vec![raw(1, (0, 0), 80, 24)],
            cmdline_height: 1,
        };
        let fast = LayoutBatch {
            windows: vec![raw(2, (0, 0), 80, 24)],
            cmdline_height: 1,
        };
        let source = ScriptedSource {
            batches: VecDeque::from([
                (Duration::from_millis(400), slow),
                (Duration::ZERO, fast),
            ]),
            backgrounds: vec![],
        };
        let resolver = OverlayResolver::spawn(source).unwrap();

        // The slow fetch exceeds the bound: stale (initial empty) snapshot
        let snap = resolver.refresh(Duration::from_millis(20), 25);
        assert!(snap.windows.is_empty());

        // The abandoned fetch still completes and lands in the slot
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if resolver.current_windows().get(WindowId(1)).is_some() {
                break;
            }
            assert!(Instant::now() < deadline, "abandoned fetch never landed");
            thread::sleep(Duration::from_millis(10));
        }

        // The next completed refresh replaces it; window 1 is closed now
        let snap = resolver.refresh(Duration::from_secs(2), 25);
        assert!(snap.get(WindowId(2)).is_some());
        assert!(snap.get(WindowId(1)).is_none());
    }

    #[test]
    fn test_normal_group_background_decodes() {
        let mut with_hl = raw(1, (0, 0), 40, 24);
        with_hl.hl_option = "EndOfBuffer:Hidden,Normal:MyNormal".into();
        let mut bad_hex = raw(2, (0, 41), 39, 24);
        bad_hex.hl_option = "Normal:Broken".into();
        let source = ScriptedSource {
            batches: VecDeque::from([(
                Duration::ZERO,
                LayoutBatch { windows: vec![with_hl, bad_hex], cmdline_height: 0 },
            )]),
            backgrounds: vec![
                ("MyNormal".into(), Some("#336699".into())),
                ("Broken".into(), Some("not-a-color".into())),
            ],
        };
        let resolver = OverlayResolver::spawn(source).unwrap();
        let snap = resolver.refresh(Duration::from_secs(2), 25);
        assert_eq!(
            snap.get(WindowId(1)).unwrap().bg,
            Some(Rgba::rgb(0x33, 0x66, 0x99))
        );
        assert_eq!(snap.get(WindowId(2)).unwrap().bg, None);
    }

    #[test]
    fn test_window_at_uses_declared_bounds() {
        let snapshot = LayoutSnapshot {
            windows: vec![WindowInfo {
                id: WindowId(7),
                pos: (2, 10),
                width: 20,
                height: 5,
                tab: TabId(1),
                hl_option: String::new(),
                bg: None,
                statusline: false,
                buf_name: String::new(),
            }],
            cmdline_height: 1,
        };
        assert_eq!(snapshot.window_at(15, 4).map(|w| w.id), Some(WindowId(7)));
        assert_eq!(snapshot.window_at(5, 4), None);
        assert_eq!(snapshot.window_at(15, 20), None);
    }

    #[test]
    fn test_normal_group_parsing() {
        assert_eq!(normal_group("Normal:Foo"), Some("Foo"));
        assert_eq!(normal_group("A:B,Normal:Bar,C:D"), Some("Bar"));
        assert_eq!(normal_group("NormalNC:Baz"), None);
        assert_eq!(normal_group("Normal:"), None);
        assert_eq!(normal_group(""), None);
    }
}
