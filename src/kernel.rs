//! Parallel dispatch of per-cell kernels over a 2D grid.
//!
//! Rows are distributed over a rayon pool. Each row runs its columns in
//! ascending order on one worker. Rows run in no particular order, so a
//! kernel must not share mutable state across rows unless it synchronizes.
//!
//! A kernel that panics or returns an error stops only its own row. The
//! round still finishes every other row, then all faults are reported in one
//! [`PixelError::AggregatedKernelFault`].
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use pinpix::kernel;
//!
//! let hits = AtomicUsize::new(0);
//! kernel::launch(|_t| { hits.fetch_add(1, Ordering::Relaxed); }, 7, 3).unwrap();
//! assert_eq!(hits.into_inner(), 21);
//! ```

use core::cell::Cell;
use core::convert::Infallible;
use core::fmt::Display;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;

use crate::buffer::PixelBuffer;
use crate::color::Color;
use crate::error::{KernelFault, PixelError, Result};

/// Coordinate of one kernel invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KernelThread {
    pub x: usize,
    pub y: usize,
}

// ---------------------------------------------------------------------------
// Launcher
// ---------------------------------------------------------------------------

/// Runs kernels on either the global rayon pool or a dedicated one.
#[derive(Debug, Default)]
pub struct Launcher {
    pool: Option<rayon::ThreadPool>,
}

/// Configures a [`Launcher`] with its own thread pool.
#[derive(Debug, Default, Clone)]
pub struct LauncherBuilder {
    threads: Option<usize>,
    thread_name: Option<String>,
}

impl LauncherBuilder {
    /// Number of worker threads. Zero is rejected by [`build`](Self::build).
    pub fn threads(mut self, n: usize) -> Self {
        self.threads = Some(n);
        self
    }

    /// Worker names become `{prefix}-{index}`.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = Some(prefix.into());
        self
    }

    pub fn build(self) -> Result<Launcher> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = self.threads {
            if n == 0 {
                return Err(PixelError::InvalidArgument(
                    "launcher needs at least one thread".into(),
                ));
            }
            builder = builder.num_threads(n);
        }
        if let Some(prefix) = self.thread_name {
            builder = builder.thread_name(move |i| format!("{prefix}-{i}"));
        }
        let pool = builder
            .build()
            .map_err(|e| PixelError::InvalidArgument(format!("cannot build thread pool: {e}")))?;
        Ok(Launcher { pool: Some(pool) })
    }
}

impl Launcher {
    /// Launcher on the global rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> LauncherBuilder {
        LauncherBuilder::default()
    }

    /// Worker count of the pool kernels run on.
    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Invoke `kernel` once for every `(x, y)` in `[0, grid_x) × [0, grid_y)`.
    pub fn launch<F>(&self, kernel: F, grid_x: usize, grid_y: usize) -> Result<()>
    where
        F: Fn(KernelThread) + Sync,
    {
        self.try_launch(
            |t| {
                kernel(t);
                Ok::<(), Infallible>(())
            },
            grid_x,
            grid_y,
        )
    }

    /// Like [`launch`](Self::launch) for fallible kernels. A row stops at its
    /// first error.
    pub fn try_launch<F, E>(&self, kernel: F, grid_x: usize, grid_y: usize) -> Result<()>
    where
        F: Fn(KernelThread) -> core::result::Result<(), E> + Sync,
        E: Display,
    {
        let faults: Vec<KernelFault> = self.install(|| {
            (0..grid_y)
                .into_par_iter()
                .filter_map(|y| {
                    run_row(y, |x| kernel(KernelThread { x, y }), grid_x)
                })
                .collect()
        });
        finish(faults, grid_x, grid_y)
    }

    /// Invoke `kernel(thread, arg)` over the grid with a shared argument.
    pub fn launch_with<T, F>(&self, kernel: F, arg: &T, grid_x: usize, grid_y: usize) -> Result<()>
    where
        T: Sync + ?Sized,
        F: Fn(KernelThread, &T) + Sync,
    {
        self.launch(|t| kernel(t, arg), grid_x, grid_y)
    }

    /// Invoke `kernel` on every pixel of `buffer`, with mutable access.
    ///
    /// The grid is the buffer's extent. Rows are handed out as disjoint
    /// mutable chunks, so no synchronization is needed.
    pub fn launch_pixels<C, F>(&self, buffer: &mut PixelBuffer<C>, kernel: F) -> Result<()>
    where
        C: Color,
        F: Fn(KernelThread, &mut C) + Sync,
    {
        let (width, height) = (buffer.width(), buffer.height());
        if width == 0 || height == 0 {
            return Ok(());
        }
        let faults: Vec<KernelFault> = self.install(|| {
            buffer
                .pixels_mut()
                .par_chunks_mut(width)
                .enumerate()
                .filter_map(|(y, row)| {
                    run_row(
                        y,
                        |x| {
                            kernel(KernelThread { x, y }, &mut row[x]);
                            Ok::<(), Infallible>(())
                        },
                        width,
                    )
                })
                .collect()
        });
        finish(faults, width, height)
    }
}

/// Run columns `0..grid_x` of row `y`, catching the first error or panic.
fn run_row<E: Display>(
    y: usize,
    mut cell: impl FnMut(usize) -> core::result::Result<(), E>,
    grid_x: usize,
) -> Option<KernelFault> {
    let column = Cell::new(0);
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        for x in 0..grid_x {
            column.set(x);
            cell(x).map_err(|e| e.to_string())?;
        }
        Ok::<(), String>(())
    }));
    let message = match outcome {
        Ok(Ok(())) => return None,
        Ok(Err(msg)) => msg,
        Err(payload) => panic_message(payload.as_ref()),
    };
    Some(KernelFault {
        row: y,
        column: column.get(),
        message,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "kernel panicked with a non-string payload".to_string()
    }
}

fn finish(mut faults: Vec<KernelFault>, grid_x: usize, grid_y: usize) -> Result<()> {
    if faults.is_empty() {
        return Ok(());
    }
    faults.sort_by_key(|f| f.row);
    log::debug!(
        "{} of {} rows faulted in {}x{} kernel launch",
        faults.len(),
        grid_y,
        grid_x,
        grid_y
    );
    Err(PixelError::AggregatedKernelFault { faults })
}

// ---------------------------------------------------------------------------
// Free functions on the global pool
// ---------------------------------------------------------------------------

/// [`Launcher::launch`] on the global pool.
pub fn launch<F>(kernel: F, grid_x: usize, grid_y: usize) -> Result<()>
where
    F: Fn(KernelThread) + Sync,
{
    Launcher::new().launch(kernel, grid_x, grid_y)
}

/// [`Launcher::try_launch`] on the global pool.
pub fn try_launch<F, E>(kernel: F, grid_x: usize, grid_y: usize) -> Result<()>
where
    F: Fn(KernelThread) -> core::result::Result<(), E> + Sync,
    E: Display,
{
    Launcher::new().try_launch(kernel, grid_x, grid_y)
}

/// [`Launcher::launch_with`] on the global pool.
pub fn launch_with<T, F>(kernel: F, arg: &T, grid_x: usize, grid_y: usize) -> Result<()>
where
    T: Sync + ?Sized,
    F: Fn(KernelThread, &T) + Sync,
{
    Launcher::new().launch_with(kernel, arg, grid_x, grid_y)
}

/// [`Launcher::launch_pixels`] on the global pool.
pub fn launch_pixels<C, F>(buffer: &mut PixelBuffer<C>, kernel: F) -> Result<()>
where
    C: Color,
    F: Fn(KernelThread, &mut C) + Sync,
{
    Launcher::new().launch_pixels(buffer, kernel)
}
