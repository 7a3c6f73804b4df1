use crate::utils::select_median;

use super::{
    BackfillContext, MedianError, PartitionAccess, SeekFrom, UnavailableCause, WindowSize,
};

/// backfilled rolling median of `row`. rows of a partition go in ascending order
/// through the same `ctx`; `Ok(None)` on a null window or a short partition
pub fn compute<P>(
    row: usize,
    ctx: &mut BackfillContext,
    partition: &P,
    window_size: Option<i64>,
) -> Result<Option<f64>, MedianError>
where
    P: PartitionAccess + ?Sized,
{
    let ws = match ctx.window_size() {
        Some(ws) => {
            if window_size != Some(ws.get() as i64) {
                tracing::warn!(
                    "row {}: window size changed to {:?} mid-partition, keep using {}",
                    row,
                    window_size,
                    ws.get()
                );
            }
            ws
        }
        None => WindowSize::new(window_size)?,
    };

    if ws.get() > partition.row_count() {
        if ctx.window_size().is_none() {
            ctx.unavailable(ws, UnavailableCause::ShortPartition);
        }
        return Ok(None);
    }

    if ctx.window_size().is_none() {
        bootstrap(row, ctx, partition, ws);
    }

    if row > ws.backfill_end() {
        let window = gather_window(partition, row, ws, SeekFrom::Current, -1);
        return Ok(window.map(|mut window| select_median(&mut window)));
    }

    Ok(ctx.first_median())
}

/// runs `compute` over every row of `partition` with a fresh context
pub fn evaluate_partition<P>(
    partition: &P,
    window_size: Option<i64>,
) -> Result<Vec<Option<f64>>, MedianError>
where
    P: PartitionAccess + ?Sized,
{
    let mut ctx = BackfillContext::new();
    evaluate_partition_with(&mut ctx, partition, window_size)
}

/// same as [`evaluate_partition`] on a caller-owned context
pub fn evaluate_partition_with<P>(
    ctx: &mut BackfillContext,
    partition: &P,
    window_size: Option<i64>,
) -> Result<Vec<Option<f64>>, MedianError>
where
    P: PartitionAccess + ?Sized,
{
    (0..partition.row_count())
        .map(|row| compute(row, ctx, partition, window_size))
        .collect()
}

fn bootstrap<P>(row: usize, ctx: &mut BackfillContext, partition: &P, ws: WindowSize)
where
    P: PartitionAccess + ?Sized,
{
    match gather_window(partition, row, ws, SeekFrom::Head, 1) {
        Some(mut window) => ctx.bootstrapped(ws, select_median(&mut window)),
        None => ctx.unavailable(ws, UnavailableCause::NullInBootstrap),
    }
}

/// `ws` values walking from `seek` in `step` direction. `None` if any of them is missing
fn gather_window<P>(
    partition: &P,
    current: usize,
    ws: WindowSize,
    seek: SeekFrom,
    step: i64,
) -> Option<Vec<f64>>
where
    P: PartitionAccess + ?Sized,
{
    (0..ws.get() as i64)
        .map(|j| partition.fetch(current, j * step, seek).value())
        .collect()
}
