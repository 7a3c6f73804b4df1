use std::{collections::HashMap, fs, path};

use anyhow::Context;
use crossbeam::channel::{Receiver, Sender};
use gskits::pbar::{get_spin_pb, DEFAULT_INTERVAL};
use indicatif::ProgressBar;
use polars::prelude::*;

use backfill_median::rolling_median::{
    evaluate_partition_with, BackfillState, ContextArena, MedianError,
};

use crate::cli::RollingMedianParams;

/// rows of the (ordered) table, split into partitions. `rows[i]` are the table row
/// indices of partition i in evaluation order
#[derive(Debug)]
struct PartitionedColumn {
    rows: Vec<Vec<usize>>,
    values: Vec<Vec<Option<f64>>>,
}

pub fn rolling_median_main(param: &RollingMedianParams, output_dir: &str) -> anyhow::Result<()> {
    let filestem = path::Path::new(&param.input)
        .file_stem()
        .and_then(|v| v.to_str())
        .unwrap_or("input")
        .to_string();
    let oup_filepath = param
        .o_filepath
        .clone()
        .unwrap_or_else(|| format!("{output_dir}/{filestem}.rolling_median.csv"));

    let mut df = read_table(&param.input, param.order_col.as_deref())?;
    tracing::info!(
        "read {} rows from {}, window_size={}",
        df.height(),
        param.input,
        param.window_size
    );

    let partitioned = split_partitions(&df, &param.value_col, param.partition_col.as_deref())?;
    tracing::info!("{} partitions", partitioned.rows.len());

    let threads = param.threads.unwrap_or(num_cpus::get()).max(1);
    let pb = get_spin_pb(
        format!("rolling_median: {} partitions", partitioned.rows.len()),
        DEFAULT_INTERVAL,
    );
    let medians = evaluate_partitions(&partitioned.values, Some(param.window_size), threads, &pb)
        .with_context(|| format!("evaluate {}", param.input))?;
    pb.finish();

    let mut result = vec![None; df.height()];
    for (rows, medians) in partitioned.rows.iter().zip(medians.iter()) {
        for (&row, &median) in rows.iter().zip(medians.iter()) {
            result[row] = median;
        }
    }

    df.with_column(Series::new(param.out_col.as_str().into(), result))?;

    let mut out_file = fs::File::create(&oup_filepath)
        .with_context(|| format!("create file error. {}", oup_filepath))?;
    CsvWriter::new(&mut out_file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("write {}", oup_filepath))?;
    tracing::info!("written to {}", oup_filepath);

    Ok(())
}

fn read_table(filepath: &str, order_col: Option<&str>) -> anyhow::Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(filepath.into()))?
        .finish()
        .with_context(|| format!("read csv error. {}", filepath))?;

    let df = match order_col {
        Some(order_col) => df
            .lazy()
            .sort_by_exprs(
                [col(order_col)],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()
            .with_context(|| format!("sort by {}", order_col))?,
        None => df,
    };
    Ok(df)
}

/// rows with equal keys form one partition, in order of first appearance.
/// null keys are one partition too
fn split_partitions(
    df: &DataFrame,
    value_col: &str,
    partition_col: Option<&str>,
) -> anyhow::Result<PartitionedColumn> {
    let values = df
        .column(value_col)
        .with_context(|| format!("value column {}", value_col))?
        .cast(&DataType::Float64)?;
    let values = values.f64()?.into_iter().collect::<Vec<Option<f64>>>();

    let rows = match partition_col {
        Some(partition_col) => {
            let keys = df
                .column(partition_col)
                .with_context(|| format!("partition column {}", partition_col))?
                .cast(&DataType::String)?;

            let mut key2idx: HashMap<Option<&str>, usize> = HashMap::new();
            let mut rows: Vec<Vec<usize>> = vec![];
            for (row, key) in keys.str()?.into_iter().enumerate() {
                let idx = *key2idx.entry(key).or_insert_with(|| {
                    rows.push(vec![]);
                    rows.len() - 1
                });
                rows[idx].push(row);
            }
            rows
        }
        None => vec![(0..df.height()).collect()],
    };

    let values = rows
        .iter()
        .map(|rows| rows.iter().map(|&row| values[row]).collect())
        .collect();
    Ok(PartitionedColumn { rows, values })
}

/// evaluates every partition on a pool of `threads` workers. partitions share nothing;
/// the first failing partition's error is returned
pub fn evaluate_partitions(
    partitions: &[Vec<Option<f64>>],
    window_size: Option<i64>,
    threads: usize,
    pb: &ProgressBar,
) -> Result<Vec<Vec<Option<f64>>>, MedianError> {
    let mut outputs = vec![vec![]; partitions.len()];
    let mut first_err = None;

    std::thread::scope(|thread_scope| {
        let (task_sender, task_recv) = crossbeam::channel::bounded(1000);
        let (res_sender, res_recv) = crossbeam::channel::bounded(1000);

        for _ in 0..threads.max(1) {
            thread_scope.spawn({
                let task_recv = task_recv.clone();
                let res_sender = res_sender.clone();
                move || {
                    partition_worker(partitions, window_size, task_recv, res_sender);
                }
            });
        }
        drop(task_recv);
        drop(res_sender);

        thread_scope.spawn(move || {
            for idx in 0..partitions.len() {
                if task_sender.send(idx).is_err() {
                    break;
                }
            }
        });

        for (idx, res) in res_recv {
            pb.inc(1);
            match res {
                Ok(medians) => outputs[idx] = medians,
                Err(err) => {
                    tracing::debug!("partition {}: {}", idx, err);
                    first_err.get_or_insert(err);
                }
            }
        }
    });

    match first_err {
        Some(err) => Err(err),
        None => Ok(outputs),
    }
}

fn partition_worker(
    partitions: &[Vec<Option<f64>>],
    window_size: Option<i64>,
    recv: Receiver<usize>,
    sender: Sender<(usize, Result<Vec<Option<f64>>, MedianError>)>,
) {
    let mut arena = ContextArena::new();
    for idx in recv {
        let handle = arena.open();
        let res = evaluate_partition_with(
            &mut arena[handle],
            partitions[idx].as_slice(),
            window_size,
        );
        if let Some(BackfillState::Unavailable { window_size, cause }) =
            arena.close(handle).map(|ctx| ctx.state())
        {
            tracing::debug!(
                "partition {}: no backfill median for window {}, {:?}",
                idx,
                window_size.get(),
                cause
            );
        }
        debug_assert_eq!(arena.live(), 0);

        if sender.send((idx, res)).is_err() {
            break;
        }
    }
}
