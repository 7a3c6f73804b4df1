use std::{fs, path};

use anyhow::{bail, Context};
use clap::{self, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(long = "outdir")]
    pub output_dir: String,
    #[arg(short = 'f', help = "remove everything in the ${outdir}")]
    pub force: bool,

    #[command(subcommand)]
    pub commands: Subcommands,
}

impl Cli {
    pub fn build_output_dir(&self) -> anyhow::Result<()> {
        let output_dir = path::Path::new(&self.output_dir);
        if output_dir.exists() && !self.force {
            bail!(
                "output_dir: {} exists, use -f or change the output dir",
                self.output_dir
            );
        }

        if output_dir.exists() {
            fs::remove_dir_all(output_dir)
                .with_context(|| format!("remove dir error {}", self.output_dir))?;
        }

        fs::create_dir_all(output_dir)
            .with_context(|| format!("create dir error. {}", self.output_dir))?;
        Ok(())
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Subcommands {
    RollingMedian(RollingMedianParams),
}

#[derive(Debug, Args, Clone)]
pub struct RollingMedianParams {
    #[arg(long = "input", help = "csv file with a header line")]
    pub input: String,

    #[arg(long = "value-col", help = "numeric column the median is computed over")]
    pub value_col: String,

    #[arg(
        long = "window-size",
        allow_negative_numbers = true,
        help = "odd number of rows in each trailing window"
    )]
    pub window_size: i64,

    #[arg(
        long = "partition-col",
        help = "rows sharing a value form one partition, default: the whole table"
    )]
    pub partition_col: Option<String>,

    #[arg(
        long = "order-col",
        help = "rows are ordered by this column within each partition, default: file order"
    )]
    pub order_col: Option<String>,

    #[arg(long = "out-col", default_value = "rolling_median")]
    pub out_col: String,

    #[arg(long = "threads", help = "default: number of cpus")]
    pub threads: Option<usize>,

    #[arg(short = 'o', help = "default: ${outdir}/${input_stem}.rolling_median.csv")]
    pub o_filepath: Option<String>,
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::{Cli, RollingMedianParams, Subcommands};

    fn cli(output_dir: &str, force: bool) -> Cli {
        Cli {
            output_dir: output_dir.to_string(),
            force,
            commands: Subcommands::RollingMedian(RollingMedianParams {
                input: "prices.csv".to_string(),
                value_col: "price".to_string(),
                window_size: 3,
                partition_col: None,
                order_col: None,
                out_col: "rolling_median".to_string(),
                threads: None,
                o_filepath: None,
            }),
        }
    }

    #[test]
    fn test_build_output_dir_exists() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("keep.txt");
        fs::write(&marker, "x").unwrap();

        let err = cli(dir.path().to_str().unwrap(), false)
            .build_output_dir()
            .unwrap_err();
        assert!(err.to_string().contains("use -f"));
        assert!(marker.exists());
    }

    #[test]
    fn test_build_output_dir_force() {
        let dir = tempfile::tempdir().unwrap();
        let outdir = dir.path().join("out");
        fs::create_dir_all(outdir.join("nested")).unwrap();
        fs::write(outdir.join("nested/old.csv"), "x").unwrap();

        cli(outdir.to_str().unwrap(), true).build_output_dir().unwrap();
        assert!(outdir.is_dir());
        assert_eq!(fs::read_dir(&outdir).unwrap().count(), 0);
    }

    #[test]
    fn test_build_output_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        let outdir = dir.path().join("a/b");

        cli(outdir.to_str().unwrap(), false).build_output_dir().unwrap();
        assert!(outdir.is_dir());

        // a second run without -f must not clobber it
        assert!(cli(outdir.to_str().unwrap(), false).build_output_dir().is_err());
    }
}
