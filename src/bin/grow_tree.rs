use csv::ReaderBuilder;
use nalgebra::{DMatrix, DVector};
use rand::{rngs::StdRng, SeedableRng};
use rusty_cct::data::stats::{column_means, column_std_devs};
use rusty_cct::trees::{FeatureGroups, OutputScaling, Task, TreeConfig, TreeGrower, TreeNode};
use std::collections::HashMap;
use std::env;
use std::error::Error;

/// Rows of features, and the raw label column.
fn read_file(
    file_path: &str,
    dimension: usize,
    header: bool,
) -> Result<(DMatrix<f64>, Vec<String>), Box<dyn Error>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(header)
        .from_path(file_path)?;
    let mut features = Vec::new();
    let mut labels = Vec::new();

    for result in reader.records() {
        let record = result?;
        let mut feature_row = Vec::new();

        for feature in record.iter().take(dimension) {
            feature_row.push(feature.parse::<f64>()?);
        }

        let label = record.get(dimension).ok_or("Missing label")?;

        features.push(feature_row);
        labels.push(label.to_string());
    }
    if features.is_empty() {
        return Err("Empty dataset".into());
    }
    let feature_matrix =
        DMatrix::from_row_slice(features.len(), dimension, &features.concat());

    Ok((feature_matrix, labels))
}

fn one_hot(labels: &[String]) -> DMatrix<f64> {
    let mut label_map = HashMap::new();
    let ids: Vec<usize> = labels
        .iter()
        .map(|label| {
            let next = label_map.len();
            *label_map.entry(label.as_str()).or_insert(next)
        })
        .collect();

    DMatrix::from_fn(labels.len(), label_map.len(), |i, j| {
        if ids[i] == j {
            1.0
        } else {
            0.0
        }
    })
}

/// Standardised targets and the scaling that undoes it.
fn standardize(labels: &[String]) -> Result<(DMatrix<f64>, OutputScaling<f64>), Box<dyn Error>> {
    let values = labels
        .iter()
        .map(|label| label.parse::<f64>())
        .collect::<Result<Vec<_>, _>>()?;
    let y = DMatrix::from_column_slice(values.len(), 1, &values);

    let mean = column_means(&y);
    let std_dev = column_std_devs(&y).map(|s| if s > 0.0 { s } else { 1.0 });
    let standardized = DMatrix::from_fn(y.nrows(), 1, |i, _| (y[(i, 0)] - mean[0]) / std_dev[0]);

    let scaling = OutputScaling {
        scale: Some(DVector::from_vec(vec![std_dev[0]])),
        offset: Some(mean),
    };
    Ok((standardized, scaling))
}

fn summary(tree: &TreeNode<f64>) -> String {
    format!(
        "Nodes: {}, leaves: {}, depth: {}, root mean: {:?}",
        tree.n_nodes(),
        tree.n_leaves(),
        tree.depth(),
        tree.mean().as_slice()
    )
}

fn run(args: &[String]) -> Result<String, Box<dyn Error>> {
    let [path, dimension, task] = match args {
        [path, dimension, task, ..] => [path, dimension, task],
        _ => return Err("usage: grow-tree <file.csv> <n_features> <classification|regression> [seed]".into()),
    };
    let dimension = dimension.parse::<usize>()?;
    let seed = match args.get(3) {
        Some(seed) => seed.parse::<u64>()?,
        None => 42,
    };

    let (x, labels) = read_file(path, dimension, true)?;
    let (task, y, config) = match task.as_str() {
        "classification" => (
            Task::Classification,
            one_hot(&labels),
            TreeConfig::for_task(Task::Classification),
        ),
        "regression" => {
            let (y, scaling) = standardize(&labels)?;
            let mut config = TreeConfig::for_task(Task::Regression);
            config.output_scaling = scaling;
            (Task::Regression, y, config)
        }
        other => return Err(format!("Unknown task '{}'", other).into()),
    };

    let grower = TreeGrower::axis_aligned(config)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let tree = grower.grow(&x, &y, task, &FeatureGroups::ungrouped(dimension), &mut rng)?;
    Ok(summary(&tree))
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(summary) => println!("{}", summary),
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    }
}
