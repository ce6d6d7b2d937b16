use anyhow::{bail, Context};
use clap::Parser;
use simthings_core::RawRecord;
use simthings_schema::WeightOverrides;
use simthings_similarity::{Metric, NeighborStats, Pipeline, PipelineConfig};
use simthings_storage::{
    write_arff_file, NTriplesWriter, Provenance, RecordCache, SparqlJsonLoader,
    DEFAULT_SUBJECT_VAR, DEFAULT_URI_PATTERN,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Computes lists of similar resources from SPARQL query results
#[derive(Parser, Debug)]
#[command(name = "simthings")]
#[command(about = "Find similar things among linked-data resources", long_about = None)]
struct Args {
    /// Dataset the results were selected from (recorded as provenance)
    #[arg(short, long)]
    dataset: String,

    /// SPARQL JSON results file (may be repeated)
    #[arg(short, long = "input")]
    inputs: Vec<PathBuf>,

    /// Output N-Triples file
    #[arg(short, long)]
    file: PathBuf,

    /// Variable holding the resource subject
    #[arg(long, default_value = DEFAULT_SUBJECT_VAR)]
    subject_var: String,

    /// Weight a variable, e.g. p1=5 (may be repeated)
    #[arg(short, long = "weight")]
    weights: Vec<String>,

    /// Maximum number of matches per resource [default: 10]
    #[arg(short, long)]
    nummatches: Option<usize>,

    /// Pattern for similarity group nodes, %s is replaced by a subject hash
    #[arg(short, long, default_value = DEFAULT_URI_PATTERN)]
    uripattern: String,

    /// Distance metric (manhattan or euclidean)
    #[arg(long)]
    metric: Option<Metric>,

    /// Apply weights to numeric properties as well
    #[arg(long)]
    weight_numeric: bool,

    /// Compute distances on a single thread
    #[arg(long)]
    sequential: bool,

    /// JSON pipeline configuration; command line options override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the ARFF feature table
    #[arg(long, default_value = ".")]
    arff_dir: PathBuf,

    /// Skip writing the ARFF feature table
    #[arg(long)]
    no_arff: bool,

    /// Directory for cached records
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting simthings v{}", env!("CARGO_PKG_VERSION"));

    let config = build_config(&args)?;
    let writer = NTriplesWriter::new(&args.uripattern)?;

    let inputs: Vec<String> = args.inputs.iter().map(|p| p.display().to_string()).collect();
    let provenance = Provenance::new(&args.dataset, inputs)
        .with_subject_var(&args.subject_var)
        .with_weights(&config.weights);
    let source_id = provenance.source_id();

    let records = load_records(&args, &source_id)?;

    let pipeline = Pipeline::new(config)?;
    let output = pipeline.run(&records).with_context(|| {
        format!("Similarity pipeline failed for dataset {}", args.dataset)
    })?;
    drop(records);

    if !args.no_arff {
        let path = write_arff_file(&args.arff_dir, &provenance, &output)?;
        info!("Feature table written to {}", path.display());
    }

    writer.write_file(&args.file, &provenance, &output.neighbors)?;

    let stats = NeighborStats::compute(&output.neighbors);
    info!(
        resources = stats.resources,
        neighbors = stats.neighbors,
        avg = stats.avg_neighbors,
        isolated = stats.isolated,
        std_dev = output.std_dev,
        "Done"
    );

    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    let overrides = WeightOverrides::parse_all(&args.weights)?;
    for name in overrides.names() {
        if let Some(weight) = overrides.get(name) {
            config.weights.insert(name.clone(), weight)?;
        }
    }

    if let Some(n) = args.nummatches {
        config.max_neighbors = n;
    }
    if let Some(metric) = args.metric {
        config.metric = metric;
    }
    if args.weight_numeric {
        config.weight_numeric = true;
    }
    if args.sequential {
        config.parallel = false;
    }

    config.validate()?;
    Ok(config)
}

fn load_records(args: &Args, source_id: &str) -> anyhow::Result<Vec<RawRecord>> {
    let cache = args.cache_dir.as_ref().map(RecordCache::new).transpose()?;

    if let Some(cache) = &cache {
        if let Some(records) = cache.load(source_id)? {
            return Ok(records);
        }
    }

    if args.inputs.is_empty() {
        bail!("Please supply at least one --input results file");
    }

    let records = SparqlJsonLoader::new(&args.subject_var).load_files(&args.inputs)?;

    if let Some(cache) = &cache {
        cache.store(source_id, &records)?;
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["simthings", "--dataset", "books", "--file", "out.nt"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn config_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = build_config(&args(&[])).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let file = config_file(
            r#"{"max_neighbors": 3, "metric": "euclidean", "weights": {"color": 2.0, "size": 4.0}}"#,
        );
        let path = file.path().to_str().unwrap();

        let config = build_config(&args(&[
            "--config", path, "-w", "color=7", "--nummatches", "5", "--metric", "manhattan",
        ]))
        .unwrap();

        assert_eq!(config.max_neighbors, 5);
        assert_eq!(config.metric, Metric::Manhattan);
        assert_eq!(config.weights.get("color"), Some(7.0));
        assert_eq!(config.weights.get("size"), Some(4.0));
        assert!(config.parallel);
    }

    #[test]
    fn test_config_file_values_kept_when_no_flag() {
        let file = config_file(r#"{"max_neighbors": 3, "weight_numeric": true, "parallel": false}"#);
        let path = file.path().to_str().unwrap();

        let config = build_config(&args(&["--config", path])).unwrap();
        assert_eq!(config.max_neighbors, 3);
        assert!(config.weight_numeric);
        assert!(!config.parallel);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(build_config(&args(&["--nummatches", "0"])).is_err());
        assert!(build_config(&args(&["-w", "color=-1"])).is_err());
        assert!(build_config(&args(&["-w", "color"])).is_err());

        let file = config_file(r#"{"weights": {"color": -3.0}}"#);
        let path = file.path().to_str().unwrap();
        assert!(build_config(&args(&["--config", path])).is_err());
    }

    #[test]
    fn test_unknown_metric_rejected_by_parser() {
        let argv = ["simthings", "--dataset", "d", "--file", "o.nt", "--metric", "cosine"];
        assert!(Args::try_parse_from(argv).is_err());
    }
}
