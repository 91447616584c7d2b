//! smosvm command line interface
//!
//! Train models (optionally with cross-validation), predict with saved models and
//! inspect model files. Data files use the libsvm format.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use smosvm::api::{accuracy, RegressionMetrics, SVM};
use smosvm::persistence::model_summary;
use smosvm::{load_model, load_problem, save_model, KernelType, Result, SVMError, SVMType};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "smosvm")]
#[command(about = "Support Vector Machine training and prediction")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model, or cross-validate the parameters
    Train(TrainArgs),
    /// Predict a data file with a trained model
    Predict(PredictArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (libsvm format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// c_svc, nu_svc, one_class, epsilon_svr or nu_svr
    #[arg(long, default_value = "c_svc")]
    svm_type: SVMType,

    /// linear, polynomial, rbf, sigmoid or precomputed
    #[arg(short, long, default_value = "rbf")]
    kernel: KernelType,

    /// Polynomial degree
    #[arg(long, default_value = "3")]
    degree: i32,

    /// Kernel gamma; 0 means 1 / number of features
    #[arg(short, long, default_value = "0")]
    gamma: f64,

    /// Kernel coef0
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    coef0: f64,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0", allow_negative_numbers = true)]
    c: f64,

    /// nu of nu-SVC, one-class SVM and nu-SVR
    #[arg(short, long, default_value = "0.5")]
    nu: f64,

    /// Epsilon-SVR tube width
    #[arg(short, long, default_value = "0.1")]
    p: f64,

    /// Stopping tolerance
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Kernel cache size in MB
    #[arg(long, default_value = "100")]
    cache_size: f64,

    /// Disable the shrinking heuristic
    #[arg(long)]
    no_shrinking: bool,

    /// Fit probability estimates
    #[arg(short = 'b', long)]
    probability: bool,

    /// Class weight as LABEL:WEIGHT; repeatable
    #[arg(short, long, value_parser = parse_weight, allow_hyphen_values = true)]
    weight: Vec<(i32, f64)>,

    /// Seed for cross-validation and calibration shuffles
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Run n-fold cross-validation instead of saving a model
    #[arg(long, value_name = "N")]
    cross_validation: Option<usize>,
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output class probabilities
    #[arg(short = 'b', long)]
    probability: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn parse_weight(s: &str) -> std::result::Result<(i32, f64), String> {
    let (label, weight) = s
        .split_once(':')
        .ok_or_else(|| format!("expected LABEL:WEIGHT, got {s}"))?;
    let label = label
        .parse()
        .map_err(|_| format!("invalid class label: {label}"))?;
    let weight = weight
        .parse()
        .map_err(|_| format!("invalid weight: {weight}"))?;
    Ok((label, weight))
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn train_command(args: TrainArgs) -> Result<()> {
    let problem = load_problem(&args.data)?;
    info!(
        "Loaded {} instances with {} features from {:?}",
        problem.len(),
        problem.max_index(),
        args.data
    );

    let mut svm = SVM::new()
        .with_svm_type(args.svm_type)
        .with_kernel(args.kernel)
        .with_degree(args.degree)
        .with_gamma(args.gamma)
        .with_coef0(args.coef0)
        .with_c(args.c)
        .with_nu(args.nu)
        .with_p(args.p)
        .with_epsilon(args.epsilon)
        .with_cache_size(args.cache_size)
        .with_shrinking(!args.no_shrinking)
        .with_probability(args.probability)
        .with_seed(args.seed);
    for &(label, weight) in &args.weight {
        svm = svm.with_weight(label, weight);
    }

    if let Some(nr_fold) = args.cross_validation {
        let target = svm.cross_validate(&problem, nr_fold)?;
        if args.svm_type.is_regression() {
            let metrics = RegressionMetrics::compute(&target, &problem.y);
            println!(
                "Cross Validation Mean squared error = {}",
                metrics.mean_squared_error
            );
            println!(
                "Cross Validation Squared correlation coefficient = {}",
                metrics.squared_correlation
            );
        } else {
            println!(
                "Cross Validation Accuracy = {}%",
                100.0 * accuracy(&target, &problem.y)
            );
        }
        return Ok(());
    }

    let output = args.output.ok_or_else(|| {
        SVMError::InvalidParameter("an output model file is required".to_string())
    })?;

    let model = svm.train(&problem)?;
    info!(
        "Training completed: {} support vectors",
        model.support_vector_count()
    );

    save_model(&model, &output)?;
    info!("Model saved to: {output:?}");
    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    info!("Loading model from: {:?}", args.model);
    let model = load_model(&args.model)?;
    let problem = load_problem(&args.data)?;

    if args.probability && !model.has_probability_model() {
        return Err(SVMError::InvalidParameter(
            "model does not support probability estimates".to_string(),
        ));
    }
    if !args.probability && model.has_probability_model() {
        info!("Model supports probability estimates, but disabled in prediction");
    }

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let classification = model.svm_type().is_classification();
    if args.probability {
        if classification {
            write!(writer, "labels")?;
            for label in model.labels() {
                write!(writer, " {label}")?;
            }
            writeln!(writer)?;
        } else if let Some(sigma) = model.svr_probability() {
            info!(
                "Prob. model for test data: target value = predicted value + z, \
                 z: Laplace distribution e^(-|z|/sigma)/(2sigma), sigma = {sigma}"
            );
        }
    }

    let mut predicted = Vec::with_capacity(problem.len());
    for x in &problem.x {
        let (label, probabilities) = if args.probability {
            model.predict_probability(x)
        } else {
            (model.predict(x), None)
        };

        write!(writer, "{label}")?;
        for p in probabilities.iter().flatten() {
            write!(writer, " {p}")?;
        }
        writeln!(writer)?;
        predicted.push(label);
    }
    writer.flush()?;

    let summary = if classification {
        let acc = accuracy(&predicted, &problem.y);
        let correct = (acc * problem.len() as f64).round() as usize;
        format!(
            "Accuracy = {}% ({}/{}) (classification)",
            100.0 * acc,
            correct,
            problem.len()
        )
    } else if model.svm_type().is_regression() {
        let metrics = RegressionMetrics::compute(&predicted, &problem.y);
        format!(
            "Mean squared error = {} (regression)\nSquared correlation coefficient = {} (regression)",
            metrics.mean_squared_error, metrics.squared_correlation
        )
    } else {
        let inliers = predicted.iter().filter(|&&v| v > 0.0).count();
        format!("Inliers = {inliers}/{}", problem.len())
    };

    // Keep stdout parseable when predictions go there
    if args.output.is_some() {
        println!("{summary}");
    } else {
        info!("{summary}");
    }
    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    let summary = model_summary(&model);

    if args.json {
        println!("{}", summary.to_json()?);
    } else {
        summary.print();
    }
    Ok(())
}
