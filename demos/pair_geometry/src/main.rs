use argh::FromArgs;
use std::path::PathBuf;

use twoview::{
    estimate_pairs,
    io::{
        json::{read_json, write_json},
        table::read_correspondence_table,
    },
    CorrespondenceProvider, PairConfig, PairSummary, TableProvider,
};

#[derive(FromArgs)]
/// Estimate the homography and the fundamental matrix of every image pair in a correspondence table
struct Args {
    /// path to the correspondence table (pair_id,index,xa,ya,xb,yb)
    #[argh(option)]
    table: PathBuf,

    /// path to a json pair configuration, used instead of --threshold, --max-iterations, --seed and --strict
    #[argh(option)]
    config: Option<PathBuf>,

    /// path of the json file with the estimated models
    #[argh(option)]
    output: Option<PathBuf>,

    /// inlier threshold in pixels
    #[argh(option, default = "twoview::DEFAULT_INLIER_THRESHOLD_PX")]
    threshold: f64,

    /// maximum number of ransac iterations
    #[argh(option, default = "2000")]
    max_iterations: usize,

    /// seed of the random sampling
    #[argh(option, default = "42")]
    seed: u64,

    /// reject ambiguous 8-point samples
    #[argh(switch)]
    strict: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut provider = TableProvider::new(read_correspondence_table(&args.table)?);
    let sets = provider
        .pairs()
        .iter()
        .map(|pair| provider.correspondences(pair))
        .collect::<Result<Vec<_>, _>>()?;
    println!("Loaded #{} image pairs", sets.len());

    let config = match &args.config {
        Some(path) => read_json::<PairConfig>(path)?,
        None => {
            let mut config = PairConfig {
                strict_fundamental: args.strict,
                seed: args.seed,
                ..Default::default()
            };
            for params in [&mut config.homography, &mut config.fundamental] {
                params.threshold = args.threshold;
                params.max_iterations = args.max_iterations;
            }
            config
        }
    };
    log::debug!("pair configuration: {config:?}");

    let geometries = estimate_pairs(&sets, &config);
    for geometry in &geometries {
        println!("{} ({} correspondences)", geometry.pair, geometry.num_correspondences);
        match &geometry.homography {
            Ok(fit) => println!(
                "  H: {}/{} inliers, mean reprojection error {:.3} px, max {:.3} px",
                fit.ransac.num_inliers,
                geometry.num_correspondences,
                fit.report.mean,
                fit.report.max
            ),
            Err(e) => println!("  H: {e}"),
        }
        match &geometry.fundamental {
            Ok(fit) => println!(
                "  F: {}/{} inliers, mean epipolar distance {:.3} px, max {:.3} px",
                fit.ransac.num_inliers,
                geometry.num_correspondences,
                fit.report.mean,
                fit.report.max
            ),
            Err(e) => println!("  F: {e}"),
        }
    }

    if let Some(output) = args.output {
        let summaries: Vec<PairSummary> = geometries.iter().map(|g| g.summary()).collect();
        write_json(&output, &summaries)?;
        log::info!("wrote {}", output.display());
    }

    Ok(())
}
