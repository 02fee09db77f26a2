use argh::FromArgs;
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

use twoview::{
    io::{
        json::{read_json, write_json},
        table::read_triplet_table,
    },
    three_view_check, Point2d, Provenance, ThreeViewConfig, ThreeViewQuery,
};

#[derive(FromArgs)]
/// Check a point in image A against its matches in B and C through epipolar line intersection
struct Args {
    /// path to the triplet table (ImageA_x,ImageA_y,ImageB_x,ImageB_y,ImageC_x,ImageC_y)
    #[argh(option)]
    triplets: PathBuf,

    /// query point in image A, as "x,y"
    #[argh(option)]
    query: Point2d,

    /// observed match in image B, as "x,y"
    #[argh(option)]
    observed_b: Option<Point2d>,

    /// observed match in image C, as "x,y"; predicted with H_AC when absent
    #[argh(option)]
    observed_c: Option<Point2d>,

    /// path to a json three-view configuration, used instead of --threshold
    #[argh(option)]
    config: Option<PathBuf>,

    /// inlier threshold in pixels
    #[argh(option, default = "twoview::DEFAULT_INLIER_THRESHOLD_PX")]
    threshold: f64,

    /// seed of the random sampling
    #[argh(option, default = "42")]
    seed: u64,

    /// path of the json report
    #[argh(option)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let triplets = read_triplet_table(&args.triplets)?;
    println!("Loaded #{} point triplets", triplets.len());

    let config = match &args.config {
        Some(path) => read_json::<ThreeViewConfig>(path)?,
        None => {
            let mut config = ThreeViewConfig::default();
            config.homography.threshold = args.threshold;
            config.fundamental.threshold = args.threshold;
            config
        }
    };

    let query = ThreeViewQuery {
        point_a: args.query,
        observed_b: args.observed_b,
        observed_c: args.observed_c,
    };
    let mut rng = StdRng::seed_from_u64(args.seed);
    let report = three_view_check(&triplets, &query, &config, &mut rng)?;

    println!("H_AB: {:?}", report.h_ab.matrix());
    println!("H_AC: {:?}", report.h_ac.matrix());
    println!("F_AB: {:?}", report.f_ab.matrix());
    println!("F_CB: {:?}", report.f_cb.matrix());
    println!(
        "query ({:.2}, {:.2}) -> B by H_AB: ({:.2}, {:.2})",
        query.point_a.x, query.point_a.y, report.transfer_b.x, report.transfer_b.y
    );
    let source = match report.point_c_provenance {
        Provenance::Observed => "observed",
        Provenance::Projected => "projected by H_AC",
    };
    println!(
        "C point ({:.2}, {:.2}), {}",
        report.point_c.x, report.point_c.y, source
    );
    println!(
        "epipolar intersection in B: ({:.2}, {:.2})",
        report.check.intersection.x, report.check.intersection.y
    );
    if let Some(error) = report.check.error {
        println!("cross-view error: {error:.3} px");
    }
    if let Some(error) = report.epipolar_error_b {
        println!("distance of observed B point to its epipolar line: {error:.3} px");
    }
    if let Some(error) = report.transfer_error_b {
        println!("homography transfer error in B: {error:.3} px");
    }

    if let Some(output) = args.output {
        write_json(&output, &report)?;
        log::info!("wrote {}", output.display());
    }

    Ok(())
}
