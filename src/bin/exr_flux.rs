use photon_array::io::exr_utils::read_exr_from_file;
use photon_array::math::bounds::Bounds2i;

use std::env;

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image.exr>", args[0]);
        std::process::exit(1);
    }

    let img = match read_exr_from_file(&args[1]) {
        Ok(img) => img,
        Err(e) => {
            log::error!("Failed to read {}: {}.", args[1], e);
            std::process::exit(1);
        }
    };

    let bounds = img.bounds();
    let mut extent = Bounds2i::undefined();
    let mut peak = (0.0f64, 0, 0);
    for y in bounds.p_min.y..=bounds.p_max.y {
        for x in bounds.p_min.x..=bounds.p_max.x {
            let v = img[(x, y)];
            if v != 0.0 {
                extent.expand_by_point(x, y);
            }
            if v > peak.0 {
                peak = (v, x, y);
            }
        }
    }

    println!("Size: {}x{} ({} pixels)", img.width(), img.height(), bounds.area());
    println!("Total flux: {:.6}", img.total());
    println!("Peak: {:.6} at ({}, {})", peak.0, peak.1, peak.2);
    if extent.is_defined() {
        println!("Non-zero extent: x [{}, {}], y [{}, {}]",
                 extent.p_min.x, extent.p_max.x, extent.p_min.y, extent.p_max.y);
    } else {
        println!("Non-zero extent: none");
    }
}
