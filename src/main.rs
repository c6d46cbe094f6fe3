// Copyright 2020 TwoCookingMice

use photon_array::core::job_loader::load_job;
use photon_array::io::exr_utils;
use photon_array::io::png_utils;
use photon_array::renderers::shooting::PhotonShooter;

use std::env;
use std::process;

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <job.xml> <output.exr> [--seed N] [--preview out.png]", args[0]);
        process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut seed_override: Option<u64> = None;
    let mut preview_path: Option<String> = None;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                seed_override = args.get(i).and_then(|v| v.parse::<u64>().ok());
            }
            "--preview" => {
                i += 1;
                preview_path = args.get(i).cloned();
            }
            other => log::warn!("Ignoring unknown argument: {}.", other),
        }
        i += 1;
    }

    let job = match load_job(input_path) {
        Ok(job) => job,
        Err(e) => {
            log::error!("Failed to load job {}: {}.", input_path, e);
            process::exit(1);
        }
    };

    let seed = seed_override.unwrap_or(job.seed);
    let shooter = PhotonShooter::new(seed);
    let result = match shooter.shoot(&job) {
        Ok(result) => result,
        Err(e) => {
            log::error!("Failed to render {}: {}.", input_path, e);
            process::exit(1);
        }
    };

    println!("Deposited flux: {:.6} (total {:.6}, {} photons)",
             result.deposited_flux, result.photons.total_flux(), result.photons.len());

    if let Err(e) = exr_utils::write_exr_to_file(&result.image, output_path) {
        log::error!("Failed to write {}: {}.", output_path, e);
        process::exit(1);
    }
    if let Some(preview_path) = preview_path {
        if let Err(e) = png_utils::write_png_preview(&result.image, &preview_path) {
            log::error!("Failed to write {}: {}.", preview_path, e);
            process::exit(1);
        }
    }
}
